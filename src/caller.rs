use std::panic::Location;

/// Expands to the path of the enclosing function, e.g.
/// `my_app::orders::submit`. Closures add `{{closure}}` segments, which
/// are stripped.
#[macro_export]
macro_rules! function_path {
    () => {{
        fn __here() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        $crate::caller::trim_function_path(__type_name_of(__here))
    }};
}

/// Strip the helper suffix and closure segments left by [`function_path!`].
#[doc(hidden)]
pub fn trim_function_path(raw: &'static str) -> &'static str {
    let mut path = raw.strip_suffix("::__here").unwrap_or(raw);
    while let Some(stripped) = path.strip_suffix("::{{closure}}") {
        path = stripped;
    }
    path
}

/// Where a logging call was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    /// Enclosing function path, when the caller supplied one.
    pub function: Option<&'static str>,
    pub location: &'static Location<'static>,
}

impl CallSite {
    /// Capture the location of the caller of the `#[track_caller]` chain.
    #[track_caller]
    pub fn here(function: Option<&'static str>) -> Self {
        CallSite {
            function,
            location: Location::caller(),
        }
    }

    /// Explicit name received from the call site, or `""`.
    pub fn received_name(&self) -> &'static str {
        self.function.unwrap_or("")
    }
}

/// Identity of the method a record is attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodIdentity {
    /// Method name, or `file:line` when the call site supplied no function
    /// path (calls through the plain `Logger` methods rather than the
    /// `log_*!` macros).
    pub name: String,
    pub file: &'static str,
    pub line: u32,
}

/// Decides which method a logging call is attributed to. Returning `None`
/// drops the call.
pub trait CallerResolver: Send + Sync {
    fn resolve(&self, site: &CallSite) -> Option<MethodIdentity>;
}

impl<F> CallerResolver for F
where
    F: Fn(&CallSite) -> Option<MethodIdentity> + Send + Sync,
{
    fn resolve(&self, site: &CallSite) -> Option<MethodIdentity> {
        self(site)
    }
}

/// Default resolver: the last segment of the explicit function path, or
/// `file:line` when no path was supplied.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallSiteResolver;

impl CallerResolver for CallSiteResolver {
    fn resolve(&self, site: &CallSite) -> Option<MethodIdentity> {
        let name = match site.function.filter(|f| !f.is_empty()) {
            Some(path) => short_name(path).to_string(),
            None => format!("{}:{}", site.location.file(), site.location.line()),
        };

        Some(MethodIdentity {
            name,
            file: site.location.file(),
            line: site.location.line(),
        })
    }
}

/// Last `::` segment of a path, ignoring separators inside generics.
pub fn short_name(path: &str) -> &str {
    let base = path.split('<').next().unwrap_or(path);
    match base.rfind("::") {
        Some(idx) => &path[idx + 2..],
        None => path,
    }
}

/// Everything before the last `::` segment of a path, ignoring generics.
pub fn parent_path(path: &str) -> Option<&str> {
    let base = path.split('<').next().unwrap_or(path);
    base.rfind("::").map(|idx| &path[..idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_path_names_the_enclosing_function() {
        let path = crate::function_path!();
        assert_eq!(path, "log_facade::caller::tests::function_path_names_the_enclosing_function");
    }

    #[test]
    fn function_path_strips_closures() {
        let path = (|| crate::function_path!())();
        assert_eq!(path, "log_facade::caller::tests::function_path_strips_closures");
    }

    #[test]
    fn call_site_captures_this_line() {
        let (site, line) = (CallSite::here(None), line!());
        assert_eq!(site.location.line(), line);
        assert_eq!(site.location.file(), file!());
        assert_eq!(site.received_name(), "");
    }

    #[test]
    fn resolver_prefers_explicit_function() {
        let site = CallSite::here(Some("app::orders::submit"));
        let identity = CallSiteResolver.resolve(&site).unwrap();
        assert_eq!(identity.name, "submit");
        assert_eq!(identity.file, file!());
    }

    #[test]
    fn resolver_falls_back_to_location() {
        let site = CallSite::here(None);
        let identity = CallSiteResolver.resolve(&site).unwrap();
        assert_eq!(identity.name, format!("{}:{}", file!(), site.location.line()));
    }

    #[test]
    fn closures_are_resolvers() {
        let resolver = |_: &CallSite| -> Option<MethodIdentity> { None };
        assert!(resolver.resolve(&CallSite::here(None)).is_none());
    }

    #[test]
    fn path_helpers_ignore_generics() {
        assert_eq!(short_name("a::b::Repo<c::D>"), "Repo<c::D>");
        assert_eq!(parent_path("a::b::Repo<c::D>"), Some("a::b"));
        assert_eq!(short_name("Plain"), "Plain");
        assert_eq!(parent_path("Plain"), None);
    }
}
