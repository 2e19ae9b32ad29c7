use serde::Serialize;
use std::cell::RefCell;
use std::net::IpAddr;

pub const UNKNOWN_REMOTE_IP: &str = "Unknown RemoteIP";
pub const UNKNOWN_USERNAME: &str = "Unknown Username";
pub const UNKNOWN_REQUEST_PATH: &str = "Unknown RequestPath";
pub const UNKNOWN_HTTP_REFERRER: &str = "Unknown HttpReferrer";

/// Source of ambient request metadata, typically backed by the web
/// framework's request context.
///
/// Each accessor is resolved independently; returning `None` means the
/// value is not available for the current call.
pub trait ContextProvider: Send + Sync {
    fn remote_address(&self) -> Option<String>;
    fn username(&self) -> Option<String>;
    fn request_path(&self) -> Option<String>;
    fn http_referrer(&self) -> Option<String>;
}

/// Request fields captured for a single log call. Every field holds either
/// a non-blank provider value or its `Unknown ...` sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextFields {
    pub remote_address: String,
    pub username: String,
    pub request_path: String,
    pub http_referrer: String,
}

impl ContextFields {
    /// All four sentinels.
    pub fn unknown() -> Self {
        ContextFields {
            remote_address: UNKNOWN_REMOTE_IP.to_string(),
            username: UNKNOWN_USERNAME.to_string(),
            request_path: UNKNOWN_REQUEST_PATH.to_string(),
            http_referrer: UNKNOWN_HTTP_REFERRER.to_string(),
        }
    }

    /// Read the provider's current state. Nothing is cached between calls.
    pub fn capture(provider: Option<&dyn ContextProvider>) -> Self {
        let Some(provider) = provider else {
            return ContextFields::unknown();
        };

        ContextFields {
            remote_address: or_sentinel(provider.remote_address(), UNKNOWN_REMOTE_IP),
            username: or_sentinel(provider.username(), UNKNOWN_USERNAME),
            request_path: or_sentinel(provider.request_path(), UNKNOWN_REQUEST_PATH),
            http_referrer: or_sentinel(provider.http_referrer(), UNKNOWN_HTTP_REFERRER),
        }
    }
}

fn or_sentinel(value: Option<String>, sentinel: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| sentinel.to_string())
}

/// Metadata of one request. Usable directly as a fixed provider, or
/// installed for the current thread with [`RequestInfo::enter`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestInfo {
    pub remote_address: Option<String>,
    pub username: Option<String>,
    pub request_path: Option<String>,
    pub http_referrer: Option<String>,
}

impl RequestInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_remote_ip(mut self, addr: IpAddr) -> Self {
        self.remote_address = Some(addr.to_string());
        self
    }

    pub fn with_remote_address(mut self, addr: impl Into<String>) -> Self {
        self.remote_address = Some(addr.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_request_path(mut self, path: impl Into<String>) -> Self {
        self.request_path = Some(path.into());
        self
    }

    pub fn with_http_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.http_referrer = Some(referrer.into());
        self
    }

    /// Make this request the active one on the current thread until the
    /// returned scope is dropped. Scopes nest; the innermost one wins.
    pub fn enter(self) -> RequestScope {
        ACTIVE_REQUESTS.with(|stack| stack.borrow_mut().push(self));
        RequestScope { _private: () }
    }
}

impl ContextProvider for RequestInfo {
    fn remote_address(&self) -> Option<String> {
        self.remote_address.clone()
    }

    fn username(&self) -> Option<String> {
        self.username.clone()
    }

    fn request_path(&self) -> Option<String> {
        self.request_path.clone()
    }

    fn http_referrer(&self) -> Option<String> {
        self.http_referrer.clone()
    }
}

thread_local! {
    static ACTIVE_REQUESTS: RefCell<Vec<RequestInfo>> = const { RefCell::new(Vec::new()) };
}

/// Guard returned by [`RequestInfo::enter`].
#[must_use = "the request is deactivated as soon as the scope is dropped"]
pub struct RequestScope {
    _private: (),
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        ACTIVE_REQUESTS.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Provider reading the request entered on the calling thread. With no
/// active scope every field is unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRequestContext;

impl ThreadRequestContext {
    fn with_active<R>(&self, f: impl FnOnce(&RequestInfo) -> Option<R>) -> Option<R> {
        ACTIVE_REQUESTS.with(|stack| stack.borrow().last().and_then(f))
    }
}

impl ContextProvider for ThreadRequestContext {
    fn remote_address(&self) -> Option<String> {
        self.with_active(|r| r.remote_address.clone())
    }

    fn username(&self) -> Option<String> {
        self.with_active(|r| r.username.clone())
    }

    fn request_path(&self) -> Option<String> {
        self.with_active(|r| r.request_path.clone())
    }

    fn http_referrer(&self) -> Option<String> {
        self.with_active(|r| r.http_referrer.clone())
    }
}
