use std::cell::RefCell;
use std::fmt;
use std::str::FromStr;

/// Formatting locale used for locale-sensitive rendering of values.
///
/// Only the pieces the logger actually formats are modelled: the tag
/// and the decimal separator used for fractional numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale {
    tag: String,
    decimal_separator: char,
}

/// Language subtags whose conventional decimal separator is a comma.
const COMMA_DECIMAL_LANGUAGES: &[&str] = &[
    "de", "fr", "es", "it", "pt", "nl", "ru", "pl", "tr", "sv", "da", "fi", "nb", "cs", "uk", "id",
];

impl Locale {
    /// The fixed locale the logger formats with (`en-US`).
    pub fn invariant() -> Self {
        Locale {
            tag: "en-US".to_string(),
            decimal_separator: '.',
        }
    }

    pub fn new(tag: impl Into<String>, decimal_separator: char) -> Self {
        Locale {
            tag: tag.into(),
            decimal_separator,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn decimal_separator(&self) -> char {
        self.decimal_separator
    }

    pub fn is_invariant(&self) -> bool {
        *self == Locale::invariant()
    }

    /// Render a floating point number with this locale's decimal separator.
    pub fn format_float(&self, value: f64) -> String {
        let text = value.to_string();
        if self.decimal_separator == '.' {
            text
        } else {
            text.replace('.', &self.decimal_separator.to_string())
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale::invariant()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag)
    }
}

/// Error returned for a malformed locale tag.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid locale tag: {0:?}")]
pub struct ParseLocaleError(pub String);

impl FromStr for Locale {
    type Err = ParseLocaleError;

    /// Parses BCP 47 style tags such as `en-US`, `de_DE` or `fa`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().replace('_', "-");
        let mut parts = tag.split('-');
        let language = parts.next().unwrap_or_default();

        let valid_language =
            (2..=3).contains(&language.len()) && language.chars().all(|c| c.is_ascii_alphabetic());
        let valid_rest = parts.all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_alphanumeric()));
        if !valid_language || !valid_rest {
            return Err(ParseLocaleError(s.to_string()));
        }

        let language = language.to_ascii_lowercase();
        let separator = if COMMA_DECIMAL_LANGUAGES.contains(&language.as_str()) {
            ','
        } else if language == "fa" || language == "ar" {
            '\u{066B}'
        } else {
            '.'
        };

        Ok(Locale::new(tag, separator))
    }
}

thread_local! {
    static CURRENT: RefCell<Locale> = RefCell::new(Locale::invariant());
}

/// Locale currently installed on this thread.
pub fn current() -> Locale {
    CURRENT.with(|current| current.borrow().clone())
}

/// Install `locale` on this thread and return the one it replaced.
pub fn set_current(locale: Locale) -> Locale {
    CURRENT.with(|current| std::mem::replace(&mut *current.borrow_mut(), locale))
}

/// Install `locale` on this thread until the returned guard is dropped.
///
/// The previous locale is restored on every exit path, including
/// unwinding out of a panicking sink.
pub fn override_current(locale: Locale) -> LocaleGuard {
    let previous = set_current(locale);
    LocaleGuard {
        previous: Some(previous),
    }
}

/// Restores the locale that was current before [`override_current`].
#[must_use = "the previous locale is restored as soon as the guard is dropped"]
pub struct LocaleGuard {
    previous: Option<Locale>,
}

impl LocaleGuard {
    pub fn previous(&self) -> Option<&Locale> {
        self.previous.as_ref()
    }
}

impl Drop for LocaleGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            set_current(previous);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invariant_is_en_us_with_dot() {
        let locale = Locale::invariant();
        assert_eq!(locale.tag(), "en-US");
        assert_eq!(locale.format_float(1.5), "1.5");
    }

    #[test]
    fn parses_tags() {
        let de: Locale = "de_DE".parse().unwrap();
        assert_eq!(de.tag(), "de-DE");
        assert_eq!(de.format_float(2.25), "2,25");

        let fa: Locale = "fa-IR".parse().unwrap();
        assert_eq!(fa.decimal_separator(), '\u{066B}');

        assert!("".parse::<Locale>().is_err());
        assert!("english-US".parse::<Locale>().is_err());
        assert!("en--US".parse::<Locale>().is_err());
    }

    #[test]
    fn guard_restores_previous_locale() {
        let before = set_current("fr-FR".parse().unwrap());
        {
            let guard = override_current(Locale::invariant());
            assert_eq!(guard.previous().map(Locale::tag), Some("fr-FR"));
            assert!(current().is_invariant());
        }
        assert_eq!(current().tag(), "fr-FR");
        set_current(before);
    }

    #[test]
    fn guard_restores_during_unwind() {
        let before = set_current("tr-TR".parse().unwrap());
        let result = std::panic::catch_unwind(|| {
            let _guard = override_current(Locale::invariant());
            panic!("sink blew up");
        });
        assert!(result.is_err());
        assert_eq!(current().tag(), "tr-TR");
        set_current(before);
    }

    #[test]
    fn locale_is_thread_scoped() {
        let before = set_current("de-DE".parse().unwrap());
        std::thread::spawn(|| {
            assert!(current().is_invariant());
            let _guard = override_current("it-IT".parse().unwrap());
        })
        .join()
        .unwrap();
        assert_eq!(current().tag(), "de-DE");
        set_current(before);
    }
}
