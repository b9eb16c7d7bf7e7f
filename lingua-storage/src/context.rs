//! Request context collaborators.

/// Supplies the locale of the current request.
///
/// Only the convenience wrappers consult a locale source; every core
/// operation takes its locale as an explicit argument.
pub trait LocaleSource: Send + Sync {
    /// The current locale, if one could be determined.
    fn current_locale(&self) -> Option<String>;
}

/// A locale source that always answers the same locale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedLocale(Option<String>);

impl FixedLocale {
    pub fn new(locale: impl Into<String>) -> Self {
        Self(Some(locale.into()))
    }

    /// A source that never determines a locale.
    pub fn none() -> Self {
        Self(None)
    }
}

impl LocaleSource for FixedLocale {
    fn current_locale(&self) -> Option<String> {
        self.0.clone()
    }
}

impl<F> LocaleSource for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn current_locale(&self) -> Option<String> {
        self()
    }
}
