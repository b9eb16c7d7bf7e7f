//! Cache scope providers.
//!
//! A scope provider supplies the tags that partition cache entries by
//! request context, such as published versus preview content. The resolver
//! attaches these tags to every entry it stores, so invalidating a scope tag
//! drops every entry computed under that scope.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Source of the current cache scope tags.
pub trait CacheScopeProvider: Send + Sync {
    /// Tags describing the scope of the current request.
    fn current_tags(&self) -> Vec<String>;
}

/// Scope provider returning a fixed tag set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticScopeProvider {
    tags: Vec<String>,
}

impl StaticScopeProvider {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// Provider contributing no scope tags.
    pub fn empty() -> Self {
        Self::default()
    }
}

impl CacheScopeProvider for StaticScopeProvider {
    fn current_tags(&self) -> Vec<String> {
        self.tags.clone()
    }
}

/// Content view a request is served from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Live, published content.
    #[default]
    Published,
    /// Unpublished drafts shown to editors.
    Preview,
}

impl ViewMode {
    /// Scope tag for this view.
    pub fn tag(&self) -> &'static str {
        match self {
            ViewMode::Published => "view:published",
            ViewMode::Preview => "view:preview",
        }
    }

    pub fn is_preview(&self) -> bool {
        matches!(self, ViewMode::Preview)
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewMode::Published => write!(f, "published"),
            ViewMode::Preview => write!(f, "preview"),
        }
    }
}

/// Scope provider keyed on the content view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewScopeProvider {
    mode: ViewMode,
}

impl ViewScopeProvider {
    pub fn new(mode: ViewMode) -> Self {
        Self { mode }
    }

    pub fn published() -> Self {
        Self::new(ViewMode::Published)
    }

    pub fn preview() -> Self {
        Self::new(ViewMode::Preview)
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }
}

impl CacheScopeProvider for ViewScopeProvider {
    fn current_tags(&self) -> Vec<String> {
        vec![self.mode.tag().to_string()]
    }
}
