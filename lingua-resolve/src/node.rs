//! Translation node lookup within a folder.

use lingua_core::{invariant_eq, non_blank, ContentNode, DEFAULT_LOCALE_FIELD};

/// Matches translation folder children against locales.
///
/// A child is a translation node when its locale field holds a non-blank
/// string; any other value (absent, blank, number, object) disqualifies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeResolver {
    locale_field: String,
}

impl Default for NodeResolver {
    fn default() -> Self {
        Self::new(DEFAULT_LOCALE_FIELD)
    }
}

impl NodeResolver {
    pub fn new(locale_field: impl Into<String>) -> Self {
        Self {
            locale_field: locale_field.into(),
        }
    }

    pub fn locale_field(&self) -> &str {
        &self.locale_field
    }

    /// Locale designated by `node`, if it is a translation node.
    pub fn locale_of<'n>(&self, node: &'n ContentNode) -> Option<&'n str> {
        non_blank(node.field_str(&self.locale_field))
    }

    /// First child of `folder` whose locale equals `locale`, ignoring case.
    ///
    /// A missing locale never matches.
    pub fn find_translation_node<'n>(
        &self,
        folder: &'n ContentNode,
        locale: Option<&str>,
    ) -> Option<&'n ContentNode> {
        let locale = locale?;
        self.translation_nodes(folder)
            .find(|(_, node_locale)| invariant_eq(node_locale, locale))
            .map(|(node, _)| node)
    }

    /// Children of `folder` that are translation nodes, in child order, with
    /// their locale.
    pub fn translation_nodes<'a, 'n: 'a>(
        &'a self,
        folder: &'n ContentNode,
    ) -> impl Iterator<Item = (&'n ContentNode, &'n str)> + 'a {
        folder
            .children
            .iter()
            .filter_map(move |child| self.locale_of(child).map(|locale| (child, locale)))
    }

    /// Locales of every translation node under `folder`, in child order.
    ///
    /// Duplicates are kept as stored.
    pub fn list_translated_locales(&self, folder: &ContentNode) -> Vec<String> {
        self.translation_nodes(folder)
            .map(|(_, locale)| locale.to_string())
            .collect()
    }
}
