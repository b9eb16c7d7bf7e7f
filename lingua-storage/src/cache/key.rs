//! Cache key types.

use lingua_core::NodeId;
use std::fmt;
use std::hash::Hash;

/// A value usable as a cache key.
///
/// `encode` must be injective for the implementing type: two keys encode to
/// the same string only if they are equal. Key spaces keep encodings of
/// different key types apart, see [`ScopedKey`](super::ScopedKey).
pub trait CacheKey: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    /// Stable textual form of the key.
    fn encode(&self) -> String;
}

impl CacheKey for NodeId {
    fn encode(&self) -> String {
        self.to_string()
    }
}

impl CacheKey for String {
    fn encode(&self) -> String {
        self.clone()
    }
}

/// Composite key of a node id and a locale.
///
/// Equality and hashing cover both fields. The locale is compared exactly
/// (no case folding): `es-mx` and `ES-MX` are different keys that resolve to
/// the same translation node. An absent locale is its own key, distinct from
/// the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeAndLocale {
    node_id: NodeId,
    locale: Option<String>,
}

impl NodeAndLocale {
    pub fn new(node_id: NodeId, locale: Option<&str>) -> Self {
        Self {
            node_id,
            locale: locale.map(str::to_string),
        }
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }
}

impl CacheKey for NodeAndLocale {
    fn encode(&self) -> String {
        // Node ids never contain ':', so "7" (no locale) and "7:" (empty
        // locale) stay distinct.
        match &self.locale {
            Some(locale) => format!("{}:{}", self.node_id, locale),
            None => self.node_id.to_string(),
        }
    }
}

impl fmt::Display for NodeAndLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::collections::HashMap;
    use std::hash::Hasher;

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_independent_keys_compare_and_hash_equal() {
        let a = NodeAndLocale::new(NodeId::new(5), Some("en-us"));
        let b = NodeAndLocale::new(NodeId::new(5), Some("en-us"));
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_keys_differ_by_locale_or_node() {
        let us = NodeAndLocale::new(NodeId::new(5), Some("en-us"));
        let gb = NodeAndLocale::new(NodeId::new(5), Some("en-gb"));
        let other = NodeAndLocale::new(NodeId::new(6), Some("en-us"));
        assert_ne!(us, gb);
        assert_ne!(us, other);
    }

    #[test]
    fn test_locale_case_is_significant_for_keys() {
        let lower = NodeAndLocale::new(NodeId::new(5), Some("es-mx"));
        let upper = NodeAndLocale::new(NodeId::new(5), Some("ES-MX"));
        assert_ne!(lower, upper);
    }

    #[test]
    fn test_absent_locale_is_distinct() {
        let none = NodeAndLocale::new(NodeId::new(5), None);
        let empty = NodeAndLocale::new(NodeId::new(5), Some(""));
        assert_ne!(none, empty);
        assert_ne!(none.encode(), empty.encode());
        assert_eq!(none.locale(), None);
        assert_eq!(empty.locale(), Some(""));
    }

    #[test]
    fn test_equal_keys_collapse_to_one_map_entry() {
        let mut map = HashMap::new();
        map.insert(NodeAndLocale::new(NodeId::new(5), Some("en-us")), 1);
        map.insert(NodeAndLocale::new(NodeId::new(5), Some("en-us")), 2);
        assert_eq!(map.len(), 1);
        assert_eq!(map[&NodeAndLocale::new(NodeId::new(5), Some("en-us"))], 2);
    }
}
