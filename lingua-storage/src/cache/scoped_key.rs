//! Key spaces and space-scoped backend keys.
//!
//! A `ScopedKey` can only be built together with its `KeySpace`, so an entry
//! of one logical cache can never be read back through another, even when
//! the raw key encodings coincide (page id `7` in the folder cache and page
//! id `7` in the locale-list cache are different entries).
//!
//! A key may also carry a request scope (for example `view:preview`). The
//! scope is canonical: tags are sorted and deduplicated, so the same set of
//! tags always names the same slot, and different sets never share one.

use super::key::CacheKey;
use std::fmt;

/// Separator between the space name and the encoded key.
const SEPARATOR: char = '/';

/// Separator between scope tags.
const SCOPE_SEPARATOR: char = ',';

/// The logical caches sharing a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeySpace {
    /// (page, locale) -> translation node id.
    TranslationNode,
    /// page -> locales that have a translation node.
    TranslatedLocales,
    /// page -> translation folder id.
    TranslationFolder,
    /// dictionary term -> translated value.
    DictionaryTerm,
}

impl KeySpace {
    /// Every key space.
    pub const ALL: [KeySpace; 4] = [
        KeySpace::TranslationNode,
        KeySpace::TranslatedLocales,
        KeySpace::TranslationFolder,
        KeySpace::DictionaryTerm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KeySpace::TranslationNode => "translation_node",
            KeySpace::TranslatedLocales => "translated_locales",
            KeySpace::TranslationFolder => "translation_folder",
            KeySpace::DictionaryTerm => "dictionary_term",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|space| space.as_str() == value)
    }
}

impl fmt::Display for KeySpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A backend key confined to one key space.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopedKey {
    /// Private so a key never exists without its space.
    inner: ScopedKeyInner,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ScopedKeyInner {
    space: KeySpace,
    scope: Vec<String>,
    key: String,
}

impl ScopedKey {
    /// Scope a typed key to a key space.
    pub fn new<K: CacheKey>(space: KeySpace, key: &K) -> Self {
        Self {
            inner: ScopedKeyInner {
                space,
                scope: Vec::new(),
                key: key.encode(),
            },
        }
    }

    /// Confine the key to a request scope. Order and repeats of `tags` do
    /// not matter.
    pub fn with_scope<S: AsRef<str>>(mut self, tags: &[S]) -> Self {
        let mut scope: Vec<String> = tags.iter().map(|tag| tag.as_ref().to_string()).collect();
        scope.sort();
        scope.dedup();
        self.inner.scope = scope;
        self
    }

    pub fn space(&self) -> KeySpace {
        self.inner.space
    }

    /// Canonical scope tags, sorted. Empty for an unscoped key.
    pub fn scope(&self) -> &[String] {
        &self.inner.scope
    }

    /// The encoded key within its space.
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Encode as `space/key`, or `space[tag,tag]/key` when scoped, suitable
    /// for string-keyed stores.
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Decode a string produced by [`encode`](Self::encode).
    ///
    /// Returns `None` if the separator is missing, the space is unknown or
    /// the scope is malformed.
    pub fn decode(encoded: &str) -> Option<Self> {
        let (head, key) = encoded.split_once(SEPARATOR)?;
        let (space, scope) = match head.split_once('[') {
            Some((space, rest)) => {
                let tags = rest.strip_suffix(']')?;
                let scope = tags
                    .split(SCOPE_SEPARATOR)
                    .map(unescape_tag)
                    .collect::<Option<Vec<_>>>()?;
                (space, scope)
            }
            None => (head, Vec::new()),
        };
        Some(Self {
            inner: ScopedKeyInner {
                space: KeySpace::parse(space)?,
                scope,
                key: key.to_string(),
            },
        })
    }
}

impl fmt::Display for ScopedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.space)?;
        if !self.inner.scope.is_empty() {
            let tags: Vec<String> = self.inner.scope.iter().map(|tag| escape_tag(tag)).collect();
            write!(f, "[{}]", tags.join(","))?;
        }
        write!(f, "{}{}", SEPARATOR, self.inner.key)
    }
}

/// Percent-escape the characters that delimit the encoded scope.
fn escape_tag(tag: &str) -> String {
    let mut escaped = String::with_capacity(tag.len());
    for c in tag.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            '/' => escaped.push_str("%2F"),
            ',' => escaped.push_str("%2C"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn unescape_tag(escaped: &str) -> Option<String> {
    let mut tag = String::with_capacity(escaped.len());
    let mut rest = escaped;
    while let Some(at) = rest.find('%') {
        tag.push_str(&rest[..at]);
        let code = rest.get(at + 1..at + 3)?;
        tag.push(match code {
            "25" => '%',
            "2F" => '/',
            "2C" => ',',
            _ => return None,
        });
        rest = &rest[at + 3..];
    }
    tag.push_str(rest);
    Some(tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::key::NodeAndLocale;
    use lingua_core::NodeId;

    #[test]
    fn test_same_raw_key_in_different_spaces_differs() {
        let page = NodeId::new(7);
        let folder = ScopedKey::new(KeySpace::TranslationFolder, &page);
        let locales = ScopedKey::new(KeySpace::TranslatedLocales, &page);
        assert_eq!(folder.key(), locales.key());
        assert_ne!(folder, locales);
        assert_ne!(folder.encode(), locales.encode());
    }

    #[test]
    fn test_encode_decode() {
        let key = ScopedKey::new(
            KeySpace::TranslationNode,
            &NodeAndLocale::new(NodeId::new(42), Some("es-mx")),
        );
        assert_eq!(key.encode(), "translation_node/42:es-mx");
        assert_eq!(ScopedKey::decode(&key.encode()), Some(key));
    }

    #[test]
    fn test_decode_keeps_separator_inside_key() {
        let key = ScopedKey::new(KeySpace::DictionaryTerm, &"nav/home".to_string());
        let decoded = ScopedKey::decode(&key.encode()).unwrap();
        assert_eq!(decoded.key(), "nav/home");
        assert_eq!(decoded.space(), KeySpace::DictionaryTerm);
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(ScopedKey::decode("no-separator").is_none());
        assert!(ScopedKey::decode("unknown_space/1").is_none());
    }

    #[test]
    fn test_scope_is_part_of_identity() {
        let key = NodeAndLocale::new(NodeId::new(1), Some("es-mx"));
        let published = ScopedKey::new(KeySpace::TranslationNode, &key).with_scope(&["view:published"]);
        let preview = ScopedKey::new(KeySpace::TranslationNode, &key).with_scope(&["view:preview"]);
        let unscoped = ScopedKey::new(KeySpace::TranslationNode, &key);

        assert_ne!(published, preview);
        assert_ne!(published, unscoped);
        assert_eq!(published.key(), preview.key());
        assert_eq!(preview.encode(), "translation_node[view:preview]/1:es-mx");
    }

    #[test]
    fn test_scope_is_canonical() {
        let page = NodeId::new(3);
        let a = ScopedKey::new(KeySpace::TranslationFolder, &page).with_scope(&["b", "a", "b"]);
        let b = ScopedKey::new(KeySpace::TranslationFolder, &page).with_scope(&["a", "b"]);
        assert_eq!(a, b);
        assert_eq!(a.scope(), ["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_scoped_encode_decode_with_delimiters_in_tags() {
        let key = ScopedKey::new(KeySpace::DictionaryTerm, &"nav/home".to_string())
            .with_scope(&["site:a/b", "x,y", "100%", "[]"]);
        let decoded = ScopedKey::decode(&key.encode()).unwrap();
        assert_eq!(decoded, key);
        assert_eq!(decoded.key(), "nav/home");
        assert!(ScopedKey::decode("dictionary_term[bad%zz]/k").is_none());
        assert!(ScopedKey::decode("dictionary_term[open/k").is_none());
    }

    #[test]
    fn test_key_space_names_round_trip() {
        for space in KeySpace::ALL {
            assert_eq!(KeySpace::parse(space.as_str()), Some(space));
        }
    }
}
