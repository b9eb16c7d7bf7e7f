//! Content node snapshot.
//!
//! A `ContentNode` is a read-only view of one node of the content tree as
//! returned by a content store: its identifier, its type alias, its field
//! values, and its children in stored order. The resolver never mutates it.

use crate::identity::NodeId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One node of the content tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentNode {
    /// Tree identifier.
    pub id: NodeId,
    /// Document type alias (e.g. `homePage`).
    pub type_alias: String,
    /// Field values by field name.
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    /// Children in stored order.
    #[serde(default)]
    pub children: Vec<ContentNode>,
}

impl ContentNode {
    /// Create a childless node with no fields.
    pub fn new(id: impl Into<NodeId>, type_alias: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_alias: type_alias.into(),
            fields: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Set a field value.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Append a child.
    pub fn with_child(mut self, child: ContentNode) -> Self {
        self.children.push(child);
        self
    }

    /// Raw field value.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Field value when it is a JSON string.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }

    /// Depth-first search of this node and its descendants.
    pub fn find(&self, id: NodeId) -> Option<&ContentNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_page() -> ContentNode {
        ContentNode::new(1, "homePage").with_child(
            ContentNode::new(2, "homePageTranslationFolder")
                .with_child(ContentNode::new(3, "homePageTranslation").with_field("language", "es-mx")),
        )
    }

    #[test]
    fn test_field_str_only_returns_strings() {
        let node = ContentNode::new(9, "page")
            .with_field("language", "fr-fr")
            .with_field("order", 3);
        assert_eq!(node.field_str("language"), Some("fr-fr"));
        assert_eq!(node.field_str("order"), None);
        assert_eq!(node.field_str("missing"), None);
        assert!(node.field("order").is_some());
    }

    #[test]
    fn test_find_walks_descendants() {
        let page = sample_page();
        assert_eq!(page.find(NodeId::new(3)).map(|n| n.type_alias.as_str()), Some("homePageTranslation"));
        assert!(page.find(NodeId::new(99)).is_none());
    }

    #[test]
    fn test_node_deserializes_without_optional_sections() {
        let node: ContentNode =
            serde_json::from_str(r#"{"id": 5, "type_alias": "blogPost"}"#).unwrap();
        assert_eq!(node.id, NodeId::new(5));
        assert!(node.children.is_empty());
        assert!(node.fields.is_empty());
    }
}
