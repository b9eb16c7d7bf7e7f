//! Identity types for content nodes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque integer identifier of a node in the content tree.
///
/// The tree owns the numbering; this crate only compares and hashes ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(i64);

impl NodeId {
    /// Wrap a raw tree identifier.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// The raw identifier.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for NodeId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl From<i32> for NodeId {
    fn from(raw: i32) -> Self {
        Self(i64::from(raw))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>().map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_display_round_trips_through_from_str() {
        let id = NodeId::new(1042);
        assert_eq!(id.to_string(), "1042");
        assert_eq!("1042".parse::<NodeId>().unwrap(), id);
    }

    #[test]
    fn test_node_id_serializes_as_plain_integer() {
        let json = serde_json::to_string(&NodeId::new(7)).unwrap();
        assert_eq!(json, "7");
        let back: NodeId = serde_json::from_str("-3").unwrap();
        assert_eq!(back.get(), -3);
    }
}
