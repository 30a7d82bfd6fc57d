//! Typed directed edge between two points of one library.

use crate::model::point::PointId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type LinkId = Uuid;

/// Relationship classifier of a link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    #[default]
    Related,
    /// `from` is the parent of `to`.
    Parent,
    /// `from` is the child of `to`.
    Child,
}

impl LinkType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Related => "related",
            Self::Parent => "parent",
            Self::Child => "child",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "related" => Some(Self::Related),
            "parent" => Some(Self::Parent),
            "child" => Some(Self::Child),
            _ => None,
        }
    }

    /// The type that expresses the same hierarchy from the other endpoint.
    pub fn inverse(self) -> Self {
        match self {
            Self::Related => Self::Related,
            Self::Parent => Self::Child,
            Self::Child => Self::Parent,
        }
    }
}

/// Persisted link row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub from_id: PointId,
    pub to_id: PointId,
    #[serde(rename = "type")]
    pub kind: LinkType,
    /// Epoch milliseconds.
    pub created_at: i64,
}

impl Link {
    /// Whether this link connects `a` and `b`, in either direction.
    pub fn joins(&self, a: PointId, b: PointId) -> bool {
        (self.from_id == a && self.to_id == b) || (self.from_id == b && self.to_id == a)
    }
}

#[cfg(test)]
mod tests {
    use super::LinkType;

    #[test]
    fn parse_accepts_only_known_types() {
        assert_eq!(LinkType::parse("parent"), Some(LinkType::Parent));
        assert_eq!(LinkType::parse("Parent"), None);
        assert_eq!(LinkType::parse(LinkType::Child.as_str()), Some(LinkType::Child));
    }

    #[test]
    fn inverse_swaps_hierarchy() {
        assert_eq!(LinkType::Parent.inverse(), LinkType::Child);
        assert_eq!(LinkType::Related.inverse(), LinkType::Related);
    }
}
