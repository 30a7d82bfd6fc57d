//! Library (knowledge base) model with its tag and source vocabularies.
//!
//! # Invariants
//! - Tag and source ids are scoped to one library.
//! - Tag names are matched exactly (case-sensitive) when points reference them.

use crate::model::validation::{limit_optional_text, require_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type LibraryId = Uuid;
pub type TagId = Uuid;
pub type SourceId = Uuid;

pub const LIBRARY_NAME_MAX_CHARS: usize = 128;
pub const TAG_NAME_MAX_CHARS: usize = 64;
pub const TAG_COLOR_MAX_CHARS: usize = 16;
pub const SOURCE_NAME_MAX_CHARS: usize = 256;
pub const DEFAULT_TAG_COLOR: &str = "#3F51B5";

/// Library header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    pub id: LibraryId,
    pub name: String,
    pub description: Option<String>,
}

impl Library {
    /// Creates a library with a generated id.
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name, LIBRARY_NAME_MAX_CHARS)
    }
}

/// Colored label defined per library and attached to points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub color: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, color: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            color: color.unwrap_or_else(|| DEFAULT_TAG_COLOR.to_string()),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("tag.name", &self.name, TAG_NAME_MAX_CHARS)?;
        limit_optional_text("tag.color", Some(&self.color), TAG_COLOR_MAX_CHARS)
    }
}

/// Bibliographic source suggestion for points of one library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: SourceId,
    pub name: String,
}

impl Source {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("source.name", &self.name, SOURCE_NAME_MAX_CHARS)
    }
}

#[cfg(test)]
mod tests {
    use super::{Library, Tag, DEFAULT_TAG_COLOR};

    #[test]
    fn tag_defaults_color() {
        let tag = Tag::new("history", None);
        assert_eq!(tag.color, DEFAULT_TAG_COLOR);
        assert!(tag.validate().is_ok());
    }

    #[test]
    fn library_rejects_blank_name() {
        assert!(Library::new("   ", None).validate().is_err());
    }
}
