//! Point (note) domain model.
//!
//! # Responsibility
//! - Define the writable field set of a point.
//! - Identify which fields are snapshot-relevant.
//!
//! # Invariants
//! - `id` is stable and never reused for another point.
//! - Only `title` and `content` changes are versioned; position, tags, source
//!   and page edits alone never trigger a snapshot.

use crate::model::library::LibraryId;
use crate::model::validation::{
    limit_optional_text, require_finite, require_text, ValidationError,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type PointId = Uuid;

pub const TITLE_MAX_CHARS: usize = 256;
pub const SOURCE_MAX_CHARS: usize = 256;
pub const PAGE_MAX_CHARS: usize = 32;

/// Canonical point record without derived associations (tags, timestamps).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: PointId,
    pub library_id: LibraryId,
    pub title: String,
    /// Free text body, may be empty.
    pub content: String,
    pub source: Option<String>,
    pub page: Option<String>,
    /// Canvas position used by graph visualisation.
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Creates a point at the canvas origin with a generated id.
    pub fn new(library_id: LibraryId, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            library_id,
            title: title.into(),
            content: content.into(),
            source: None,
            page: None,
            x: 0.0,
            y: 0.0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title, TITLE_MAX_CHARS)?;
        limit_optional_text("source", self.source.as_deref(), SOURCE_MAX_CHARS)?;
        limit_optional_text("page", self.page.as_deref(), PAGE_MAX_CHARS)?;
        require_finite("x", self.x)?;
        require_finite("y", self.y)
    }

    /// Whether `other` differs in a field tracked by snapshot history.
    pub fn versioned_fields_differ(&self, other: &Point) -> bool {
        self.title != other.title || self.content != other.content
    }
}

/// Partial update for a point. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub source: Option<String>,
    pub page: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    /// Replaces the full tag set by name when present.
    pub tags: Option<Vec<String>>,
}

impl PointPatch {
    /// Applies the field part of the patch, returning the updated point.
    pub fn apply_to(&self, point: &Point) -> Point {
        let mut next = point.clone();
        if let Some(title) = &self.title {
            next.title = title.clone();
        }
        if let Some(content) = &self.content {
            next.content = content.clone();
        }
        if let Some(source) = &self.source {
            next.source = Some(source.clone());
        }
        if let Some(page) = &self.page {
            next.page = Some(page.clone());
        }
        if let Some(x) = self.x {
            next.x = x;
        }
        if let Some(y) = self.y {
            next.y = y;
        }
        next
    }
}
