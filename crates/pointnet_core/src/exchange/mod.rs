//! JSON export / import of whole libraries.
//!
//! # Responsibility
//! - Project libraries into a self-contained, serde-serializable document.
//! - Rebuild libraries from such documents under fresh ids.
//!
//! # Invariants
//! - Export never emits a link with an endpoint outside the exported points.
//! - Import never creates a dangling or cross-library link.
//!
//! Document field names (`fromId`, `toId`, `type`, `meta`) follow the
//! browser client's export format so files move between both tools.

use crate::model::library::LibraryId;
use crate::model::link::LinkType;
use crate::repo::RepoError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

mod export;
mod import;

pub use export::{export_libraries, export_library};
pub use import::{import_libraries, import_libraries_json, ImportSummary};

/// Errors from export/import.
#[derive(Debug)]
pub enum ExchangeError {
    LibraryNotFound(LibraryId),
    /// Import document cannot be parsed.
    InvalidPayload(String),
    Repo(RepoError),
}

impl Display for ExchangeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LibraryNotFound(id) => write!(f, "library not found: {id}"),
            Self::InvalidPayload(message) => write!(f, "invalid import payload: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ExchangeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ExchangeError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for ExchangeError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

/// One exported library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryExport {
    #[serde(alias = "library")]
    pub meta: LibraryMeta,
    #[serde(default)]
    pub points: Vec<PointExport>,
    #[serde(default)]
    pub links: Vec<LinkExport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryMeta {
    /// Opaque id from the exporting store; only used for reference.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<TagExport>,
    #[serde(default)]
    pub sources: Vec<SourceExport>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagExport {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceExport {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointExport {
    /// Opaque id used to resolve link endpoints inside the document.
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
    /// Tag names.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkExport {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "fromId")]
    pub from_id: String,
    #[serde(rename = "toId")]
    pub to_id: String,
    #[serde(rename = "type", default)]
    pub kind: LinkType,
}
