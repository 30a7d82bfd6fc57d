//! Library use-case service.
//!
//! # Responsibility
//! - Create, update, list and delete libraries with their tag/source sets.
//!
//! # Invariants
//! - Library names are trimmed before validation.
//! - Tag/source sets are replaced as a whole when provided.
//! - Deleting a library removes every point, link and snapshot it owns.

use crate::model::library::{Library, LibraryId, Source, SourceId, Tag, TagId};
use crate::model::validation::ValidationError;
use crate::repo::library_repo::{
    LibraryRecord, LibraryRepository, LibrarySummary, SqliteLibraryRepository,
};
use crate::repo::RepoError;
use log::info;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from library use-cases.
#[derive(Debug)]
pub enum LibraryServiceError {
    InvalidInput(ValidationError),
    LibraryNotFound(LibraryId),
    Repo(RepoError),
    /// Write succeeded but the read-back did not find the row.
    InconsistentState(&'static str),
}

impl Display for LibraryServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(err) => write!(f, "invalid library input: {err}"),
            Self::LibraryNotFound(id) => write!(f, "library not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => {
                write!(f, "inconsistent library state: {details}")
            }
        }
    }
}

impl Error for LibraryServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for LibraryServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::InvalidInput(err),
            RepoError::NotFound {
                entity: "library",
                id,
            } => Self::LibraryNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<rusqlite::Error> for LibraryServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

/// Tag definition in create/update requests. `id` keeps an existing tag (and
/// its point associations) when it already belongs to the library.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagInput {
    pub id: Option<TagId>,
    pub name: String,
    pub color: Option<String>,
}

impl TagInput {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn into_tag(self) -> Tag {
        let mut tag = Tag::new(self.name.trim(), self.color);
        if let Some(id) = self.id {
            tag.id = id;
        }
        tag
    }
}

/// Source definition in create/update requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceInput {
    pub id: Option<SourceId>,
    pub name: String,
}

impl SourceInput {
    fn into_source(self) -> Source {
        let mut source = Source::new(self.name.trim());
        if let Some(id) = self.id {
            source.id = id;
        }
        source
    }
}

/// Input for [`LibraryService::create_library`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewLibrary {
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<TagInput>,
    pub sources: Vec<SourceInput>,
}

/// Partial update for a library. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<TagInput>>,
    pub sources: Option<Vec<SourceInput>>,
}

/// Library service over one borrowed connection.
pub struct LibraryService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> LibraryService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn create_library(&self, input: NewLibrary) -> Result<LibraryRecord, LibraryServiceError> {
        let library = Library::new(input.name.trim(), input.description);
        library
            .validate()
            .map_err(LibraryServiceError::InvalidInput)?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let repo = SqliteLibraryRepository::try_new(&tx)?;
        repo.insert_library(&library)?;
        let tags: Vec<Tag> = input.tags.into_iter().map(TagInput::into_tag).collect();
        repo.replace_tags(library.id, &tags)?;
        let sources: Vec<Source> = input
            .sources
            .into_iter()
            .map(SourceInput::into_source)
            .collect();
        repo.replace_sources(library.id, &sources)?;
        let record = repo
            .get_library(library.id)?
            .ok_or(LibraryServiceError::InconsistentState(
                "created library not found in read-back",
            ))?;
        tx.commit()?;

        info!(
            "event=library_create module=library status=ok library_id={} tags={} sources={}",
            library.id,
            record.tags.len(),
            record.sources.len()
        );
        Ok(record)
    }

    pub fn get_library(
        &self,
        library_id: LibraryId,
    ) -> Result<Option<LibraryRecord>, LibraryServiceError> {
        Ok(SqliteLibraryRepository::try_new(self.conn)?.get_library(library_id)?)
    }

    /// Lists libraries newest first with point/link counts.
    pub fn list_libraries(&self) -> Result<Vec<LibrarySummary>, LibraryServiceError> {
        Ok(SqliteLibraryRepository::try_new(self.conn)?.list_libraries()?)
    }

    pub fn update_library(
        &self,
        library_id: LibraryId,
        patch: LibraryPatch,
    ) -> Result<LibraryRecord, LibraryServiceError> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let repo = SqliteLibraryRepository::try_new(&tx)?;
        let current = repo
            .get_library(library_id)?
            .ok_or(LibraryServiceError::LibraryNotFound(library_id))?;

        let mut library = current.summary.library;
        if let Some(name) = patch.name {
            library.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            library.description = Some(description);
        }
        repo.update_library(&library)?;

        if let Some(tags) = patch.tags {
            let tags: Vec<Tag> = tags.into_iter().map(TagInput::into_tag).collect();
            repo.replace_tags(library_id, &tags)?;
        }
        if let Some(sources) = patch.sources {
            let sources: Vec<Source> = sources.into_iter().map(SourceInput::into_source).collect();
            repo.replace_sources(library_id, &sources)?;
        }

        let record = repo
            .get_library(library_id)?
            .ok_or(LibraryServiceError::InconsistentState(
                "updated library not found in read-back",
            ))?;
        tx.commit()?;

        info!("event=library_update module=library status=ok library_id={library_id}");
        Ok(record)
    }

    /// Deletes a library and everything it owns.
    pub fn delete_library(&self, library_id: LibraryId) -> Result<(), LibraryServiceError> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        SqliteLibraryRepository::try_new(&tx)?.delete_library_cascade(library_id)?;
        tx.commit()?;
        info!("event=library_delete module=library status=ok library_id={library_id}");
        Ok(())
    }
}
