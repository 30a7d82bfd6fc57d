//! Point use-case service.
//!
//! # Responsibility
//! - Create, update, list and delete points.
//! - Decide when a mutation is versioned and capture the snapshot in the same
//!   transaction as the mutation.
//!
//! # Invariants
//! - Creating a point always yields exactly one baseline snapshot.
//! - Updating a point yields one snapshot iff title or content changed.
//! - Deleting a point removes its links, snapshots and tag associations.

use crate::db::now_epoch_ms;
use crate::model::library::LibraryId;
use crate::model::point::{Point, PointId, PointPatch};
use crate::model::validation::ValidationError;
use crate::repo::library_repo::{LibraryRepository, SqliteLibraryRepository};
use crate::repo::link_repo::SqliteLinkRepository;
use crate::repo::point_repo::{PointRecord, PointRepository, SqlitePointRepository};
use crate::repo::snapshot_repo::SqliteSnapshotRepository;
use crate::repo::RepoError;
use crate::service::snapshot_service::capture_snapshot;
use log::info;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from point use-cases.
#[derive(Debug)]
pub enum PointServiceError {
    InvalidInput(ValidationError),
    LibraryNotFound(LibraryId),
    PointNotFound(PointId),
    Repo(RepoError),
    /// Write succeeded but the read-back did not find the row.
    InconsistentState(&'static str),
}

impl Display for PointServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(err) => write!(f, "invalid point input: {err}"),
            Self::LibraryNotFound(id) => write!(f, "library not found: {id}"),
            Self::PointNotFound(id) => write!(f, "point not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent point state: {details}"),
        }
    }
}

impl Error for PointServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for PointServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::InvalidInput(err),
            RepoError::NotFound {
                entity: "point",
                id,
            } => Self::PointNotFound(id),
            RepoError::NotFound {
                entity: "library",
                id,
            } => Self::LibraryNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<rusqlite::Error> for PointServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

/// Input for [`PointService::create_point`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewPoint {
    pub title: String,
    pub content: String,
    pub source: Option<String>,
    pub page: Option<String>,
    pub x: f64,
    pub y: f64,
    /// Tag names resolved against the library tag set.
    pub tags: Vec<String>,
}

/// Point service over one borrowed connection.
pub struct PointService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> PointService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Creates a point and its baseline snapshot atomically.
    pub fn create_point(
        &self,
        library_id: LibraryId,
        input: NewPoint,
    ) -> Result<PointRecord, PointServiceError> {
        let point = Point {
            source: input.source,
            page: input.page,
            x: input.x,
            y: input.y,
            ..Point::new(library_id, input.title, input.content)
        };
        point.validate().map_err(PointServiceError::InvalidInput)?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !SqliteLibraryRepository::try_new(&tx)?.library_exists(library_id)? {
            return Err(PointServiceError::LibraryNotFound(library_id));
        }

        let points = SqlitePointRepository::try_new(&tx)?;
        points.insert_point(&point)?;
        points.replace_point_tags(point.id, library_id, &input.tags)?;
        capture_snapshot(
            &SqliteLinkRepository::try_new(&tx)?,
            &SqliteSnapshotRepository::try_new(&tx)?,
            &point,
            now_epoch_ms(),
        )?;
        let record = points
            .get_point_record(point.id)?
            .ok_or(PointServiceError::InconsistentState(
                "created point not found in read-back",
            ))?;
        tx.commit()?;

        info!(
            "event=point_create module=point status=ok point_id={} library_id={} tags={}",
            point.id,
            library_id,
            record.tags.len()
        );
        Ok(record)
    }

    /// Applies `patch` and captures a snapshot when title or content changed.
    pub fn update_point(
        &self,
        point_id: PointId,
        patch: &PointPatch,
    ) -> Result<PointRecord, PointServiceError> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let points = SqlitePointRepository::try_new(&tx)?;
        let before = points
            .get_point(point_id)?
            .ok_or(PointServiceError::PointNotFound(point_id))?;
        let after = patch.apply_to(&before);
        points.update_point(&after)?;

        if let Some(tags) = &patch.tags {
            points.replace_point_tags(point_id, before.library_id, tags)?;
        }

        let versioned = before.versioned_fields_differ(&after);
        if versioned {
            capture_snapshot(
                &SqliteLinkRepository::try_new(&tx)?,
                &SqliteSnapshotRepository::try_new(&tx)?,
                &after,
                now_epoch_ms(),
            )?;
        }

        let record = points
            .get_point_record(point_id)?
            .ok_or(PointServiceError::InconsistentState(
                "updated point not found in read-back",
            ))?;
        tx.commit()?;

        info!(
            "event=point_update module=point status=ok point_id={} versioned={}",
            point_id, versioned
        );
        Ok(record)
    }

    pub fn get_point(&self, point_id: PointId) -> Result<Option<PointRecord>, PointServiceError> {
        Ok(SqlitePointRepository::try_new(self.conn)?.get_point_record(point_id)?)
    }

    /// Lists points of a library, oldest first.
    pub fn list_points(
        &self,
        library_id: LibraryId,
    ) -> Result<Vec<PointRecord>, PointServiceError> {
        if !SqliteLibraryRepository::try_new(self.conn)?.library_exists(library_id)? {
            return Err(PointServiceError::LibraryNotFound(library_id));
        }
        Ok(SqlitePointRepository::try_new(self.conn)?.list_point_records(library_id)?)
    }

    /// Deletes a point together with its links, snapshots and tag rows.
    pub fn delete_point(&self, point_id: PointId) -> Result<(), PointServiceError> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        SqlitePointRepository::try_new(&tx)?.delete_point_cascade(point_id)?;
        tx.commit()?;
        info!("event=point_delete module=point status=ok point_id={point_id}");
        Ok(())
    }

    /// Counts library points carrying a tag named `tag_name`.
    pub fn count_points_by_tag(
        &self,
        library_id: LibraryId,
        tag_name: &str,
    ) -> Result<u64, PointServiceError> {
        let ids = SqlitePointRepository::try_new(self.conn)?.point_ids_with_tag(library_id, tag_name)?;
        Ok(ids.len() as u64)
    }

    /// Deletes every library point carrying `tag_name`, each with the full
    /// point cascade. Returns the number of deleted points.
    pub fn delete_points_by_tag(
        &self,
        library_id: LibraryId,
        tag_name: &str,
    ) -> Result<u64, PointServiceError> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let points = SqlitePointRepository::try_new(&tx)?;
        let ids = points.point_ids_with_tag(library_id, tag_name)?;
        for id in &ids {
            points.delete_point_cascade(*id)?;
        }
        tx.commit()?;

        info!(
            "event=point_delete_by_tag module=point status=ok library_id={} deleted={}",
            library_id,
            ids.len()
        );
        Ok(ids.len() as u64)
    }
}
