//! Snapshot (version history) use-case service.
//!
//! # Responsibility
//! - Capture a point's content together with its link neighborhood.
//! - List history inside a retention window and restore content fields.
//!
//! # Invariants
//! - Capture is unconditional; callers decide whether a change warrants one.
//! - Capture reads post-mutation state inside the caller's transaction.
//! - Restore copies title/content/source/page only; position, tags and links
//!   are never touched.
//! - The retention window hides old snapshots, it never deletes them.

use crate::db::now_epoch_ms;
use crate::model::point::{Point, PointId};
use crate::model::snapshot::{LinkNeighborhood, Snapshot, SnapshotId};
use crate::repo::link_repo::{LinkRepository, SqliteLinkRepository};
use crate::repo::point_repo::{PointRecord, PointRepository, SqlitePointRepository};
use crate::repo::snapshot_repo::{SnapshotRepository, SqliteSnapshotRepository};
use crate::repo::{RepoError, RepoResult};
use log::info;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub const DEFAULT_RETENTION_DAYS: u32 = 300;
const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// History behavior knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotPolicy {
    /// Window used by [`SnapshotService::list_snapshots`] when no explicit
    /// window is requested.
    pub retention_days: u32,
    /// When set, a restore that changes title or content is itself recorded.
    pub snapshot_on_restore: bool,
}

impl Default for SnapshotPolicy {
    fn default() -> Self {
        Self {
            retention_days: DEFAULT_RETENTION_DAYS,
            snapshot_on_restore: false,
        }
    }
}

/// Errors from snapshot use-cases.
#[derive(Debug)]
pub enum SnapshotServiceError {
    PointNotFound(PointId),
    SnapshotNotFound(SnapshotId),
    /// Snapshot exists but belongs to another point.
    InvalidReference {
        point_id: PointId,
        snapshot_id: SnapshotId,
    },
    Repo(RepoError),
}

impl Display for SnapshotServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PointNotFound(id) => write!(f, "point not found: {id}"),
            Self::SnapshotNotFound(id) => write!(f, "snapshot not found: {id}"),
            Self::InvalidReference {
                point_id,
                snapshot_id,
            } => write!(
                f,
                "snapshot {snapshot_id} does not belong to point {point_id}"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SnapshotServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for SnapshotServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "point",
                id,
            } => Self::PointNotFound(id),
            RepoError::NotFound {
                entity: "snapshot",
                id,
            } => Self::SnapshotNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<rusqlite::Error> for SnapshotServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

/// Captures `point` as a new snapshot.
///
/// The neighborhood is read with an explicit [`LinkRepository::links_touching`]
/// query and partitioned by direction, preserving link creation order.
pub fn capture_snapshot<L, S>(
    links: &L,
    snapshots: &S,
    point: &Point,
    captured_at: i64,
) -> RepoResult<Snapshot>
where
    L: LinkRepository,
    S: SnapshotRepository,
{
    let mut neighborhood = LinkNeighborhood::default();
    for link in links.links_touching(point.id)? {
        if link.from_id == point.id {
            neighborhood.outgoing.push(link.to_id);
        }
        if link.to_id == point.id {
            neighborhood.incoming.push(link.from_id);
        }
    }

    let snapshot = Snapshot {
        id: Uuid::new_v4(),
        point_id: point.id,
        title: point.title.clone(),
        content: point.content.clone(),
        source: point.source.clone(),
        page: point.page.clone(),
        neighborhood,
        captured_at,
    };
    snapshots.insert_snapshot(&snapshot)?;
    info!(
        "event=snapshot_capture module=snapshot status=ok point_id={} snapshot_id={} outgoing={} incoming={}",
        point.id,
        snapshot.id,
        snapshot.neighborhood.outgoing.len(),
        snapshot.neighborhood.incoming.len()
    );
    Ok(snapshot)
}

/// Snapshot service over one borrowed connection.
pub struct SnapshotService<'conn> {
    conn: &'conn Connection,
    policy: SnapshotPolicy,
}

impl<'conn> SnapshotService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self::with_policy(conn, SnapshotPolicy::default())
    }

    pub fn with_policy(conn: &'conn Connection, policy: SnapshotPolicy) -> Self {
        Self { conn, policy }
    }

    pub fn policy(&self) -> SnapshotPolicy {
        self.policy
    }

    /// Captures the current state of a point unconditionally.
    pub fn capture(&self, point_id: PointId) -> Result<Snapshot, SnapshotServiceError> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let points = SqlitePointRepository::try_new(&tx)?;
        let point = points
            .get_point(point_id)?
            .ok_or(SnapshotServiceError::PointNotFound(point_id))?;
        let snapshot = capture_snapshot(
            &SqliteLinkRepository::try_new(&tx)?,
            &SqliteSnapshotRepository::try_new(&tx)?,
            &point,
            now_epoch_ms(),
        )?;
        tx.commit()?;
        Ok(snapshot)
    }

    /// Lists snapshots newer than `days` (policy default when `None`),
    /// newest first.
    pub fn list_snapshots(
        &self,
        point_id: PointId,
        days: Option<u32>,
    ) -> Result<Vec<Snapshot>, SnapshotServiceError> {
        self.list_snapshots_at(point_id, days, now_epoch_ms())
    }

    /// Same as [`Self::list_snapshots`] with a caller-provided clock.
    pub fn list_snapshots_at(
        &self,
        point_id: PointId,
        days: Option<u32>,
        now_ms: i64,
    ) -> Result<Vec<Snapshot>, SnapshotServiceError> {
        let points = SqlitePointRepository::try_new(self.conn)?;
        if points.get_point(point_id)?.is_none() {
            return Err(SnapshotServiceError::PointNotFound(point_id));
        }

        let days = days.unwrap_or(self.policy.retention_days);
        let since_ms = now_ms.saturating_sub(i64::from(days).saturating_mul(MS_PER_DAY));
        let snapshots = SqliteSnapshotRepository::try_new(self.conn)?;
        Ok(snapshots.list_snapshots_since(point_id, since_ms)?)
    }

    /// Copies content fields of `snapshot_id` back onto `point_id`.
    ///
    /// # Errors
    /// - `SnapshotNotFound` when the snapshot does not exist.
    /// - `InvalidReference` when it belongs to another point; the point is
    ///   left unmodified.
    pub fn restore(
        &self,
        point_id: PointId,
        snapshot_id: SnapshotId,
    ) -> Result<PointRecord, SnapshotServiceError> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let snapshots = SqliteSnapshotRepository::try_new(&tx)?;
        let snapshot = snapshots
            .get_snapshot(snapshot_id)?
            .ok_or(SnapshotServiceError::SnapshotNotFound(snapshot_id))?;
        if snapshot.point_id != point_id {
            return Err(SnapshotServiceError::InvalidReference {
                point_id,
                snapshot_id,
            });
        }

        let points = SqlitePointRepository::try_new(&tx)?;
        let current = points
            .get_point(point_id)?
            .ok_or(SnapshotServiceError::PointNotFound(point_id))?;
        let restored = Point {
            title: snapshot.title,
            content: snapshot.content,
            source: snapshot.source,
            page: snapshot.page,
            ..current.clone()
        };
        points.update_point(&restored)?;

        let recorded = self.policy.snapshot_on_restore && current.versioned_fields_differ(&restored);
        if recorded {
            capture_snapshot(
                &SqliteLinkRepository::try_new(&tx)?,
                &snapshots,
                &restored,
                now_epoch_ms(),
            )?;
        }

        let record = points
            .get_point_record(point_id)?
            .ok_or(SnapshotServiceError::PointNotFound(point_id))?;
        tx.commit()?;
        info!(
            "event=snapshot_restore module=snapshot status=ok point_id={} snapshot_id={} recorded={}",
            point_id, snapshot_id, recorded
        );
        Ok(record)
    }
}
