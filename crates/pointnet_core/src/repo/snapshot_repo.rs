//! Snapshot repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Append and read immutable point versions.
//! - Encode the captured neighborhood as two JSON id arrays.
//!
//! # Invariants
//! - There is no update path; rows are only inserted or removed by the
//!   point/library delete cascades.
//! - Listing is newest first: `captured_at DESC, rowid DESC`.

use crate::model::point::PointId;
use crate::model::snapshot::{LinkNeighborhood, Snapshot, SnapshotId};
use crate::repo::{ensure_tables, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const SNAPSHOT_SELECT_SQL: &str = "SELECT
    id,
    point_id,
    title,
    content,
    source,
    page,
    outgoing_ids,
    incoming_ids,
    captured_at
FROM snapshots";

/// Repository interface for snapshot rows.
pub trait SnapshotRepository {
    fn insert_snapshot(&self, snapshot: &Snapshot) -> RepoResult<()>;
    fn get_snapshot(&self, id: SnapshotId) -> RepoResult<Option<Snapshot>>;
    /// Lists snapshots of a point captured at or after `since_ms`.
    fn list_snapshots_since(&self, point_id: PointId, since_ms: i64) -> RepoResult<Vec<Snapshot>>;
    fn count_snapshots(&self, point_id: PointId) -> RepoResult<u64>;
}

/// SQLite-backed snapshot repository.
pub struct SqliteSnapshotRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSnapshotRepository<'conn> {
    /// Constructs a repository from a migrated connection or transaction.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["snapshots"])?;
        Ok(Self { conn })
    }
}

impl SnapshotRepository for SqliteSnapshotRepository<'_> {
    fn insert_snapshot(&self, snapshot: &Snapshot) -> RepoResult<()> {
        let outgoing = encode_ids(&snapshot.neighborhood.outgoing)?;
        let incoming = encode_ids(&snapshot.neighborhood.incoming)?;
        self.conn.execute(
            "INSERT INTO snapshots (
                id,
                point_id,
                title,
                content,
                source,
                page,
                outgoing_ids,
                incoming_ids,
                captured_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                snapshot.id.to_string(),
                snapshot.point_id.to_string(),
                snapshot.title.as_str(),
                snapshot.content.as_str(),
                snapshot.source.as_deref(),
                snapshot.page.as_deref(),
                outgoing,
                incoming,
                snapshot.captured_at,
            ],
        )?;
        Ok(())
    }

    fn get_snapshot(&self, id: SnapshotId) -> RepoResult<Option<Snapshot>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SNAPSHOT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_snapshot_row(row)?));
        }
        Ok(None)
    }

    fn list_snapshots_since(&self, point_id: PointId, since_ms: i64) -> RepoResult<Vec<Snapshot>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SNAPSHOT_SELECT_SQL}
             WHERE point_id = ?1
               AND captured_at >= ?2
             ORDER BY captured_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query(params![point_id.to_string(), since_ms])?;
        let mut snapshots = Vec::new();
        while let Some(row) = rows.next()? {
            snapshots.push(parse_snapshot_row(row)?);
        }
        Ok(snapshots)
    }

    fn count_snapshots(&self, point_id: PointId) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM snapshots WHERE point_id = ?1;",
            [point_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

fn encode_ids(ids: &[PointId]) -> RepoResult<String> {
    serde_json::to_string(ids)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode neighborhood: {err}")))
}

fn decode_ids(value: &str, column: &str) -> RepoResult<Vec<PointId>> {
    serde_json::from_str(value)
        .map_err(|err| RepoError::InvalidData(format!("invalid id list in {column}: {err}")))
}

fn parse_snapshot_row(row: &Row<'_>) -> RepoResult<Snapshot> {
    let id_text: String = row.get("id")?;
    let point_text: String = row.get("point_id")?;
    let outgoing: String = row.get("outgoing_ids")?;
    let incoming: String = row.get("incoming_ids")?;
    Ok(Snapshot {
        id: parse_uuid(&id_text, "snapshots.id")?,
        point_id: parse_uuid(&point_text, "snapshots.point_id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        source: row.get("source")?,
        page: row.get("page")?,
        neighborhood: LinkNeighborhood {
            outgoing: decode_ids(&outgoing, "snapshots.outgoing_ids")?,
            incoming: decode_ids(&incoming, "snapshots.incoming_ids")?,
        },
        captured_at: row.get("captured_at")?,
    })
}
