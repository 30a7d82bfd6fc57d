//! Link repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist directed, typed edges between points.
//! - Expose every neighborhood lookup as an explicit query.
//!
//! # Invariants
//! - Edge lists are ordered by creation: `created_at ASC, rowid ASC`.
//! - Pair-exclusivity policy lives in the link service; this layer only
//!   stores and deletes rows.

use crate::db::now_epoch_ms;
use crate::model::link::{Link, LinkId, LinkType};
use crate::model::point::PointId;
use crate::repo::{ensure_tables, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use std::collections::BTreeSet;
use uuid::Uuid;

const LINK_SELECT_SQL: &str = "SELECT
    id,
    from_id,
    to_id,
    type,
    created_at
FROM links";

/// Repository interface for link rows.
pub trait LinkRepository {
    /// Inserts one edge `from -> to` and returns the stored row.
    fn insert_link(&self, from_id: PointId, to_id: PointId, kind: LinkType) -> RepoResult<Link>;
    /// Loads one edge by id.
    fn get_link(&self, id: LinkId) -> RepoResult<Option<Link>>;
    /// Deletes one edge by id.
    fn delete_link(&self, id: LinkId) -> RepoResult<()>;
    /// Lists edges between `a` and `b` in both directions, any type.
    fn links_between(&self, a: PointId, b: PointId) -> RepoResult<Vec<Link>>;
    /// Deletes edges between `a` and `b` in both directions and returns the
    /// number of removed rows.
    fn delete_links_between(&self, a: PointId, b: PointId) -> RepoResult<usize>;
    /// Lists edges where `point_id` is either endpoint.
    fn links_touching(&self, point_id: PointId) -> RepoResult<Vec<Link>>;
    /// Lists edges whose both endpoints are members of `point_ids`.
    fn links_within(&self, point_ids: &BTreeSet<PointId>) -> RepoResult<Vec<Link>>;
}

/// SQLite-backed link repository.
pub struct SqliteLinkRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLinkRepository<'conn> {
    /// Constructs a repository from a migrated connection or transaction.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["points", "links"])?;
        Ok(Self { conn })
    }

    fn query_links(&self, sql: &str, params: impl rusqlite::Params) -> RepoResult<Vec<Link>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut links = Vec::new();
        while let Some(row) = rows.next()? {
            links.push(parse_link_row(row)?);
        }
        Ok(links)
    }
}

impl LinkRepository for SqliteLinkRepository<'_> {
    fn insert_link(&self, from_id: PointId, to_id: PointId, kind: LinkType) -> RepoResult<Link> {
        let link = Link {
            id: Uuid::new_v4(),
            from_id,
            to_id,
            kind,
            created_at: now_epoch_ms(),
        };
        self.conn.execute(
            "INSERT INTO links (id, from_id, to_id, type, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                link.id.to_string(),
                from_id.to_string(),
                to_id.to_string(),
                kind.as_str(),
                link.created_at,
            ],
        )?;
        Ok(link)
    }

    fn get_link(&self, id: LinkId) -> RepoResult<Option<Link>> {
        let mut links = self.query_links(
            &format!("{LINK_SELECT_SQL} WHERE id = ?1;"),
            [id.to_string()],
        )?;
        Ok(links.pop())
    }

    fn delete_link(&self, id: LinkId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM links WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "link", id });
        }
        Ok(())
    }

    fn links_between(&self, a: PointId, b: PointId) -> RepoResult<Vec<Link>> {
        self.query_links(
            &format!(
                "{LINK_SELECT_SQL}
                 WHERE (from_id = ?1 AND to_id = ?2)
                    OR (from_id = ?2 AND to_id = ?1)
                 ORDER BY created_at ASC, rowid ASC;"
            ),
            params![a.to_string(), b.to_string()],
        )
    }

    fn delete_links_between(&self, a: PointId, b: PointId) -> RepoResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM links
             WHERE (from_id = ?1 AND to_id = ?2)
                OR (from_id = ?2 AND to_id = ?1);",
            params![a.to_string(), b.to_string()],
        )?;
        Ok(removed)
    }

    fn links_touching(&self, point_id: PointId) -> RepoResult<Vec<Link>> {
        self.query_links(
            &format!(
                "{LINK_SELECT_SQL}
                 WHERE from_id = ?1 OR to_id = ?1
                 ORDER BY created_at ASC, rowid ASC;"
            ),
            [point_id.to_string()],
        )
    }

    fn links_within(&self, point_ids: &BTreeSet<PointId>) -> RepoResult<Vec<Link>> {
        if point_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids_json = serde_json::to_string(
            &point_ids.iter().map(Uuid::to_string).collect::<Vec<_>>(),
        )
        .map_err(|err| RepoError::InvalidData(format!("cannot encode id set: {err}")))?;
        let candidates = self.query_links(
            &format!(
                "{LINK_SELECT_SQL}
                 WHERE from_id IN (SELECT value FROM json_each(?1))
                 ORDER BY created_at ASC, rowid ASC;"
            ),
            [ids_json],
        )?;

        Ok(candidates
            .into_iter()
            .filter(|link| point_ids.contains(&link.to_id))
            .collect())
    }
}

fn parse_link_row(row: &Row<'_>) -> RepoResult<Link> {
    let id_text: String = row.get("id")?;
    let from_text: String = row.get("from_id")?;
    let to_text: String = row.get("to_id")?;
    let type_text: String = row.get("type")?;
    let kind = LinkType::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid link type `{type_text}` in links.type"))
    })?;

    Ok(Link {
        id: parse_uuid(&id_text, "links.id")?,
        from_id: parse_uuid(&from_text, "links.from_id")?,
        to_id: parse_uuid(&to_text, "links.to_id")?,
        kind,
        created_at: row.get("created_at")?,
    })
}
