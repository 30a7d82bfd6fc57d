//! Point repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist point rows and their tag associations.
//! - Own the explicit delete cascade for a point.
//!
//! # Invariants
//! - Tag association is by name against the owning library's tag set;
//!   unknown names are ignored.
//! - `delete_point_cascade` removes links, snapshots and tag associations
//!   before the point row itself.

use crate::db::now_epoch_ms;
use crate::model::library::{LibraryId, Tag};
use crate::model::point::{Point, PointId};
use crate::repo::{ensure_tables, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const POINT_SELECT_SQL: &str = "SELECT
    id,
    library_id,
    title,
    content,
    source,
    page,
    x,
    y,
    created_at,
    updated_at
FROM points";

/// Read model for point detail/list use-cases.
#[derive(Debug, Clone, PartialEq)]
pub struct PointRecord {
    pub point: Point,
    /// Tags attached to the point, ordered by name.
    pub tags: Vec<Tag>,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds.
    pub updated_at: i64,
}

impl PointRecord {
    pub fn tag_names(&self) -> Vec<String> {
        self.tags.iter().map(|tag| tag.name.clone()).collect()
    }
}

/// Repository interface for point rows.
pub trait PointRepository {
    /// Inserts one validated point.
    fn insert_point(&self, point: &Point) -> RepoResult<()>;
    /// Overwrites all writable fields and bumps `updated_at`.
    fn update_point(&self, point: &Point) -> RepoResult<()>;
    /// Loads the bare point row.
    fn get_point(&self, id: PointId) -> RepoResult<Option<Point>>;
    /// Loads the point with tags and timestamps.
    fn get_point_record(&self, id: PointId) -> RepoResult<Option<PointRecord>>;
    /// Lists points of one library, oldest first.
    fn list_point_records(&self, library_id: LibraryId) -> RepoResult<Vec<PointRecord>>;
    /// Lists point ids of one library.
    fn list_point_ids(&self, library_id: LibraryId) -> RepoResult<Vec<PointId>>;
    /// Lists ids of library points carrying a tag with the given name.
    fn point_ids_with_tag(&self, library_id: LibraryId, tag_name: &str)
        -> RepoResult<Vec<PointId>>;
    /// Replaces the full tag association of a point by tag name.
    fn replace_point_tags(
        &self,
        point_id: PointId,
        library_id: LibraryId,
        tag_names: &[String],
    ) -> RepoResult<()>;
    /// Deletes links (both directions), snapshots, tag associations and
    /// finally the point row.
    fn delete_point_cascade(&self, id: PointId) -> RepoResult<()>;
}

/// SQLite-backed point repository.
pub struct SqlitePointRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePointRepository<'conn> {
    /// Constructs a repository from a migrated connection or transaction.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["points", "point_tags", "tags", "links", "snapshots"])?;
        Ok(Self { conn })
    }

    fn load_records(&self, sql: &str, params: impl rusqlite::Params) -> RepoResult<Vec<PointRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let point = parse_point_row(row)?;
            let tags = load_tags_for_point(self.conn, point.id)?;
            records.push(PointRecord {
                point,
                tags,
                created_at: row.get("created_at")?,
                updated_at: row.get("updated_at")?,
            });
        }
        Ok(records)
    }
}

impl PointRepository for SqlitePointRepository<'_> {
    fn insert_point(&self, point: &Point) -> RepoResult<()> {
        point.validate()?;
        let now = now_epoch_ms();
        self.conn.execute(
            "INSERT INTO points (
                id,
                library_id,
                title,
                content,
                source,
                page,
                x,
                y,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9);",
            params![
                point.id.to_string(),
                point.library_id.to_string(),
                point.title.as_str(),
                point.content.as_str(),
                point.source.as_deref(),
                point.page.as_deref(),
                point.x,
                point.y,
                now,
            ],
        )?;
        Ok(())
    }

    fn update_point(&self, point: &Point) -> RepoResult<()> {
        point.validate()?;
        let changed = self.conn.execute(
            "UPDATE points
             SET
                title = ?2,
                content = ?3,
                source = ?4,
                page = ?5,
                x = ?6,
                y = ?7,
                updated_at = ?8
             WHERE id = ?1;",
            params![
                point.id.to_string(),
                point.title.as_str(),
                point.content.as_str(),
                point.source.as_deref(),
                point.page.as_deref(),
                point.x,
                point.y,
                now_epoch_ms(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "point",
                id: point.id,
            });
        }
        Ok(())
    }

    fn get_point(&self, id: PointId) -> RepoResult<Option<Point>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{POINT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_point_row(row)?));
        }
        Ok(None)
    }

    fn get_point_record(&self, id: PointId) -> RepoResult<Option<PointRecord>> {
        let mut records =
            self.load_records(&format!("{POINT_SELECT_SQL} WHERE id = ?1;"), [id.to_string()])?;
        Ok(records.pop())
    }

    fn list_point_records(&self, library_id: LibraryId) -> RepoResult<Vec<PointRecord>> {
        self.load_records(
            &format!(
                "{POINT_SELECT_SQL}
                 WHERE library_id = ?1
                 ORDER BY created_at ASC, rowid ASC;"
            ),
            [library_id.to_string()],
        )
    }

    fn list_point_ids(&self, library_id: LibraryId) -> RepoResult<Vec<PointId>> {
        let mut stmt = self.conn.prepare(
            "SELECT id FROM points WHERE library_id = ?1 ORDER BY created_at ASC, rowid ASC;",
        )?;
        let mut rows = stmt.query([library_id.to_string()])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            let text: String = row.get(0)?;
            ids.push(parse_uuid(&text, "points.id")?);
        }
        Ok(ids)
    }

    fn point_ids_with_tag(
        &self,
        library_id: LibraryId,
        tag_name: &str,
    ) -> RepoResult<Vec<PointId>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT p.id AS id
             FROM points p
             INNER JOIN point_tags pt ON pt.point_id = p.id
             INNER JOIN tags t ON t.id = pt.tag_id
             WHERE p.library_id = ?1
               AND t.name = ?2
             ORDER BY p.created_at ASC, p.id ASC;",
        )?;
        let mut rows = stmt.query(params![library_id.to_string(), tag_name])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            let text: String = row.get("id")?;
            ids.push(parse_uuid(&text, "points.id")?);
        }
        Ok(ids)
    }

    fn replace_point_tags(
        &self,
        point_id: PointId,
        library_id: LibraryId,
        tag_names: &[String],
    ) -> RepoResult<()> {
        let point_text = point_id.to_string();
        let library_text = library_id.to_string();
        self.conn.execute(
            "DELETE FROM point_tags WHERE point_id = ?1;",
            [point_text.as_str()],
        )?;
        for name in tag_names {
            self.conn.execute(
                "INSERT OR IGNORE INTO point_tags (point_id, tag_id)
                 SELECT ?1, id
                 FROM tags
                 WHERE library_id = ?2
                   AND name = ?3;",
                params![point_text.as_str(), library_text.as_str(), name.as_str()],
            )?;
        }
        Ok(())
    }

    fn delete_point_cascade(&self, id: PointId) -> RepoResult<()> {
        let id_text = id.to_string();
        self.conn.execute(
            "DELETE FROM links WHERE from_id = ?1 OR to_id = ?1;",
            [id_text.as_str()],
        )?;
        self.conn.execute(
            "DELETE FROM snapshots WHERE point_id = ?1;",
            [id_text.as_str()],
        )?;
        self.conn.execute(
            "DELETE FROM point_tags WHERE point_id = ?1;",
            [id_text.as_str()],
        )?;
        let changed = self
            .conn
            .execute("DELETE FROM points WHERE id = ?1;", [id_text.as_str()])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "point", id });
        }
        Ok(())
    }
}

fn parse_point_row(row: &Row<'_>) -> RepoResult<Point> {
    let id_text: String = row.get("id")?;
    let library_text: String = row.get("library_id")?;
    Ok(Point {
        id: parse_uuid(&id_text, "points.id")?,
        library_id: parse_uuid(&library_text, "points.library_id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        source: row.get("source")?,
        page: row.get("page")?,
        x: row.get("x")?,
        y: row.get("y")?,
    })
}

fn load_tags_for_point(conn: &Connection, point_id: PointId) -> RepoResult<Vec<Tag>> {
    let mut stmt = conn.prepare(
        "SELECT t.id AS id, t.name AS name, t.color AS color
         FROM point_tags pt
         INNER JOIN tags t ON t.id = pt.tag_id
         WHERE pt.point_id = ?1
         ORDER BY t.name ASC, t.id ASC;",
    )?;
    let mut rows = stmt.query([point_id.to_string()])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        let id_text: String = row.get("id")?;
        tags.push(Tag {
            id: parse_uuid(&id_text, "tags.id")?,
            name: row.get("name")?,
            color: row.get("color")?,
        });
    }
    Ok(tags)
}
