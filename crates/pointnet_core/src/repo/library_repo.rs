//! Library repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist library headers and their tag/source vocabularies.
//! - Own the explicit delete cascade for a whole library.
//!
//! # Invariants
//! - Tag replacement keeps point associations of tags whose id survives and
//!   drops associations of tags removed from the set.
//! - `link_count` only counts links whose both endpoints are library points.

use crate::db::now_epoch_ms;
use crate::model::library::{Library, LibraryId, Source, Tag, TagId};
use crate::repo::{ensure_tables, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use std::collections::HashSet;
use uuid::Uuid;

const LIBRARY_SELECT_SQL: &str = "SELECT
    id,
    name,
    description,
    created_at,
    updated_at
FROM libraries";

/// Library list item with aggregate counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibrarySummary {
    pub library: Library,
    pub point_count: u64,
    pub link_count: u64,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds.
    pub updated_at: i64,
}

/// Library detail read model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryRecord {
    pub summary: LibrarySummary,
    pub tags: Vec<Tag>,
    pub sources: Vec<Source>,
}

/// Repository interface for libraries.
pub trait LibraryRepository {
    fn insert_library(&self, library: &Library) -> RepoResult<()>;
    /// Overwrites name/description and bumps `updated_at`.
    fn update_library(&self, library: &Library) -> RepoResult<()>;
    fn library_exists(&self, id: LibraryId) -> RepoResult<bool>;
    fn get_library(&self, id: LibraryId) -> RepoResult<Option<LibraryRecord>>;
    /// Lists libraries, newest first.
    fn list_libraries(&self) -> RepoResult<Vec<LibrarySummary>>;
    fn list_tags(&self, library_id: LibraryId) -> RepoResult<Vec<Tag>>;
    /// Replaces the tag set and returns the tags as stored. Ids not owned by
    /// this library are re-keyed.
    fn replace_tags(&self, library_id: LibraryId, tags: &[Tag]) -> RepoResult<Vec<Tag>>;
    fn list_sources(&self, library_id: LibraryId) -> RepoResult<Vec<Source>>;
    /// Replaces the source set and returns the sources as stored.
    fn replace_sources(&self, library_id: LibraryId, sources: &[Source])
        -> RepoResult<Vec<Source>>;
    /// Deletes links among library points, snapshots, tag associations,
    /// points, tags, sources and finally the library row.
    fn delete_library_cascade(&self, id: LibraryId) -> RepoResult<()>;
}

/// SQLite-backed library repository.
pub struct SqliteLibraryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLibraryRepository<'conn> {
    /// Constructs a repository from a migrated connection or transaction.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(
            conn,
            &["libraries", "tags", "sources", "points", "point_tags", "links", "snapshots"],
        )?;
        Ok(Self { conn })
    }

    fn summarize(&self, row: &Row<'_>) -> RepoResult<LibrarySummary> {
        let id_text: String = row.get("id")?;
        let id = parse_uuid(&id_text, "libraries.id")?;
        let point_count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM points WHERE library_id = ?1;",
            [id_text.as_str()],
            |row| row.get(0),
        )?;
        let link_count: i64 = self.conn.query_row(
            "SELECT COUNT(*)
             FROM links l
             INNER JOIN points a ON a.id = l.from_id
             INNER JOIN points b ON b.id = l.to_id
             WHERE a.library_id = ?1
               AND b.library_id = ?1;",
            [id_text.as_str()],
            |row| row.get(0),
        )?;
        Ok(LibrarySummary {
            library: Library {
                id,
                name: row.get("name")?,
                description: row.get("description")?,
            },
            point_count: point_count as u64,
            link_count: link_count as u64,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn owned_tag_ids(&self, library_id: LibraryId) -> RepoResult<HashSet<TagId>> {
        Ok(self
            .list_tags(library_id)?
            .into_iter()
            .map(|tag| tag.id)
            .collect())
    }
}

impl LibraryRepository for SqliteLibraryRepository<'_> {
    fn insert_library(&self, library: &Library) -> RepoResult<()> {
        library.validate()?;
        let now = now_epoch_ms();
        self.conn.execute(
            "INSERT INTO libraries (id, name, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4);",
            params![
                library.id.to_string(),
                library.name.as_str(),
                library.description.as_deref(),
                now,
            ],
        )?;
        Ok(())
    }

    fn update_library(&self, library: &Library) -> RepoResult<()> {
        library.validate()?;
        let changed = self.conn.execute(
            "UPDATE libraries
             SET name = ?2,
                 description = ?3,
                 updated_at = ?4
             WHERE id = ?1;",
            params![
                library.id.to_string(),
                library.name.as_str(),
                library.description.as_deref(),
                now_epoch_ms(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "library",
                id: library.id,
            });
        }
        Ok(())
    }

    fn library_exists(&self, id: LibraryId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM libraries WHERE id = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn get_library(&self, id: LibraryId) -> RepoResult<Option<LibraryRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{LIBRARY_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let summary = self.summarize(row)?;
        Ok(Some(LibraryRecord {
            summary,
            tags: self.list_tags(id)?,
            sources: self.list_sources(id)?,
        }))
    }

    fn list_libraries(&self) -> RepoResult<Vec<LibrarySummary>> {
        let mut stmt = self.conn.prepare(&format!(
            "{LIBRARY_SELECT_SQL} ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(self.summarize(row)?);
        }
        Ok(items)
    }

    fn list_tags(&self, library_id: LibraryId) -> RepoResult<Vec<Tag>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, color FROM tags WHERE library_id = ?1 ORDER BY rowid ASC;",
        )?;
        let mut rows = stmt.query([library_id.to_string()])?;
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

    fn replace_tags(&self, library_id: LibraryId, tags: &[Tag]) -> RepoResult<Vec<Tag>> {
        for tag in tags {
            tag.validate()?;
        }

        let owned = self.owned_tag_ids(library_id)?;
        let mut stored = Vec::with_capacity(tags.len());
        let mut kept = HashSet::new();
        for tag in tags {
            let mut tag = tag.clone();
            if !owned.contains(&tag.id) || kept.contains(&tag.id) {
                tag.id = Uuid::new_v4();
            }
            kept.insert(tag.id);
            stored.push(tag);
        }

        for dropped in owned.iter().filter(|id| !kept.contains(*id)) {
            let dropped_text = dropped.to_string();
            self.conn.execute(
                "DELETE FROM point_tags WHERE tag_id = ?1;",
                [dropped_text.as_str()],
            )?;
            self.conn
                .execute("DELETE FROM tags WHERE id = ?1;", [dropped_text.as_str()])?;
        }

        for tag in &stored {
            if owned.contains(&tag.id) {
                self.conn.execute(
                    "UPDATE tags SET name = ?2, color = ?3 WHERE id = ?1;",
                    params![tag.id.to_string(), tag.name.as_str(), tag.color.as_str()],
                )?;
            } else {
                self.conn.execute(
                    "INSERT INTO tags (id, library_id, name, color) VALUES (?1, ?2, ?3, ?4);",
                    params![
                        tag.id.to_string(),
                        library_id.to_string(),
                        tag.name.as_str(),
                        tag.color.as_str(),
                    ],
                )?;
            }
        }

        self.list_tags(library_id)
    }

    fn list_sources(&self, library_id: LibraryId) -> RepoResult<Vec<Source>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name FROM sources WHERE library_id = ?1 ORDER BY rowid ASC;",
        )?;
        let mut rows = stmt.query([library_id.to_string()])?;
        let mut sources = Vec::new();
        while let Some(row) = rows.next()? {
            let id_text: String = row.get("id")?;
            sources.push(Source {
                id: parse_uuid(&id_text, "sources.id")?,
                name: row.get("name")?,
            });
        }
        Ok(sources)
    }

    fn replace_sources(
        &self,
        library_id: LibraryId,
        sources: &[Source],
    ) -> RepoResult<Vec<Source>> {
        for source in sources {
            source.validate()?;
        }

        let library_text = library_id.to_string();
        self.conn.execute(
            "DELETE FROM sources WHERE library_id = ?1;",
            [library_text.as_str()],
        )?;
        let mut seen = HashSet::new();
        for source in sources {
            let mut id = source.id;
            if !seen.insert(id) || source_id_taken(self.conn, id)? {
                id = Uuid::new_v4();
                seen.insert(id);
            }
            self.conn.execute(
                "INSERT INTO sources (id, library_id, name) VALUES (?1, ?2, ?3);",
                params![id.to_string(), library_text.as_str(), source.name.as_str()],
            )?;
        }
        self.list_sources(library_id)
    }

    fn delete_library_cascade(&self, id: LibraryId) -> RepoResult<()> {
        let id_text = id.to_string();
        self.conn.execute(
            "DELETE FROM links
             WHERE from_id IN (SELECT id FROM points WHERE library_id = ?1)
                OR to_id IN (SELECT id FROM points WHERE library_id = ?1);",
            [id_text.as_str()],
        )?;
        self.conn.execute(
            "DELETE FROM snapshots
             WHERE point_id IN (SELECT id FROM points WHERE library_id = ?1);",
            [id_text.as_str()],
        )?;
        self.conn.execute(
            "DELETE FROM point_tags
             WHERE point_id IN (SELECT id FROM points WHERE library_id = ?1);",
            [id_text.as_str()],
        )?;
        self.conn.execute(
            "DELETE FROM points WHERE library_id = ?1;",
            [id_text.as_str()],
        )?;
        self.conn
            .execute("DELETE FROM tags WHERE library_id = ?1;", [id_text.as_str()])?;
        self.conn.execute(
            "DELETE FROM sources WHERE library_id = ?1;",
            [id_text.as_str()],
        )?;
        let changed = self
            .conn
            .execute("DELETE FROM libraries WHERE id = ?1;", [id_text.as_str()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "library",
                id,
            });
        }
        Ok(())
    }
}

fn source_id_taken(conn: &Connection, id: Uuid) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sources WHERE id = ?1);",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
