//! Library → document projection.

use crate::exchange::{
    ExchangeError, LibraryExport, LibraryMeta, LinkExport, PointExport, SourceExport, TagExport,
};
use crate::model::library::LibraryId;
use crate::model::point::PointId;
use crate::repo::library_repo::{LibraryRecord, LibraryRepository, SqliteLibraryRepository};
use crate::repo::link_repo::{LinkRepository, SqliteLinkRepository};
use crate::repo::point_repo::{PointRecord, PointRepository, SqlitePointRepository};
use log::info;
use rusqlite::Connection;
use std::collections::BTreeSet;

/// Exports the given libraries, or every library when `library_ids` is
/// empty. Unknown ids are skipped.
pub fn export_libraries(
    conn: &Connection,
    library_ids: &[LibraryId],
) -> Result<Vec<LibraryExport>, ExchangeError> {
    let libraries = SqliteLibraryRepository::try_new(conn)?;
    let ids: Vec<LibraryId> = if library_ids.is_empty() {
        libraries
            .list_libraries()?
            .into_iter()
            .map(|summary| summary.library.id)
            .collect()
    } else {
        library_ids.to_vec()
    };

    let mut exports = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(record) = libraries.get_library(id)? {
            exports.push(build_export(conn, record, None)?);
        }
    }

    info!(
        "event=library_export module=exchange status=ok libraries={}",
        exports.len()
    );
    Ok(exports)
}

/// Exports one library. With `tag_filter`, only points carrying at least one
/// of the named tags are included, and only links among those points.
pub fn export_library(
    conn: &Connection,
    library_id: LibraryId,
    tag_filter: Option<&[String]>,
) -> Result<LibraryExport, ExchangeError> {
    let record = SqliteLibraryRepository::try_new(conn)?
        .get_library(library_id)?
        .ok_or(ExchangeError::LibraryNotFound(library_id))?;
    build_export(conn, record, tag_filter)
}

fn build_export(
    conn: &Connection,
    record: LibraryRecord,
    tag_filter: Option<&[String]>,
) -> Result<LibraryExport, ExchangeError> {
    let library_id = record.summary.library.id;
    let points: Vec<PointRecord> = SqlitePointRepository::try_new(conn)?
        .list_point_records(library_id)?
        .into_iter()
        .filter(|point| match tag_filter {
            Some(filter) => point.tags.iter().any(|tag| filter.contains(&tag.name)),
            None => true,
        })
        .collect();
    let point_ids: BTreeSet<PointId> = points.iter().map(|point| point.point.id).collect();
    let links = SqliteLinkRepository::try_new(conn)?.links_within(&point_ids)?;

    Ok(LibraryExport {
        meta: LibraryMeta {
            id: Some(library_id.to_string()),
            name: record.summary.library.name,
            description: record.summary.library.description,
            tags: record
                .tags
                .into_iter()
                .map(|tag| TagExport {
                    id: Some(tag.id.to_string()),
                    name: tag.name,
                    color: Some(tag.color),
                })
                .collect(),
            sources: record
                .sources
                .into_iter()
                .map(|source| SourceExport {
                    id: Some(source.id.to_string()),
                    name: source.name,
                })
                .collect(),
            created_at: Some(record.summary.created_at),
            updated_at: Some(record.summary.updated_at),
        },
        points: points
            .into_iter()
            .map(|record| PointExport {
                id: record.point.id.to_string(),
                tags: record.tag_names(),
                title: record.point.title,
                content: record.point.content,
                source: record.point.source,
                page: record.point.page,
                x: record.point.x,
                y: record.point.y,
            })
            .collect(),
        links: links
            .into_iter()
            .map(|link| LinkExport {
                id: Some(link.id.to_string()),
                from_id: link.from_id.to_string(),
                to_id: link.to_id.to_string(),
                kind: link.kind,
            })
            .collect(),
    })
}
