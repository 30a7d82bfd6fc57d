//! Document → library reconstruction.

use crate::db::now_epoch_ms;
use crate::exchange::{ExchangeError, LibraryExport};
use crate::model::library::{Library, Source, Tag};
use crate::model::point::{Point, PointId};
use crate::repo::library_repo::{LibraryRepository, SqliteLibraryRepository};
use crate::repo::link_repo::{LinkRepository, SqliteLinkRepository};
use crate::repo::point_repo::{PointRepository, SqlitePointRepository};
use crate::repo::snapshot_repo::SqliteSnapshotRepository;
use crate::service::snapshot_service::capture_snapshot;
use log::info;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};

/// Counts of what an import created or skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub libraries: usize,
    pub points: usize,
    pub links: usize,
    /// Links skipped because an endpoint was not part of the document, or
    /// both endpoints were the same point.
    pub dropped_links: usize,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ImportDocument {
    Many(Vec<LibraryExport>),
    One(Box<LibraryExport>),
}

/// Parses a JSON document (one export object or an array of them) and
/// imports it.
pub fn import_libraries_json(conn: &Connection, json: &str) -> Result<ImportSummary, ExchangeError> {
    let document: ImportDocument = serde_json::from_str(json)
        .map_err(|err| ExchangeError::InvalidPayload(err.to_string()))?;
    let libraries = match document {
        ImportDocument::Many(items) => items,
        ImportDocument::One(item) => vec![*item],
    };
    import_libraries(conn, &libraries)
}

/// Imports libraries under fresh ids in one transaction.
///
/// Link endpoints are remapped through the old-id → new-id table of each
/// library; links whose endpoint is unknown are dropped. Links are written
/// with replace semantics, so at most one link per pair survives. Every
/// imported point receives its baseline snapshot once its links exist.
pub fn import_libraries(
    conn: &Connection,
    libraries: &[LibraryExport],
) -> Result<ImportSummary, ExchangeError> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let library_repo = SqliteLibraryRepository::try_new(&tx)?;
    let point_repo = SqlitePointRepository::try_new(&tx)?;
    let link_repo = SqliteLinkRepository::try_new(&tx)?;
    let snapshot_repo = SqliteSnapshotRepository::try_new(&tx)?;
    let mut summary = ImportSummary::default();

    for document in libraries {
        let library = Library::new(document.meta.name.trim(), document.meta.description.clone());
        library_repo.insert_library(&library)?;
        let mut tags: Vec<Tag> = Vec::new();
        for tag in &document.meta.tags {
            if !tags.iter().any(|known| known.name == tag.name.trim()) {
                tags.push(Tag::new(tag.name.trim(), tag.color.clone()));
            }
        }
        // Points may carry tag names the header never declared.
        for name in document.points.iter().flat_map(|point| point.tags.iter()) {
            let name = name.trim();
            if !tags.iter().any(|known| known.name == name) {
                tags.push(Tag::new(name, None));
            }
        }
        library_repo.replace_tags(library.id, &tags)?;
        let sources: Vec<Source> = document
            .meta
            .sources
            .iter()
            .map(|source| Source::new(source.name.trim()))
            .collect();
        library_repo.replace_sources(library.id, &sources)?;

        let mut id_map: HashMap<&str, PointId> = HashMap::new();
        let mut created: Vec<Point> = Vec::with_capacity(document.points.len());
        for item in &document.points {
            let point = Point {
                source: item.source.clone(),
                page: item.page.clone(),
                x: item.x,
                y: item.y,
                ..Point::new(library.id, item.title.clone(), item.content.clone())
            };
            point_repo.insert_point(&point)?;
            let tag_names: Vec<String> =
                item.tags.iter().map(|name| name.trim().to_string()).collect();
            point_repo.replace_point_tags(point.id, library.id, &tag_names)?;
            id_map.entry(item.id.as_str()).or_insert(point.id);
            created.push(point);
        }

        for item in &document.links {
            let endpoints = (
                id_map.get(item.from_id.as_str()),
                id_map.get(item.to_id.as_str()),
            );
            match endpoints {
                (Some(&from_id), Some(&to_id)) if from_id != to_id => {
                    link_repo.delete_links_between(from_id, to_id)?;
                    link_repo.insert_link(from_id, to_id, item.kind)?;
                }
                _ => summary.dropped_links += 1,
            }
        }

        let captured_at = now_epoch_ms();
        for point in &created {
            capture_snapshot(&link_repo, &snapshot_repo, point, captured_at)?;
        }

        let ids: BTreeSet<PointId> =
            created.iter().map(|point| point.id).collect();
        summary.links += link_repo.links_within(&ids)?.len();
        summary.points += created.len();
        summary.libraries += 1;
    }

    tx.commit()?;
    info!(
        "event=library_import module=exchange status=ok libraries={} points={} links={} dropped_links={}",
        summary.libraries, summary.points, summary.links, summary.dropped_links
    );
    Ok(summary)
}
