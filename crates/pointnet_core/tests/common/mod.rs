#![allow(dead_code)]

use pointnet_core::{
    LibraryId, LibraryService, NewLibrary, NewPoint, PointId, PointService, TagInput,
};
use rusqlite::Connection;

pub fn library(conn: &Connection, name: &str, tags: &[&str]) -> LibraryId {
    LibraryService::new(conn)
        .create_library(NewLibrary {
            name: name.to_string(),
            tags: tags.iter().map(|tag| TagInput::named(*tag)).collect(),
            ..NewLibrary::default()
        })
        .unwrap()
        .summary
        .library
        .id
}

pub fn point(conn: &Connection, library_id: LibraryId, title: &str) -> PointId {
    point_with(conn, library_id, title, "", &[])
}

pub fn point_with(
    conn: &Connection,
    library_id: LibraryId,
    title: &str,
    content: &str,
    tags: &[&str],
) -> PointId {
    PointService::new(conn)
        .create_point(
            library_id,
            NewPoint {
                title: title.to_string(),
                content: content.to_string(),
                tags: tags.iter().map(|tag| tag.to_string()).collect(),
                ..NewPoint::default()
            },
        )
        .unwrap()
        .point
        .id
}

pub fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}
