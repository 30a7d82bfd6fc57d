mod common;

use common::{count, library, point_with};
use pointnet_core::db::open_db_in_memory;
use pointnet_core::{
    export_libraries, export_library, import_libraries, import_libraries_json, ExchangeError,
    LibraryService, LinkService, LinkType, PointService, SnapshotService,
};
use serde_json::json;

#[test]
fn import_remaps_ids_and_drops_dangling_links() {
    let conn = open_db_in_memory().unwrap();
    let payload = json!({
        "meta": {
            "id": "legacy-lib",
            "name": "Imported",
            "tags": [{"name": "ml", "color": "#FF0000"}]
        },
        "points": [
            {"id": "p1", "title": "One", "content": "first", "tags": ["ml"], "x": 1.0, "y": 2.0},
            {"id": "p2", "title": "Two", "content": "second"}
        ],
        "links": [
            {"fromId": "p1", "toId": "p2", "type": "parent"},
            {"fromId": "p2", "toId": "p1"},
            {"fromId": "p1", "toId": "ghost", "type": "related"}
        ]
    });

    let summary = import_libraries_json(&conn, &payload.to_string()).unwrap();
    assert_eq!(summary.libraries, 1);
    assert_eq!(summary.points, 2);
    assert_eq!(summary.links, 1);
    assert_eq!(summary.dropped_links, 1);

    let listed = LibraryService::new(&conn).list_libraries().unwrap();
    let lib = listed[0].library.id;
    assert_ne!(lib.to_string(), "legacy-lib");

    let points = PointService::new(&conn).list_points(lib).unwrap();
    let one = points.iter().find(|p| p.point.title == "One").unwrap();
    let two = points.iter().find(|p| p.point.title == "Two").unwrap();
    assert_eq!(one.tag_names(), vec!["ml".to_string()]);
    assert_eq!((one.point.x, one.point.y), (1.0, 2.0));

    let links = LinkService::new(&conn).list_links(lib).unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!((links[0].from_id, links[0].to_id), (two.point.id, one.point.id));
    assert_eq!(links[0].kind, LinkType::Related);

    let baseline = &SnapshotService::new(&conn)
        .list_snapshots(one.point.id, None)
        .unwrap()[0];
    assert_eq!(baseline.neighborhood.incoming, vec![two.point.id]);
}

#[test]
fn import_accepts_array_and_library_alias() {
    let conn = open_db_in_memory().unwrap();
    let payload = json!([
        {"library": {"name": "A"}, "points": [{"id": "1", "title": "t", "content": ""}]},
        {"meta": {"name": "B"}}
    ]);

    let summary = import_libraries_json(&conn, &payload.to_string()).unwrap();
    assert_eq!(summary.libraries, 2);
    assert_eq!(summary.points, 1);
    assert_eq!(count(&conn, "snapshots"), 1);
}

#[test]
fn malformed_payload_writes_nothing() {
    let conn = open_db_in_memory().unwrap();
    assert!(matches!(
        import_libraries_json(&conn, "{\"points\": []}"),
        Err(ExchangeError::InvalidPayload(_))
    ));
    let bad_point = json!({"meta": {"name": "L"}, "points": [{"id": "1", "title": "", "content": ""}]});
    assert!(import_libraries_json(&conn, &bad_point.to_string()).is_err());
    assert_eq!(count(&conn, "libraries"), 0);
}

#[test]
fn export_then_import_reproduces_the_graph() {
    let conn = open_db_in_memory().unwrap();
    let lib = library(&conn, "source", &["keep"]);
    let a = point_with(&conn, lib, "A", "alpha", &["keep"]);
    let b = point_with(&conn, lib, "B", "beta", &[]);
    LinkService::new(&conn)
        .create_link(a, b, LinkType::Child)
        .unwrap();

    let exported = export_libraries(&conn, &[]).unwrap();
    assert_eq!(exported.len(), 1);
    assert_eq!(exported[0].links[0].from_id, a.to_string());

    let target = open_db_in_memory().unwrap();
    let summary = import_libraries(&target, &exported).unwrap();
    assert_eq!((summary.points, summary.links, summary.dropped_links), (2, 1, 0));

    let again = export_libraries(&target, &[]).unwrap();
    assert_eq!(again[0].meta.name, "source");
    assert_eq!(again[0].points.len(), 2);
    assert_eq!(again[0].links[0].kind, LinkType::Child);
}

#[test]
fn tag_filtered_export_keeps_links_inside_the_selection() {
    let conn = open_db_in_memory().unwrap();
    let lib = library(&conn, "lib", &["pick"]);
    let a = point_with(&conn, lib, "A", "", &["pick"]);
    let b = point_with(&conn, lib, "B", "", &["pick"]);
    let c = point_with(&conn, lib, "C", "", &[]);
    let links = LinkService::new(&conn);
    links.create_link(a, b, LinkType::Related).unwrap();
    links.create_link(b, c, LinkType::Related).unwrap();

    let filter = vec!["pick".to_string()];
    let exported = export_library(&conn, lib, Some(&filter)).unwrap();
    assert_eq!(exported.points.len(), 2);
    assert_eq!(exported.links.len(), 1);

    assert!(matches!(
        export_library(&conn, uuid::Uuid::new_v4(), None),
        Err(ExchangeError::LibraryNotFound(_))
    ));
}

#[test]
fn import_trims_point_tag_names_onto_header_tags() {
    let conn = open_db_in_memory().unwrap();
    let payload = json!({
        "meta": {"name": "Trimmed", "tags": [{"name": "x"}]},
        "points": [
            {"id": "1", "title": "A", "content": "", "tags": [" x "]},
            {"id": "2", "title": "B", "content": "", "tags": ["y "]}
        ]
    });

    import_libraries_json(&conn, &payload.to_string()).unwrap();

    let lib = LibraryService::new(&conn).list_libraries().unwrap()[0]
        .library
        .id;
    let record = LibraryService::new(&conn).get_library(lib).unwrap().unwrap();
    let names: Vec<&str> = record.tags.iter().map(|tag| tag.name.as_str()).collect();
    assert_eq!(names, vec!["x", "y"]);

    let points = PointService::new(&conn).list_points(lib).unwrap();
    let a = points.iter().find(|p| p.point.title == "A").unwrap();
    let b = points.iter().find(|p| p.point.title == "B").unwrap();
    assert_eq!(a.tag_names(), vec!["x".to_string()]);
    assert_eq!(b.tag_names(), vec!["y".to_string()]);
}
