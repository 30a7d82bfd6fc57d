mod common;

use common::{count, library, point, point_with};
use pointnet_core::db::open_db_in_memory;
use pointnet_core::{
    LibraryPatch, LibraryService, LibraryServiceError, LinkService, LinkType, NewLibrary,
    NewPoint, PointService, PointServiceError, SourceInput, TagInput,
};
use uuid::Uuid;

#[test]
fn library_lifecycle_keeps_tag_associations_by_id() {
    let conn = open_db_in_memory().unwrap();
    let service = LibraryService::new(&conn);
    let created = service
        .create_library(NewLibrary {
            name: "  Reading  ".to_string(),
            description: Some("papers".to_string()),
            tags: vec![TagInput::named("ml"), TagInput::named("db")],
            sources: vec![SourceInput {
                id: None,
                name: "SIGMOD".to_string(),
            }],
        })
        .unwrap();
    let lib = created.summary.library.id;
    assert_eq!(created.summary.library.name, "Reading");
    assert_eq!(created.tags.len(), 2);
    assert_eq!(created.sources.len(), 1);

    let p = point_with(&conn, lib, "P", "", &["ml", "db"]);
    let ml = created.tags.iter().find(|tag| tag.name == "ml").unwrap();
    let updated = service
        .update_library(
            lib,
            LibraryPatch {
                name: Some("Papers".to_string()),
                tags: Some(vec![TagInput {
                    id: Some(ml.id),
                    name: "machine-learning".to_string(),
                    color: Some("#000000".to_string()),
                }]),
                ..LibraryPatch::default()
            },
        )
        .unwrap();
    assert_eq!(updated.summary.library.name, "Papers");
    assert_eq!(updated.tags.len(), 1);
    assert_eq!(updated.tags[0].id, ml.id);

    let record = PointService::new(&conn).get_point(p).unwrap().unwrap();
    assert_eq!(record.tag_names(), vec!["machine-learning".to_string()]);
}

#[test]
fn list_libraries_reports_counts_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let first = library(&conn, "first", &[]);
    let second = library(&conn, "second", &[]);
    let a = point(&conn, second, "A");
    let b = point(&conn, second, "B");
    LinkService::new(&conn)
        .create_link(a, b, LinkType::Related)
        .unwrap();

    let listed = LibraryService::new(&conn).list_libraries().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].library.id, second);
    assert_eq!((listed[0].point_count, listed[0].link_count), (2, 1));
    assert_eq!(listed[1].library.id, first);
    assert_eq!((listed[1].point_count, listed[1].link_count), (0, 0));
}

#[test]
fn invalid_library_input_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = LibraryService::new(&conn);
    assert!(matches!(
        service.create_library(NewLibrary {
            name: "   ".to_string(),
            ..NewLibrary::default()
        }),
        Err(LibraryServiceError::InvalidInput(_))
    ));
    assert!(matches!(
        service.update_library(Uuid::new_v4(), LibraryPatch::default()),
        Err(LibraryServiceError::LibraryNotFound(_))
    ));
    assert_eq!(count(&conn, "libraries"), 0);
}

#[test]
fn deleting_a_library_removes_everything_it_owns() {
    let conn = open_db_in_memory().unwrap();
    let doomed = library(&conn, "doomed", &["t"]);
    let kept = library(&conn, "kept", &[]);
    let a = point_with(&conn, doomed, "A", "", &["t"]);
    let b = point(&conn, doomed, "B");
    let survivor = point(&conn, kept, "S");
    LinkService::new(&conn)
        .create_link(a, b, LinkType::Child)
        .unwrap();

    LibraryService::new(&conn).delete_library(doomed).unwrap();

    assert_eq!(count(&conn, "libraries"), 1);
    assert_eq!(count(&conn, "points"), 1);
    assert_eq!(count(&conn, "links"), 0);
    assert_eq!(count(&conn, "point_tags"), 0);
    assert_eq!(count(&conn, "tags"), 0);
    assert_eq!(count(&conn, "snapshots"), 1);
    assert!(PointService::new(&conn).get_point(survivor).unwrap().is_some());
    assert!(matches!(
        LibraryService::new(&conn).delete_library(doomed),
        Err(LibraryServiceError::LibraryNotFound(_))
    ));
}

#[test]
fn point_creation_validates_input_and_library() {
    let conn = open_db_in_memory().unwrap();
    let lib = library(&conn, "lib", &[]);
    let service = PointService::new(&conn);

    assert!(matches!(
        service.create_point(
            lib,
            NewPoint {
                title: "bad".to_string(),
                x: f64::NAN,
                ..NewPoint::default()
            }
        ),
        Err(PointServiceError::InvalidInput(_))
    ));
    let missing = Uuid::new_v4();
    assert!(matches!(
        service.create_point(
            missing,
            NewPoint {
                title: "orphan".to_string(),
                ..NewPoint::default()
            }
        ),
        Err(PointServiceError::LibraryNotFound(id)) if id == missing
    ));
    assert!(matches!(
        service.list_points(missing),
        Err(PointServiceError::LibraryNotFound(_))
    ));
    assert_eq!(count(&conn, "points"), 0);
    assert_eq!(count(&conn, "snapshots"), 0);
}

#[test]
fn deleting_a_point_cascades() {
    let conn = open_db_in_memory().unwrap();
    let lib = library(&conn, "lib", &["t"]);
    let a = point_with(&conn, lib, "A", "", &["t"]);
    let b = point(&conn, lib, "B");
    LinkService::new(&conn)
        .create_link(b, a, LinkType::Parent)
        .unwrap();
    let service = PointService::new(&conn);

    service.delete_point(a).unwrap();

    assert!(service.get_point(a).unwrap().is_none());
    assert_eq!(count(&conn, "links"), 0);
    assert_eq!(count(&conn, "point_tags"), 0);
    assert_eq!(count(&conn, "snapshots"), 1);
    assert!(matches!(
        service.delete_point(a),
        Err(PointServiceError::PointNotFound(id)) if id == a
    ));
}

#[test]
fn points_can_be_counted_and_deleted_by_tag() {
    let conn = open_db_in_memory().unwrap();
    let lib = library(&conn, "lib", &["draft", "final"]);
    point_with(&conn, lib, "A", "", &["draft"]);
    point_with(&conn, lib, "B", "", &["draft", "final"]);
    let c = point_with(&conn, lib, "C", "", &["final"]);
    let service = PointService::new(&conn);

    assert_eq!(service.count_points_by_tag(lib, "draft").unwrap(), 2);
    assert_eq!(service.count_points_by_tag(lib, "none").unwrap(), 0);
    assert_eq!(service.delete_points_by_tag(lib, "draft").unwrap(), 2);

    let remaining = service.list_points(lib).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].point.id, c);
}
