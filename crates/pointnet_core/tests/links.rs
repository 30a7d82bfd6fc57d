mod common;

use common::{library, point};
use pointnet_core::db::open_db_in_memory;
use pointnet_core::{
    CoreConfig, LinkPolicy, LinkService, LinkServiceError, LinkType, PointService,
};
use uuid::Uuid;

#[test]
fn new_link_replaces_every_link_between_the_pair() {
    let conn = open_db_in_memory().unwrap();
    let lib = library(&conn, "graph", &[]);
    let a = point(&conn, lib, "A");
    let b = point(&conn, lib, "B");
    let service = LinkService::new(&conn);

    service.create_link(a, b, LinkType::Parent).unwrap();
    let latest = service.create_link(b, a, LinkType::Related).unwrap();

    let links = service.list_links(lib).unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].id, latest.id);
    assert_eq!((links[0].from_id, links[0].to_id), (b, a));
    assert_eq!(links[0].kind, LinkType::Related);
}

#[test]
fn replacing_only_touches_the_requested_pair() {
    let conn = open_db_in_memory().unwrap();
    let lib = library(&conn, "graph", &[]);
    let a = point(&conn, lib, "A");
    let b = point(&conn, lib, "B");
    let c = point(&conn, lib, "C");
    let service = LinkService::new(&conn);

    service.create_link(a, c, LinkType::Child).unwrap();
    service.create_link(a, b, LinkType::Related).unwrap();
    service.create_link(a, b, LinkType::Related).unwrap();

    let links = service.list_links(lib).unwrap();
    assert_eq!(links.len(), 2);
    assert_eq!(service.links_for_point(c).unwrap().len(), 1);
}

#[test]
fn reject_policy_keeps_existing_links() {
    let conn = open_db_in_memory().unwrap();
    let lib = library(&conn, "graph", &[]);
    let a = point(&conn, lib, "A");
    let b = point(&conn, lib, "B");
    let service = LinkService::with_policy(&conn, LinkPolicy::RejectConflicts);
    assert_eq!(service.policy(), LinkPolicy::RejectConflicts);

    let first = service.create_link(a, b, LinkType::Related).unwrap();
    let err = service.create_link(b, a, LinkType::Related).unwrap_err();
    assert!(matches!(err, LinkServiceError::Conflict { existing } if existing == first.id));

    service.create_link(a, b, LinkType::Parent).unwrap();
    let err = service.create_link(b, a, LinkType::Child).unwrap_err();
    assert!(matches!(err, LinkServiceError::Conflict { .. }));

    assert_eq!(service.list_links(lib).unwrap().len(), 2);
}

#[test]
fn invalid_endpoints_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let lib = library(&conn, "one", &[]);
    let other = library(&conn, "two", &[]);
    let a = point(&conn, lib, "A");
    let foreign = point(&conn, other, "F");
    let missing = Uuid::new_v4();
    let service = LinkService::new(&conn);

    assert!(matches!(
        service.create_link(a, a, LinkType::Related),
        Err(LinkServiceError::SelfLink(id)) if id == a
    ));
    assert!(matches!(
        service.create_link(a, missing, LinkType::Related),
        Err(LinkServiceError::PointNotFound(id)) if id == missing
    ));
    assert!(matches!(
        service.create_link(a, foreign, LinkType::Related),
        Err(LinkServiceError::CrossLibrary { .. })
    ));
    assert!(matches!(
        service.list_links(Uuid::new_v4()),
        Err(LinkServiceError::LibraryNotFound(_))
    ));
    assert!(service.list_links(lib).unwrap().is_empty());
}

#[test]
fn deleted_links_and_points_leave_no_dangling_edges() {
    let conn = open_db_in_memory().unwrap();
    let lib = library(&conn, "graph", &[]);
    let a = point(&conn, lib, "A");
    let b = point(&conn, lib, "B");
    let c = point(&conn, lib, "C");
    let service = LinkService::new(&conn);

    let ab = service.create_link(a, b, LinkType::Related).unwrap();
    service.create_link(b, c, LinkType::Parent).unwrap();

    service.delete_link(ab.id).unwrap();
    assert!(service.get_link(ab.id).unwrap().is_none());
    assert!(matches!(
        service.delete_link(ab.id),
        Err(LinkServiceError::LinkNotFound(id)) if id == ab.id
    ));

    PointService::new(&conn).delete_point(c).unwrap();
    assert!(service.list_links(lib).unwrap().is_empty());
    assert!(service.links_for_point(b).unwrap().is_empty());
}

#[test]
fn configured_reject_policy_is_applied() {
    let conn = open_db_in_memory().unwrap();
    let lib = library(&conn, "graph", &[]);
    let a = point(&conn, lib, "A");
    let b = point(&conn, lib, "B");
    let config = CoreConfig::from_json_str(r#"{"link_policy": "reject_conflicts"}"#).unwrap();
    let service = config.link_service(&conn);
    assert_eq!(service.policy(), LinkPolicy::RejectConflicts);

    let first = service.create_link(a, b, LinkType::Related).unwrap();
    assert!(matches!(
        service.create_link(b, a, LinkType::Related),
        Err(LinkServiceError::Conflict { existing }) if existing == first.id
    ));

    let default_service = CoreConfig::default().link_service(&conn);
    assert_eq!(default_service.policy(), LinkPolicy::ReplaceExisting);
    default_service.create_link(b, a, LinkType::Related).unwrap();
    assert_eq!(service.list_links(lib).unwrap().len(), 1);
}
