//! Link graph use-case service.
//!
//! # Responsibility
//! - Enforce the pair policy on every link creation.
//! - List library links without ever returning a dangling edge.
//!
//! # Invariants
//! - Under [`LinkPolicy::ReplaceExisting`] at most one link exists between
//!   any unordered pair of points; creation deletes every prior link between
//!   the pair (any direction, any type) and inserts the new one in the same
//!   transaction.
//! - Under [`LinkPolicy::RejectConflicts`] existing links are never touched;
//!   a conflicting request fails with [`LinkServiceError::Conflict`].
//! - Both endpoints exist, are distinct and share a library.

use crate::model::library::LibraryId;
use crate::model::link::{Link, LinkId, LinkType};
use crate::model::point::PointId;
use crate::repo::library_repo::{LibraryRepository, SqliteLibraryRepository};
use crate::repo::link_repo::{LinkRepository, SqliteLinkRepository};
use crate::repo::point_repo::{PointRepository, SqlitePointRepository};
use crate::repo::RepoError;
use log::{info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// How link creation treats links that already join the same pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkPolicy {
    /// Replace every existing link between the pair. Never conflicts.
    #[default]
    ReplaceExisting,
    /// Keep existing links and reject duplicates, reverse `related` links and
    /// reversed parent/child hierarchies.
    RejectConflicts,
}

/// Errors from link use-cases.
#[derive(Debug)]
pub enum LinkServiceError {
    PointNotFound(PointId),
    LinkNotFound(LinkId),
    LibraryNotFound(LibraryId),
    /// Both endpoints are the same point.
    SelfLink(PointId),
    /// Endpoints belong to different libraries.
    CrossLibrary { from_id: PointId, to_id: PointId },
    /// Rejected under [`LinkPolicy::RejectConflicts`].
    Conflict { existing: LinkId },
    Repo(RepoError),
}

impl Display for LinkServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PointNotFound(id) => write!(f, "point not found: {id}"),
            Self::LinkNotFound(id) => write!(f, "link not found: {id}"),
            Self::LibraryNotFound(id) => write!(f, "library not found: {id}"),
            Self::SelfLink(id) => write!(f, "point {id} cannot link to itself"),
            Self::CrossLibrary { from_id, to_id } => write!(
                f,
                "points {from_id} and {to_id} belong to different libraries"
            ),
            Self::Conflict { existing } => write!(f, "link conflicts with existing link {existing}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LinkServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for LinkServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity: "link", id } => Self::LinkNotFound(id),
            RepoError::NotFound {
                entity: "point",
                id,
            } => Self::PointNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<rusqlite::Error> for LinkServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

/// Link service over one borrowed connection.
pub struct LinkService<'conn> {
    conn: &'conn Connection,
    policy: LinkPolicy,
}

impl<'conn> LinkService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self::with_policy(conn, LinkPolicy::default())
    }

    pub fn with_policy(conn: &'conn Connection, policy: LinkPolicy) -> Self {
        Self { conn, policy }
    }

    pub fn policy(&self) -> LinkPolicy {
        self.policy
    }

    /// Creates the link `from_id -> to_id` of type `kind`.
    pub fn create_link(
        &self,
        from_id: PointId,
        to_id: PointId,
        kind: LinkType,
    ) -> Result<Link, LinkServiceError> {
        if from_id == to_id {
            return Err(LinkServiceError::SelfLink(from_id));
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let points = SqlitePointRepository::try_new(&tx)?;
        let from = points
            .get_point(from_id)?
            .ok_or(LinkServiceError::PointNotFound(from_id))?;
        let to = points
            .get_point(to_id)?
            .ok_or(LinkServiceError::PointNotFound(to_id))?;
        if from.library_id != to.library_id {
            return Err(LinkServiceError::CrossLibrary { from_id, to_id });
        }

        let links = SqliteLinkRepository::try_new(&tx)?;
        let replaced = match self.policy {
            LinkPolicy::ReplaceExisting => links.delete_links_between(from_id, to_id)?,
            LinkPolicy::RejectConflicts => {
                let existing = links.links_between(from_id, to_id)?;
                if let Some(conflict) = find_conflict(&existing, from_id, to_id, kind) {
                    warn!(
                        "event=link_create module=link status=conflict from_id={} to_id={} type={} existing={}",
                        from_id,
                        to_id,
                        kind.as_str(),
                        conflict.id
                    );
                    return Err(LinkServiceError::Conflict {
                        existing: conflict.id,
                    });
                }
                0
            }
        };
        let link = links.insert_link(from_id, to_id, kind)?;
        tx.commit()?;

        info!(
            "event=link_create module=link status=ok link_id={} type={} replaced={}",
            link.id,
            kind.as_str(),
            replaced
        );
        Ok(link)
    }

    pub fn delete_link(&self, link_id: LinkId) -> Result<(), LinkServiceError> {
        SqliteLinkRepository::try_new(self.conn)?.delete_link(link_id)?;
        info!("event=link_delete module=link status=ok link_id={link_id}");
        Ok(())
    }

    pub fn get_link(&self, link_id: LinkId) -> Result<Option<Link>, LinkServiceError> {
        Ok(SqliteLinkRepository::try_new(self.conn)?.get_link(link_id)?)
    }

    /// Lists links whose both endpoints are points of `library_id`.
    ///
    /// The library's point ids are collected first and edges are filtered
    /// against that set.
    pub fn list_links(&self, library_id: LibraryId) -> Result<Vec<Link>, LinkServiceError> {
        if !SqliteLibraryRepository::try_new(self.conn)?.library_exists(library_id)? {
            return Err(LinkServiceError::LibraryNotFound(library_id));
        }
        let point_ids: BTreeSet<PointId> = SqlitePointRepository::try_new(self.conn)?
            .list_point_ids(library_id)?
            .into_iter()
            .collect();
        Ok(SqliteLinkRepository::try_new(self.conn)?.links_within(&point_ids)?)
    }

    /// Lists links touching `point_id` in either direction.
    pub fn links_for_point(&self, point_id: PointId) -> Result<Vec<Link>, LinkServiceError> {
        if SqlitePointRepository::try_new(self.conn)?
            .get_point(point_id)?
            .is_none()
        {
            return Err(LinkServiceError::PointNotFound(point_id));
        }
        Ok(SqliteLinkRepository::try_new(self.conn)?.links_touching(point_id)?)
    }
}

/// Finds the existing link that blocks `from -> to` of type `kind` under
/// [`LinkPolicy::RejectConflicts`].
///
/// Rules:
/// - the exact same directed, typed link exists;
/// - `related` already exists in the reverse direction;
/// - for `parent`/`child`, any hierarchical link exists in the reverse
///   direction.
pub fn find_conflict<'a>(
    existing: &'a [Link],
    from_id: PointId,
    to_id: PointId,
    kind: LinkType,
) -> Option<&'a Link> {
    existing.iter().find(|link| {
        if !link.joins(from_id, to_id) {
            return false;
        }
        if link.from_id == from_id {
            return link.kind == kind;
        }
        match kind {
            LinkType::Related => link.kind == LinkType::Related,
            LinkType::Parent | LinkType::Child => link.kind != LinkType::Related,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::find_conflict;
    use crate::model::link::{Link, LinkType};
    use uuid::Uuid;

    fn link(from_id: Uuid, to_id: Uuid, kind: LinkType) -> Link {
        Link {
            id: Uuid::new_v4(),
            from_id,
            to_id,
            kind,
            created_at: 0,
        }
    }

    #[test]
    fn exact_duplicate_conflicts() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let existing = vec![link(a, b, LinkType::Parent)];
        assert!(find_conflict(&existing, a, b, LinkType::Parent).is_some());
        assert!(find_conflict(&existing, a, b, LinkType::Related).is_none());
    }

    #[test]
    fn related_is_undirected() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let existing = vec![link(b, a, LinkType::Related)];
        assert!(find_conflict(&existing, a, b, LinkType::Related).is_some());
        assert!(find_conflict(&existing, a, b, LinkType::Parent).is_none());
    }

    #[test]
    fn hierarchy_cannot_be_reversed() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let existing = vec![link(a, b, LinkType::Parent)];
        assert!(find_conflict(&existing, b, a, LinkType::Parent).is_some());
        assert!(find_conflict(&existing, b, a, LinkType::Child).is_some());
        assert!(find_conflict(&existing, b, a, LinkType::Related).is_none());
    }
}
