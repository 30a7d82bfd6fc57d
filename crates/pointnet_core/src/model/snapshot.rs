//! Immutable content version of a point.
//!
//! # Invariants
//! - Snapshots are append-only: created, listed, never updated.
//! - `neighborhood` reflects the link set at capture time, not the current one.

use crate::model::point::PointId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type SnapshotId = Uuid;

/// Link endpoints touching a point at capture time, split by direction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkNeighborhood {
    /// Targets of links whose `from` end is the point.
    pub outgoing: Vec<PointId>,
    /// Sources of links whose `to` end is the point.
    pub incoming: Vec<PointId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: SnapshotId,
    pub point_id: PointId,
    pub title: String,
    pub content: String,
    pub source: Option<String>,
    pub page: Option<String>,
    pub neighborhood: LinkNeighborhood,
    /// Epoch milliseconds.
    pub captured_at: i64,
}
