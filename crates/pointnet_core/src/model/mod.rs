//! Domain model for libraries, points, links and snapshots.
//!
//! # Responsibility
//! - Define canonical records shared by repositories and services.
//! - Own field-level validation so every write path applies the same limits.
//!
//! # Invariants
//! - Every entity is identified by a stable UUID that is never reused.
//! - Points belong to exactly one library; links and snapshots belong to
//!   points.

pub mod library;
pub mod link;
pub mod point;
pub mod snapshot;
pub mod validation;
