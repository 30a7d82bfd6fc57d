//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Own transaction boundaries: every mutation and its derived writes
//!   (edge replacement, snapshot capture, cascades) commit together.

pub mod library_service;
pub mod link_service;
pub mod point_service;
pub mod snapshot_service;
