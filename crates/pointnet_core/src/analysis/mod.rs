//! Read-only analysis over library content.
//!
//! # Responsibility
//! - Derive statistics from points without mutating storage.

pub mod word_freq;
