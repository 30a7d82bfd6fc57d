//! Core domain logic for PointNet, a knowledge-point graph with version
//! history.
//!
//! Hosts open a connection with [`open_db`], then construct the short-lived
//! services over it.

pub mod analysis;
pub mod config;
pub mod db;
pub mod exchange;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use analysis::word_freq::{word_frequency, AnalysisError, FrequencyMode, WordCount};
pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError};
pub use exchange::{
    export_libraries, export_library, import_libraries, import_libraries_json, ExchangeError,
    ImportSummary, LibraryExport,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::library::{Library, LibraryId, Source, Tag};
pub use model::link::{Link, LinkId, LinkType};
pub use model::point::{Point, PointId, PointPatch};
pub use model::snapshot::{LinkNeighborhood, Snapshot, SnapshotId};
pub use repo::{RepoError, RepoResult};
pub use service::library_service::{
    LibraryPatch, LibraryService, LibraryServiceError, NewLibrary, SourceInput, TagInput,
};
pub use service::link_service::{LinkPolicy, LinkService, LinkServiceError};
pub use service::point_service::{NewPoint, PointService, PointServiceError};
pub use service::snapshot_service::{SnapshotPolicy, SnapshotService, SnapshotServiceError};

/// Health check for hosts.
pub fn ping() -> &'static str {
    "pong"
}

pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
