//! Runtime configuration.
//!
//! # Responsibility
//! - Describe the knobs a host passes to core: storage path, logging and
//!   history/link policies.
//!
//! # Invariants
//! - Every field has a default; an empty JSON object is a valid config.
//! - A zero-day retention window is rejected.

use crate::service::link_service::{LinkPolicy, LinkService};
use crate::service::snapshot_service::{SnapshotPolicy, SnapshotService, DEFAULT_RETENTION_DAYS};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_DB_FILE: &str = "pointnet.sqlite3";

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    Invalid(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::Invalid(details) => write!(f, "invalid config: {details}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    /// `None` uses [`crate::default_log_level`].
    pub log_level: Option<String>,
    /// `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    pub snapshot_retention_days: u32,
    pub snapshot_on_restore: bool,
    pub link_policy: LinkPolicy,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            log_level: None,
            log_dir: None,
            snapshot_retention_days: DEFAULT_RETENTION_DAYS,
            snapshot_on_restore: false,
            link_policy: LinkPolicy::default(),
        }
    }
}

impl CoreConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.snapshot_retention_days == 0 {
            return Err(ConfigError::Invalid(
                "snapshot_retention_days must be at least 1",
            ));
        }
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("db_path cannot be empty"));
        }
        Ok(())
    }

    pub fn snapshot_policy(&self) -> SnapshotPolicy {
        SnapshotPolicy {
            retention_days: self.snapshot_retention_days,
            snapshot_on_restore: self.snapshot_on_restore,
        }
    }

    /// Link service applying the configured pair policy.
    pub fn link_service<'conn>(&self, conn: &'conn Connection) -> LinkService<'conn> {
        LinkService::with_policy(conn, self.link_policy)
    }

    /// Snapshot service applying the configured history policy.
    pub fn snapshot_service<'conn>(&self, conn: &'conn Connection) -> SnapshotService<'conn> {
        SnapshotService::with_policy(conn, self.snapshot_policy())
    }

    pub fn log_level(&self) -> &str {
        self.log_level
            .as_deref()
            .unwrap_or(crate::logging::default_log_level())
    }
}
