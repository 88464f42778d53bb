//! Storage configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Database path; relative paths resolve against the target root.
    pub db_path: Option<String>,
    /// Records per upsert transaction. Default: 100.
    pub batch_size: Option<usize>,
    /// Age cutoff for history cleanup. Default: 30 days.
    pub retention_days: Option<u32>,
    /// Resolve fingerprints that disappear between checks. Default: false.
    pub auto_resolve_removed: Option<bool>,
}

impl StorageConfig {
    pub fn effective_db_path(&self, root: &Path) -> PathBuf {
        let raw = self
            .db_path
            .as_deref()
            .unwrap_or(constants::DEFAULT_DB_FILE);
        let path = Path::new(raw);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        }
    }

    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.unwrap_or(constants::DEFAULT_BATCH_SIZE)
    }

    pub fn effective_retention_days(&self) -> u32 {
        self.retention_days
            .unwrap_or(constants::DEFAULT_RETENTION_DAYS)
    }

    pub fn effective_auto_resolve_removed(&self) -> bool {
        self.auto_resolve_removed.unwrap_or(false)
    }
}
