//! Adjustment state persistence.
//!
//! [`JsonStateStore`] keeps one pretty-printed JSON document per source
//! file at `<dir>/<sha256(path)>.json`. Documents from older versions with
//! missing fields load with defaults substituted.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use negafix_core::AdjustmentParameters;

use crate::error::StoreError;
use crate::state::FileIdentity;

/// Persistence collaborator for per-file adjustments.
pub trait StateStore: Send + Sync {
    /// Stored parameters, `None` when nothing (readable) is stored.
    fn load(&self, identity: &FileIdentity) -> Option<AdjustmentParameters>;

    fn save(&self, identity: &FileIdentity, params: &AdjustmentParameters) -> Result<(), StoreError>;
}

/// One JSON file per source image.
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    directory: PathBuf,
}

impl JsonStateStore {
    /// Use `directory`, creating it if needed.
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let directory = directory.into();
        std::fs::create_dir_all(&directory).map_err(|source| StoreError::Io {
            path: directory.clone(),
            source,
        })?;
        Ok(Self { directory })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn path_for(&self, identity: &FileIdentity) -> PathBuf {
        self.directory.join(format!("{}.json", identity.digest()))
    }
}

impl StateStore for JsonStateStore {
    fn load(&self, identity: &FileIdentity) -> Option<AdjustmentParameters> {
        let path = self.path_for(identity);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read adjustment state");
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(params) => Some(params),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable adjustment state");
                None
            }
        }
    }

    fn save(&self, identity: &FileIdentity, params: &AdjustmentParameters) -> Result<(), StoreError> {
        let path = self.path_for(identity);
        let json = serde_json::to_string_pretty(params)?;
        std::fs::write(&path, json).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(file = %identity, path = %path.display(), "saved adjustment state");
        Ok(())
    }
}

/// In-memory store for ephemeral sessions and tests.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    entries: Mutex<HashMap<FileIdentity, AdjustmentParameters>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self, identity: &FileIdentity) -> Option<AdjustmentParameters> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identity)
            .cloned()
    }

    fn save(&self, identity: &FileIdentity, params: &AdjustmentParameters) -> Result<(), StoreError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identity.clone(), params.clone());
        Ok(())
    }
}
