//! Error types for the engine crate.
//!
//! None of these are fatal: cache failures degrade to a miss and
//! persistence failures are reported for the one edit that failed.

use std::path::PathBuf;

use negafix_core::EncodeError;
use thiserror::Error;

/// Errors loading an [`crate::EngineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Validation(String),
}

/// Errors from the adjustment state store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("State store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize adjustment state: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors from the disk thumbnail cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode thumbnail: {0}")]
    Encode(#[from] EncodeError),
}

/// Errors from [`crate::EditSession`].
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No file is open")]
    NoActiveFile,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }
}
