//! Per-file identity and adjustment state.

use std::fmt;
use std::path::{Path, PathBuf};

use negafix_core::AdjustmentParameters;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Identity of a source file: its canonical path string.
///
/// Two paths naming the same file produce the same identity when the file
/// exists; otherwise the path is used as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileIdentity(String);

impl FileIdentity {
    pub fn from_path(path: &Path) -> Self {
        let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        Self(canonical.to_string_lossy().into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn path(&self) -> PathBuf {
        PathBuf::from(&self.0)
    }

    /// Lowercase hex SHA-256 of the path string; the key for every
    /// per-file artifact on disk.
    pub fn digest(&self) -> String {
        format!("{:x}", Sha256::digest(self.0.as_bytes()))
    }
}

impl From<&str> for FileIdentity {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for FileIdentity {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for FileIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The adjustment state of one open file.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageState {
    pub identity: FileIdentity,
    pub parameters: AdjustmentParameters,
}

impl ImageState {
    pub fn new(identity: FileIdentity) -> Self {
        Self {
            identity,
            parameters: AdjustmentParameters::default(),
        }
    }

    pub fn with_parameters(identity: FileIdentity, parameters: AdjustmentParameters) -> Self {
        Self {
            identity,
            parameters,
        }
    }
}
