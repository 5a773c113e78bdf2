//! Engine configuration.
//!
//! One [`EngineConfig`] per application session, passed explicitly to the
//! engine, the thumbnail scheduler and the disk cache. Every section has
//! defaults, so a partial (or empty) TOML file is valid:
//!
//! ```toml
//! [processing]
//! version = "v1"
//!
//! [thumbnails]
//! target_width = 256
//!
//! [disk_cache]
//! directory = "/var/cache/negafix"
//! max_bytes = 104857600
//! ```

use std::path::{Path, PathBuf};

use negafix_core::filters::levels::DEFAULT_ANALYSIS_WIDTH;
use negafix_core::{PipelineSettings, ProcessingVersion};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub processing: ProcessingConfig,
    pub thumbnails: ThumbnailConfig,
    pub disk_cache: DiskCacheConfig,
    pub state: StateConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    pub version: ProcessingVersion,
    /// Auto-levels analysis width in pixels.
    pub analysis_width: u32,
    /// Width of the copy the display histogram is computed from.
    pub histogram_width: u32,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            version: ProcessingVersion::V2,
            analysis_width: DEFAULT_ANALYSIS_WIDTH,
            histogram_width: 512,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailConfig {
    /// Maximum number of thumbnails generated at once.
    pub concurrency: usize,
    pub target_width: u32,
    pub memory_count_limit: usize,
    pub memory_byte_limit: usize,
    pub jpeg_quality: u8,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            target_width: 320,
            memory_count_limit: 500,
            memory_byte_limit: 256 * MIB as usize,
            jpeg_quality: 85,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiskCacheConfig {
    /// Cache directory; the disk cache is disabled when unset.
    pub directory: Option<PathBuf>,
    pub max_bytes: u64,
}

impl Default for DiskCacheConfig {
    fn default() -> Self {
        Self {
            directory: None,
            max_bytes: 500 * MIB,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StateConfig {
    /// Directory of per-image JSON state; state is kept in memory when unset.
    pub directory: Option<PathBuf>,
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thumbnails.concurrency == 0 {
            return Err(ConfigError::Validation(
                "thumbnails.concurrency must be at least 1".into(),
            ));
        }
        if self.thumbnails.target_width == 0 {
            return Err(ConfigError::Validation(
                "thumbnails.target_width must be non-zero".into(),
            ));
        }
        if self.processing.analysis_width == 0 || self.processing.histogram_width == 0 {
            return Err(ConfigError::Validation(
                "processing analysis widths must be non-zero".into(),
            ));
        }
        Ok(())
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            version: self.processing.version,
            analysis_width: self.processing.analysis_width,
        }
    }
}
