//! Size-bounded disk cache of thumbnail JPEGs.
//!
//! # Layout
//!
//! Content-addressed by source identity: the thumbnail for a file lives at
//! `<dir>/<sha256(path)>.jpg`. Writes go to a hidden temp file that is then
//! renamed into place, so a reader never sees a partially written file.
//!
//! # Pruning
//!
//! [`DiskThumbnailCache::enforce_size_limit`] deletes oldest files (by
//! modification time) until the total is within budget. A pass runs once
//! when the cache is opened and after every write, on a background thread.
//! Passes are serialized; a failed deletion ends the pass early.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::SystemTime;

use negafix_core::decode::decode_raster_bytes;
use negafix_core::{encode_jpeg, FloatImage};

use crate::config::DiskCacheConfig;
use crate::error::CacheError;
use crate::state::FileIdentity;

/// Extension of cache entries; anything else in the directory is ignored.
pub const CACHE_EXTENSION: &str = "jpg";

/// Outcome of one pruning pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub deleted: usize,
    pub bytes_before: u64,
    pub bytes_after: u64,
}

#[derive(Debug)]
struct CacheFile {
    path: PathBuf,
    modified: SystemTime,
    size: u64,
}

#[derive(Debug)]
pub struct DiskThumbnailCache {
    directory: PathBuf,
    max_bytes: u64,
    prune_lock: Mutex<()>,
    temp_counter: AtomicU64,
}

impl DiskThumbnailCache {
    /// Create the cache directory if needed. No pruning pass is started.
    pub fn new(directory: impl Into<PathBuf>, max_bytes: u64) -> Result<Self, CacheError> {
        let directory = directory.into();
        fs::create_dir_all(&directory).map_err(|e| CacheError::io(&directory, e))?;
        Ok(Self {
            directory,
            max_bytes,
            prune_lock: Mutex::new(()),
            temp_counter: AtomicU64::new(0),
        })
    }

    /// Open the cache and start the startup pruning pass in the background.
    pub fn open(directory: impl Into<PathBuf>, max_bytes: u64) -> Result<Arc<Self>, CacheError> {
        let cache = Arc::new(Self::new(directory, max_bytes)?);
        cache.spawn_enforce_size_limit();
        Ok(cache)
    }

    /// Open from configuration; `None` when no directory is configured.
    pub fn from_config(config: &DiskCacheConfig) -> Result<Option<Arc<Self>>, CacheError> {
        match &config.directory {
            Some(dir) => Self::open(dir.clone(), config.max_bytes).map(Some),
            None => Ok(None),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// File name for an identity: hex SHA-256 of the path plus extension.
    pub fn file_name(identity: &FileIdentity) -> String {
        format!("{}.{CACHE_EXTENSION}", identity.digest())
    }

    pub fn path_for(&self, identity: &FileIdentity) -> PathBuf {
        self.directory.join(Self::file_name(identity))
    }

    // ========================================================================
    // Primitives
    // ========================================================================

    /// Store encoded thumbnail bytes, replacing any previous entry.
    pub fn save(&self, identity: &FileIdentity, bytes: &[u8]) -> Result<(), CacheError> {
        let target = self.path_for(identity);
        let n = self.temp_counter.fetch_add(1, Ordering::Relaxed);
        let temp = self
            .directory
            .join(format!(".{}.{n}.tmp", identity.digest()));

        fs::write(&temp, bytes).map_err(|e| CacheError::io(&temp, e))?;
        if let Err(e) = fs::rename(&temp, &target) {
            let _ = fs::remove_file(&temp);
            return Err(CacheError::io(&target, e));
        }
        Ok(())
    }

    /// Cached bytes, `None` on a miss. Read failures count as a miss.
    pub fn load(&self, identity: &FileIdentity) -> Option<Vec<u8>> {
        let path = self.path_for(identity);
        match fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "thumbnail cache read failed");
                None
            }
        }
    }

    /// Delete one entry. A missing entry is not an error.
    pub fn remove(&self, identity: &FileIdentity) -> Result<(), CacheError> {
        let path = self.path_for(identity);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::io(&path, e)),
        }
    }

    /// Delete every cache entry.
    pub fn clear(&self) -> Result<(), CacheError> {
        let _guard = self.prune_lock.lock().unwrap_or_else(PoisonError::into_inner);
        for file in self.entries()? {
            match fs::remove_file(&file.path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(CacheError::io(&file.path, e)),
            }
        }
        Ok(())
    }

    // ========================================================================
    // Images
    // ========================================================================

    /// Encode `image` as JPEG and store it.
    pub fn save_image(
        &self,
        identity: &FileIdentity,
        image: &FloatImage,
        quality: u8,
    ) -> Result<(), CacheError> {
        let bytes = encode_jpeg(image, quality)?;
        self.save(identity, &bytes)
    }

    /// Decode a cached thumbnail. A corrupt entry is removed and reported
    /// as a miss.
    pub fn load_image(&self, identity: &FileIdentity) -> Option<FloatImage> {
        let bytes = self.load(identity)?;
        match decode_raster_bytes(&bytes) {
            Ok(image) => Some(image),
            Err(e) => {
                tracing::warn!(file = %identity, error = %e, "discarding corrupt cached thumbnail");
                let _ = self.remove(identity);
                None
            }
        }
    }

    // ========================================================================
    // Size limit
    // ========================================================================

    fn entries(&self) -> Result<Vec<CacheFile>, CacheError> {
        let dir = fs::read_dir(&self.directory).map_err(|e| CacheError::io(&self.directory, e))?;
        let mut files = Vec::new();
        for entry in dir.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(CACHE_EXTENSION) {
                continue;
            }
            let Ok(meta) = entry.metadata() else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }
            files.push(CacheFile {
                path,
                modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                size: meta.len(),
            });
        }
        Ok(files)
    }

    /// Total bytes of all cache entries.
    pub fn total_size(&self) -> Result<u64, CacheError> {
        Ok(self.entries()?.iter().map(|f| f.size).sum())
    }

    /// Delete oldest entries until the total size is within budget.
    pub fn enforce_size_limit(&self) -> Result<PruneReport, CacheError> {
        let _guard = self.prune_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut files = self.entries()?;
        let bytes_before: u64 = files.iter().map(|f| f.size).sum();
        let mut report = PruneReport {
            deleted: 0,
            bytes_before,
            bytes_after: bytes_before,
        };
        if bytes_before <= self.max_bytes {
            return Ok(report);
        }

        files.sort_by_key(|f| f.modified);
        for file in files {
            if report.bytes_after <= self.max_bytes {
                break;
            }
            match fs::remove_file(&file.path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %file.path.display(), error = %e, "cache pruning aborted");
                    break;
                }
            }
            report.bytes_after = report.bytes_after.saturating_sub(file.size);
            report.deleted += 1;
        }

        tracing::debug!(
            deleted = report.deleted,
            bytes_before = report.bytes_before,
            bytes_after = report.bytes_after,
            max_bytes = self.max_bytes,
            "thumbnail cache pruned"
        );
        Ok(report)
    }

    /// Run [`Self::enforce_size_limit`] on a background thread.
    pub fn spawn_enforce_size_limit(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let cache = Arc::clone(self);
        let spawned = std::thread::Builder::new()
            .name("negafix-cache-prune".into())
            .spawn(move || {
                if let Err(e) = cache.enforce_size_limit() {
                    tracing::warn!(error = %e, "thumbnail cache pruning failed");
                }
            });
        match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(error = %e, "failed to start cache pruning");
                None
            }
        }
    }
}
