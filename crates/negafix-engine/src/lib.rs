//! Processing engine, thumbnail scheduling and caching for negafix.
//!
//! This crate runs the [`negafix_core`] pipeline off the caller's thread:
//!
//! - [`ProcessingEngine`]: one cancellable full-resolution request at a time
//! - [`ThumbnailScheduler`]: a prioritized queue of low-resolution jobs
//! - [`DiskThumbnailCache`]: thumbnails on disk, pruned oldest first
//! - [`EditSession`]: per-file adjustments, persisted and applied
//!
//! Everything is configured through one [`EngineConfig`].

pub mod config;
pub mod disk_cache;
pub mod engine;
pub mod error;
pub mod session;
pub mod state;
pub mod store;
pub mod thumbnail;

pub use config::{DiskCacheConfig, EngineConfig, ProcessingConfig, StateConfig, ThumbnailConfig};
pub use disk_cache::{DiskThumbnailCache, PruneReport};
pub use engine::{EngineState, ProcessOutcome, ProcessResult, ProcessTicket, ProcessingEngine};
pub use error::{CacheError, ConfigError, SessionError, StoreError};
pub use session::{EditSession, SessionEvent};
pub use state::{FileIdentity, ImageState};
pub use store::{JsonStateStore, MemoryStateStore, StateStore};
pub use thumbnail::{MemoryThumbnailCache, ThumbnailEvent, ThumbnailScheduler};
