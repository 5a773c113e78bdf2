//! Thumbnail generation and caching.

pub mod memory_cache;
pub mod scheduler;

pub use memory_cache::MemoryThumbnailCache;
pub use scheduler::{ThumbnailEvent, ThumbnailScheduler};
