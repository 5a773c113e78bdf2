//! In-memory thumbnail cache, least recently used, bounded by entry count
//! and total bytes.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use negafix_core::FloatImage;

use crate::state::FileIdentity;

#[derive(Debug)]
pub struct MemoryThumbnailCache {
    entries: HashMap<FileIdentity, Arc<FloatImage>>,
    /// Front is least recently used.
    order: VecDeque<FileIdentity>,
    bytes: usize,
    count_limit: usize,
    byte_limit: usize,
}

impl MemoryThumbnailCache {
    pub fn new(count_limit: usize, byte_limit: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            bytes: 0,
            count_limit,
            byte_limit,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn byte_size(&self) -> usize {
        self.bytes
    }

    pub fn contains(&self, identity: &FileIdentity) -> bool {
        self.entries.contains_key(identity)
    }

    fn touch(&mut self, identity: &FileIdentity) {
        if let Some(pos) = self.order.iter().position(|id| id == identity) {
            self.order.remove(pos);
        }
        self.order.push_back(identity.clone());
    }

    /// Look up and mark as most recently used.
    pub fn get(&mut self, identity: &FileIdentity) -> Option<Arc<FloatImage>> {
        let image = self.entries.get(identity).cloned()?;
        self.touch(identity);
        Some(image)
    }

    /// Look up without affecting recency.
    pub fn peek(&self, identity: &FileIdentity) -> Option<Arc<FloatImage>> {
        self.entries.get(identity).cloned()
    }

    /// Insert, evicting least recently used entries past either bound.
    ///
    /// Returns the evicted identities. An image larger than the byte limit
    /// on its own is not cached.
    pub fn insert(&mut self, identity: FileIdentity, image: Arc<FloatImage>) -> Vec<FileIdentity> {
        let size = image.byte_size();
        if size > self.byte_limit || self.count_limit == 0 {
            return Vec::new();
        }
        self.remove(&identity);
        self.bytes += size;
        self.entries.insert(identity.clone(), image);
        self.order.push_back(identity);
        self.evict()
    }

    pub fn remove(&mut self, identity: &FileIdentity) -> Option<Arc<FloatImage>> {
        let image = self.entries.remove(identity)?;
        self.bytes -= image.byte_size();
        if let Some(pos) = self.order.iter().position(|id| id == identity) {
            self.order.remove(pos);
        }
        Some(image)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.bytes = 0;
    }

    fn evict(&mut self) -> Vec<FileIdentity> {
        let mut evicted = Vec::new();
        while self.entries.len() > self.count_limit || self.bytes > self.byte_limit {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if let Some(image) = self.entries.remove(&oldest) {
                self.bytes -= image.byte_size();
            }
            evicted.push(oldest);
        }
        evicted
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn bounds_hold_after_any_inserts(
            widths in proptest::collection::vec((0u8..12, 1u32..8), 1..60),
            count_limit in 1usize..6,
            byte_limit in 16usize..400,
        ) {
            let mut cache = MemoryThumbnailCache::new(count_limit, byte_limit);
            for (name, width) in widths {
                cache.insert(FileIdentity::from(format!("f{name}")), Arc::new(FloatImage::filled(width, 1, [0.0; 3])));
                prop_assert!(cache.len() <= count_limit);
                prop_assert!(cache.byte_size() <= byte_limit);
            }
        }
    }
}
