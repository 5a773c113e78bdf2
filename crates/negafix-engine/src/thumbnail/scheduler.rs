//! Bounded-concurrency thumbnail generation.
//!
//! # Queue discipline
//!
//! Files wait in a FIFO queue. [`ThumbnailScheduler::request_priority`] moves
//! a file to the front. Up to `concurrency` worker threads pull from the
//! front; each entry is re-validated when it is dequeued, since a file can
//! be cached or picked up by another worker between enqueue and dequeue.
//!
//! All queue and cache mutation happens under one lock. Decoding, the
//! pipeline and disk I/O run outside it.
//!
//! A file regenerated while its job is in flight is marked stale: the
//! running job's result is dropped and the file goes back to the front of
//! the queue with the new parameters. Its next render skips the disk
//! cache, since the outdated copy is removed only after the lock is released.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{mpsc, Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use negafix_core::{AdjustmentParameters, FloatImage};

use crate::config::ThumbnailConfig;
use crate::disk_cache::DiskThumbnailCache;
use crate::engine::ProcessingEngine;
use crate::state::FileIdentity;
use crate::thumbnail::MemoryThumbnailCache;

/// Published when a thumbnail job finishes.
#[derive(Debug, Clone)]
pub enum ThumbnailEvent {
    Ready {
        identity: FileIdentity,
        image: Arc<FloatImage>,
    },
    /// Generation failed; nothing was cached.
    Failed {
        identity: FileIdentity,
        message: String,
    },
}

struct Job {
    identity: FileIdentity,
    parameters: AdjustmentParameters,
    use_disk: bool,
}

#[derive(Debug)]
struct SchedulerState {
    queue: VecDeque<FileIdentity>,
    parameters: HashMap<FileIdentity, AdjustmentParameters>,
    in_flight: HashSet<FileIdentity>,
    stale: HashSet<FileIdentity>,
    /// Files whose disk copy is outdated or about to be removed.
    bypass_disk: HashSet<FileIdentity>,
    cache: MemoryThumbnailCache,
    paused: bool,
    workers: usize,
    subscribers: Vec<mpsc::Sender<ThumbnailEvent>>,
}

impl SchedulerState {
    fn is_idle(&self) -> bool {
        self.workers == 0 && (self.paused || self.queue.is_empty())
    }

    fn dequeue(&mut self, identity: &FileIdentity) {
        self.queue.retain(|queued| queued != identity);
    }

    /// Pop the next job that still needs doing.
    fn next_job(&mut self) -> Option<Job> {
        if self.paused {
            return None;
        }
        while let Some(identity) = self.queue.pop_front() {
            if self.cache.contains(&identity) || self.in_flight.contains(&identity) {
                continue;
            }
            let Some(parameters) = self.parameters.get(&identity).cloned() else {
                continue;
            };
            self.in_flight.insert(identity.clone());
            let use_disk = !self.bypass_disk.remove(&identity);
            return Some(Job {
                identity,
                parameters,
                use_disk,
            });
        }
        None
    }

    fn publish(&mut self, event: ThumbnailEvent) {
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}

struct Inner {
    engine: Arc<ProcessingEngine>,
    disk: Option<Arc<DiskThumbnailCache>>,
    config: ThumbnailConfig,
    state: Mutex<SchedulerState>,
    idle: Condvar,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Generates thumbnails in the background and keeps them in a bounded
/// in-memory cache, backed by the disk cache when one is configured.
#[derive(Clone)]
pub struct ThumbnailScheduler {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ThumbnailScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThumbnailScheduler")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl ThumbnailScheduler {
    pub fn new(
        engine: Arc<ProcessingEngine>,
        disk: Option<Arc<DiskThumbnailCache>>,
        config: &ThumbnailConfig,
    ) -> Self {
        let state = SchedulerState {
            queue: VecDeque::new(),
            parameters: HashMap::new(),
            in_flight: HashSet::new(),
            stale: HashSet::new(),
            bypass_disk: HashSet::new(),
            cache: MemoryThumbnailCache::new(config.memory_count_limit, config.memory_byte_limit),
            paused: false,
            workers: 0,
            subscribers: Vec::new(),
        };
        Self {
            inner: Arc::new(Inner {
                engine,
                disk,
                config: config.clone(),
                state: Mutex::new(state),
                idle: Condvar::new(),
            }),
        }
    }

    // ========================================================================
    // Queue operations
    // ========================================================================

    /// Queue files at the back, skipping those already cached, queued or in
    /// flight. Every file's parameter snapshot is updated either way.
    pub fn schedule(&self, files: impl IntoIterator<Item = (FileIdentity, AdjustmentParameters)>) {
        {
            let mut state = self.inner.lock();
            let mut added = 0usize;
            for (identity, parameters) in files {
                state.parameters.insert(identity.clone(), parameters);
                if state.cache.contains(&identity)
                    || state.in_flight.contains(&identity)
                    || state.queue.contains(&identity)
                {
                    continue;
                }
                state.queue.push_back(identity);
                added += 1;
            }
            tracing::debug!(added, queued = state.queue.len(), "thumbnails scheduled");
        }
        self.pump();
    }

    /// Move a file to the front of the queue and start work.
    ///
    /// No-op for files already cached or in flight, and for files that were
    /// never scheduled (no parameters to render with).
    pub fn request_priority(&self, identity: &FileIdentity) {
        {
            let mut state = self.inner.lock();
            if state.cache.contains(identity) || state.in_flight.contains(identity) {
                return;
            }
            if !state.parameters.contains_key(identity) {
                tracing::debug!(file = %identity, "priority request for unscheduled file");
                return;
            }
            state.dequeue(identity);
            state.queue.push_front(identity.clone());
        }
        self.pump();
    }

    /// Drop every cached copy of a file's thumbnail and render it again
    /// with `parameters`, ahead of the rest of the queue.
    pub fn regenerate(&self, identity: &FileIdentity, parameters: AdjustmentParameters) {
        {
            let mut state = self.inner.lock();
            state.cache.remove(identity);
            state.parameters.insert(identity.clone(), parameters);
            state.bypass_disk.insert(identity.clone());

            if state.in_flight.contains(identity) {
                state.stale.insert(identity.clone());
                tracing::debug!(file = %identity, "in-flight thumbnail marked stale");
            } else {
                state.dequeue(identity);
                state.queue.push_front(identity.clone());
            }
        }
        remove_from_disk(&self.inner, identity);
        self.pump();
    }

    /// Stop starting new jobs. Jobs already running finish.
    pub fn pause(&self) {
        self.inner.lock().paused = true;
    }

    pub fn resume(&self) {
        self.inner.lock().paused = false;
        self.pump();
    }

    pub fn is_paused(&self) -> bool {
        self.inner.lock().paused
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Cached thumbnail, marked as recently used.
    pub fn get(&self, identity: &FileIdentity) -> Option<Arc<FloatImage>> {
        self.inner.lock().cache.get(identity)
    }

    pub fn cached_count(&self) -> usize {
        self.inner.lock().cache.len()
    }

    /// Files waiting to start.
    pub fn queued(&self) -> Vec<FileIdentity> {
        self.inner.lock().queue.iter().cloned().collect()
    }

    pub fn in_flight_count(&self) -> usize {
        self.inner.lock().in_flight.len()
    }

    /// Receive an event for every finished job from now on.
    pub fn subscribe(&self) -> mpsc::Receiver<ThumbnailEvent> {
        let (sender, receiver) = mpsc::channel();
        self.inner.lock().subscribers.push(sender);
        receiver
    }

    /// Block until nothing runs and nothing can start.
    pub fn wait_idle(&self) {
        let state = self.inner.lock();
        let _state = self
            .inner
            .idle
            .wait_while(state, |s| !s.is_idle())
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// [`Self::wait_idle`] with a deadline. Returns whether the scheduler
    /// went idle in time.
    pub fn wait_idle_timeout(&self, timeout: Duration) -> bool {
        let state = self.inner.lock();
        let (state, _) = self
            .inner
            .idle
            .wait_timeout_while(state, timeout, |s| !s.is_idle())
            .unwrap_or_else(PoisonError::into_inner);
        state.is_idle()
    }

    // ========================================================================
    // Workers
    // ========================================================================

    /// Start workers until the concurrency limit or the queue runs out.
    fn pump(&self) {
        let limit = self.inner.config.concurrency.max(1);
        let mut state = self.inner.lock();
        while !state.paused && state.workers < limit && !state.queue.is_empty() {
            state.workers += 1;
            let inner = Arc::clone(&self.inner);
            let spawned = std::thread::Builder::new()
                .name("negafix-thumbnail".into())
                .spawn(move || worker_loop(&inner));
            if let Err(e) = spawned {
                tracing::warn!(error = %e, "failed to start thumbnail worker");
                state.workers -= 1;
                break;
            }
        }
        if state.is_idle() {
            self.inner.idle.notify_all();
        }
    }
}

fn remove_from_disk(inner: &Inner, identity: &FileIdentity) {
    if let Some(disk) = &inner.disk {
        if let Err(e) = disk.remove(identity) {
            tracing::warn!(file = %identity, error = %e, "failed to remove cached thumbnail");
        }
    }
}

fn worker_loop(inner: &Inner) {
    loop {
        let job = {
            let mut state = inner.lock();
            match state.next_job() {
                Some(job) => job,
                None => {
                    state.workers -= 1;
                    if state.is_idle() {
                        inner.idle.notify_all();
                    }
                    return;
                }
            }
        };

        let result = render(inner, &job);
        finish(inner, job, result);
    }
}

/// Produce a thumbnail: disk hit first, then a fresh render.
fn render(inner: &Inner, job: &Job) -> Result<FloatImage, String> {
    let disk_hit = inner
        .disk
        .as_ref()
        .filter(|_| job.use_disk)
        .and_then(|d| d.load_image(&job.identity));
    if let Some(image) = disk_hit {
        tracing::debug!(file = %job.identity, "thumbnail served from disk");
        return Ok(image);
    }

    tracing::debug!(file = %job.identity, "generating thumbnail");
    let image = inner
        .engine
        .render_thumbnail(&job.identity.path(), &job.parameters, inner.config.target_width)
        .map_err(|e| e.to_string())?;

    if let Some(disk) = &inner.disk {
        match disk.save_image(&job.identity, &image, inner.config.jpeg_quality) {
            Ok(()) => {
                let _ = disk.spawn_enforce_size_limit();
            }
            Err(e) => {
                tracing::warn!(file = %job.identity, error = %e, "failed to write thumbnail to disk");
            }
        }
    }
    Ok(image)
}

fn finish(inner: &Inner, job: Job, result: Result<FloatImage, String>) {
    // Parameters changed mid-render; whatever reached the disk is outdated.
    // A regenerate landing after this check removes the copy itself.
    if inner.lock().stale.contains(&job.identity) {
        remove_from_disk(inner, &job.identity);
    }

    let mut state = inner.lock();
    state.in_flight.remove(&job.identity);

    if state.stale.remove(&job.identity) {
        state.bypass_disk.insert(job.identity.clone());
        state.dequeue(&job.identity);
        state.queue.push_front(job.identity);
        return;
    }

    match result {
        Ok(image) => {
            let image = Arc::new(image);
            let evicted = state.cache.insert(job.identity.clone(), Arc::clone(&image));
            if !evicted.is_empty() {
                tracing::debug!(count = evicted.len(), "thumbnails evicted from memory");
            }
            tracing::debug!(file = %job.identity, "thumbnail ready");
            state.publish(ThumbnailEvent::Ready {
                identity: job.identity,
                image,
            });
        }
        Err(message) => {
            tracing::warn!(file = %job.identity, error = %message, "thumbnail generation failed");
            state.publish(ThumbnailEvent::Failed {
                identity: job.identity,
                message,
            });
        }
    }
}
