//! Editing session: the registry of open files, the active file and the
//! engine and scheduler working on them.
//!
//! Every change to the active file's adjustments is saved to the store
//! before anything else happens, then the file is re-processed and its
//! thumbnail regenerated. Results arrive as [`SessionEvent`]s.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{mpsc, Arc, Mutex, PoisonError};

use negafix_core::{AdjustmentParameters, Decoder, FloatImage, Histogram};

use crate::config::EngineConfig;
use crate::disk_cache::DiskThumbnailCache;
use crate::engine::{ProcessOutcome, ProcessingEngine};
use crate::error::SessionError;
use crate::state::{FileIdentity, ImageState};
use crate::store::{JsonStateStore, MemoryStateStore, StateStore};
use crate::thumbnail::ThumbnailScheduler;

#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The active file's parameters changed and were saved.
    AdjustmentsChanged {
        identity: FileIdentity,
        parameters: AdjustmentParameters,
    },
    /// A full-resolution result was published.
    ImageReady {
        identity: FileIdentity,
        generation: u64,
    },
    /// Decoding failed; the published result is the empty image.
    LoadFailed {
        identity: FileIdentity,
        message: String,
    },
}

type Subscribers = Arc<Mutex<Vec<mpsc::Sender<SessionEvent>>>>;

fn broadcast(subscribers: &Subscribers, event: SessionEvent) {
    subscribers
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .retain(|subscriber| subscriber.send(event.clone()).is_ok());
}

pub struct EditSession {
    store: Arc<dyn StateStore>,
    engine: Arc<ProcessingEngine>,
    scheduler: ThumbnailScheduler,
    states: HashMap<FileIdentity, ImageState>,
    active: Option<FileIdentity>,
    subscribers: Subscribers,
}

impl std::fmt::Debug for EditSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSession")
            .field("active", &self.active)
            .field("open_files", &self.states.len())
            .finish_non_exhaustive()
    }
}

impl EditSession {
    /// Build a session from configuration.
    ///
    /// State is persisted as JSON when `state.directory` is set and kept in
    /// memory otherwise. The disk thumbnail cache is enabled by
    /// `disk_cache.directory`.
    pub fn new(config: &EngineConfig, decoder: Arc<dyn Decoder>) -> Result<Self, SessionError> {
        let store: Arc<dyn StateStore> = match &config.state.directory {
            Some(dir) => Arc::new(JsonStateStore::new(dir)?),
            None => Arc::new(MemoryStateStore::new()),
        };
        Self::with_store(config, decoder, store)
    }

    pub fn with_store(
        config: &EngineConfig,
        decoder: Arc<dyn Decoder>,
        store: Arc<dyn StateStore>,
    ) -> Result<Self, SessionError> {
        let disk = DiskThumbnailCache::from_config(&config.disk_cache)?;
        let engine = Arc::new(ProcessingEngine::new(config, decoder));
        let scheduler = ThumbnailScheduler::new(Arc::clone(&engine), disk, &config.thumbnails);
        Ok(Self {
            store,
            engine,
            scheduler,
            states: HashMap::new(),
            active: None,
            subscribers: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn engine(&self) -> &ProcessingEngine {
        &self.engine
    }

    pub fn thumbnails(&self) -> &ThumbnailScheduler {
        &self.scheduler
    }

    pub fn subscribe(&self) -> mpsc::Receiver<SessionEvent> {
        let (sender, receiver) = mpsc::channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sender);
        receiver
    }

    // ========================================================================
    // Files
    // ========================================================================

    /// The state for `identity`, loading it from the store on first use.
    fn state_for(&mut self, identity: &FileIdentity) -> &mut ImageState {
        let store = &self.store;
        self.states.entry(identity.clone()).or_insert_with(|| {
            match store.load(identity) {
                Some(parameters) => ImageState::with_parameters(identity.clone(), parameters),
                None => ImageState::new(identity.clone()),
            }
        })
    }

    /// Register files for browsing and queue their thumbnails.
    pub fn import<P: AsRef<Path>>(&mut self, paths: &[P]) -> Vec<FileIdentity> {
        let mut jobs = Vec::with_capacity(paths.len());
        for path in paths {
            let identity = FileIdentity::from_path(path.as_ref());
            let parameters = self.state_for(&identity).parameters.clone();
            jobs.push((identity, parameters));
        }
        let identities = jobs.iter().map(|(id, _)| id.clone()).collect();
        self.scheduler.schedule(jobs);
        identities
    }

    /// Make `path` the active file and start processing it.
    pub fn open(&mut self, path: &Path) -> FileIdentity {
        let identity = FileIdentity::from_path(path);
        let parameters = self.state_for(&identity).parameters.clone();
        tracing::info!(file = %identity, "opening file");

        self.active = Some(identity.clone());
        self.scheduler.schedule([(identity.clone(), parameters.clone())]);
        self.scheduler.request_priority(&identity);
        self.process(identity.clone(), parameters);
        identity
    }

    pub fn active(&self) -> Option<&FileIdentity> {
        self.active.as_ref()
    }

    /// Parameters of the active file.
    pub fn parameters(&self) -> Option<&AdjustmentParameters> {
        let identity = self.active.as_ref()?;
        self.states.get(identity).map(|state| &state.parameters)
    }

    /// Parameters of any registered file.
    pub fn parameters_of(&self, identity: &FileIdentity) -> Option<&AdjustmentParameters> {
        self.states.get(identity).map(|state| &state.parameters)
    }

    // ========================================================================
    // Edits
    // ========================================================================

    /// Change the active file's parameters.
    ///
    /// The new parameters are saved first; if saving fails nothing changes.
    /// An edit that leaves the parameters equal is a no-op.
    pub fn update<F>(&mut self, edit: F) -> Result<(), SessionError>
    where
        F: FnOnce(&mut AdjustmentParameters),
    {
        let identity = self.active.clone().ok_or(SessionError::NoActiveFile)?;
        let state = self.state_for(&identity);
        let mut parameters = state.parameters.clone();
        edit(&mut parameters);
        if parameters == state.parameters {
            return Ok(());
        }

        if let Err(e) = self.store.save(&identity, &parameters) {
            tracing::warn!(file = %identity, error = %e, "failed to save adjustments");
            return Err(e.into());
        }
        self.state_for(&identity).parameters = parameters.clone();

        broadcast(
            &self.subscribers,
            SessionEvent::AdjustmentsChanged {
                identity: identity.clone(),
                parameters: parameters.clone(),
            },
        );
        self.scheduler.regenerate(&identity, parameters.clone());
        self.process(identity, parameters);
        Ok(())
    }

    /// Restore the active file's defaults.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.update(|parameters| *parameters = AdjustmentParameters::default())
    }

    // ========================================================================
    // Results
    // ========================================================================

    /// Latest full-resolution image of the active file.
    pub fn latest_image(&self) -> Option<Arc<FloatImage>> {
        let result = self.engine.latest()?;
        (Some(&result.identity) == self.active.as_ref()).then_some(result.image)
    }

    /// Histogram of [`Self::latest_image`].
    pub fn latest_histogram(&self) -> Option<Arc<Histogram>> {
        let result = self.engine.latest()?;
        (Some(&result.identity) == self.active.as_ref()).then_some(result.histogram)
    }

    pub fn thumbnail(&self, identity: &FileIdentity) -> Option<Arc<FloatImage>> {
        self.scheduler.get(identity)
    }

    /// Start processing and forward the outcome to subscribers.
    fn process(&self, identity: FileIdentity, parameters: AdjustmentParameters) {
        let ticket = self.engine.process(identity, parameters);
        let subscribers = Arc::clone(&self.subscribers);
        let spawned = std::thread::Builder::new()
            .name("negafix-session-watch".into())
            .spawn(move || match ticket.wait() {
                ProcessOutcome::Completed(result) => broadcast(
                    &subscribers,
                    SessionEvent::ImageReady {
                        identity: result.identity,
                        generation: result.generation,
                    },
                ),
                ProcessOutcome::Failed { result, message } => broadcast(
                    &subscribers,
                    SessionEvent::LoadFailed {
                        identity: result.identity,
                        message,
                    },
                ),
                ProcessOutcome::Cancelled => {}
            });
        if let Err(e) = spawned {
            tracing::warn!(error = %e, "failed to watch processing request");
        }
    }
}
