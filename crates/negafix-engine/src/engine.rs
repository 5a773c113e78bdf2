//! Single-flight, cancellable processing.
//!
//! # State Machine
//!
//! `Idle -> Running -> Completed | Cancelled | Failed`
//!
//! At most one request is live. [`ProcessingEngine::process`] bumps a
//! generation counter, which cancels the previous request: its worker polls
//! the counter after decoding and after every filter and unwinds without
//! touching the engine state. Results are published under the state lock
//! only if their generation is still current, so a superseded request can
//! never overwrite a newer result.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use negafix_core::decode::{analysis_copy, resize_to_width, FilterType};
use negafix_core::{
    compute_histogram, AdjustmentParameters, DecodeError, DecodeSettings, Decoder, FloatImage,
    Histogram, Pipeline,
};

use crate::config::EngineConfig;
use crate::state::FileIdentity;

/// Engine lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
    Completed,
    Cancelled,
    /// The last request's decode failed; its result is the empty image.
    Failed,
}

/// A finished full-resolution result. Buffers are shared and immutable.
#[derive(Debug, Clone)]
pub struct ProcessResult {
    pub identity: FileIdentity,
    pub generation: u64,
    pub image: Arc<FloatImage>,
    pub histogram: Arc<Histogram>,
}

/// How one request ended.
#[derive(Debug, Clone)]
pub enum ProcessOutcome {
    Completed(ProcessResult),
    /// Decoding failed; the published result holds the empty image.
    Failed {
        result: ProcessResult,
        message: String,
    },
    /// Superseded or cancelled before completion. Nothing was published.
    Cancelled,
}

/// Handle to one request.
#[derive(Debug)]
pub struct ProcessTicket {
    generation: u64,
    receiver: mpsc::Receiver<ProcessOutcome>,
}

impl ProcessTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Block until the request finishes.
    pub fn wait(self) -> ProcessOutcome {
        self.receiver.recv().unwrap_or(ProcessOutcome::Cancelled)
    }

    /// Block for at most `timeout`; `None` if still running.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<ProcessOutcome> {
        match self.receiver.recv_timeout(timeout) {
            Ok(outcome) => Some(outcome),
            Err(mpsc::RecvTimeoutError::Timeout) => None,
            Err(mpsc::RecvTimeoutError::Disconnected) => Some(ProcessOutcome::Cancelled),
        }
    }
}

#[derive(Debug)]
struct Status {
    state: EngineState,
    latest: Option<ProcessResult>,
}

#[derive(Debug)]
struct Shared {
    generation: AtomicU64,
    status: Mutex<Status>,
    changed: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Status> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }
}

/// Runs the pipeline for the interactive view and for thumbnails.
pub struct ProcessingEngine {
    decoder: Arc<dyn Decoder>,
    pipeline: Arc<Pipeline>,
    histogram_width: u32,
    shared: Arc<Shared>,
}

impl std::fmt::Debug for ProcessingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessingEngine")
            .field("pipeline", &self.pipeline)
            .field("histogram_width", &self.histogram_width)
            .finish_non_exhaustive()
    }
}

impl ProcessingEngine {
    pub fn new(config: &EngineConfig, decoder: Arc<dyn Decoder>) -> Self {
        Self {
            decoder,
            pipeline: Arc::new(Pipeline::new(config.pipeline_settings())),
            histogram_width: config.processing.histogram_width.max(1),
            shared: Arc::new(Shared {
                generation: AtomicU64::new(0),
                status: Mutex::new(Status {
                    state: EngineState::Idle,
                    latest: None,
                }),
                changed: Condvar::new(),
            }),
        }
    }

    pub fn state(&self) -> EngineState {
        self.shared.lock().state
    }

    /// The most recently published result.
    pub fn latest(&self) -> Option<ProcessResult> {
        self.shared.lock().latest.clone()
    }

    /// Generation of the most recent request.
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::SeqCst)
    }

    /// Start processing `identity`, cancelling any request in flight.
    pub fn process(&self, identity: FileIdentity, params: AdjustmentParameters) -> ProcessTicket {
        let (sender, receiver) = mpsc::channel();

        let generation = {
            let mut status = self.shared.lock();
            let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
            status.state = EngineState::Running;
            generation
        };
        tracing::debug!(file = %identity, generation, "process requested");

        let worker = Worker {
            decoder: Arc::clone(&self.decoder),
            pipeline: Arc::clone(&self.pipeline),
            histogram_width: self.histogram_width,
            shared: Arc::clone(&self.shared),
        };
        let spawned = std::thread::Builder::new()
            .name("negafix-process".into())
            .spawn(move || {
                let outcome = worker.run(identity, params, generation);
                let _ = sender.send(outcome);
            });

        if let Err(e) = spawned {
            tracing::warn!(error = %e, "failed to start processing thread");
            let mut status = self.shared.lock();
            if self.shared.is_current(generation) {
                status.state = EngineState::Cancelled;
            }
            self.shared.changed.notify_all();
        }

        ProcessTicket {
            generation,
            receiver,
        }
    }

    /// Cancel the request in flight, if any.
    pub fn cancel(&self) {
        let mut status = self.shared.lock();
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        if status.state == EngineState::Running {
            status.state = EngineState::Cancelled;
            tracing::debug!("processing cancelled");
        }
        self.shared.changed.notify_all();
    }

    /// Block until the engine is not running. Returns the settled state.
    pub fn wait_idle(&self, timeout: Duration) -> EngineState {
        let status = self.shared.lock();
        let (status, _) = self
            .shared
            .changed
            .wait_timeout_while(status, timeout, |s| s.state == EngineState::Running)
            .unwrap_or_else(PoisonError::into_inner);
        status.state
    }

    /// Render a thumbnail synchronously, outside the single-flight slot.
    ///
    /// The decoded image is downsampled to `target_width` before the
    /// pipeline runs.
    pub fn render_thumbnail(
        &self,
        path: &Path,
        params: &AdjustmentParameters,
        target_width: u32,
    ) -> Result<FloatImage, DecodeError> {
        let decoded = self
            .decoder
            .decode(path, &DecodeSettings::from_parameters(params))?;
        let small = resize_to_width(&decoded, target_width, FilterType::Bilinear)?;
        Ok(self.pipeline.process(small, params))
    }
}

/// State a request's thread needs.
struct Worker {
    decoder: Arc<dyn Decoder>,
    pipeline: Arc<Pipeline>,
    histogram_width: u32,
    shared: Arc<Shared>,
}

impl Worker {
    fn run(
        &self,
        identity: FileIdentity,
        params: AdjustmentParameters,
        generation: u64,
    ) -> ProcessOutcome {
        let is_cancelled = || !self.shared.is_current(generation);

        let decoded = self
            .decoder
            .decode(&identity.path(), &DecodeSettings::from_parameters(&params));
        if is_cancelled() {
            tracing::debug!(file = %identity, generation, "cancelled after decode");
            return ProcessOutcome::Cancelled;
        }

        let (image, failure) = match decoded {
            Ok(image) => (image, None),
            Err(e) => {
                tracing::warn!(file = %identity, error = %e, "decode failed");
                (FloatImage::empty(), Some(e.to_string()))
            }
        };

        let Some(image) = self.pipeline.run(image, &params, is_cancelled) else {
            return ProcessOutcome::Cancelled;
        };

        let histogram = compute_histogram(&analysis_copy(&image, self.histogram_width));
        let result = ProcessResult {
            identity,
            generation,
            image: Arc::new(image),
            histogram: Arc::new(histogram),
        };

        let mut status = self.shared.lock();
        if !self.shared.is_current(generation) {
            return ProcessOutcome::Cancelled;
        }
        status.latest = Some(result.clone());
        let outcome = match failure {
            None => {
                status.state = EngineState::Completed;
                tracing::debug!(file = %result.identity, generation, "processing completed");
                ProcessOutcome::Completed(result)
            }
            Some(message) => {
                status.state = EngineState::Failed;
                ProcessOutcome::Failed { result, message }
            }
        };
        self.shared.changed.notify_all();
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SolidDecoder([f32; 3]);

    impl Decoder for SolidDecoder {
        fn decode(&self, _: &Path, _: &DecodeSettings) -> Result<FloatImage, DecodeError> {
            Ok(FloatImage::filled(8, 4, self.0))
        }
    }

    struct FailingDecoder;

    impl Decoder for FailingDecoder {
        fn decode(&self, path: &Path, _: &DecodeSettings) -> Result<FloatImage, DecodeError> {
            Err(DecodeError::IoError(format!("{} not found", path.display())))
        }
    }

    fn engine(decoder: impl Decoder + 'static) -> ProcessingEngine {
        ProcessingEngine::new(&EngineConfig::default(), Arc::new(decoder))
    }

    #[test]
    fn test_starts_idle() {
        let engine = engine(SolidDecoder([0.5; 3]));
        assert_eq!(engine.state(), EngineState::Idle);
        assert!(engine.latest().is_none());
    }

    #[test]
    fn test_completes_with_histogram() {
        let engine = engine(SolidDecoder([0.2, 0.2, 0.2]));
        let outcome = engine
            .process(FileIdentity::from("a.dng"), AdjustmentParameters::default())
            .wait();
        let ProcessOutcome::Completed(result) = outcome else {
            panic!("expected completion");
        };
        assert_eq!((result.image.width, result.image.height), (8, 4));
        assert!((result.image.pixel(0, 0)[0] - 0.8).abs() < 1e-6);
        assert_eq!(result.histogram.red[204], 32);
        assert_eq!(engine.state(), EngineState::Completed);
        assert_eq!(engine.latest().unwrap().generation, result.generation);
    }

    #[test]
    fn test_decode_failure_yields_empty_image() {
        let engine = engine(FailingDecoder);
        let outcome = engine
            .process(FileIdentity::from("missing.dng"), AdjustmentParameters::default())
            .wait();
        let ProcessOutcome::Failed { result, message } = outcome else {
            panic!("expected failure");
        };
        assert!(result.image.is_empty());
        assert_eq!(result.histogram.total(), 0);
        assert!(message.contains("missing.dng"));
        assert_eq!(engine.state(), EngineState::Failed);
    }

    #[test]
    fn test_cancel_without_request_keeps_state() {
        let engine = engine(SolidDecoder([0.5; 3]));
        engine.cancel();
        assert_eq!(engine.state(), EngineState::Idle);
    }

    #[test]
    fn test_render_thumbnail_downsamples() {
        let engine = engine(SolidDecoder([0.3, 0.3, 0.3]));
        let thumb = engine
            .render_thumbnail(Path::new("a.dng"), &AdjustmentParameters::default(), 4)
            .unwrap();
        assert_eq!((thumb.width, thumb.height), (4, 2));
        assert!((thumb.pixel(1, 1)[0] - 0.7).abs() < 1e-4);
        assert_eq!(engine.state(), EngineState::Idle);
    }

    #[test]
    fn test_generations_increase() {
        let engine = engine(SolidDecoder([0.5; 3]));
        let a = engine.process(FileIdentity::from("a"), AdjustmentParameters::default());
        let b = engine.process(FileIdentity::from("b"), AdjustmentParameters::default());
        assert!(b.generation() > a.generation());
        assert_eq!(engine.generation(), b.generation());
        let _ = a.wait();
        assert!(matches!(b.wait(), ProcessOutcome::Completed(_)));
    }
}
