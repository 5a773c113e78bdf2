//! Editing session against real files and on-disk state.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use negafix_core::{AdjustmentParameters, DecodeError, DecodeSettings, Decoder, FloatImage};
use negafix_engine::{EditSession, EngineConfig, JsonStateStore, SessionEvent, StateStore};

const WAIT: Duration = Duration::from_secs(20);

/// Reads one byte from the file and uses it as the gray level.
struct ByteDecoder;

impl Decoder for ByteDecoder {
    fn decode(&self, path: &Path, _: &DecodeSettings) -> Result<FloatImage, DecodeError> {
        let bytes = std::fs::read(path).map_err(|e| DecodeError::IoError(e.to_string()))?;
        let level = f32::from(*bytes.first().ok_or(DecodeError::InvalidFormat)?) / 255.0;
        Ok(FloatImage::filled(24, 16, [level, level, level]))
    }
}

fn config_file(dir: &Path) -> EngineConfig {
    let toml = format!(
        r#"
[thumbnails]
target_width = 8

[disk_cache]
directory = "{}"

[state]
directory = "{}"
"#,
        dir.join("thumbs").display(),
        dir.join("state").display()
    );
    let path = dir.join("negafix.toml");
    std::fs::write(&path, toml).unwrap();
    EngineConfig::from_file(&path).unwrap()
}

fn wait_for_ready(events: &std::sync::mpsc::Receiver<SessionEvent>) {
    loop {
        match events.recv_timeout(WAIT).unwrap() {
            SessionEvent::ImageReady { .. } => return,
            SessionEvent::LoadFailed { message, .. } => panic!("{message}"),
            SessionEvent::AdjustmentsChanged { .. } => {}
        }
    }
}

#[test]
fn adjustments_persist_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let scan = dir.path().join("frame_01.tif");
    std::fs::write(&scan, [51u8]).unwrap();
    let config = config_file(dir.path());

    {
        let mut session = EditSession::new(&config, Arc::new(ByteDecoder)).unwrap();
        let events = session.subscribe();
        session.open(&scan);
        wait_for_ready(&events);

        session
            .update(|p| {
                p.tone.contrast = 30.0;
                p.color.saturation = -20.0;
            })
            .unwrap();
        session.thumbnails().wait_idle();
    }

    let store = JsonStateStore::new(dir.path().join("state")).unwrap();
    let identity = negafix_engine::FileIdentity::from_path(&scan);
    let saved = store.load(&identity).unwrap();
    assert_eq!(saved.tone.contrast, 30.0);
    assert_eq!(saved.color.saturation, -20.0);

    let mut session = EditSession::new(&config, Arc::new(ByteDecoder)).unwrap();
    let reopened = session.open(&scan);
    assert_eq!(reopened, identity);
    assert_eq!(session.parameters(), Some(&saved));
}

#[test]
fn open_produces_image_histogram_and_thumbnail() {
    let dir = tempfile::tempdir().unwrap();
    let scan = dir.path().join("frame_02.tif");
    std::fs::write(&scan, [204u8]).unwrap();
    let config = config_file(dir.path());

    let mut session = EditSession::new(&config, Arc::new(ByteDecoder)).unwrap();
    let events = session.subscribe();
    let identity = session.open(&scan);
    wait_for_ready(&events);

    let image = session.latest_image().unwrap();
    assert_eq!((image.width, image.height), (24, 16));
    assert!((image.pixel(5, 5)[0] - 0.2).abs() < 1e-5);
    assert_eq!(session.latest_histogram().unwrap().red[51], 24 * 16);

    session.thumbnails().wait_idle();
    let thumb = session.thumbnail(&identity).unwrap();
    assert_eq!((thumb.width, thumb.height), (8, 5));
}

#[test]
fn import_queues_thumbnails_with_stored_parameters() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_file(dir.path());

    let mut paths = Vec::new();
    for (i, level) in [10u8, 128, 250].iter().enumerate() {
        let path = dir.path().join(format!("frame_{i}.tif"));
        std::fs::write(&path, [*level]).unwrap();
        paths.push(path);
    }

    // Pre-seed state for the first frame: no inversion.
    let store = JsonStateStore::new(dir.path().join("state")).unwrap();
    let first = negafix_engine::FileIdentity::from_path(&paths[0]);
    store.save(&first, &AdjustmentParameters::positive()).unwrap();

    let mut session = EditSession::new(&config, Arc::new(ByteDecoder)).unwrap();
    let identities = session.import(&paths);
    assert_eq!(identities.len(), 3);
    session.thumbnails().wait_idle();

    for identity in &identities {
        assert!(session.thumbnail(identity).is_some());
    }
    let positive = session.thumbnail(&first).unwrap();
    // JPEG round trip is not involved for the memory copy.
    assert!((positive.pixel(0, 0)[0] - 10.0 / 255.0).abs() < 1e-4);
}
