//! Integration test utilities for ledplayer
//!
//! This module provides common utilities for integration testing including:
//! - A recording renderer that logs call order and overlap
//! - Content stream generation for the real matrix renderer
//! - Test fixtures and polling helpers

use anyhow::Result;
use ledplayer::media::{DisplayOptions, EntrySettings, MediaKind, PlayMode};
use ledplayer::player::CancelToken;
use ledplayer::renderer::{ContentStream, Frame, StreamRenderer};
use ledplayer::storage::{JsonStore, MediaFiles, PlaylistStore};
use ledplayer::{EntryRef, PlayableEntry, PlayerError};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Panel layout used by every fixture
pub fn panel() -> DisplayOptions {
    DisplayOptions {
        rows: 4,
        cols: 8,
        chain_length: 1,
        parallel: 1,
        hardware_mapping: "regular".to_string(),
    }
}

/// Entry with no backing file, for renderers that never open it
pub fn entry(name: &str, play_mode: PlayMode) -> EntryRef {
    PlayableEntry::new(
        name,
        MediaKind::Animation,
        format!("/nonexistent/{}.stream", name),
        panel(),
        EntrySettings {
            play_mode,
            ..Default::default()
        },
    )
    .shared()
}

pub fn loops(count: u32) -> PlayMode {
    PlayMode::loops(count).unwrap_or(PlayMode::Forever)
}

/// Poll `condition` for up to five seconds
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    false
}

/// Renderer fake that records every call in order
///
/// Log lines look like `render-start:A`, `cancel-observed:A`, `cleanup:A`.
/// Forever entries hold until cancelled; a `Loop(n)` entry takes `n` passes
/// of 20ms.
pub struct RecordingRenderer {
    log: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    pass_time: Duration,
}

impl RecordingRenderer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            log: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            pass_time: Duration::from_millis(20),
        })
    }

    /// Make every render of `name` fail
    pub fn fail_on(&self, name: &str) {
        self.failing.lock().insert(name.to_string());
    }

    /// Append a line from the test itself, to interleave with renderer calls
    pub fn record(&self, line: impl Into<String>) {
        self.log.lock().push(line.into());
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    /// Names of rendered entries, in start order
    pub fn started(&self) -> Vec<String> {
        self.log
            .lock()
            .iter()
            .filter_map(|line| line.strip_prefix("render-start:"))
            .map(str::to_string)
            .collect()
    }

    /// Largest number of overlapping render calls seen
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl StreamRenderer for RecordingRenderer {
    fn render(&self, entry: &PlayableEntry, cancel: &CancelToken) -> ledplayer::Result<()> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let name = entry.name();
        self.record(format!("render-start:{}", name));

        let result = if self.failing.lock().contains(name) {
            Err(PlayerError::Renderer(format!("{} refused to render", name)))
        } else {
            let cancelled = match entry.play_mode() {
                PlayMode::Forever => {
                    while !cancel.wait(Duration::from_secs(10)) {}
                    true
                }
                PlayMode::Loop(count) => cancel.wait(self.pass_time * count.get()),
                PlayMode::Duration(secs) => cancel.wait(Duration::from_secs(secs.get() as u64)),
            };
            if cancelled {
                self.record(format!("cancel-observed:{}", name));
            }
            Ok(())
        };

        self.record(format!("cleanup:{}", name));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn clear(&self) {
        self.record("clear");
    }
}

/// Write a content stream of `frames` solid frames sized for `options`
pub fn write_stream(path: &Path, options: &DisplayOptions, frames: usize, delay_ms: u32) -> Result<()> {
    let frame_len = (options.width() * options.height() * 3) as usize;
    let frames = (0..frames)
        .map(|i| Frame {
            delay_ms,
            pixels: vec![(i * 40) as u8; frame_len],
        })
        .collect();
    ContentStream::new(options.width(), options.height(), frames)?.write(path)?;
    Ok(())
}

/// Test fixture for integration tests
pub struct TestFixture {
    pub temp_dir: TempDir,
}

impl TestFixture {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
        })
    }

    /// Get the path to the temporary directory
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.path().join("data")
    }

    pub fn store(&self) -> Result<Arc<dyn PlaylistStore>> {
        Ok(Arc::new(JsonStore::open(self.data_dir())?))
    }

    pub fn playlist_media(&self) -> MediaFiles {
        MediaFiles::new(self.data_dir().join("media"))
    }

    pub fn quick_media(&self) -> MediaFiles {
        MediaFiles::new(self.data_dir().join("quick_media"))
    }

    /// Library entry backed by a real two-frame stream
    pub fn template(&self, name: &str, play_mode: PlayMode) -> Result<PlayableEntry> {
        self.template_for(name, play_mode, &panel())
    }

    /// Library entry whose stream and captured options match `options`
    pub fn template_for(&self, name: &str, play_mode: PlayMode, options: &DisplayOptions) -> Result<PlayableEntry> {
        let library = self.path().join("library");
        std::fs::create_dir_all(&library)?;

        let source = library.join(format!("{}.stream", name));
        write_stream(&source, options, 2, 5)?;

        Ok(PlayableEntry::new(
            name,
            MediaKind::Animation,
            source,
            options.clone(),
            EntrySettings {
                play_mode,
                ..Default::default()
            },
        ))
    }
}
