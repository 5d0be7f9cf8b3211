//! Playable entries and their persisted form

use crate::media::{Brightness, DisplayOptions, MediaKind, PlayMode};
use crate::utils::error::{PlayerError, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Shared handle to an entry.
///
/// Identity (`Arc::ptr_eq`) is what the orchestrator uses to tell whether an
/// entry is the one currently on the panel.
pub type EntryRef = Arc<PlayableEntry>;

/// Settings that may change while the entry is owned by a collection
#[derive(Debug, Clone, PartialEq)]
pub struct EntrySettings {
    /// Eligible for playlist playback
    pub enabled: bool,

    /// Play mode boundary
    pub play_mode: PlayMode,

    /// Brightness while this entry renders
    pub brightness: Brightness,
}

impl Default for EntrySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            play_mode: PlayMode::Forever,
            brightness: Brightness::default(),
        }
    }
}

/// One displayable unit
#[derive(Debug)]
pub struct PlayableEntry {
    name: String,
    kind: MediaKind,
    source: PathBuf,
    display: DisplayOptions,
    settings: RwLock<EntrySettings>,
}

impl PlayableEntry {
    pub fn new(
        name: impl Into<String>,
        kind: MediaKind,
        source: impl Into<PathBuf>,
        display: DisplayOptions,
        settings: EntrySettings,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            source: source.into(),
            display,
            settings: RwLock::new(settings),
        }
    }

    /// Wrap into a shared handle
    pub fn shared(self) -> EntryRef {
        Arc::new(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Content stream backing this entry
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn display(&self) -> &DisplayOptions {
        &self.display
    }

    /// Snapshot of the mutable settings
    pub fn settings(&self) -> EntrySettings {
        self.settings.read().clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.read().enabled
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.settings.write().enabled = enabled;
    }

    pub fn play_mode(&self) -> PlayMode {
        self.settings.read().play_mode
    }

    pub fn brightness(&self) -> Brightness {
        self.settings.read().brightness
    }

    /// Mutate settings in place
    pub fn update<F>(&self, updater: F)
    where
        F: FnOnce(&mut EntrySettings),
    {
        updater(&mut *self.settings.write());
    }

    /// Create an independent copy under a new name and backing file.
    ///
    /// The copy shares nothing with `self`; editing one never affects the other.
    pub fn copy_as(&self, name: impl Into<String>, source: impl Into<PathBuf>) -> PlayableEntry {
        PlayableEntry::new(name, self.kind, source, self.display.clone(), self.settings())
    }

    pub fn to_record(&self) -> EntryRecord {
        let settings = self.settings();
        EntryRecord {
            name: self.name.clone(),
            kind: self.kind,
            source: self.source.clone(),
            display: self.display.clone(),
            enabled: settings.enabled,
            play_mode: settings.play_mode,
            brightness: settings.brightness,
        }
    }

    pub fn from_record(record: EntryRecord) -> Result<Self> {
        if record.name.trim().is_empty() {
            return Err(PlayerError::invalid("entry name must not be empty"));
        }

        Ok(PlayableEntry::new(
            record.name,
            record.kind,
            record.source,
            record.display,
            EntrySettings {
                enabled: record.enabled,
                play_mode: record.play_mode,
                brightness: record.brightness,
            },
        ))
    }
}

/// Serialized form of an entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryRecord {
    pub name: String,
    pub kind: MediaKind,
    pub source: PathBuf,
    pub display: DisplayOptions,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub play_mode: PlayMode,
    #[serde(default)]
    pub brightness: Brightness,
}

fn default_enabled() -> bool {
    true
}

/// Partial edit of an entry's settings
#[derive(Debug, Clone, Default)]
pub struct EntryUpdate {
    pub enabled: Option<bool>,
    pub play_mode: Option<PlayMode>,
    pub brightness: Option<Brightness>,
}

impl EntryUpdate {
    pub fn is_empty(&self) -> bool {
        self.enabled.is_none() && self.play_mode.is_none() && self.brightness.is_none()
    }

    pub fn apply(&self, entry: &PlayableEntry) {
        entry.update(|settings| {
            if let Some(enabled) = self.enabled {
                settings.enabled = enabled;
            }
            if let Some(play_mode) = self.play_mode {
                settings.play_mode = play_mode;
            }
            if let Some(brightness) = self.brightness {
                settings.brightness = brightness;
            }
        });
    }
}
