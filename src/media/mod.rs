//! Media model for ledplayer
//!
//! Everything the panel can show is a [`PlayableEntry`]: a still image or an
//! animation, pre-converted into a content stream, together with the play
//! mode and brightness it should be shown with.

mod entry;

pub use entry::{EntryRecord, EntryRef, EntrySettings, EntryUpdate, PlayableEntry};

use crate::utils::error::{PlayerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;

/// Kind of media behind an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// Single still frame
    Image,

    /// Multi-frame animation
    Animation,
}

/// How long an entry keeps the panel once it starts rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum PlayMode {
    /// Until something pre-empts it
    Forever,

    /// A fixed number of passes over the stream
    Loop(NonZeroU32),

    /// A fixed number of seconds
    Duration(NonZeroU32),
}

impl PlayMode {
    /// Build a play mode from its loosely typed parts (form fields, CLI)
    ///
    /// The value is ignored for `forever` and must be positive otherwise.
    pub fn from_parts(mode: &str, value: i64) -> Result<Self> {
        let positive = || {
            u32::try_from(value)
                .ok()
                .and_then(NonZeroU32::new)
                .ok_or_else(|| PlayerError::invalid(format!("play mode value must be positive, got {}", value)))
        };

        match mode.to_ascii_lowercase().as_str() {
            "forever" => Ok(PlayMode::Forever),
            "loop" => Ok(PlayMode::Loop(positive()?)),
            "duration" => Ok(PlayMode::Duration(positive()?)),
            other => Err(PlayerError::invalid(format!("unknown play mode '{}'", other))),
        }
    }

    pub fn loops(count: u32) -> Option<Self> {
        NonZeroU32::new(count).map(PlayMode::Loop)
    }

    pub fn seconds(secs: u32) -> Option<Self> {
        NonZeroU32::new(secs).map(PlayMode::Duration)
    }

    pub fn is_forever(&self) -> bool {
        matches!(self, PlayMode::Forever)
    }
}

impl fmt::Display for PlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayMode::Forever => write!(f, "forever"),
            PlayMode::Loop(n) => write!(f, "loop x{}", n),
            PlayMode::Duration(secs) => {
                let secs = secs.get();
                match secs / 3600 {
                    0 => write!(f, "for {}:{:02}", secs / 60, secs % 60),
                    h => write!(f, "for {}h{:02}m", h, (secs % 3600) / 60),
                }
            }
        }
    }
}

/// Brightness of an entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Brightness {
    /// Fixed percentage, ignoring the global setting
    Absolute(u8),

    /// Factor applied to the global brightness
    Relative(f32),
}

impl Default for Brightness {
    fn default() -> Self {
        Brightness::Relative(1.0)
    }
}

impl Brightness {
    /// Effective brightness percentage given the global setting
    pub fn resolve(&self, global: u8) -> u8 {
        let percent = match *self {
            Brightness::Absolute(p) => p as f32,
            Brightness::Relative(factor) => global as f32 * factor.max(0.0),
        };
        percent.round().clamp(0.0, 100.0) as u8
    }
}

/// Matrix options captured when an entry is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayOptions {
    pub rows: u32,
    pub cols: u32,
    pub chain_length: u32,
    pub parallel: u32,
    pub hardware_mapping: String,
}

impl DisplayOptions {
    /// Width of the whole chained surface in pixels
    pub fn width(&self) -> u32 {
        self.cols * self.chain_length
    }

    /// Height of the whole surface in pixels
    pub fn height(&self) -> u32 {
        self.rows * self.parallel
    }
}
