//! Renderer module for ledplayer
//!
//! The orchestrator only sees [`StreamRenderer`]. The matrix implementation
//! plays pre-converted content streams onto a [`Canvas`], which stands in for
//! the native panel driver.

use crate::media::PlayableEntry;
use crate::player::CancelToken;
use crate::utils::error::Result;

pub mod canvas;
pub mod matrix;
pub mod stream;

pub use canvas::{Canvas, CanvasCounters, SimulatedCanvas};
pub use matrix::MatrixRenderer;
pub use stream::{ContentStream, Frame, StreamHeader};

/// Renderer trait used by the playback orchestrator
pub trait StreamRenderer: Send + Sync {
    /// Render an entry until its play mode completes or `cancel` fires
    ///
    /// Blocks the calling thread. Must leave the display blank on return,
    /// whether playback completed, was cancelled or failed.
    ///
    /// # Returns
    ///
    /// `Ok(())` when playback completed or was cancelled, an error when the
    /// entry could not be played
    fn render(&self, entry: &PlayableEntry, cancel: &CancelToken) -> Result<()>;

    /// Blank the output device
    ///
    /// Best effort; used on shutdown independently of any render loop.
    fn clear(&self);
}
