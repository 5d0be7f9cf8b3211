//! Drawing surface abstraction
//!
//! The native panel driver is reached only through [`Canvas`]: it can draw a
//! full RGB frame, change brightness, blank itself and describe its geometry
//! so streams can be checked before they are played.

use crate::media::DisplayOptions;
use crate::renderer::stream::StreamHeader;
use crate::utils::error::{PlayerError, Result};
use log::{debug, trace};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

/// Output surface trait
pub trait Canvas: Send {
    /// Panel layout the surface was initialised with
    fn options(&self) -> &DisplayOptions;

    /// Set output brightness (0 - 100)
    fn set_brightness(&mut self, percent: u8);

    /// Draw one full RGB frame
    ///
    /// # Arguments
    ///
    /// * `pixels` - `width * height * 3` bytes, row major
    fn draw_frame(&mut self, pixels: &[u8]) -> Result<()>;

    /// Blank the surface
    fn clear(&mut self);

    /// Pixel size of the whole surface
    fn size(&self) -> (u32, u32) {
        let options = self.options();
        (options.width(), options.height())
    }

    /// Check that a stream made for `captured` panels fits this surface
    fn check_compatible(&self, header: &StreamHeader, captured: &DisplayOptions) -> Result<()> {
        let (width, height) = self.size();
        if (header.width, header.height) != (width, height) {
            return Err(PlayerError::UnsupportedFormat(format!(
                "{}x{} stream on a {}x{} panel",
                header.width, header.height, width, height
            )));
        }

        let current = self.options();
        if captured.rows != current.rows
            || captured.cols != current.cols
            || captured.chain_length != current.chain_length
            || captured.parallel != current.parallel
        {
            return Err(PlayerError::UnsupportedFormat(format!(
                "entry was prepared for {}x{} panels ({}x{} chain), panel is {}x{} ({}x{} chain)",
                captured.cols, captured.rows, captured.chain_length, captured.parallel,
                current.cols, current.rows, current.chain_length, current.parallel
            )));
        }

        Ok(())
    }
}

/// Counters of a [`SimulatedCanvas`], readable from other threads
#[derive(Debug, Clone, Default)]
pub struct CanvasCounters {
    frames: Arc<AtomicU64>,
    clears: Arc<AtomicU64>,
    brightness: Arc<AtomicU8>,
}

impl CanvasCounters {
    pub fn frames_drawn(&self) -> u64 {
        self.frames.load(Ordering::SeqCst)
    }

    pub fn clears(&self) -> u64 {
        self.clears.load(Ordering::SeqCst)
    }

    pub fn brightness(&self) -> u8 {
        self.brightness.load(Ordering::SeqCst)
    }
}

/// Headless canvas used when no panel driver is linked in
///
/// Frames are validated and counted, never displayed.
pub struct SimulatedCanvas {
    options: DisplayOptions,
    counters: CanvasCounters,
}

impl SimulatedCanvas {
    pub fn new(options: DisplayOptions) -> Self {
        Self {
            options,
            counters: CanvasCounters::default(),
        }
    }

    pub fn counters(&self) -> CanvasCounters {
        self.counters.clone()
    }
}

impl Canvas for SimulatedCanvas {
    fn options(&self) -> &DisplayOptions {
        &self.options
    }

    fn set_brightness(&mut self, percent: u8) {
        self.counters.brightness.store(percent.min(100), Ordering::SeqCst);
    }

    fn draw_frame(&mut self, pixels: &[u8]) -> Result<()> {
        let (width, height) = self.size();
        let expected = width as usize * height as usize * 3;
        if pixels.len() != expected {
            return Err(PlayerError::Renderer(format!(
                "frame of {} bytes, canvas expects {}",
                pixels.len(),
                expected
            )));
        }

        let n = self.counters.frames.fetch_add(1, Ordering::SeqCst) + 1;
        trace!("Simulated canvas drew frame #{}", n);
        Ok(())
    }

    fn clear(&mut self) {
        self.counters.clears.fetch_add(1, Ordering::SeqCst);
        debug!("Simulated canvas cleared");
    }
}
