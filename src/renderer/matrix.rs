//! Content stream renderer for the LED matrix
//!
//! Plays one entry's stream onto a [`Canvas`], honouring the entry's play
//! mode and brightness, and polling the cancel token between frames.

use crate::media::{PlayMode, PlayableEntry};
use crate::player::CancelToken;
use crate::renderer::canvas::Canvas;
use crate::renderer::stream::ContentStream;
use crate::renderer::StreamRenderer;
use crate::utils::config::Config;
use crate::utils::error::Result;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};

/// Blanks the canvas when dropped, whatever way rendering ends
struct BlankOnExit<'a, C: Canvas> {
    canvas: &'a mut C,
}

impl<C: Canvas> Drop for BlankOnExit<'_, C> {
    fn drop(&mut self) {
        self.canvas.clear();
    }
}

/// Why a render call returned without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Completed,
    Cancelled,
}

/// Renderer driving a single canvas
///
/// The canvas sits behind its own mutex, so render calls never overlap on
/// the hardware even if two callers race.
pub struct MatrixRenderer<C: Canvas> {
    canvas: Mutex<C>,
    global_brightness: AtomicU8,
    image_hold: Duration,
    clear_timeout: Duration,
}

impl<C: Canvas> MatrixRenderer<C> {
    pub fn new(canvas: C, config: &Config) -> Self {
        Self {
            canvas: Mutex::new(canvas),
            global_brightness: AtomicU8::new(config.matrix.brightness.min(100)),
            image_hold: config.playback.image_hold(),
            clear_timeout: config.playback.clear_timeout(),
        }
    }

    /// Set the global brightness relative entries scale from
    ///
    /// Takes effect on the next render.
    pub fn set_global_brightness(&self, percent: u8) {
        self.global_brightness.store(percent.min(100), Ordering::SeqCst);
    }

    pub fn global_brightness(&self) -> u8 {
        self.global_brightness.load(Ordering::SeqCst)
    }

    fn play(
        &self,
        canvas: &mut C,
        stream: &ContentStream,
        mode: PlayMode,
        cancel: &CancelToken,
    ) -> Result<Outcome> {
        let deadline = match mode {
            PlayMode::Duration(secs) => Some(Instant::now() + Duration::from_secs(secs.get() as u64)),
            _ => None,
        };

        let mut passes = 0u32;
        loop {
            for frame in stream.frames() {
                if cancel.is_cancelled() {
                    return Ok(Outcome::Cancelled);
                }

                canvas.draw_frame(&frame.pixels)?;

                let mut wait = frame.delay().unwrap_or(self.image_hold);
                if let Some(deadline) = deadline {
                    wait = wait.min(deadline.saturating_duration_since(Instant::now()));
                }

                if cancel.wait(wait) {
                    return Ok(Outcome::Cancelled);
                }

                if deadline.is_some_and(|d| Instant::now() >= d) {
                    return Ok(Outcome::Completed);
                }
            }

            passes += 1;
            if let PlayMode::Loop(count) = mode {
                if passes >= count.get() {
                    return Ok(Outcome::Completed);
                }
            }
        }
    }
}

impl<C: Canvas> StreamRenderer for MatrixRenderer<C> {
    fn render(&self, entry: &PlayableEntry, cancel: &CancelToken) -> Result<()> {
        let settings = entry.settings();
        let mut canvas = self.canvas.lock();
        let mut guard = BlankOnExit { canvas: &mut *canvas };

        let stream = ContentStream::open(entry.source())?;
        guard.canvas.check_compatible(stream.header(), entry.display())?;

        let brightness = settings.brightness.resolve(self.global_brightness());
        guard.canvas.set_brightness(brightness);

        info!(
            "Rendering '{}' ({}, {} frames, brightness {}%)",
            entry.name(),
            settings.play_mode,
            stream.header().frame_count,
            brightness
        );

        let outcome = self.play(&mut *guard.canvas, &stream, settings.play_mode, cancel)?;
        debug!("Render of '{}' ended: {:?}", entry.name(), outcome);
        Ok(())
    }

    fn clear(&self) {
        match self.canvas.try_lock_for(self.clear_timeout) {
            Some(mut canvas) => canvas.clear(),
            None => warn!(
                "Canvas still busy after {:?}, skipping clear",
                self.clear_timeout
            ),
        }
    }
}
