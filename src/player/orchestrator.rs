//! Playback orchestrator
//!
//! The single authority for what is on the panel. It owns one background
//! render loop at a time and arbitrates between the loaded playlist and
//! override requests coming from buttons or the UI.
//!
//! Every pre-emption is a `stop()` (cancel and join the loop) followed by a
//! `start()`, serialised by a control mutex so overlapping triggers from
//! different threads always see a consistent before/after state.

use crate::media::EntryRef;
use crate::player::cancel::{CancelSource, CancelToken};
use crate::player::events::{EventDispatcher, EventSubscription, PlayerEvent};
use crate::player::state::{OverrideQueue, PlaybackSlot};
use crate::playlist::SharedSequencer;
use crate::renderer::StreamRenderer;
use crate::utils::error::PlayerError;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// State read and written by both the loop and the control methods
#[derive(Default)]
struct LoopState {
    playlist: Option<SharedSequencer>,
    overrides: OverrideQueue,
    slot: PlaybackSlot,
}

struct Shared {
    renderer: Arc<dyn StreamRenderer>,
    state: Mutex<LoopState>,
    running: AtomicBool,
    events: EventDispatcher<PlayerEvent>,
}

/// One activation of the render loop
struct RenderWorker {
    cancel: CancelSource,
    handle: JoinHandle<()>,
}

/// Drives a [`StreamRenderer`] from a playlist and override requests
pub struct PlaybackOrchestrator {
    shared: Arc<Shared>,
    control: Mutex<Option<RenderWorker>>,
}

impl PlaybackOrchestrator {
    pub fn new(renderer: Arc<dyn StreamRenderer>) -> Self {
        Self {
            shared: Arc::new(Shared {
                renderer,
                state: Mutex::new(LoopState::default()),
                running: AtomicBool::new(false),
                events: EventDispatcher::new(),
            }),
            control: Mutex::new(None),
        }
    }

    /// Set or clear the playlist the loop pulls from
    ///
    /// Takes effect on the next `start()`.
    pub fn load_playlist(&self, playlist: Option<SharedSequencer>) {
        match &playlist {
            Some(p) => info!("Loaded playlist '{}'", p.lock().name()),
            None => info!("Unloaded playlist"),
        }
        self.shared.state.lock().playlist = playlist;
    }

    /// Start the render loop
    ///
    /// The first iteration resumes the playlist's current entry; later ones
    /// advance.
    ///
    /// # Returns
    ///
    /// `false` without side effects when the loop is already running or
    /// there is nothing to play
    pub fn start(&self) -> bool {
        let mut control = self.control.lock();
        self.start_locked(&mut control)
    }

    /// Stop the render loop and wait for it to exit
    ///
    /// Safe to call when nothing is running. When this returns, the renderer
    /// has finished its cleanup and the loop thread is gone.
    pub fn stop(&self) {
        let mut control = self.control.lock();
        self.stop_locked(&mut control);
    }

    /// Request `entry` to play now, pre-empting whatever is rendering
    ///
    /// * A forever entry that is already rendering is toggled off.
    /// * A forever entry replaces the pending override. A suspended forever
    ///   entry stays parked and resumes once nothing is pending.
    /// * A finite entry plays next; a forever override it interrupts is
    ///   parked and resumes once the finite entry completes.
    ///
    /// # Arguments
    ///
    /// * `entry` - The entry to play; compared by identity, not by name
    ///
    /// # Returns
    ///
    /// Whether the render loop is running afterwards
    pub fn trigger_override(&self, entry: EntryRef) -> bool {
        let mut control = self.control.lock();
        let current = self.shared.state.lock().slot.clone();

        self.stop_locked(&mut control);

        {
            let mut state = self.shared.state.lock();
            if entry.play_mode().is_forever() {
                if current.holds(&entry) {
                    info!("Override '{}' toggled off", entry.name());
                    state.overrides.clear_pending();
                } else {
                    info!("Override '{}' requested (forever)", entry.name());
                    state.overrides.set_pending(entry);
                }
            } else {
                if let PlaybackSlot::Override(playing) = &current {
                    if playing.play_mode().is_forever() {
                        debug!("Suspending forever override '{}'", playing.name());
                        state.overrides.suspend(Arc::clone(playing));
                    }
                }
                info!("Override '{}' requested ({})", entry.name(), entry.play_mode());
                state.overrides.set_pending(entry);
            }

            debug!(
                "Override queue: pending {:?}, suspended {:?}",
                state.overrides.pending().map(|e| e.name()),
                state.overrides.suspended().map(|e| e.name())
            );
        }

        self.start_locked(&mut control)
    }

    /// Forget every queued request for `entry`
    ///
    /// If `entry` is the override on the panel the loop is restarted so it
    /// falls through to whatever comes next.
    ///
    /// # Returns
    ///
    /// `true` if `entry` was queued or rendering
    pub fn discard_override(&self, entry: &EntryRef) -> bool {
        let mut control = self.control.lock();

        let rendering = {
            let mut state = self.shared.state.lock();
            let queued = state.overrides.discard(entry);
            let rendering = state.slot.is_override() && state.slot.holds(entry);
            if !rendering {
                return queued;
            }
            rendering
        };

        info!("Discarding override '{}' while it renders", entry.name());
        self.stop_locked(&mut control);
        self.start_locked(&mut control);
        rendering
    }

    /// Identity check against the entry on the panel
    pub fn is_current_entry(&self, entry: &EntryRef) -> bool {
        self.shared.state.lock().slot.holds(entry)
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    pub fn current_entry(&self) -> Option<EntryRef> {
        self.shared.state.lock().slot.entry().cloned()
    }

    pub fn now_playing(&self) -> PlaybackSlot {
        self.shared.state.lock().slot.clone()
    }

    pub fn loaded_playlist(&self) -> Option<SharedSequencer> {
        self.shared.state.lock().playlist.clone()
    }

    /// Whether `playlist` is loaded and the loop is running
    pub fn is_playlist_playing(&self, playlist: &SharedSequencer) -> bool {
        let state = self.shared.state.lock();
        self.is_running()
            && state
                .playlist
                .as_ref()
                .is_some_and(|loaded| Arc::ptr_eq(loaded, playlist))
    }

    /// Subscribe to player events
    ///
    /// Callbacks run on the render loop thread. They must not call `start`,
    /// `stop` or `trigger_override` directly.
    ///
    /// # Arguments
    ///
    /// * `callback` - Function called for each event
    ///
    /// # Returns
    ///
    /// A subscription handle; dropping it unsubscribes
    pub fn subscribe<F>(&self, callback: F) -> EventSubscription
    where
        F: Fn(&PlayerEvent) + Send + Sync + 'static,
    {
        self.shared.events.subscribe(callback)
    }

    fn start_locked(&self, worker: &mut Option<RenderWorker>) -> bool {
        {
            let state = self.shared.state.lock();
            if self.shared.running.load(Ordering::SeqCst) {
                info!("Render loop already running");
                return false;
            }

            let playlist_ready = state.playlist.as_ref().is_some_and(|p| {
                let sequencer = p.lock();
                sequencer.current().is_some() || sequencer.has_eligible()
            });
            if state.overrides.is_empty() && !playlist_ready {
                warn!("Nothing eligible to play, render loop not started");
                return false;
            }

            self.shared.running.store(true, Ordering::SeqCst);
        }

        // The previous loop ended on its own; reap it before replacing it.
        if let Some(finished) = worker.take() {
            Self::join(finished);
        }

        let cancel = CancelSource::new();
        let token = cancel.token();
        let shared = Arc::clone(&self.shared);

        let spawned = thread::Builder::new()
            .name("render-loop".to_string())
            .spawn(move || render_loop(shared, token));

        match spawned {
            Ok(handle) => {
                *worker = Some(RenderWorker { cancel, handle });
                debug!("Render loop started");
                true
            }
            Err(e) => {
                error!("Failed to spawn render loop: {}", e);
                self.shared.running.store(false, Ordering::SeqCst);
                false
            }
        }
    }

    fn stop_locked(&self, worker: &mut Option<RenderWorker>) {
        if let Some(active) = worker.take() {
            Self::join(active);
            debug!("Render loop stopped");
        }

        let mut state = self.shared.state.lock();
        state.slot = PlaybackSlot::Idle;
        self.shared.running.store(false, Ordering::SeqCst);
    }

    fn join(worker: RenderWorker) {
        let RenderWorker { mut cancel, handle } = worker;
        cancel.cancel();
        if handle.join().is_err() {
            error!("Render loop thread panicked");
        }
    }
}

impl Drop for PlaybackOrchestrator {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Pick what to render next
///
/// Overrides win over the playlist. On the first iteration after a fresh
/// start the sequencer's current entry is resumed instead of advanced past.
fn resolve(state: &mut LoopState, first_iteration: bool) -> PlaybackSlot {
    if let Some(entry) = state.overrides.take_next() {
        return PlaybackSlot::Override(entry);
    }

    let Some(playlist) = state.playlist.as_ref() else {
        return PlaybackSlot::Idle;
    };

    let mut sequencer = playlist.lock();
    let next = if first_iteration {
        sequencer.current().or_else(|| sequencer.advance())
    } else {
        sequencer.advance()
    };

    next.map_or(PlaybackSlot::Idle, PlaybackSlot::Playlist)
}

fn render_loop(shared: Arc<Shared>, cancel: CancelToken) {
    let mut first_iteration = true;

    while !cancel.is_cancelled() {
        let slot = {
            let mut state = shared.state.lock();
            let slot = resolve(&mut state, std::mem::take(&mut first_iteration));
            state.slot = slot.clone();
            if slot.is_idle() {
                shared.running.store(false, Ordering::SeqCst);
            }
            slot
        };

        let Some(entry) = slot.entry() else {
            info!("Nothing left to play, render loop idle");
            return;
        };

        let result = panic::catch_unwind(AssertUnwindSafe(|| shared.renderer.render(entry, &cancel)))
            .unwrap_or_else(|_| Err(PlayerError::Internal("renderer panicked".to_string())));

        if let Err(e) = result {
            if slot.is_override() {
                error!("Override '{}' failed to render: {}", entry.name(), e);
            } else {
                error!("Playlist entry '{}' failed to render, disabling it: {}", entry.name(), e);
                entry.set_enabled(false);
                shared.events.dispatch(&PlayerEvent::EntryDisabled {
                    entry: Arc::clone(entry),
                });
            }
        }
    }

    debug!("Render loop cancelled");
}
