//! Cancellation signal for one render-loop activation
//!
//! The source owns the only sender of a zero-capacity channel. Cancelling
//! drops it, which disconnects every token's receiver, so a token blocked in
//! [`CancelToken::wait`] wakes up immediately instead of sleeping out the
//! frame delay.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Owning side; dropping it also cancels
#[derive(Debug)]
pub struct CancelSource {
    cancelled: Arc<AtomicBool>,
    tx: Option<Sender<()>>,
    rx: Receiver<()>,
}

/// Observing side handed to the render loop and the renderer
#[derive(Debug, Clone)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    rx: Receiver<()>,
}

impl CancelSource {
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            tx: Some(tx),
            rx,
        }
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            cancelled: Arc::clone(&self.cancelled),
            rx: self.rx.clone(),
        }
    }

    /// Signal cancellation; idempotent
    pub fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.tx.take();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Default for CancelSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CancelSource {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Sleep for up to `timeout`, returning early when cancelled
    ///
    /// Returns `true` if cancellation was observed.
    pub fn wait(&self, timeout: Duration) -> bool {
        if self.is_cancelled() {
            return true;
        }

        match self.rx.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => self.is_cancelled(),
            // Nobody sends; any wakeup means the sender is gone.
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
        }
    }
}
