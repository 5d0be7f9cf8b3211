//! Change notifications
//!
//! Subscribers are plain callbacks. They are invoked synchronously on the
//! thread that raised the event (usually the render loop) with no player
//! lock held, so a callback may read player state freely but must hand off
//! to another thread before calling a blocking control method.

use crate::media::EntryRef;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Events raised by the playback orchestrator
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    /// A playlist entry failed to render and was disabled in place
    EntryDisabled { entry: EntryRef },
}

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Subscribers<E> {
    next_id: AtomicU64,
    callbacks: Mutex<Vec<(u64, Callback<E>)>>,
}

/// Explicit observer list
pub struct EventDispatcher<E> {
    inner: Arc<Subscribers<E>>,
}

impl<E: 'static> EventDispatcher<E> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Subscribers {
                next_id: AtomicU64::new(1),
                callbacks: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Register `callback`; it stays registered until the returned
    /// subscription is dropped
    pub fn subscribe<F>(&self, callback: F) -> EventSubscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.callbacks.lock().push((id, Arc::new(callback)));

        let weak: Weak<Subscribers<E>> = Arc::downgrade(&self.inner);
        EventSubscription {
            id,
            unsubscribe: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.callbacks.lock().retain(|(sid, _)| *sid != id);
                }
            })),
        }
    }

    /// Deliver `event` to every current subscriber
    pub fn dispatch(&self, event: &E) {
        // Snapshot so callbacks may subscribe or unsubscribe re-entrantly.
        let callbacks: Vec<Callback<E>> = self
            .inner
            .callbacks
            .lock()
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        for callback in callbacks {
            callback(event);
        }
    }
}

impl<E: 'static> Default for EventDispatcher<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for an event subscription; unsubscribes on drop
pub struct EventSubscription {
    id: u64,
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl std::fmt::Debug for EventSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSubscription").field("id", &self.id).finish()
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}
