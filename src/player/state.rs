//! Orchestrator state machine
//!
//! Two small tagged enums replace a set of independently nullable slots:
//! [`OverrideQueue`] holds what the buttons asked for and [`PlaybackSlot`]
//! holds what is on the panel right now.

use crate::media::EntryRef;
use std::sync::Arc;

/// Override requests waiting for the render loop
#[derive(Debug, Clone, Default)]
pub enum OverrideQueue {
    /// Nothing requested; the playlist drives the panel
    #[default]
    Empty,

    /// An override waiting to be played
    Pending(EntryRef),

    /// A forever override interrupted by a finite one, waiting to resume
    Suspended(EntryRef),

    /// A finite override queued in front of a suspended forever one
    PendingOverSuspended {
        pending: EntryRef,
        suspended: EntryRef,
    },
}

impl OverrideQueue {
    pub fn is_empty(&self) -> bool {
        matches!(self, OverrideQueue::Empty)
    }

    pub fn pending(&self) -> Option<&EntryRef> {
        match self {
            OverrideQueue::Pending(e) | OverrideQueue::PendingOverSuspended { pending: e, .. } => Some(e),
            _ => None,
        }
    }

    pub fn suspended(&self) -> Option<&EntryRef> {
        match self {
            OverrideQueue::Suspended(e)
            | OverrideQueue::PendingOverSuspended { suspended: e, .. } => Some(e),
            _ => None,
        }
    }

    /// Consume the next override to play
    ///
    /// A pending request plays before a suspended forever entry resumes.
    pub fn take_next(&mut self) -> Option<EntryRef> {
        match std::mem::take(self) {
            OverrideQueue::Empty => None,
            OverrideQueue::Pending(e) | OverrideQueue::Suspended(e) => Some(e),
            OverrideQueue::PendingOverSuspended { pending, suspended } => {
                *self = OverrideQueue::Suspended(suspended);
                Some(pending)
            }
        }
    }

    /// Queue `entry`, replacing any pending request but keeping a suspended one
    pub fn set_pending(&mut self, entry: EntryRef) {
        *self = match std::mem::take(self) {
            OverrideQueue::Suspended(suspended)
            | OverrideQueue::PendingOverSuspended { suspended, .. } => {
                OverrideQueue::PendingOverSuspended {
                    pending: entry,
                    suspended,
                }
            }
            OverrideQueue::Empty | OverrideQueue::Pending(_) => OverrideQueue::Pending(entry),
        };
    }

    /// Park `entry` to resume after the pending request, keeping the pending one
    pub fn suspend(&mut self, entry: EntryRef) {
        *self = match std::mem::take(self) {
            OverrideQueue::Pending(pending)
            | OverrideQueue::PendingOverSuspended { pending, .. } => {
                OverrideQueue::PendingOverSuspended {
                    pending,
                    suspended: entry,
                }
            }
            OverrideQueue::Empty | OverrideQueue::Suspended(_) => OverrideQueue::Suspended(entry),
        };
    }

    /// Drop the pending request, keeping a suspended entry
    pub fn clear_pending(&mut self) {
        *self = match std::mem::take(self) {
            OverrideQueue::Suspended(suspended)
            | OverrideQueue::PendingOverSuspended { suspended, .. } => {
                OverrideQueue::Suspended(suspended)
            }
            OverrideQueue::Empty | OverrideQueue::Pending(_) => OverrideQueue::Empty,
        };
    }

    /// Remove `entry` wherever it is queued; returns whether it was found
    pub fn discard(&mut self, entry: &EntryRef) -> bool {
        let before = std::mem::take(self);
        let (pending, suspended) = match before {
            OverrideQueue::Empty => (None, None),
            OverrideQueue::Pending(p) => (Some(p), None),
            OverrideQueue::Suspended(s) => (None, Some(s)),
            OverrideQueue::PendingOverSuspended { pending, suspended } => {
                (Some(pending), Some(suspended))
            }
        };

        let found = pending
            .iter()
            .chain(suspended.iter())
            .any(|e| Arc::ptr_eq(e, entry));

        let keep = |slot: Option<EntryRef>| slot.filter(|e| !Arc::ptr_eq(e, entry));
        *self = match (keep(pending), keep(suspended)) {
            (None, None) => OverrideQueue::Empty,
            (Some(pending), None) => OverrideQueue::Pending(pending),
            (None, Some(suspended)) => OverrideQueue::Suspended(suspended),
            (Some(pending), Some(suspended)) => {
                OverrideQueue::PendingOverSuspended { pending, suspended }
            }
        };

        found
    }
}

/// What the render loop is currently playing
#[derive(Debug, Clone, Default)]
pub enum PlaybackSlot {
    #[default]
    Idle,

    /// An entry pulled from the loaded playlist
    Playlist(EntryRef),

    /// An entry requested through an override
    Override(EntryRef),
}

impl PlaybackSlot {
    pub fn entry(&self) -> Option<&EntryRef> {
        match self {
            PlaybackSlot::Idle => None,
            PlaybackSlot::Playlist(e) | PlaybackSlot::Override(e) => Some(e),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, PlaybackSlot::Idle)
    }

    pub fn is_override(&self) -> bool {
        matches!(self, PlaybackSlot::Override(_))
    }

    /// Identity check against the entry in the slot
    pub fn holds(&self, entry: &EntryRef) -> bool {
        self.entry().is_some_and(|e| Arc::ptr_eq(e, entry))
    }
}
