//! Cursor-based playlist sequencing
//!
//! A [`PlaylistSequencer`] is an ordered list of entries plus a cursor
//! pointing at the entry that is (or would be) on the panel. The cursor is
//! either `None` (idle) or a valid index, and every mutation below keeps it
//! that way.

use crate::media::{EntryRecord, EntryRef, PlayableEntry};
use crate::storage::PlaylistRecord;
use crate::utils::error::Result;
use parking_lot::Mutex;
use std::sync::Arc;

/// Sequencer shared between the collection manager and the orchestrator
pub type SharedSequencer = Arc<Mutex<PlaylistSequencer>>;

/// Ordered playlist with wraparound cursor
#[derive(Debug, Default)]
pub struct PlaylistSequencer {
    name: String,
    entries: Vec<EntryRef>,
    cursor: Option<usize>,
}

impl PlaylistSequencer {
    /// Create an empty, idle sequencer
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
            cursor: None,
        }
    }

    /// Create a sequencer over `entries` with the cursor on the first eligible one
    pub fn with_entries(name: impl Into<String>, entries: Vec<EntryRef>) -> Self {
        let mut sequencer = Self {
            name: name.into(),
            entries,
            cursor: None,
        };
        sequencer.advance();
        sequencer
    }

    /// Wrap into a shared handle
    pub fn shared(self) -> SharedSequencer {
        Arc::new(Mutex::new(self))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[EntryRef] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&EntryRef> {
        self.entries.get(index)
    }

    /// Index of `entry` by identity
    pub fn position_of(&self, entry: &EntryRef) -> Option<usize> {
        self.entries.iter().position(|e| Arc::ptr_eq(e, entry))
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Entry at the cursor, if any and still enabled
    pub fn current(&self) -> Option<EntryRef> {
        self.cursor
            .and_then(|index| self.entries.get(index))
            .filter(|entry| entry.is_enabled())
            .cloned()
    }

    /// Move to the next eligible entry and return it
    ///
    /// Resets the cursor to idle when nothing is eligible.
    pub fn advance(&mut self) -> Option<EntryRef> {
        self.cursor = self.next_eligible_index();
        self.cursor.map(|index| Arc::clone(&self.entries[index]))
    }

    /// Circular scan for the first enabled entry after the cursor
    ///
    /// The scan covers every position exactly once, ending on the cursor
    /// itself, so a lone enabled entry is always found again.
    pub fn next_eligible_index(&self) -> Option<usize> {
        let len = self.entries.len();
        if len == 0 {
            return None;
        }

        let start = self.cursor.map(|c| c + 1).unwrap_or(0);
        (0..len)
            .map(|step| (start + step) % len)
            .find(|&index| self.entries[index].is_enabled())
    }

    /// Whether a fresh activation would find anything to play
    pub fn has_eligible(&self) -> bool {
        self.next_eligible_index().is_some()
    }

    /// Put the cursor on `index` if it exists and is enabled
    pub fn jump_to(&mut self, index: usize) -> bool {
        match self.entries.get(index) {
            Some(entry) if entry.is_enabled() => {
                self.cursor = Some(index);
                true
            }
            _ => false,
        }
    }

    /// Insert `entry` at `index`, clamped to the end
    pub fn insert(&mut self, index: usize, entry: EntryRef) {
        let index = index.min(self.entries.len());
        self.entries.insert(index, entry);

        match self.cursor {
            None => {
                self.advance();
            }
            Some(cursor) if index <= cursor => self.cursor = Some(cursor + 1),
            Some(_) => {}
        }
    }

    /// Append `entry` at the end
    pub fn push(&mut self, entry: EntryRef) {
        self.insert(self.entries.len(), entry);
    }

    /// Remove the entry at `index`
    ///
    /// When the current entry is removed the cursor re-resolves to the entry
    /// that followed it (or idles); otherwise it keeps pointing at the same
    /// logical entry.
    pub fn remove(&mut self, index: usize) -> Option<EntryRef> {
        if index >= self.entries.len() {
            return None;
        }

        let removed = self.entries.remove(index);

        match self.cursor {
            Some(cursor) if cursor == index => {
                self.cursor = cursor.checked_sub(1);
                self.advance();
            }
            Some(cursor) if index < cursor => self.cursor = Some(cursor - 1),
            _ => {}
        }

        if self.entries.is_empty() {
            self.cursor = None;
        }

        Some(removed)
    }

    /// Restore a persisted cursor; out-of-range values idle the cursor
    pub fn restore_cursor(&mut self, cursor: Option<usize>) {
        self.cursor = cursor.filter(|&index| index < self.entries.len());
    }

    pub fn to_record(&self) -> PlaylistRecord {
        PlaylistRecord {
            name: self.name.clone(),
            cursor: self.cursor,
            entries: self.entries.iter().map(|e| e.to_record()).collect(),
        }
    }

    pub fn from_record(record: PlaylistRecord) -> Result<Self> {
        let entries = record
            .entries
            .into_iter()
            .map(|r: EntryRecord| PlayableEntry::from_record(r).map(PlayableEntry::shared))
            .collect::<Result<Vec<_>>>()?;

        let mut sequencer = Self {
            name: record.name,
            entries,
            cursor: None,
        };
        sequencer.restore_cursor(record.cursor);
        Ok(sequencer)
    }
}
