//! Quick media buttons
//!
//! Each hardware button owns one slot holding at most one entry. Pressing a
//! button asks the orchestrator to play that entry as an override.

use crate::media::{EntryRecord, EntryRef, PlayableEntry};
use crate::player::PlaybackOrchestrator;
use crate::storage::{MediaFiles, PlaylistStore};
use crate::utils::error::{PlayerError, Result};
use log::{info, warn};
use parking_lot::Mutex;
use std::sync::Arc;

/// Fixed set of button slots
pub struct QuickMediaBank {
    slots: Mutex<Vec<Option<EntryRef>>>,
    orchestrator: Arc<PlaybackOrchestrator>,
    store: Arc<dyn PlaylistStore>,
    media: MediaFiles,
}

impl QuickMediaBank {
    /// Create a bank of `slots` empty slots
    ///
    /// Slot media copies live under `media`, one directory per slot.
    pub fn new(
        slots: usize,
        orchestrator: Arc<PlaybackOrchestrator>,
        store: Arc<dyn PlaylistStore>,
        media: MediaFiles,
    ) -> Self {
        Self {
            slots: Mutex::new(vec![None; slots]),
            orchestrator,
            store,
            media,
        }
    }

    /// Fill the slots from the store
    pub fn load(&self) -> Result<()> {
        let records = self.store.load_quick_media()?;
        let mut slots = self.slots.lock();

        if records.len() > slots.len() {
            warn!(
                "{} quick media slots stored but only {} configured, ignoring the rest",
                records.len(),
                slots.len()
            );
        }

        for (slot, record) in slots.iter_mut().zip(records) {
            *slot = match record.map(PlayableEntry::from_record).transpose() {
                Ok(entry) => entry.map(PlayableEntry::shared),
                Err(e) => {
                    warn!("Dropping unreadable quick media slot: {}", e);
                    None
                }
            };
        }

        info!(
            "Loaded {} of {} quick media slots",
            slots.iter().filter(|s| s.is_some()).count(),
            slots.len()
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entry(&self, slot: usize) -> Option<EntryRef> {
        self.slots.lock().get(slot).cloned().flatten()
    }

    /// Put a copy of `template` into `slot`, replacing the previous occupant
    pub fn assign(&self, slot: usize, template: &PlayableEntry) -> Result<EntryRef> {
        self.check_slot(slot)?;

        let copy = self
            .media
            .import(&slot_dir(slot), template.name(), template.source())?;
        let entry = template.copy_as(template.name(), copy).shared();

        let previous = self.slots.lock()[slot].replace(Arc::clone(&entry));
        if let Some(previous) = previous {
            self.release(&previous)?;
        }

        self.persist()?;
        info!("Quick slot {} now holds '{}'", slot, entry.name());
        Ok(entry)
    }

    /// Empty `slot`; clearing an empty slot is a no-op
    pub fn clear(&self, slot: usize) -> Result<()> {
        self.check_slot(slot)?;

        let previous = self.slots.lock()[slot].take();
        if let Some(previous) = previous {
            self.release(&previous)?;
            self.persist()?;
            info!("Quick slot {} cleared", slot);
        }
        Ok(())
    }

    /// Button press: play the slot's entry as an override
    pub fn press(&self, slot: usize) -> Result<()> {
        self.check_slot(slot)?;

        let entry = self
            .entry(slot)
            .ok_or_else(|| PlayerError::not_found(format!("quick slot {} is empty", slot)))?;

        info!("Quick slot {} pressed ('{}')", slot, entry.name());
        self.orchestrator.trigger_override(entry);
        Ok(())
    }

    fn check_slot(&self, slot: usize) -> Result<()> {
        let len = self.len();
        if slot >= len {
            return Err(PlayerError::invalid(format!(
                "quick slot {} out of range (0 - {})",
                slot,
                len.saturating_sub(1)
            )));
        }
        Ok(())
    }

    /// Take an entry out of playback and delete its media copy
    fn release(&self, entry: &EntryRef) -> Result<()> {
        self.orchestrator.discard_override(entry);
        self.media.remove(entry.source())
    }

    fn persist(&self) -> Result<()> {
        let records: Vec<Option<EntryRecord>> = self
            .slots
            .lock()
            .iter()
            .map(|slot| slot.as_ref().map(|e| e.to_record()))
            .collect();
        self.store.save_quick_media(&records)
    }
}

fn slot_dir(slot: usize) -> String {
    format!("slot-{}", slot)
}
