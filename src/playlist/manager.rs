//! Playlist collection manager
//!
//! Owns every named playlist, the persisted active / editing pointers and
//! the backing media copies. Activation and edits are forwarded to the
//! [`PlaybackOrchestrator`], bracketing changes to the playing playlist with
//! stop and start so the loop never sees a half-edited sequencer.
//!
//! No collection or sequencer lock is held across an orchestrator call:
//! `stop()` joins the render loop, and the loop may be waiting on those
//! locks inside the disabled-entry forwarder.

use crate::media::{EntryRef, EntryUpdate, PlayableEntry};
use crate::player::{EventDispatcher, EventSubscription, PlaybackOrchestrator, PlayerEvent};
use crate::playlist::{PlaylistSequencer, SharedSequencer};
use crate::storage::{CollectionStateRecord, MediaFiles, PlaylistStore};
use crate::utils::error::{PlayerError, Result};
use crate::utils::sanitize_file_stem;
use log::{error, info, warn};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

/// State reachable from the event forwarder on the render loop thread
struct Collection {
    playlists: RwLock<BTreeMap<String, SharedSequencer>>,
    pointers: Mutex<CollectionStateRecord>,
    store: Arc<dyn PlaylistStore>,
    events: EventDispatcher<PlayerEvent>,
}

impl Collection {
    fn get(&self, name: &str) -> Result<SharedSequencer> {
        self.playlists
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| PlayerError::not_found(format!("playlist '{}'", name)))
    }

    fn save(&self, playlist: &SharedSequencer) -> Result<()> {
        let record = playlist.lock().to_record();
        self.store.save_playlist(&record)
    }

    /// Playlist that owns `entry`, by identity
    fn owner_of(&self, entry: &EntryRef) -> Option<SharedSequencer> {
        self.playlists
            .read()
            .values()
            .find(|playlist| playlist.lock().position_of(entry).is_some())
            .cloned()
    }

    fn update_pointers(&self, f: impl FnOnce(&mut CollectionStateRecord)) -> Result<()> {
        let mut pointers = self.pointers.lock();
        f(&mut pointers);
        self.store.save_collection_state(&pointers)
    }

    /// Persist the owner of a disabled entry, then re-raise the event
    fn forward(&self, event: &PlayerEvent) {
        let PlayerEvent::EntryDisabled { entry } = event;
        match self.owner_of(entry) {
            Some(owner) => {
                if let Err(e) = self.save(&owner) {
                    error!("Failed to persist disabled entry '{}': {}", entry.name(), e);
                }
            }
            None => warn!("Disabled entry '{}' belongs to no playlist", entry.name()),
        }
        self.events.dispatch(event);
    }
}

/// Named playlists plus their link to the orchestrator
pub struct PlaylistCollectionManager {
    collection: Arc<Collection>,
    orchestrator: Arc<PlaybackOrchestrator>,
    media: MediaFiles,
    _forwarding: EventSubscription,
}

impl PlaylistCollectionManager {
    /// Load every stored playlist and the persisted pointers
    ///
    /// Playlists that fail to load are skipped with a warning. Playback is
    /// not started; call [`restore`](Self::restore) for that.
    pub fn new(
        orchestrator: Arc<PlaybackOrchestrator>,
        store: Arc<dyn PlaylistStore>,
        media: MediaFiles,
    ) -> Result<Self> {
        let mut playlists = BTreeMap::new();
        for name in store.list_playlists()? {
            let loaded = store
                .load_playlist(&name)
                .and_then(PlaylistSequencer::from_record);
            match loaded {
                Ok(sequencer) => {
                    playlists.insert(name, sequencer.shared());
                }
                Err(e) => warn!("Skipping playlist '{}': {}", name, e),
            }
        }
        info!("Loaded {} playlists", playlists.len());

        let collection = Arc::new(Collection {
            playlists: RwLock::new(playlists),
            pointers: Mutex::new(store.load_collection_state()?),
            store,
            events: EventDispatcher::new(),
        });

        let weak: Weak<Collection> = Arc::downgrade(&collection);
        let forwarding = orchestrator.subscribe(move |event| {
            if let Some(collection) = weak.upgrade() {
                collection.forward(event);
            }
        });

        Ok(Self {
            collection,
            orchestrator,
            media,
            _forwarding: forwarding,
        })
    }

    /// Re-activate the persisted active playlist
    ///
    /// A pointer to a playlist that no longer exists is cleared.
    pub fn restore(&self) -> Result<()> {
        let active = self.collection.pointers.lock().active.clone();
        let Some(name) = active else {
            return Ok(());
        };

        if self.collection.get(&name).is_err() {
            warn!("Active playlist '{}' no longer exists, clearing pointer", name);
            return self.collection.update_pointers(|p| p.active = None);
        }

        self.set_active_playlist_state(true, Some(&name))
    }

    /// Re-raised orchestrator events, after the owning playlist was saved
    pub fn subscribe<F>(&self, callback: F) -> EventSubscription
    where
        F: Fn(&PlayerEvent) + Send + Sync + 'static,
    {
        self.collection.events.subscribe(callback)
    }

    pub fn playlist_names(&self) -> Vec<String> {
        self.collection.playlists.read().keys().cloned().collect()
    }

    pub fn playlist(&self, name: &str) -> Option<SharedSequencer> {
        self.collection.playlists.read().get(name).cloned()
    }

    pub fn active_playlist(&self) -> Option<String> {
        self.collection.pointers.lock().active.clone()
    }

    pub fn editing_playlist(&self) -> Option<String> {
        self.collection.pointers.lock().editing.clone()
    }

    /// Create an empty playlist
    pub fn create_playlist(&self, name: &str) -> Result<SharedSequencer> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PlayerError::invalid("playlist name must not be empty"));
        }

        let sequencer = {
            let mut playlists = self.collection.playlists.write();
            let stem = sanitize_file_stem(name);
            if playlists.keys().any(|existing| sanitize_file_stem(existing) == stem) {
                return Err(PlayerError::invalid(format!("playlist '{}' already exists", name)));
            }

            let sequencer = PlaylistSequencer::new(name).shared();
            playlists.insert(name.to_string(), Arc::clone(&sequencer));
            sequencer
        };

        self.collection.save(&sequencer)?;
        info!("Created playlist '{}'", name);
        Ok(sequencer)
    }

    /// Delete a playlist together with its media copies
    pub fn delete_playlist(&self, name: &str) -> Result<()> {
        self.collection.get(name)?;

        if self.active_playlist().as_deref() == Some(name) {
            self.set_active_playlist_state(false, None)?;
        }
        if self.editing_playlist().as_deref() == Some(name) {
            self.collection.update_pointers(|p| p.editing = None)?;
        }

        self.collection.playlists.write().remove(name);
        self.collection.store.delete_playlist(name)?;
        self.media.remove_collection(name)?;

        info!("Deleted playlist '{}'", name);
        Ok(())
    }

    /// Activate (`enable`) the named playlist, or deactivate playback
    ///
    /// Redundant calls are safe; activating the active playlist restarts it
    /// at its cursor.
    ///
    /// # Arguments
    ///
    /// * `enable` - Whether playlist playback should run at all
    /// * `name` - Playlist to activate; required when `enable` is set
    ///
    /// # Returns
    ///
    /// `NotFound` for an unknown playlist, `InvalidInput` when enabling
    /// without a name
    pub fn set_active_playlist_state(&self, enable: bool, name: Option<&str>) -> Result<()> {
        if !enable {
            self.collection.update_pointers(|p| p.active = None)?;
            self.orchestrator.stop();
            self.orchestrator.load_playlist(None);
            info!("Playlist playback disabled");
            return Ok(());
        }

        let name = name.ok_or_else(|| PlayerError::invalid("no playlist name given"))?;
        let playlist = self.collection.get(name)?;

        self.collection
            .update_pointers(|p| p.active = Some(name.to_string()))?;

        self.orchestrator.stop();
        self.orchestrator.load_playlist(Some(playlist));
        if !self.orchestrator.start() {
            info!("Playlist '{}' is active but has nothing to play yet", name);
        }
        Ok(())
    }

    /// Point the editor at a playlist, or at nothing
    pub fn set_editing_playlist(&self, name: Option<&str>) -> Result<()> {
        if let Some(name) = name {
            self.collection.get(name)?;
        }
        self.collection
            .update_pointers(|p| p.editing = name.map(str::to_string))
    }

    /// Copy `template` into `playlist` at `index`
    ///
    /// The backing file is copied into the playlist's media directory, so
    /// the new entry shares nothing with the template.
    ///
    /// # Arguments
    ///
    /// * `playlist` - Name of the target playlist
    /// * `index` - Insert position; clamped to the end
    /// * `template` - Library entry to copy
    ///
    /// # Returns
    ///
    /// The new entry as stored in the playlist
    pub fn add_item(&self, playlist: &str, index: usize, template: &PlayableEntry) -> Result<EntryRef> {
        let sequencer = self.collection.get(playlist)?;

        let copy = self.media.import(playlist, template.name(), template.source())?;
        let entry = template.copy_as(template.name(), copy).shared();

        self.bracket(&sequencer, |s| s.insert(index, Arc::clone(&entry)));
        self.collection.save(&sequencer)?;

        info!("Added '{}' to playlist '{}'", entry.name(), playlist);
        Ok(entry)
    }

    /// Remove the entry at `index` and delete its backing file
    pub fn remove_item(&self, playlist: &str, index: usize) -> Result<()> {
        let sequencer = self.collection.get(playlist)?;
        check_index(&sequencer, index)?;

        let removed = self
            .bracket(&sequencer, |s| s.remove(index))
            .ok_or_else(|| PlayerError::invalid(format!("no item {} in '{}'", index, playlist)))?;
        self.collection.save(&sequencer)?;
        self.media.remove(removed.source())?;

        info!("Removed '{}' from playlist '{}'", removed.name(), playlist);
        Ok(())
    }

    /// Move the cursor of `playlist` to `index`
    ///
    /// # Returns
    ///
    /// `InvalidInput` when `index` is out of range or the entry is disabled
    pub fn jump_to_item(&self, playlist: &str, index: usize) -> Result<()> {
        let sequencer = self.collection.get(playlist)?;
        check_index(&sequencer, index)?;

        if !self.bracket(&sequencer, |s| s.jump_to(index)) {
            return Err(PlayerError::invalid(format!(
                "item {} of '{}' is disabled",
                index, playlist
            )));
        }
        self.collection.save(&sequencer)
    }

    /// Change an entry's settings in place
    ///
    /// An entry on the panel is restarted so the change shows immediately.
    ///
    /// # Arguments
    ///
    /// * `playlist` - Name of the owning playlist
    /// * `index` - Position of the entry
    /// * `update` - Fields to change; unset fields are kept
    pub fn edit_item(&self, playlist: &str, index: usize, update: EntryUpdate) -> Result<EntryRef> {
        let sequencer = self.collection.get(playlist)?;
        let entry = sequencer
            .lock()
            .get(index)
            .cloned()
            .ok_or_else(|| PlayerError::invalid(format!("no item {} in '{}'", index, playlist)))?;

        if update.is_empty() {
            return Ok(entry);
        }

        if self.orchestrator.is_current_entry(&entry) {
            self.orchestrator.stop();
            update.apply(&entry);
            self.orchestrator.start();
        } else {
            update.apply(&entry);
        }

        self.collection.save(&sequencer)?;
        Ok(entry)
    }

    /// Run `mutate` on `playlist`, stopping and restarting playback around it
    /// when the playlist is the one loaded in the orchestrator
    fn bracket<R>(&self, playlist: &SharedSequencer, mutate: impl FnOnce(&mut PlaylistSequencer) -> R) -> R {
        let playing = self.orchestrator.is_playlist_playing(playlist);
        if playing {
            self.orchestrator.stop();
        }

        let result = mutate(&mut playlist.lock());

        let loaded = self
            .orchestrator
            .loaded_playlist()
            .is_some_and(|loaded| Arc::ptr_eq(&loaded, playlist));
        if playing || (loaded && !self.orchestrator.is_running()) {
            self.orchestrator.start();
        }

        result
    }
}

fn check_index(playlist: &SharedSequencer, index: usize) -> Result<()> {
    let sequencer = playlist.lock();
    if index >= sequencer.len() {
        return Err(PlayerError::invalid(format!(
            "index {} out of range for '{}' ({} items)",
            index,
            sequencer.name(),
            sequencer.len()
        )));
    }
    Ok(())
}
