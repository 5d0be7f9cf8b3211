//! JSON file store
//!
//! Layout under the data directory:
//!
//! ```text
//! collection.json
//! quick_media.json
//! playlists/<name>.json
//! ```

use crate::media::EntryRecord;
use crate::storage::{CollectionStateRecord, PlaylistRecord, PlaylistStore};
use crate::utils::error::{IntoPlayerError, PlayerError, Result};
use crate::utils::sanitize_file_stem;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const COLLECTION_FILE: &str = "collection.json";
const QUICK_MEDIA_FILE: &str = "quick_media.json";
const PLAYLIST_DIR: &str = "playlists";

/// Store backed by pretty-printed JSON files
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    /// Open (and create if needed) a store rooted at `root`
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(root.join(PLAYLIST_DIR))
            .storage_err(&format!("Failed to create data directory {:?}", root))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn playlist_path(&self, name: &str) -> PathBuf {
        self.root
            .join(PLAYLIST_DIR)
            .join(format!("{}.json", sanitize_file_stem(name)))
    }

    fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        match std::fs::read_to_string(path) {
            Ok(data) => Ok(Some(serde_json::from_str(&data)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write through a temporary file so a crash never leaves half a record
    fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
        let data = serde_json::to_string_pretty(value)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, data)?;
        std::fs::rename(&tmp, path)?;
        debug!("Saved {:?}", path);
        Ok(())
    }
}

impl PlaylistStore for JsonStore {
    fn list_playlists(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();

        for dir_entry in std::fs::read_dir(self.root.join(PLAYLIST_DIR))? {
            let path = dir_entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            match Self::read_json::<PlaylistRecord>(&path) {
                Ok(Some(record)) => names.push(record.name),
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable playlist file {:?}: {}", path, e),
            }
        }

        names.sort();
        Ok(names)
    }

    fn load_playlist(&self, name: &str) -> Result<PlaylistRecord> {
        Self::read_json(&self.playlist_path(name))?
            .ok_or_else(|| PlayerError::not_found(format!("playlist '{}'", name)))
    }

    fn save_playlist(&self, record: &PlaylistRecord) -> Result<()> {
        Self::write_json(&self.playlist_path(&record.name), record)
    }

    fn delete_playlist(&self, name: &str) -> Result<()> {
        match std::fs::remove_file(self.playlist_path(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn load_collection_state(&self) -> Result<CollectionStateRecord> {
        Ok(Self::read_json(&self.root.join(COLLECTION_FILE))?.unwrap_or_default())
    }

    fn save_collection_state(&self, state: &CollectionStateRecord) -> Result<()> {
        Self::write_json(&self.root.join(COLLECTION_FILE), state)
    }

    fn load_quick_media(&self) -> Result<Vec<Option<EntryRecord>>> {
        Ok(Self::read_json(&self.root.join(QUICK_MEDIA_FILE))?.unwrap_or_default())
    }

    fn save_quick_media(&self, slots: &[Option<EntryRecord>]) -> Result<()> {
        Self::write_json(&self.root.join(QUICK_MEDIA_FILE), slots)
    }
}
