//! Persistence for playlists, collection pointers and quick media
//!
//! The core only asks for "save now" / "load by name"; how the records hit
//! the disk is up to the [`PlaylistStore`] implementation.

mod json_store;
mod media_files;

pub use json_store::JsonStore;
pub use media_files::MediaFiles;

use crate::media::EntryRecord;
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};

/// Persisted playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistRecord {
    pub name: String,
    #[serde(default)]
    pub cursor: Option<usize>,
    #[serde(default)]
    pub entries: Vec<EntryRecord>,
}

/// Persisted active / editing pointers of the collection manager
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStateRecord {
    pub active: Option<String>,
    pub editing: Option<String>,
}

/// Storage backend trait
pub trait PlaylistStore: Send + Sync {
    /// Names of all stored playlists
    fn list_playlists(&self) -> Result<Vec<String>>;

    /// Load one playlist by name
    fn load_playlist(&self, name: &str) -> Result<PlaylistRecord>;

    /// Create or overwrite a playlist
    fn save_playlist(&self, record: &PlaylistRecord) -> Result<()>;

    /// Delete a playlist; deleting a missing playlist is not an error
    fn delete_playlist(&self, name: &str) -> Result<()>;

    /// Load collection pointers, defaulting when nothing was saved yet
    fn load_collection_state(&self) -> Result<CollectionStateRecord>;

    fn save_collection_state(&self, state: &CollectionStateRecord) -> Result<()>;

    /// Load quick media slots, empty when nothing was saved yet
    fn load_quick_media(&self) -> Result<Vec<Option<EntryRecord>>>;

    fn save_quick_media(&self, slots: &[Option<EntryRecord>]) -> Result<()>;
}
