//! Backing media files
//!
//! Every collection keeps its own copy of the content streams it plays, so
//! deleting an item never touches the library or another playlist.

use crate::utils::error::{IntoPlayerError, Result};
use crate::utils::sanitize_file_stem;
use log::{debug, warn};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Media directory manager
#[derive(Debug, Clone)]
pub struct MediaFiles {
    root: PathBuf,
}

impl MediaFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the files of one collection
    pub fn collection_dir(&self, collection: &str) -> PathBuf {
        self.root.join(sanitize_file_stem(collection))
    }

    /// Copy `source` into `collection`, naming the copy after `name`
    ///
    /// Existing files are never overwritten; a numeric suffix is added instead.
    pub fn import(&self, collection: &str, name: &str, source: &Path) -> Result<PathBuf> {
        let dir = self.collection_dir(collection);
        std::fs::create_dir_all(&dir).storage_err(&format!("Failed to create {:?}", dir))?;

        let stem = sanitize_file_stem(name);
        let extension = source
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("stream");

        let mut target = dir.join(format!("{}.{}", stem, extension));
        let mut suffix = 1;
        while target.exists() {
            target = dir.join(format!("{}-{}.{}", stem, suffix, extension));
            suffix += 1;
        }

        std::fs::copy(source, &target)
            .storage_err(&format!("Failed to copy {:?} to {:?}", source, target))?;
        debug!("Imported {:?} as {:?}", source, target);

        Ok(target)
    }

    /// Delete a backing file owned by this manager
    ///
    /// Paths outside the media root are left alone.
    pub fn remove(&self, path: &Path) -> Result<()> {
        if !path.starts_with(&self.root) {
            warn!("Refusing to delete {:?} outside media root {:?}", path, self.root);
            return Ok(());
        }

        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete every file of a collection
    pub fn remove_collection(&self, collection: &str) -> Result<()> {
        match std::fs::remove_dir_all(self.collection_dir(collection)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
