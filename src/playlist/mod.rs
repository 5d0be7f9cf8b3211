//! Playlists for ledplayer
//!
//! [`PlaylistSequencer`] is the ordered list with its play cursor;
//! [`PlaylistCollectionManager`] owns every named playlist and forwards
//! activation and edits to the playback orchestrator.

mod manager;
mod sequencer;

pub use manager::PlaylistCollectionManager;
pub use sequencer::{PlaylistSequencer, SharedSequencer};
