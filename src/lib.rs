//! ledplayer - playback orchestration for RGB LED matrix panels
//!
//! The crate decides which single piece of content is on the panel at any
//! moment. A background playlist and quick media buttons compete for the
//! display. [`player::PlaybackOrchestrator`] arbitrates between them and
//! drives a [`renderer::StreamRenderer`] on a dedicated render thread.

pub mod media;
pub mod player;
pub mod playlist;
pub mod quick;
pub mod renderer;
pub mod storage;
pub mod utils;

pub use media::{EntryRef, PlayMode, PlayableEntry};
pub use player::{PlaybackOrchestrator, PlayerEvent};
pub use playlist::{PlaylistCollectionManager, PlaylistSequencer, SharedSequencer};
pub use quick::QuickMediaBank;
pub use utils::{Config, PlayerError, Result};
