//! Playback orchestration for ledplayer
//!
//! This module decides which single entry is on the panel at any moment. It
//! owns the background render loop, the override queue fed by quick media
//! buttons, and the change notifications raised when a playlist entry fails.

pub mod cancel;
pub mod events;
pub mod orchestrator;
pub mod state;

pub use cancel::{CancelSource, CancelToken};
pub use events::{EventDispatcher, EventSubscription, PlayerEvent};
pub use orchestrator::PlaybackOrchestrator;
pub use state::{OverrideQueue, PlaybackSlot};
