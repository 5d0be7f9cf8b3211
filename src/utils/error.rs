//! Error types for ledplayer
//!
//! This module defines the error type shared by the sequencer, the
//! orchestrator, the renderer and the storage layer. We use thiserror for
//! the library error and anyhow only at the binary boundary.

use thiserror::Error;

/// Main error type for ledplayer
#[derive(Error, Debug)]
pub enum PlayerError {
    /// Renderer / canvas errors
    #[error("Renderer error: {0}")]
    Renderer(String),

    /// Content stream parsing errors
    #[error("Stream error: {0}")]
    Stream(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Playlist / state persistence errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// File I/O errors
    #[error("File error: {0}")]
    FileIO(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Stream does not fit the panel it is played on
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Generic error for unexpected situations
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlayerError {
    pub fn not_found<S: Into<String>>(what: S) -> Self {
        PlayerError::NotFound(what.into())
    }

    pub fn invalid<S: Into<String>>(msg: S) -> Self {
        PlayerError::InvalidInput(msg.into())
    }
}

/// Convenience type alias for Results in ledplayer
pub type Result<T> = std::result::Result<T, PlayerError>;

/// Extension trait for converting other errors to PlayerError
pub trait IntoPlayerError<T> {
    /// Convert this error into a PlayerError with the given context
    fn stream_err(self, context: &str) -> Result<T>;
    fn config_err(self, context: &str) -> Result<T>;
    fn storage_err(self, context: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> IntoPlayerError<T> for std::result::Result<T, E> {
    fn stream_err(self, context: &str) -> Result<T> {
        self.map_err(|e| PlayerError::Stream(format!("{}: {}", context, e)))
    }

    fn config_err(self, context: &str) -> Result<T> {
        self.map_err(|e| PlayerError::Config(format!("{}: {}", context, e)))
    }

    fn storage_err(self, context: &str) -> Result<T> {
        self.map_err(|e| PlayerError::Storage(format!("{}: {}", context, e)))
    }
}
