//! Utility module for ledplayer
//!
//! This module provides common utilities used throughout the crate:
//! - Error handling with custom error types
//! - Configuration management
//! - File-name sanitising for collection and media paths

pub mod config;
pub mod error;

// Re-export commonly used items
pub use config::{Config, MatrixConfig, PlaybackConfig, QuickMediaConfig, StorageConfig};
pub use error::{IntoPlayerError, PlayerError, Result};

/// Turn a display name into a file-system safe stem
pub fn sanitize_file_stem(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();

    if stem.is_empty() {
        "_".to_string()
    } else {
        stem
    }
}
