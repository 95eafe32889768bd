//! Export error types

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Errors aborting an export
#[derive(Error, Debug)]
pub enum ExportError {
    /// Writing the world file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Copying a referenced texture failed
    #[error("Failed to copy {} to {}: {error}", .path.display(), .destination.display())]
    AssetCopy {
        /// Source file
        path: PathBuf,
        /// Target file
        destination: PathBuf,
        /// Underlying failure
        #[source]
        error: std::io::Error,
    },

    /// Options file could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The scene could not be read
    #[error("Invalid scene: {0}")]
    InvalidScene(String),

    /// Options are inconsistent
    #[error("Invalid export options: {0}")]
    InvalidOptions(String),
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;
