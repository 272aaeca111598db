use std::path::PathBuf;

use thiserror::Error;

/// Failures of the persistent key-value layer.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage file {path} is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Failures of the target surface the patch is applied to.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Surface rejected the change: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum StyleError {
    #[error("Theme not found: {0}")]
    NotFound(String),

    #[error("Theme already exists: {0}")]
    Conflict(String),

    #[error("Invalid theme name: {0:?}")]
    InvalidName(String),

    #[error("Invalid theme document: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),
}

pub type Result<T> = std::result::Result<T, StyleError>;
