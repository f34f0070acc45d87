/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Error types for result stores

use std::path::PathBuf;
use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Error type for persisting and reading SCF results
#[derive(Error, Debug)]
pub enum StoreError {
    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Table could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Another writer holds the table lock
    #[error("Store is locked by another process: {0}")]
    Locked(PathBuf),

    /// Stored densities do not fit the current site model
    #[error("Stored record has {found} sites, model has {expected}")]
    SiteCountMismatch { expected: usize, found: usize },

    /// Table content is unreadable
    #[error("Corrupt store: {0}")]
    Corrupt(String),
}
