//! ReadEngine: index whatever you read and search it later
//!
//! This crate fetches web pages (or reads local HTML files), extracts their
//! title and main content, keeps the result in a durable document store and
//! maintains a rebuildable full-text index over everything ingested.

pub mod config;
pub mod engine;
pub mod extract;
pub mod fetch;
pub mod index;
pub mod state;
pub mod storage;
pub mod tokenizer;

use thiserror::Error;

/// Main error type for ReadEngine operations
#[derive(Debug, Error)]
pub enum ReadEngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] fetch::FetchError),

    #[error("Decode error: {0}")]
    Decode(#[from] fetch::DecodeError),

    #[error("Extraction error: {0}")]
    Extract(#[from] extract::ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Index error: {0}")]
    Index(#[from] index::IndexError),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::IngestState,
        to: state::IngestState,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Missing required resource: {0}")]
    MissingResource(String),
}

/// Result type alias for ReadEngine operations
pub type Result<T> = std::result::Result<T, ReadEngineError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use engine::{Coordinator, QueryEngine};
pub use state::IngestState;
pub use storage::{DocId, Document};
