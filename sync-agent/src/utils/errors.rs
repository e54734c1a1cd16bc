//! Custom error types for the sync agent.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Secret retrieval error: {0}")]
    Secrets(String),

    #[error("Checkpoint load error: {0}")]
    StateLoad(String),

    #[error("Checkpoint save error: {0}")]
    StateSave(String),

    #[error("Catalog listing error: {0}")]
    CatalogList(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;
