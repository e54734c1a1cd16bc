//! Sync Agent Library
//!
//! Incremental sync service that mirrors new and changed drive files into
//! an object store, checkpointing what it has landed between passes.

pub mod api;
pub mod config;
pub mod daemon;
pub mod remote;
pub mod storage;
pub mod sync;
pub mod transfer;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use utils::errors::SyncError;
pub type Result<T> = std::result::Result<T, SyncError>;
