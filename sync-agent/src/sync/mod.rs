//! Incremental sync core: checkpoint document, change detection and the
//! pass orchestrator.
//!
//! The three traits below are the seams between the decision logic and the
//! outside world. Production implementations live in `remote`, `storage`
//! and `transfer`; tests substitute in-memory fakes.

pub mod detector;
pub mod orchestrator;
pub mod state;

use bytes::Bytes;
use serde::Deserialize;

use crate::utils::errors::Result;
use state::SyncState;

/// Listing-time snapshot of one remote file. Field names map the drive
/// listing response (camelCase on the wire).
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SourceFileMetadata {
    pub id: String,
    pub name: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    #[serde(rename = "modifiedTime")]
    pub modified_at: String,
    #[serde(rename = "createdTime", default)]
    pub created_at: Option<String>,
}

/// Persists and retrieves the sync checkpoint.
#[allow(async_fn_in_trait)]
pub trait StateStore {
    /// Load the checkpoint. An absent checkpoint yields the default state;
    /// any other failure aborts the pass before transfers start.
    async fn load(&self) -> Result<SyncState>;

    /// Replace the checkpoint document in a single write.
    async fn save(&self, state: &SyncState) -> Result<()>;
}

/// Enumerates the remote files matching the fixed selection predicate.
#[allow(async_fn_in_trait)]
pub trait SourceCatalog {
    /// List every matching file, following pagination until exhausted.
    ///
    /// `None` means the listing call itself failed (treated downstream as
    /// "nothing to do", but kept distinguishable from a genuinely empty
    /// folder, which is `Some(vec![])`).
    async fn list_all(&self) -> Option<Vec<SourceFileMetadata>>;
}

/// Moves one file's bytes from the source to the destination store.
#[allow(async_fn_in_trait)]
pub trait Transferer {
    /// Retrieve the full content of a source file.
    async fn fetch(&self, file_id: &str) -> Result<Bytes>;

    /// Write content under the destination key, replacing any prior object.
    async fn store(&self, content: Bytes, destination_key: &str) -> Result<()>;
}
