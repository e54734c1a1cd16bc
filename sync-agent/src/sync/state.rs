//! The persisted sync checkpoint.
//!
//! The checkpoint is a single JSON document: `last_pipeline_run` plus one
//! record per successfully landed file, keyed by filename. A filename
//! present in `files` means that file was transferred and persisted at
//! `last_processed`; absence means it was never successfully synced, even
//! if an earlier attempt failed halfway.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::SourceFileMetadata;

/// Render format for every timestamp the agent writes: UTC, zero-padded,
/// fixed width. Keeping all timestamps in this one shape is what makes the
/// lexicographic comparison in the change detector valid.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Current time as a fixed-width UTC timestamp, e.g. `2025-01-01T00:00:00.000Z`.
pub fn utc_timestamp() -> String {
    Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Tracking entry for one landed file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileRecord {
    pub file_id: String,
    pub last_modified_in_drive: String,
    pub last_processed: String,
}

/// The checkpoint document.
///
/// Loaded once per pass, mutated only in memory, and written back in a
/// single replace at the end of the pass. Keyed by filename, so a rename
/// at the source shows up as a brand-new file and the old record goes
/// stale (never pruned).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncState {
    pub last_pipeline_run: Option<String>,
    #[serde(default)]
    pub files: BTreeMap<String, FileRecord>,
}

impl SyncState {
    /// Record a successful transfer. All files landed in one pass share the
    /// pass's start timestamp as their `last_processed`.
    pub fn record_file(&mut self, meta: &SourceFileMetadata, processed_at: &str) {
        self.files.insert(
            meta.name.clone(),
            FileRecord {
                file_id: meta.id.clone(),
                last_modified_in_drive: meta.modified_at.clone(),
                last_processed: processed_at.to_string(),
            },
        );
    }
}
