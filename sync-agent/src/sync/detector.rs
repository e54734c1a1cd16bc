//! Change detection: decides whether a listed file needs (re)syncing.

use super::state::SyncState;
use super::SourceFileMetadata;

/// Returns true when `meta` describes a file that must be transferred.
///
/// Evaluated in order:
/// 1. no record under this filename → new file, sync;
/// 2. the record's `last_processed` is empty → sync;
/// 3. `modified_at` is lexicographically greater than `last_processed` → sync;
/// 4. otherwise the file is unchanged, skip.
///
/// Step 3 is a plain string comparison, not date arithmetic. It is only
/// correct because every timestamp on both sides is zero-padded, fixed-width,
/// UTC-normalized ISO-8601 (see [`super::state::TIMESTAMP_FORMAT`]).
pub fn should_sync(meta: &SourceFileMetadata, state: &SyncState) -> bool {
    let Some(record) = state.files.get(&meta.name) else {
        return true;
    };

    if record.last_processed.is_empty() {
        return true;
    }

    meta.modified_at.as_str() > record.last_processed.as_str()
}
