//! The sync pass orchestrator.
//!
//! One pass walks LoadingState → Listing → ProcessingFiles →
//! PersistingState → Done. AbortedBeforeStart is reachable only from
//! LoadingState, when the checkpoint cannot be trusted. Per-file failures
//! never abort the pass; checkpoint load/save failures do.

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::utils::errors::{Result, SyncError};

use super::detector::should_sync;
use super::state::utc_timestamp;
use super::{SourceCatalog, SourceFileMetadata, StateStore, Transferer};

/// Phase of a running pass, for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassPhase {
    LoadingState,
    Listing,
    ProcessingFiles,
    PersistingState,
    Done,
    AbortedBeforeStart,
}

/// Identity of one file landed during a pass.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProcessedFile {
    pub file_id: String,
    pub filename: String,
}

/// Outcome of one completed pass.
#[derive(Debug, Serialize)]
pub struct PassSummary {
    pub pass_id: Uuid,
    pub pass_started_at: String,
    pub processed: Vec<ProcessedFile>,
    pub skipped: usize,
    pub failed: usize,
    /// True when the listing call failed and the pass degraded to
    /// "nothing to do". Kept distinct from a genuinely empty folder.
    pub catalog_unavailable: bool,
}

impl PassSummary {
    /// Human-readable one-line summary for the trigger response body.
    pub fn message(&self) -> String {
        if self.catalog_unavailable {
            "Catalog unavailable, nothing to do".to_string()
        } else if self.processed.is_empty() && self.failed == 0 {
            "No files needed processing (all up to date)".to_string()
        } else {
            format!(
                "Processed {} changed files ({} skipped, {} failed)",
                self.processed.len(),
                self.skipped,
                self.failed
            )
        }
    }
}

/// Drives one full sync pass over injected collaborators.
///
/// The caller guarantees at most one concurrent pass per checkpoint key
/// (the HTTP trigger holds a lock for the duration of a pass).
pub struct SyncOrchestrator<S, C, T> {
    state_store: S,
    catalog: C,
    transferer: T,
    data_prefix: String,
    cancel_token: CancellationToken,
}

impl<S, C, T> SyncOrchestrator<S, C, T>
where
    S: StateStore,
    C: SourceCatalog,
    T: Transferer,
{
    pub fn new(
        state_store: S,
        catalog: C,
        transferer: T,
        data_prefix: String,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            state_store,
            catalog,
            transferer,
            data_prefix,
            cancel_token,
        }
    }

    /// Run one pass: load checkpoint, list catalog, transfer what changed,
    /// persist the checkpoint exactly once.
    pub async fn run_pass(&self) -> Result<PassSummary> {
        let pass_id = Uuid::new_v4();
        // Every file landed in this pass shares this timestamp as its
        // `last_processed`, and it becomes the new `last_pipeline_run`.
        let pass_started_at = utc_timestamp();

        let mut phase = PassPhase::LoadingState;
        info!(%pass_id, ?phase, "Pass starting at {}", pass_started_at);

        let mut state = match self.state_store.load().await {
            Ok(state) => state,
            Err(e) => {
                phase = PassPhase::AbortedBeforeStart;
                error!(%pass_id, ?phase, "Checkpoint unreadable, aborting pass: {}", e);
                return Err(e);
            }
        };
        info!(
            %pass_id,
            "Previous run: {}",
            state.last_pipeline_run.as_deref().unwrap_or("never")
        );

        phase = PassPhase::Listing;
        debug!(%pass_id, ?phase, "Listing source catalog");
        let listing = self.catalog.list_all().await;
        let catalog_unavailable = listing.is_none();

        if catalog_unavailable {
            // Cannot tell "no files" from "listing outage", so leave the
            // checkpoint untouched and report the degradation explicitly.
            warn!(%pass_id, "Catalog unavailable, finishing pass with zero changes");
            return Ok(PassSummary {
                pass_id,
                pass_started_at,
                processed: Vec::new(),
                skipped: 0,
                failed: 0,
                catalog_unavailable: true,
            });
        }

        let files = listing.unwrap_or_default();
        info!(%pass_id, "Found {} files in source catalog", files.len());

        phase = PassPhase::ProcessingFiles;
        debug!(%pass_id, ?phase, "Diffing catalog against checkpoint");

        let mut processed = Vec::new();
        let mut skipped = 0usize;
        let mut failed = 0usize;

        for meta in &files {
            if self.cancel_token.is_cancelled() {
                warn!(%pass_id, "Cancellation requested, stopping before {}", meta.name);
                break;
            }

            if !should_sync(meta, &state) {
                debug!("File unchanged, skipping: {}", meta.name);
                skipped += 1;
                continue;
            }

            info!(%pass_id, "Transferring: {}", meta.name);
            match self.transfer_one(meta).await {
                Ok(()) => {
                    state.record_file(meta, &pass_started_at);
                    processed.push(ProcessedFile {
                        file_id: meta.id.clone(),
                        filename: meta.name.clone(),
                    });
                }
                Err(e) => {
                    // Counted and logged; the remaining files still run.
                    warn!(%pass_id, "Transfer failed for {}: {}", meta.name, e);
                    failed += 1;
                }
            }
        }

        info!(
            %pass_id,
            "Pass summary: {} processed, {} skipped, {} failed",
            processed.len(),
            skipped,
            failed
        );
        if !files.is_empty() {
            info!(%pass_id, "Efficiency: {}/{} files skipped", skipped, files.len());
        }

        phase = PassPhase::PersistingState;
        debug!(%pass_id, ?phase, "Persisting checkpoint");
        state.last_pipeline_run = Some(pass_started_at.clone());
        self.state_store.save(&state).await?;

        phase = PassPhase::Done;
        debug!(%pass_id, ?phase, "Pass complete");
        Ok(PassSummary {
            pass_id,
            pass_started_at,
            processed,
            skipped,
            failed,
            catalog_unavailable: false,
        })
    }

    /// Fetch and store a single file, honoring cancellation on both legs.
    async fn transfer_one(&self, meta: &SourceFileMetadata) -> Result<()> {
        let content = tokio::select! {
            _ = self.cancel_token.cancelled() => {
                return Err(SyncError::Fetch(format!("{}: cancelled", meta.name)));
            }
            result = self.transferer.fetch(&meta.id) => result?,
        };

        let destination_key = format!("{}{}", self.data_prefix, meta.name);
        tokio::select! {
            _ = self.cancel_token.cancelled() => {
                Err(SyncError::Store(format!("{}: cancelled", meta.name)))
            }
            result = self.transferer.store(content, &destination_key) => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::state::{FileRecord, SyncState};
    use bytes::Bytes;
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    fn meta(id: &str, name: &str, modified: &str) -> SourceFileMetadata {
        SourceFileMetadata {
            id: id.to_string(),
            name: name.to_string(),
            mime_type: "text/csv".to_string(),
            modified_at: modified.to_string(),
            created_at: None,
        }
    }

    #[derive(Clone, Default)]
    struct MemoryStateStore {
        doc: Arc<Mutex<Option<SyncState>>>,
        fail_load: bool,
        fail_save: bool,
    }

    impl MemoryStateStore {
        fn seeded(state: SyncState) -> Self {
            Self {
                doc: Arc::new(Mutex::new(Some(state))),
                ..Self::default()
            }
        }

        fn persisted(&self) -> Option<SyncState> {
            self.doc.lock().unwrap().clone()
        }
    }

    impl StateStore for MemoryStateStore {
        async fn load(&self) -> Result<SyncState> {
            if self.fail_load {
                return Err(SyncError::StateLoad("permission denied".to_string()));
            }
            Ok(self.doc.lock().unwrap().clone().unwrap_or_default())
        }

        async fn save(&self, state: &SyncState) -> Result<()> {
            if self.fail_save {
                return Err(SyncError::StateSave("write fault".to_string()));
            }
            *self.doc.lock().unwrap() = Some(state.clone());
            Ok(())
        }
    }

    #[derive(Clone)]
    struct StaticCatalog {
        listing: Option<Vec<SourceFileMetadata>>,
    }

    impl SourceCatalog for StaticCatalog {
        async fn list_all(&self) -> Option<Vec<SourceFileMetadata>> {
            self.listing.clone()
        }
    }

    #[derive(Clone, Default)]
    struct FakeTransferer {
        fetched: Arc<Mutex<Vec<String>>>,
        stored: Arc<Mutex<BTreeMap<String, Bytes>>>,
        fail_fetch_ids: Vec<String>,
        fail_store_keys: Vec<String>,
    }

    impl Transferer for FakeTransferer {
        async fn fetch(&self, file_id: &str) -> Result<Bytes> {
            if self.fail_fetch_ids.iter().any(|id| id == file_id) {
                return Err(SyncError::Fetch(format!("{file_id}: source fault")));
            }
            self.fetched.lock().unwrap().push(file_id.to_string());
            Ok(Bytes::from(format!("content of {file_id}")))
        }

        async fn store(&self, content: Bytes, destination_key: &str) -> Result<()> {
            if self.fail_store_keys.iter().any(|key| key == destination_key) {
                return Err(SyncError::Store(format!("{destination_key}: write fault")));
            }
            self.stored
                .lock()
                .unwrap()
                .insert(destination_key.to_string(), content);
            Ok(())
        }
    }

    fn orchestrator(
        store: MemoryStateStore,
        catalog: StaticCatalog,
        transferer: FakeTransferer,
    ) -> SyncOrchestrator<MemoryStateStore, StaticCatalog, FakeTransferer> {
        SyncOrchestrator::new(
            store,
            catalog,
            transferer,
            "data/".to_string(),
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn test_new_file_is_transferred_and_recorded() {
        let store = MemoryStateStore::default();
        let transferer = FakeTransferer::default();
        let catalog = StaticCatalog {
            listing: Some(vec![meta("1", "a.csv", "2025-01-01T00:00:00.000Z")]),
        };

        let summary = orchestrator(store.clone(), catalog, transferer.clone())
            .run_pass()
            .await
            .unwrap();

        assert_eq!(summary.processed.len(), 1);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.failed, 0);
        assert!(!summary.catalog_unavailable);

        assert!(transferer.stored.lock().unwrap().contains_key("data/a.csv"));

        let saved = store.persisted().unwrap();
        assert_eq!(saved.last_pipeline_run.as_deref(), Some(summary.pass_started_at.as_str()));
        assert_eq!(saved.files["a.csv"].last_processed, summary.pass_started_at);
        assert_eq!(saved.files["a.csv"].file_id, "1");
    }

    #[tokio::test]
    async fn test_unchanged_file_is_skipped() {
        let mut prior = SyncState::default();
        prior.files.insert(
            "a.csv".to_string(),
            FileRecord {
                file_id: "1".to_string(),
                last_modified_in_drive: "2025-01-01T00:00:00.000Z".to_string(),
                last_processed: "2025-01-02T00:00:00.000Z".to_string(),
            },
        );

        let store = MemoryStateStore::seeded(prior);
        let transferer = FakeTransferer::default();
        let catalog = StaticCatalog {
            listing: Some(vec![meta("1", "a.csv", "2025-01-01T00:00:00.000Z")]),
        };

        let summary = orchestrator(store, catalog, transferer.clone())
            .run_pass()
            .await
            .unwrap();

        assert_eq!(summary.processed.len(), 0);
        assert_eq!(summary.skipped, 1);
        assert!(transferer.fetched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_catalog_failure_leaves_checkpoint_untouched() {
        let mut prior = SyncState::default();
        prior.last_pipeline_run = Some("2025-01-01T00:00:00.000Z".to_string());

        let store = MemoryStateStore::seeded(prior.clone());
        let catalog = StaticCatalog { listing: None };

        let summary = orchestrator(store.clone(), catalog, FakeTransferer::default())
            .run_pass()
            .await
            .unwrap();

        assert!(summary.catalog_unavailable);
        assert_eq!(summary.processed.len(), 0);
        assert_eq!(summary.failed, 0);
        assert_eq!(store.persisted().unwrap(), prior);
    }

    #[tokio::test]
    async fn test_empty_catalog_still_records_the_pass() {
        let store = MemoryStateStore::default();
        let catalog = StaticCatalog {
            listing: Some(Vec::new()),
        };

        let summary = orchestrator(store.clone(), catalog, FakeTransferer::default())
            .run_pass()
            .await
            .unwrap();

        assert!(!summary.catalog_unavailable);
        let saved = store.persisted().unwrap();
        assert_eq!(saved.last_pipeline_run.as_deref(), Some(summary.pass_started_at.as_str()));
        assert!(saved.files.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_does_not_block_other_files() {
        let store = MemoryStateStore::default();
        let transferer = FakeTransferer {
            fail_store_keys: vec!["data/b.csv".to_string()],
            ..FakeTransferer::default()
        };
        let catalog = StaticCatalog {
            listing: Some(vec![
                meta("1", "a.csv", "2025-01-01T00:00:00.000Z"),
                meta("2", "b.csv", "2025-01-01T00:00:00.000Z"),
            ]),
        };

        let summary = orchestrator(store.clone(), catalog, transferer)
            .run_pass()
            .await
            .unwrap();

        assert_eq!(summary.processed.len(), 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.processed[0].filename, "a.csv");

        // Only the succeeded file reaches the checkpoint.
        let saved = store.persisted().unwrap();
        assert!(saved.files.contains_key("a.csv"));
        assert!(!saved.files.contains_key("b.csv"));
    }

    #[tokio::test]
    async fn test_fetch_failure_does_not_block_other_files() {
        let store = MemoryStateStore::default();
        let transferer = FakeTransferer {
            fail_fetch_ids: vec!["1".to_string()],
            ..FakeTransferer::default()
        };
        let catalog = StaticCatalog {
            listing: Some(vec![
                meta("1", "a.csv", "2025-01-01T00:00:00.000Z"),
                meta("2", "b.csv", "2025-01-01T00:00:00.000Z"),
            ]),
        };

        let summary = orchestrator(store.clone(), catalog, transferer)
            .run_pass()
            .await
            .unwrap();

        assert_eq!(summary.processed.len(), 1);
        assert_eq!(summary.failed, 1);
        assert!(store.persisted().unwrap().files.contains_key("b.csv"));
    }

    #[tokio::test]
    async fn test_second_pass_with_no_changes_transfers_nothing() {
        let store = MemoryStateStore::default();
        let transferer = FakeTransferer::default();
        let catalog = StaticCatalog {
            listing: Some(vec![meta("1", "a.csv", "2025-01-01T00:00:00.000Z")]),
        };

        let first = orchestrator(store.clone(), catalog.clone(), transferer.clone())
            .run_pass()
            .await
            .unwrap();
        assert_eq!(first.processed.len(), 1);

        let second = orchestrator(store, catalog, transferer.clone())
            .run_pass()
            .await
            .unwrap();
        assert_eq!(second.processed.len(), 0);
        assert_eq!(second.skipped, 1);
        assert_eq!(transferer.fetched.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_failure_propagates_after_transfers() {
        let store = MemoryStateStore {
            fail_save: true,
            ..MemoryStateStore::default()
        };
        let transferer = FakeTransferer::default();
        let catalog = StaticCatalog {
            listing: Some(vec![meta("1", "a.csv", "2025-01-01T00:00:00.000Z")]),
        };

        let result = orchestrator(store, catalog, transferer.clone()).run_pass().await;
        assert!(matches!(result, Err(SyncError::StateSave(_))));

        // The transfer itself stands; only the bookkeeping was lost.
        assert!(transferer.stored.lock().unwrap().contains_key("data/a.csv"));
    }

    #[tokio::test]
    async fn test_load_failure_aborts_before_any_transfer() {
        let store = MemoryStateStore {
            fail_load: true,
            ..MemoryStateStore::default()
        };
        let transferer = FakeTransferer::default();
        let catalog = StaticCatalog {
            listing: Some(vec![meta("1", "a.csv", "2025-01-01T00:00:00.000Z")]),
        };

        let result = orchestrator(store, catalog, transferer.clone()).run_pass().await;
        assert!(matches!(result, Err(SyncError::StateLoad(_))));
        assert!(transferer.fetched.lock().unwrap().is_empty());
        assert!(transferer.stored.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_all_files_in_a_pass_share_one_processed_timestamp() {
        let store = MemoryStateStore::default();
        let catalog = StaticCatalog {
            listing: Some(vec![
                meta("1", "a.csv", "2025-01-01T00:00:00.000Z"),
                meta("2", "b.csv", "2025-01-01T00:00:00.000Z"),
            ]),
        };

        let summary = orchestrator(store.clone(), catalog, FakeTransferer::default())
            .run_pass()
            .await
            .unwrap();

        let saved = store.persisted().unwrap();
        assert_eq!(saved.files["a.csv"].last_processed, summary.pass_started_at);
        assert_eq!(saved.files["b.csv"].last_processed, summary.pass_started_at);
    }

    #[tokio::test]
    async fn test_cancelled_pass_stops_processing() {
        let store = MemoryStateStore::default();
        let transferer = FakeTransferer::default();
        let catalog = StaticCatalog {
            listing: Some(vec![meta("1", "a.csv", "2025-01-01T00:00:00.000Z")]),
        };

        let cancel = CancellationToken::new();
        cancel.cancel();
        let orchestrator = SyncOrchestrator::new(
            store,
            catalog,
            transferer.clone(),
            "data/".to_string(),
            cancel,
        );

        let summary = orchestrator.run_pass().await.unwrap();
        assert_eq!(summary.processed.len(), 0);
        assert!(transferer.fetched.lock().unwrap().is_empty());
    }

    #[test]
    fn test_summary_messages() {
        let base = PassSummary {
            pass_id: Uuid::new_v4(),
            pass_started_at: "2025-01-01T00:00:00.000Z".to_string(),
            processed: Vec::new(),
            skipped: 0,
            failed: 0,
            catalog_unavailable: false,
        };
        assert_eq!(base.message(), "No files needed processing (all up to date)");

        let busy = PassSummary {
            pass_id: Uuid::new_v4(),
            pass_started_at: base.pass_started_at.clone(),
            processed: vec![ProcessedFile {
                file_id: "1".to_string(),
                filename: "a.csv".to_string(),
            }],
            skipped: 2,
            failed: 1,
            catalog_unavailable: false,
        };
        assert_eq!(busy.message(), "Processed 1 changed files (2 skipped, 1 failed)");

        let unavailable = PassSummary {
            pass_id: Uuid::new_v4(),
            pass_started_at: base.pass_started_at.clone(),
            processed: Vec::new(),
            skipped: 0,
            failed: 0,
            catalog_unavailable: true,
        };
        assert_eq!(unavailable.message(), "Catalog unavailable, nothing to do");
    }
}
