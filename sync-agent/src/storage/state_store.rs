//! Checkpoint persistence on top of the object store.

use tracing::info;

use crate::sync::state::SyncState;
use crate::sync::StateStore;
use crate::utils::errors::{Result, SyncError};

use super::object_store::ObjectStore;

/// Stores the checkpoint as one JSON document at a fixed key in the
/// destination bucket.
pub struct ObjectStateStore<O> {
    store: O,
    state_key: String,
}

impl<O> ObjectStateStore<O> {
    pub fn new(store: O, state_key: String) -> Self {
        Self { store, state_key }
    }
}

impl<O: ObjectStore> StateStore for ObjectStateStore<O> {
    async fn load(&self) -> Result<SyncState> {
        match self.store.get_object(&self.state_key).await {
            Ok(Some(body)) => serde_json::from_slice(&body)
                .map_err(|e| SyncError::StateLoad(format!("malformed checkpoint document: {e}"))),
            Ok(None) => {
                info!("Checkpoint not found - first run, using default state");
                Ok(SyncState::default())
            }
            Err(e) => Err(SyncError::StateLoad(e.to_string())),
        }
    }

    async fn save(&self, state: &SyncState) -> Result<()> {
        let body = serde_json::to_vec_pretty(state)
            .map_err(|e| SyncError::StateSave(e.to_string()))?;

        self.store
            .put_object(&self.state_key, body.into())
            .await
            .map_err(|e| SyncError::StateSave(e.to_string()))?;

        info!("Checkpoint saved to {}", self.state_key);
        Ok(())
    }
}
