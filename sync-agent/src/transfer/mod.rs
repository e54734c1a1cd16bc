//! Production transferer: drive download on one side, object store write
//! on the other.

use bytes::Bytes;

use crate::remote::DriveCatalog;
use crate::storage::object_store::ObjectStore;
use crate::sync::Transferer;
use crate::utils::errors::{Result, SyncError};

/// Moves file content from the drive into the destination bucket.
/// Re-storing under an existing key replaces the object, which is what
/// makes re-processing a file safe.
pub struct DriveToObjectTransferer<O> {
    drive: DriveCatalog,
    store: O,
}

impl<O> DriveToObjectTransferer<O> {
    pub fn new(drive: DriveCatalog, store: O) -> Self {
        Self { drive, store }
    }
}

impl<O: ObjectStore> Transferer for DriveToObjectTransferer<O> {
    async fn fetch(&self, file_id: &str) -> Result<Bytes> {
        self.drive.download(file_id).await
    }

    async fn store(&self, content: Bytes, destination_key: &str) -> Result<()> {
        self.store
            .put_object(destination_key, content)
            .await
            .map_err(|e| SyncError::Store(e.to_string()))
    }
}
