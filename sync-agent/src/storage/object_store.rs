//! Thin client for an S3-compatible object store.

use bytes::Bytes;
use reqwest::StatusCode;

use crate::config::StorageConfig;
use crate::utils::errors::Result;

/// Byte-level access to the destination bucket. Both the checkpoint store
/// and the transferer sit on this seam, so tests can swap in an in-memory
/// map.
#[allow(async_fn_in_trait)]
pub trait ObjectStore {
    /// Read an object. `None` when the key does not exist.
    async fn get_object(&self, key: &str) -> Result<Option<Bytes>>;

    /// Write an object, replacing any prior content under the same key.
    async fn put_object(&self, key: &str, body: Bytes) -> Result<()>;
}

/// Object store client speaking plain HTTP: `GET`/`PUT {base}/{bucket}/{key}`.
#[derive(Clone)]
pub struct HttpObjectStore {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
}

impl HttpObjectStore {
    pub fn new(client: reqwest::Client, config: &StorageConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.bucket, key)
    }
}

impl ObjectStore for HttpObjectStore {
    async fn get_object(&self, key: &str) -> Result<Option<Bytes>> {
        let response = self.client.get(self.object_url(key)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = response.error_for_status()?.bytes().await?;
        Ok(Some(body))
    }

    async fn put_object(&self, key: &str, body: Bytes) -> Result<()> {
        self.client
            .put(self.object_url(key))
            .body(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
