//! Drive API client: paginated folder listing and streamed file download.

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::RemoteConfig;
use crate::sync::{SourceCatalog, SourceFileMetadata};
use crate::utils::errors::{Result, SyncError};

/// One page of the drive listing response.
#[derive(Debug, Deserialize)]
struct ListingPage {
    #[serde(default)]
    files: Vec<SourceFileMetadata>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

/// Client for the drive API, scoped to one folder and content type.
///
/// Built fresh each pass with the credentials fetched for that pass.
#[derive(Clone)]
pub struct DriveCatalog {
    client: reqwest::Client,
    base_url: String,
    folder_id: String,
    mime_type: String,
    token: String,
}

impl DriveCatalog {
    pub fn new(client: reqwest::Client, config: &RemoteConfig, token: String) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            folder_id: config.folder_id.clone(),
            mime_type: config.mime_type.clone(),
            token,
        }
    }

    /// Walk every listing page, accumulating the union of all pages.
    async fn try_list(&self) -> Result<Vec<SourceFileMetadata>> {
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(format!("{}/files", self.base_url))
                .bearer_auth(&self.token)
                .query(&[
                    ("folder", self.folder_id.as_str()),
                    ("mime_type", self.mime_type.as_str()),
                ]);
            if let Some(token) = &page_token {
                request = request.query(&[("page_token", token.as_str())]);
            }

            let page: ListingPage = request
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| SyncError::CatalogList(e.to_string()))?
                .json()
                .await
                .map_err(|e| SyncError::CatalogList(e.to_string()))?;

            for file in &page.files {
                debug!("Found file: {}, modified: {}", file.name, file.modified_at);
            }
            files.extend(page.files);

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(files)
    }

    /// Download a file's full content, assembling streamed chunks.
    pub async fn download(&self, file_id: &str) -> Result<Bytes> {
        let response = self
            .client
            .get(format!("{}/files/{}/content", self.base_url, file_id))
            .bearer_auth(&self.token)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SyncError::Fetch(e.to_string()))?;

        let total = response.content_length();
        let mut stream = response.bytes_stream();
        let mut content = BytesMut::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| SyncError::Fetch(e.to_string()))?;
            content.extend_from_slice(&chunk);
            if let Some(total) = total.filter(|t| *t > 0) {
                debug!(
                    "Download progress for {}: {}%",
                    file_id,
                    content.len() as u64 * 100 / total
                );
            }
        }

        Ok(content.freeze())
    }
}

impl SourceCatalog for DriveCatalog {
    async fn list_all(&self) -> Option<Vec<SourceFileMetadata>> {
        match self.try_list().await {
            Ok(files) => Some(files),
            Err(e) => {
                // A failed listing is reported as an unavailable catalog
                // rather than a pass failure; the orchestrator flags it.
                warn!("Drive listing failed, treating catalog as unavailable: {}", e);
                None
            }
        }
    }
}
