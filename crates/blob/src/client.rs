//! Azure Blob Storage client implementation
//!
//! Wraps the SDK's `BlobServiceClient` and implements the BlobStore trait
//! from azb-core. Every call runs under the configured timeouts.

use std::collections::BTreeSet;

use async_trait::async_trait;
use azure_storage_blobs::prelude::BlobServiceClient;
use futures::StreamExt;

use azb_core::{
    BlobInfo, BlobStore, ContainerPage, Error, Result, TimeoutConfig, with_timeout,
};

/// Authenticated handle bound to one endpoint and one credential
pub struct AzureBlobClient {
    inner: BlobServiceClient,
    account: String,
    endpoint: String,
    timeouts: TimeoutConfig,
}

impl std::fmt::Debug for AzureBlobClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureBlobClient")
            .field("account", &self.account)
            .field("endpoint", &self.endpoint)
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

impl AzureBlobClient {
    /// Wrap an SDK client
    pub fn new(
        inner: BlobServiceClient,
        account: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            inner,
            account: account.into(),
            endpoint: endpoint.into(),
            timeouts: TimeoutConfig::default(),
        }
    }

    /// Replace the network call bounds
    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Storage account name
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Service endpoint the client is bound to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Network call bounds in effect
    pub fn timeouts(&self) -> &TimeoutConfig {
        &self.timeouts
    }

    /// Underlying SDK client, for operations outside [`BlobStore`] such as
    /// creating a container
    pub fn inner(&self) -> &BlobServiceClient {
        &self.inner
    }

    async fn fetch_blobs(
        &self,
        container: &str,
        prefix: &str,
        recursive: bool,
    ) -> Result<Vec<BlobInfo>> {
        let mut request = self.inner.container_client(container).list_blobs();
        if !prefix.is_empty() {
            request = request.prefix(prefix.to_string());
        }
        if !recursive {
            request = request.delimiter("/");
        }
        let mut stream = request.into_stream();

        let mut dirs = Vec::new();
        let mut files = Vec::new();
        while let Some(page) = stream.next().await {
            let page = page.map_err(|e| classify(e, container))?;
            dirs.extend(page.blobs.prefixes().map(|p| p.name.clone()));
            for blob in page.blobs.blobs() {
                let mut info = BlobInfo::file(&blob.name, blob.properties.content_length)
                    .with_content_type(blob.properties.content_type.clone());
                info.last_modified =
                    jiff::Timestamp::from_second(blob.properties.last_modified.unix_timestamp())
                        .ok();
                files.push(info);
            }
        }

        Ok(merge_listing(dirs, files))
    }
}

#[async_trait]
impl BlobStore for AzureBlobClient {
    async fn list_containers_page(&self) -> Result<ContainerPage> {
        tracing::debug!("Listing containers at {}", self.endpoint);

        with_timeout("Container listing", self.timeouts.metadata(), async {
            let mut stream = self.inner.list_containers().into_stream();
            let Some(page) = stream.next().await else {
                return Ok(ContainerPage::default());
            };
            let page = page.map_err(|e| classify(e, &self.account))?;

            Ok(ContainerPage {
                containers: page
                    .containers
                    .iter()
                    .map(|c| BlobInfo::container(&c.name))
                    .collect(),
                more: page.next_marker.is_some(),
            })
        })
        .await
    }

    async fn list_blobs(
        &self,
        container: &str,
        prefix: &str,
        recursive: bool,
    ) -> Result<Vec<BlobInfo>> {
        tracing::debug!("Listing blobs in {container} with prefix '{prefix}'");

        with_timeout(
            "Blob listing",
            self.timeouts.metadata(),
            self.fetch_blobs(container, prefix, recursive),
        )
        .await
    }

    async fn get_blob(&self, container: &str, name: &str) -> Result<Vec<u8>> {
        tracing::debug!("Downloading {container}/{name}");

        let blob_client = self.inner.container_client(container).blob_client(name);
        let data = with_timeout("Download", self.timeouts.transfer(), async {
            blob_client
                .get_content()
                .await
                .map_err(|e| classify(e, &format!("{container}/{name}")))
        })
        .await?;

        tracing::debug!("Downloaded {container}/{name} ({} bytes)", data.len());
        Ok(data)
    }

    async fn put_blob(
        &self,
        container: &str,
        name: &str,
        data: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<BlobInfo> {
        let size = data.len() as u64;
        tracing::debug!("Uploading {size} bytes to {container}/{name}");

        let blob_client = self.inner.container_client(container).blob_client(name);
        with_timeout("Upload", self.timeouts.transfer(), async {
            let request = blob_client.put_block_blob(data);
            let request = match &content_type {
                Some(ct) => request.content_type(ct.clone()),
                None => request,
            };
            request
                .await
                .map_err(|e| classify(e, &format!("{container}/{name}")))
        })
        .await?;

        let mut info = BlobInfo::file(name, size);
        info.content_type = content_type;
        info.last_modified = Some(jiff::Timestamp::now());
        Ok(info)
    }
}

/// Map an SDK error onto the core taxonomy
fn classify(e: azure_core::Error, what: &str) -> Error {
    let err_str = e.to_string();
    if err_str.contains("404")
        || err_str.contains("BlobNotFound")
        || err_str.contains("ContainerNotFound")
    {
        Error::NotFound(what.to_string())
    } else if err_str.contains("403") || err_str.contains("AuthorizationFailure") {
        Error::Auth(err_str)
    } else {
        Error::Network(err_str)
    }
}

/// Combine the service's virtual directories and blobs into one listing
///
/// Directory names from a delimited listing already end in `/`. Entries are
/// sorted by name and a directory reported on several pages appears once.
pub fn merge_listing(dirs: Vec<String>, files: Vec<BlobInfo>) -> Vec<BlobInfo> {
    let dirs: BTreeSet<String> = dirs.into_iter().collect();

    let mut entries: Vec<BlobInfo> = dirs.into_iter().map(BlobInfo::dir).collect();
    entries.extend(files);
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[BlobInfo]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    fn listing(names: &[&str]) -> Vec<BlobInfo> {
        names.iter().map(|n| BlobInfo::file(*n, 1)).collect()
    }

    fn dirs(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_merge_container_root() {
        let out = merge_listing(dirs(&["z/", "logs/"]), listing(&["a.txt"]));
        assert_eq!(names(&out), vec!["a.txt", "logs/", "z/"]);
        assert!(!out[0].is_dir);
        assert!(out[1].is_dir);
    }

    #[test]
    fn test_merge_under_directory() {
        let out = merge_listing(dirs(&["logs/2024/"]), listing(&["logs/a.log"]));
        assert_eq!(names(&out), vec!["logs/2024/", "logs/a.log"]);
    }

    #[test]
    fn test_merge_dedups_directory_split_across_pages() {
        let out = merge_listing(dirs(&["logs/", "logs/"]), Vec::new());
        assert_eq!(names(&out), vec!["logs/"]);
    }

    #[test]
    fn test_merge_recursive_listing_has_no_directories() {
        let out = merge_listing(Vec::new(), listing(&["logs/2024/jan.log", "a.txt"]));
        assert_eq!(names(&out), vec!["a.txt", "logs/2024/jan.log"]);
        assert!(out.iter().all(|i| !i.is_dir));
    }

    #[test]
    fn test_merge_empty() {
        assert!(merge_listing(Vec::new(), Vec::new()).is_empty());
    }
}
