//! BlobStore trait definition
//!
//! This trait defines the interface for blob storage operations used by the
//! commands and the connectivity prober. It keeps the core independent of the
//! Azure SDK and can be mocked for testing.

use async_trait::async_trait;
use jiff::Timestamp;
use serde::Serialize;

use crate::error::Result;

/// Metadata for a blob, a virtual directory or a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlobInfo {
    /// Blob name, directory prefix or container name
    pub name: String,

    /// Size in bytes (None for directories and containers)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,

    /// Human-readable size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_human: Option<String>,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,

    /// Content type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Whether this is a virtual directory or a container
    pub is_dir: bool,
}

impl BlobInfo {
    /// Create a new BlobInfo for a blob
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size_bytes: Some(size),
            size_human: Some(humansize::format_size(size, humansize::BINARY)),
            last_modified: None,
            content_type: None,
            is_dir: false,
        }
    }

    /// Create a new BlobInfo for a virtual directory
    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size_bytes: None,
            size_human: None,
            last_modified: None,
            content_type: None,
            is_dir: true,
        }
    }

    /// Create a new BlobInfo for a container
    pub fn container(name: impl Into<String>) -> Self {
        Self::dir(name)
    }

    /// Set the last modified timestamp
    pub fn with_last_modified(mut self, ts: Timestamp) -> Self {
        self.last_modified = Some(ts);
        self
    }

    /// Set the content type
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// First page of a container listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContainerPage {
    /// Containers on this page
    pub containers: Vec<BlobInfo>,

    /// Whether the service reported further pages
    pub more: bool,
}

/// Trait for blob storage operations
///
/// This trait is implemented by the Azure adapter and can be mocked for testing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch the first page of containers; never follows continuation
    async fn list_containers_page(&self) -> Result<ContainerPage>;

    /// List blobs in `container` under `prefix`
    ///
    /// A non-recursive listing is delimited by `/`: deeper names are reported
    /// once as their immediate child directory, with a trailing `/`.
    async fn list_blobs(&self, container: &str, prefix: &str, recursive: bool)
    -> Result<Vec<BlobInfo>>;

    /// Download a blob's content
    async fn get_blob(&self, container: &str, name: &str) -> Result<Vec<u8>>;

    /// Upload `data` as a block blob, replacing any existing blob
    async fn put_blob(
        &self,
        container: &str,
        name: &str,
        data: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<BlobInfo>;
}
