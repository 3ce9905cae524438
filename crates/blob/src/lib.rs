//! azb-blob: Azure Blob Storage adapter for azbutils
//!
//! This crate provides the client factory and the implementation of the
//! BlobStore trait using the Azure storage SDK. It is the only crate that
//! directly depends on the Azure SDK.

pub mod client;
pub mod factory;

pub use client::AzureBlobClient;
pub use factory::{build_client, open_account};
