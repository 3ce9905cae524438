//! Connectivity probing
//!
//! A probe is a single read-only listing call that shows a client is
//! reachable and authorized. Only the first page is requested and an empty
//! page counts as success.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::timeout::with_timeout;
use crate::traits::{BlobStore, ContainerPage};

/// Issue one container listing request against `store`
///
/// Any failure becomes [`Error::Connectivity`], except expiry of `after`,
/// which stays [`Error::Timeout`].
pub async fn probe(store: &dyn BlobStore, after: Duration) -> Result<ContainerPage> {
    tracing::debug!("Probing with a {}s limit", after.as_secs());

    let page = with_timeout("Connectivity probe", after, store.list_containers_page())
        .await
        .map_err(|e| match e {
            Error::Timeout { .. } => e,
            Error::Connectivity(_) => e,
            other => Error::Connectivity(other.to_string()),
        })?;

    tracing::debug!(
        "Probe succeeded: {} container(s) on first page{}",
        page.containers.len(),
        if page.more { ", more available" } else { "" }
    );
    Ok(page)
}
