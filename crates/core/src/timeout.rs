//! Upper bounds on network calls
//!
//! Every call that reaches the service runs under one of two budgets from the
//! `[timeouts]` config section: a short one for metadata and listing, a long
//! one for data transfer. Expiry surfaces as [`Error::Timeout`].

use std::future::Future;
use std::time::Duration;

use crate::error::{Error, Result};

/// Run `fut`, failing with [`Error::Timeout`] once `after` has elapsed
pub async fn with_timeout<T, F>(operation: &str, after: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(after, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::debug!("{operation} exceeded {}s", after.as_secs());
            Err(Error::Timeout {
                operation: operation.to_string(),
                after,
            })
        }
    }
}
