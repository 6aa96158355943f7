//! Timeout helper for outbound collaborator calls.

use std::future::Future;
use std::time::Duration;

use crate::error::FarmGuideError;

/// Wrap a fallible future with a deadline, mapping expiry to
/// [`FarmGuideError::Timeout`].
pub async fn with_timeout<T>(
    duration: Duration,
    future: impl Future<Output = Result<T, FarmGuideError>>,
) -> Result<T, FarmGuideError> {
    tokio::time::timeout(duration, future)
        .await
        .unwrap_or_else(|_| Err(FarmGuideError::Timeout(duration.as_millis() as u64)))
}
