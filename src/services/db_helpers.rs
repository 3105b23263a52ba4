use std::{future::Future, time::Duration};

use crate::errors::{AppError, AppResult};

/// Runs a store operation under a deadline. An elapsed deadline surfaces as
/// `StoreUnavailable` so no request waits on the store indefinitely.
pub async fn bounded<T, F>(timeout: Duration, operation: &str, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => {
            log::warn!(
                "Store operation '{}' timed out after {}ms",
                operation,
                timeout.as_millis()
            );
            Err(AppError::StoreUnavailable(format!(
                "{} timed out after {}ms",
                operation,
                timeout.as_millis()
            )))
        }
    }
}

/// Read-path variant of [`bounded`]: one retry after `backoff` when the store
/// is unavailable. Never use this for writes whose outcome may be ambiguous.
pub async fn bounded_read<T, F, Fut>(
    timeout: Duration,
    backoff: Duration,
    operation: &str,
    mut read: F,
) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    match bounded(timeout, operation, read()).await {
        Err(AppError::StoreUnavailable(reason)) => {
            log::warn!(
                "Retrying '{}' in {}ms after store failure: {}",
                operation,
                backoff.as_millis(),
                reason
            );
            tokio::time::sleep(backoff).await;
            bounded(timeout, operation, read()).await
        }
        other => other,
    }
}
