//! Database retry logic
//!
//! Retries operations that fail because SQLite reports the database as
//! locked. The overall wait is bounded by the `jury_database_max_lock_wait_ms`
//! setting.

use std::time::{Duration, Instant};
use hjury_common::{Error, Result};

const INITIAL_BACKOFF_MS: u64 = 10;
const MAX_BACKOFF_MS: u64 = 1000;

/// Retry a database operation with exponential backoff until `max_wait_ms` elapses.
///
/// Only lock errors are retried; any other error is returned immediately.
/// Backoff starts at 10ms, doubles per attempt and is capped at 1s.
pub async fn retry_on_lock<F, Fut, T>(
    operation_name: &str,
    max_wait_ms: u64,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let started = Instant::now();
    let budget = Duration::from_millis(max_wait_ms);
    let mut attempt = 0u32;
    let mut backoff_ms = INITIAL_BACKOFF_MS;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        waited_ms = started.elapsed().as_millis(),
                        "Lock cleared, operation completed"
                    );
                }
                return Ok(value);
            }
            Err(err) => {
                if !err.is_database_locked() {
                    return Err(err);
                }

                let elapsed = started.elapsed();
                if elapsed >= budget {
                    tracing::error!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = elapsed.as_millis(),
                        max_wait_ms,
                        "Lock wait budget exhausted"
                    );
                    return Err(Error::Internal(format!(
                        "Database locked after {} attempts ({} ms elapsed, max {} ms)",
                        attempt,
                        elapsed.as_millis(),
                        max_wait_ms
                    )));
                }

                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    elapsed_ms = elapsed.as_millis(),
                    backoff_ms,
                    "Database locked, backing off"
                );

                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_error() -> Error {
        Error::Database(sqlx::Error::Protocol("database is locked".to_string()))
    }

    #[tokio::test]
    async fn test_retry_succeeds_first_attempt() {
        let result = retry_on_lock("test_op", 5000, || async { Ok::<i32, Error>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_lock_errors() {
        let mut attempts = 0;

        let result = retry_on_lock("test_op", 5000, || {
            attempts += 1;
            let current = attempts;
            async move {
                if current < 3 {
                    Err(lock_error())
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_wait() {
        let result = retry_on_lock("test_op", 30, || async { Err::<i32, Error>(lock_error()) }).await;

        match result {
            Err(Error::Internal(msg)) => assert!(msg.contains("Database locked after")),
            other => panic!("expected Internal error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_lock_error_fails_immediately() {
        let mut attempts = 0;

        let result = retry_on_lock("test_op", 5000, || {
            attempts += 1;
            async move { Err::<i32, Error>(Error::Internal("other error".to_string())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts, 1);
    }
}
