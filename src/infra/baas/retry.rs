use std::future::Future;
use std::time::Duration;

use crate::error::AppError;
use tokio::time::sleep;
use tracing::warn;

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_DELAY_MS: u64 = 500;

/// Runs `op` up to three times, backing off 0.5s/1s/2s between attempts,
/// retrying only errors classified as transient. Everything else
/// surfaces immediately.
pub async fn retry_transient<T, F, Fut>(operation_name: &str, op: F) -> Result<T, AppError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut delay = Duration::from_millis(INITIAL_DELAY_MS);

    for attempt in 1..=MAX_ATTEMPTS {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < MAX_ATTEMPTS => {
                warn!(
                    "Transient error in {} (attempt {}/{}): {}. Retrying in {:?}...",
                    operation_name, attempt, MAX_ATTEMPTS, e, delay
                );
                sleep(delay).await;
                delay *= 2;
            }
            Err(e) => return Err(e),
        }
    }

    unreachable!("retry loop always returns")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn retries_transient_errors_until_success() {
        let calls = AtomicU32::new(0);
        let result = retry_transient("test op", || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(AppError::Unavailable("connection reset".into()))
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_three_transient_failures() {
        let calls = AtomicU32::new(0);
        let result: Result<(), AppError> = retry_transient("test op", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::Timeout("upstream timed out".into()))
        })
        .await;

        assert!(matches!(result, Err(AppError::Timeout(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn does_not_retry_permanent_errors() {
        let calls = AtomicU32::new(0);
        let result: Result<(), AppError> = retry_transient("test op", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::NotFound("row missing".into()))
        })
        .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
