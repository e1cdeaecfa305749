//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap store calls with a deadline
//! - Cancel the in-flight operation cleanly on timeout
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; dropping the future cancels the query
//! - Timeout errors are distinct from other errors
//! - Timed-out resolutions return 504 Gateway Timeout

use std::future::Future;
use std::time::Duration;

/// Marker error for an exceeded deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("deadline of {0:?} exceeded")]
pub struct DeadlineExceeded(pub Duration);

/// Run `operation` to completion or until `deadline` elapses.
pub async fn with_deadline<F, T, E>(deadline: Duration, operation: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<DeadlineExceeded>,
{
    match tokio::time::timeout(deadline, operation).await {
        Ok(result) => result,
        Err(_) => Err(DeadlineExceeded(deadline).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Deadline,
    }

    impl From<DeadlineExceeded> for TestError {
        fn from(_: DeadlineExceeded) -> Self {
            TestError::Deadline
        }
    }

    #[tokio::test]
    async fn test_completes_within_deadline() {
        let result: Result<u8, TestError> =
            with_deadline(Duration::from_millis(200), async { Ok(7) }).await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn test_slow_operation_times_out() {
        let result: Result<u8, TestError> = with_deadline(Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(1)
        })
        .await;
        assert_eq!(result, Err(TestError::Deadline));
    }
}
