//! Deadline helper for remote calls.

use std::future::Future;
use std::time::Duration;

use crate::error::AgentError;

/// Wrap a remote call with an optional deadline.
pub async fn with_deadline<T>(
    deadline: Option<Duration>,
    future: impl Future<Output = Result<T, AgentError>>,
) -> Result<T, AgentError> {
    let Some(duration) = deadline else {
        return future.await;
    };
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(AgentError::Timeout(duration.as_millis() as u64)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn slow_call_times_out() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, AgentError>("late")
        };
        let err = with_deadline(Some(Duration::from_millis(250)), slow)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Timeout(250)));
    }

    #[tokio::test]
    async fn no_deadline_passes_through() {
        let value = with_deadline(None, async { Ok::<_, AgentError>(7) }).await;
        assert_eq!(value.unwrap(), 7);
    }
}
