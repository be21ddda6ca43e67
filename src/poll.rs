//! Bounded-interval polling primitive
//!
//! Every concrete wait in the workflows (cluster readiness, pod and claim
//! disappearance, upgrade progress, job completion) is a specialization of
//! [`poll_until`]; none of them carry their own loop.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::{OrchestratorError, Result};

/// Outcome of one predicate evaluation.
///
/// A hard failure (an observed Error condition, a failed job attempt) is
/// expressed by returning `Err` from the check itself, which aborts the
/// poll immediately instead of waiting out the deadline.
#[derive(Debug)]
pub enum PollCheck<T> {
    /// Predicate satisfied; the poll returns this value at once
    Ready(T),
    /// Not satisfied yet; carries a progress note kept for diagnostics
    NotYet(String),
}

/// Re-evaluate `check` every `interval` until it is satisfied or `timeout`
/// elapses.
///
/// The check runs once immediately, then once per interval tick; each
/// invocation is expected to re-fetch live state so the predicate never
/// sees stale data. Exceeding the deadline yields
/// [`OrchestratorError::TimedOut`] carrying the last progress note.
pub async fn poll_until<T, F, Fut>(
    operation: &str,
    interval: Duration,
    timeout: Duration,
    mut check: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollCheck<T>>>,
{
    let deadline = Instant::now() + timeout;
    let mut last_observed: Option<String> = None;

    loop {
        match check().await? {
            PollCheck::Ready(value) => return Ok(value),
            PollCheck::NotYet(note) => {
                debug!(operation, %note, "still waiting");
                last_observed = Some(note);
            }
        }

        // No further tick can land before the deadline
        if Instant::now() + interval > deadline {
            return Err(OrchestratorError::TimedOut {
                operation: operation.to_string(),
                last_observed: last_observed
                    .unwrap_or_else(|| "nothing observed yet".to_string()),
            });
        }
        sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_ready_on_later_tick_returns_immediately() {
        let ticks = AtomicU32::new(0);
        let result = poll_until(
            "test ready",
            Duration::from_millis(5),
            Duration::from_millis(500),
            || async {
                let n = ticks.fetch_add(1, Ordering::SeqCst) + 1;
                if n >= 3 {
                    Ok(PollCheck::Ready(n))
                } else {
                    Ok(PollCheck::NotYet(format!("tick {}", n)))
                }
            },
        )
        .await;
        assert_eq!(result.unwrap(), 3);
        // No extra ticks after satisfaction
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_timeout_carries_last_observation() {
        let result: Result<()> = poll_until(
            "test timeout",
            Duration::from_millis(5),
            Duration::from_millis(20),
            || async { Ok(PollCheck::NotYet("0/3 replicas ready".to_string())) },
        )
        .await;
        match result {
            Err(OrchestratorError::TimedOut {
                operation,
                last_observed,
            }) => {
                assert_eq!(operation, "test timeout");
                assert_eq!(last_observed, "0/3 replicas ready");
            }
            other => panic!("expected TimedOut, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_hard_failure_aborts_without_waiting() {
        let ticks = AtomicU32::new(0);
        let result: Result<()> = poll_until(
            "test failure",
            Duration::from_millis(5),
            Duration::from_secs(60),
            || async {
                let n = ticks.fetch_add(1, Ordering::SeqCst) + 1;
                if n == 2 {
                    Err(OrchestratorError::ReportedFailure {
                        reason: "UpgradeFailed".to_string(),
                        message: "image pull backoff".to_string(),
                    })
                } else {
                    Ok(PollCheck::NotYet("waiting".to_string()))
                }
            },
        )
        .await;
        assert!(matches!(
            result,
            Err(OrchestratorError::ReportedFailure { .. })
        ));
        // Aborted on the failing tick, no further evaluation
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_ready_on_first_tick_needs_no_interval() {
        let result = poll_until(
            "test immediate",
            Duration::from_secs(30),
            Duration::from_secs(30),
            || async { Ok(PollCheck::Ready("done")) },
        )
        .await;
        assert_eq!(result.unwrap(), "done");
    }
}
