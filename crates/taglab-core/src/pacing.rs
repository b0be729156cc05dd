//! Fixed inter-call pauses and bounded polling.

use crate::errors::PollError;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Sleeps a fixed delay after each provider call. Calls stay strictly ordered.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    delay: Duration,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn none() -> Self {
        Self::new(Duration::ZERO)
    }

    pub async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

/// Shared cancellation flag, raised from a signal handler.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// `None` waits forever.
    pub timeout: Option<Duration>,
}

impl PollPolicy {
    pub fn new(interval: Duration, timeout: Option<Duration>) -> Self {
        Self { interval, timeout }
    }
}

/// Outcome of one check in [`poll_until`].
pub enum Poll<T> {
    Ready(T),
    Pending,
}

/// Calls `check` until it returns [`Poll::Ready`], sleeping `policy.interval`
/// between attempts. Check errors are returned immediately.
pub async fn poll_until<T, F, Fut>(
    what: &str,
    policy: PollPolicy,
    cancel: &CancelFlag,
    mut check: F,
) -> anyhow::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<Poll<T>>>,
{
    let started = Instant::now();
    let mut attempts: u64 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(PollError::Cancelled {
                what: what.to_string(),
            }
            .into());
        }

        attempts += 1;
        if let Poll::Ready(v) = check().await? {
            tracing::debug!(what, attempts, "poll finished");
            return Ok(v);
        }

        let waited = started.elapsed();
        if let Some(limit) = policy.timeout {
            if waited + policy.interval > limit {
                return Err(PollError::TimedOut {
                    what: what.to_string(),
                    waited,
                }
                .into());
            }
        }

        tracing::debug!(what, attempts, waited_ms = waited.as_millis() as u64, "still waiting");
        tokio::time::sleep(policy.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    fn fast(timeout: Option<Duration>) -> PollPolicy {
        PollPolicy::new(Duration::from_millis(1), timeout)
    }

    #[tokio::test]
    async fn test_ready_after_some_attempts() -> anyhow::Result<()> {
        let calls = AtomicU32::new(0);
        let v = poll_until("thing", fast(None), &CancelFlag::new(), || async {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok::<_, anyhow::Error>(if n == 3 { Poll::Ready(n) } else { Poll::Pending })
        })
        .await?;
        assert_eq!(v, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_times_out() {
        let err = poll_until::<(), _, _>(
            "file",
            PollPolicy::new(Duration::from_millis(5), Some(Duration::from_millis(12))),
            &CancelFlag::new(),
            || async { Ok::<_, anyhow::Error>(Poll::Pending) },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PollError>(),
            Some(PollError::TimedOut { .. })
        ));
    }

    #[tokio::test]
    async fn test_cancel_stops_before_next_check() {
        let cancel = CancelFlag::new();
        let calls = AtomicU32::new(0);
        let err = poll_until::<(), _, _>("job", fast(None), &cancel, || {
            calls.fetch_add(1, Ordering::SeqCst);
            cancel.cancel();
            async { Ok::<_, anyhow::Error>(Poll::Pending) }
        })
        .await
        .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            err.downcast_ref::<PollError>(),
            Some(&PollError::Cancelled { what: "job".into() })
        );
    }

    #[tokio::test]
    async fn test_check_error_propagates() {
        let res = poll_until::<(), _, _>("job", fast(None), &CancelFlag::new(), || async {
            Err::<Poll<()>, _>(anyhow::anyhow!("503"))
        })
        .await;
        assert_eq!(res.unwrap_err().to_string(), "503");
    }
}
