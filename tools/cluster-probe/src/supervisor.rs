//! Periodic liveness checks over a bounded window.
//!
//! There is no retry of a failed check: the first failure is alerted and
//! handed back to the caller as an [`Escalation`].

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, error};

use crate::alert::Alerter;
use crate::error::Escalation;

/// Shortest interval a window accepts.
pub const MIN_RETRY_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryWindow {
    interval: Duration,
    period: Duration,
}

impl RetryWindow {
    /// An interval below [`MIN_RETRY_INTERVAL`] is raised to it.
    pub fn new(interval: Duration, period: Duration) -> Self {
        Self {
            interval: interval.max(MIN_RETRY_INTERVAL),
            period,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

/// Invokes `operation` immediately and then every `interval` while the clock
/// is before `start + period`.
///
/// Returns `Ok(())` once the window has passed. A zero period runs nothing.
/// When `operation` fails, the failure is sent to `alerter` and returned
/// without invoking the operation again.
pub async fn run_until<A, F, Fut, E>(
    window: RetryWindow,
    alerter: &A,
    mut operation: F,
) -> Result<(), Escalation<E>>
where
    A: Alerter + ?Sized,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: std::error::Error + 'static,
{
    let start = Instant::now();
    let deadline = start + window.period;
    let mut invocation = 0u64;
    while Instant::now() < deadline {
        invocation = invocation.saturating_add(1);
        if let Err(source) = operation().await {
            let escalation = Escalation {
                invocation,
                elapsed: start.elapsed(),
                source,
            };
            error!(
                invocation,
                elapsed = ?escalation.elapsed,
                error = %escalation.source,
                "Supervised operation failed"
            );
            alerter.alert(&escalation.to_string()).await;
            return Err(escalation);
        }
        if Instant::now() + window.interval >= deadline {
            break;
        }
        sleep(window.interval).await;
    }
    debug!(invocations = invocation, "Supervision window elapsed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::testing::RecordingAlerter;

    fn counting(
        count: Arc<AtomicU32>,
        fail_on: Option<u32>,
    ) -> impl FnMut() -> std::future::Ready<Result<(), io::Error>> {
        move || {
            let n = count.fetch_add(1, Ordering::SeqCst) + 1;
            if Some(n) == fail_on {
                std::future::ready(Err(io::Error::other("tidb-1 unreachable")))
            } else {
                std::future::ready(Ok(()))
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn period_shorter_than_interval_runs_once_without_sleeping() {
        let count = Arc::new(AtomicU32::new(0));
        let alerter = RecordingAlerter::default();
        let start = Instant::now();
        run_until(
            RetryWindow::new(Duration::from_secs(5), Duration::from_secs(2)),
            &alerter,
            counting(count.clone(), None),
        )
        .await
        .unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!(alerter.messages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn invokes_every_interval_until_period() {
        let count = Arc::new(AtomicU32::new(0));
        let start = Instant::now();
        run_until(
            RetryWindow::new(Duration::from_secs(2), Duration::from_secs(7)),
            &RecordingAlerter::default(),
            counting(count.clone(), None),
        )
        .await
        .unwrap();

        // t = 0, 2, 4, 6
        assert_eq!(count.load(Ordering::SeqCst), 4);
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_escalates_and_stops() {
        let count = Arc::new(AtomicU32::new(0));
        let alerter = RecordingAlerter::default();
        let err = run_until(
            RetryWindow::new(Duration::from_secs(1), Duration::from_secs(60)),
            &alerter,
            counting(count.clone(), Some(3)),
        )
        .await
        .unwrap_err();

        assert_eq!(err.invocation, 3);
        assert_eq!(err.elapsed, Duration::from_secs(2));
        assert_eq!(count.load(Ordering::SeqCst), 3);
        let messages = alerter.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("tidb-1 unreachable"));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_is_bounded_by_period() {
        let window = RetryWindow::new(Duration::ZERO, Duration::from_millis(5));
        assert_eq!(window.interval(), MIN_RETRY_INTERVAL);
        assert_eq!(window.period(), Duration::from_millis(5));

        let count = Arc::new(AtomicU32::new(0));
        run_until(window, &RecordingAlerter::default(), counting(count.clone(), None))
            .await
            .unwrap();

        // t = 0..=4 ms
        assert_eq!(count.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_period_does_nothing() {
        let count = Arc::new(AtomicU32::new(0));
        run_until(
            RetryWindow::new(Duration::from_secs(1), Duration::ZERO),
            &RecordingAlerter::default(),
            counting(count.clone(), None),
        )
        .await
        .unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
