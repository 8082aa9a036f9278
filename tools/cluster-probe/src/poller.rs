//! Waiting on observed resource state.
//!
//! Every waiter here re-fetches the resource by identity on each tick and
//! sleeps for the poll interval between ticks. A fetch that reports the
//! resource as gone ends the general wait immediately; any other fetch error
//! only costs that tick.

use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use crate::error::{ApiError, BoxError, PodCompleted, WaitError};
use crate::resource::{Phased, PodPhase, ResourceApi, ResourceId};

pub const POD_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// How long to wait for a pod to be started or terminated.
pub const POD_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Shortest interval a window accepts; zero would spin against the apiserver.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollWindow {
    interval: Duration,
    timeout: Duration,
}

impl Default for PollWindow {
    fn default() -> Self {
        Self {
            interval: POD_POLL_INTERVAL,
            timeout: POD_TIMEOUT,
        }
    }
}

impl PollWindow {
    /// An interval below [`MIN_POLL_INTERVAL`] is raised to it.
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval: interval.max(MIN_POLL_INTERVAL),
            timeout,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Default::default()
        }
    }
}

/// Waits until `condition` reports the resource done.
///
/// `condition` returning `Ok(true)` ends the wait successfully, `Ok(false)`
/// keeps polling and `Err` ends it with [`WaitError::TerminalFailure`].
/// A not-found fetch is returned as [`WaitError::NotFound`] straight away;
/// other fetch errors are logged and the next tick proceeds as usual, so a
/// resource that can never be read ends in [`WaitError::DeadlineExceeded`].
pub async fn wait_for_condition<A, F, E>(
    api: &A,
    id: &ResourceId,
    desc: &str,
    window: PollWindow,
    mut condition: F,
) -> Result<(), WaitError>
where
    A: ResourceApi + ?Sized,
    F: FnMut(&A::State) -> Result<bool, E>,
    E: Into<BoxError>,
{
    info!(
        resource = %id,
        "Waiting up to {:?} for {} to be {:?}",
        window.timeout,
        id,
        desc
    );
    let start = Instant::now();
    while start.elapsed() < window.timeout {
        match api.get(id).await {
            Err(ApiError::NotFound(_)) => {
                info!(resource = %id, "{} not found", id);
                return Err(WaitError::NotFound(id.clone()));
            }
            Err(e) => {
                info!(
                    resource = %id,
                    error = %e,
                    "Get {} failed, ignoring for {:?}",
                    id,
                    window.interval
                );
            }
            Ok(state) => {
                debug!(resource = %id, elapsed = ?start.elapsed(), "observed");
                match condition(&state) {
                    Ok(true) => {
                        info!(resource = %id, "{} satisfied condition {:?}", id, desc);
                        return Ok(());
                    }
                    Ok(false) => {}
                    Err(e) => {
                        return Err(WaitError::TerminalFailure {
                            resource: id.clone(),
                            source: e.into(),
                        });
                    }
                }
            }
        }
        sleep(window.interval).await;
    }
    Err(WaitError::DeadlineExceeded {
        resource: id.clone(),
        desc: desc.to_string(),
        timeout: window.timeout,
    })
}

/// Waits until fetching the resource reports it as not found.
///
/// Unlike [`wait_for_condition`], any other fetch error ends the wait with
/// [`WaitError::Fetch`].
pub async fn wait_for_absence<A>(
    api: &A,
    id: &ResourceId,
    window: PollWindow,
) -> Result<(), WaitError>
where
    A: ResourceApi + ?Sized,
{
    let start = Instant::now();
    while start.elapsed() < window.timeout {
        match api.get(id).await {
            Err(ApiError::NotFound(_)) => {
                debug!(resource = %id, elapsed = ?start.elapsed(), "gone");
                return Ok(());
            }
            Err(source) => {
                return Err(WaitError::Fetch {
                    resource: id.clone(),
                    source,
                });
            }
            Ok(_) => {
                debug!(resource = %id, elapsed = ?start.elapsed(), "still present");
            }
        }
        sleep(window.interval).await;
    }
    Err(WaitError::DeadlineExceeded {
        resource: id.clone(),
        desc: "absent".to_string(),
        timeout: window.timeout,
    })
}

/// Waits for the resource to reach [`PodPhase::Running`].
///
/// Reaching `Succeeded` or `Failed` first is a terminal failure: the pod
/// will never run again.
pub async fn wait_for_running_phase<A>(
    api: &A,
    id: &ResourceId,
    window: PollWindow,
) -> Result<(), WaitError>
where
    A: ResourceApi + ?Sized,
    A::State: Phased,
{
    let start = Instant::now();
    wait_for_condition(api, id, "running", window, |state| {
        let phase = state.phase();
        // log before deciding so the last observed state is always reported
        info!(
            resource = %id,
            phase = %phase,
            reason = state.reason().unwrap_or_default(),
            ready = state.is_ready(),
            elapsed = ?start.elapsed(),
            "observed"
        );
        match phase {
            PodPhase::Running => Ok(true),
            PodPhase::Succeeded | PodPhase::Failed => Err(PodCompleted(phase)),
            _ => Ok(false),
        }
    })
    .await
}
