//! Polling and supervision helpers for cluster end-to-end tests.
//!
//! [`poller`] waits on a single resource, [`supervisor`] re-runs a liveness
//! check over a time window, and [`affinity`] renders scheduling values for
//! the database components under test.

pub mod affinity;
pub mod alert;
pub mod config;
pub mod error;
pub mod k8s;
pub mod lookup;
pub mod nodes;
pub mod poller;
pub mod resource;
pub mod supervisor;
pub mod testing;

pub use alert::{Alerter, LogAlerter};
pub use config::ProbeConfig;
pub use error::{ApiError, BoxError, Escalation, TemplateError, WaitError};
pub use poller::{PollWindow, wait_for_absence, wait_for_condition, wait_for_running_phase};
pub use resource::{LabelSet, Phased, PodPhase, ResourceApi, ResourceId, Scheduled};
pub use supervisor::{RetryWindow, run_until};

use tracing_subscriber::EnvFilter;

/// Installs a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
/// Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_tracing_is_idempotent() {
        super::init_tracing();
        super::init_tracing();
        tracing::info!("subscriber installed");
    }
}
