use std::time::Duration;

use crate::resource::{PodPhase, ResourceId};

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure of a single call against the cluster resource API.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(ResourceId),
    #[error("request failed: {0}")]
    Request(#[source] BoxError),
}

impl ApiError {
    pub fn request<E: Into<BoxError>>(err: E) -> Self {
        ApiError::Request(err.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum WaitError {
    #[error("{0} not found")]
    NotFound(ResourceId),
    #[error("{resource} reached a terminal state: {source}")]
    TerminalFailure {
        resource: ResourceId,
        #[source]
        source: BoxError,
    },
    #[error("gave up after waiting {timeout:?} for {resource} to be {desc}")]
    DeadlineExceeded {
        resource: ResourceId,
        desc: String,
        timeout: Duration,
    },
    #[error("fetching {resource} failed: {source}")]
    Fetch {
        resource: ResourceId,
        #[source]
        source: ApiError,
    },
}

impl WaitError {
    pub fn resource(&self) -> &ResourceId {
        match self {
            WaitError::NotFound(id) => id,
            WaitError::TerminalFailure { resource, .. }
            | WaitError::DeadlineExceeded { resource, .. }
            | WaitError::Fetch { resource, .. } => resource,
        }
    }

    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, WaitError::DeadlineExceeded { .. })
    }
}

#[derive(thiserror::Error, Debug)]
#[error("pod ran to completion with phase {0}")]
pub struct PodCompleted(pub PodPhase);

/// Returned when a supervised operation fails. The failure has already been
/// sent to the alerter; the caller decides whether to abort.
#[derive(thiserror::Error, Debug)]
#[error("operation failed on invocation {invocation} after {elapsed:?}: {source}")]
pub struct Escalation<E>
where
    E: std::error::Error + 'static,
{
    pub invocation: u64,
    pub elapsed: Duration,
    #[source]
    pub source: E,
}

#[derive(thiserror::Error, Debug)]
pub enum TemplateError {
    #[error("weight {0} for kind {1} is outside 1..=100")]
    InvalidWeight(i32, String),
    #[error("rendering affinity for kind {kind} failed: {source}")]
    Render {
        kind: String,
        #[source]
        source: serde_yaml::Error,
    },
}
