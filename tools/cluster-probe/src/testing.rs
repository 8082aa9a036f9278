//! In-memory doubles for the cluster API and the alerting sink.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::alert::Alerter;
use crate::error::ApiError;
use crate::resource::{LabelSet, Phased, PodPhase, ResourceApi, ResourceId, Scheduled};

#[derive(Clone, Debug, PartialEq)]
pub struct FakePod {
    pub namespace: String,
    pub name: String,
    pub phase: PodPhase,
    pub reason: Option<String>,
    pub ready: bool,
    pub node: Option<String>,
    pub labels: BTreeMap<String, String>,
}

impl FakePod {
    pub fn new(name: &str) -> Self {
        Self {
            namespace: "default".to_string(),
            name: name.to_string(),
            phase: PodPhase::Pending,
            reason: None,
            ready: false,
            node: None,
            labels: BTreeMap::new(),
        }
    }

    pub fn in_namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace.to_string();
        self
    }

    pub fn phase(mut self, phase: PodPhase) -> Self {
        self.ready = phase == PodPhase::Running;
        self.phase = phase;
        self
    }

    pub fn on_node(mut self, node: &str) -> Self {
        self.node = Some(node.to_string());
        self
    }

    pub fn label(mut self, key: &str, value: &str) -> Self {
        self.labels.insert(key.to_string(), value.to_string());
        self
    }
}

impl Phased for FakePod {
    fn phase(&self) -> PodPhase {
        self.phase
    }

    fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    fn is_ready(&self) -> bool {
        self.ready
    }
}

impl Scheduled for FakePod {
    fn node_name(&self) -> Option<&str> {
        self.node.as_deref()
    }
}

type GetFn<S> = Box<dyn Fn(&ResourceId) -> Result<S, ApiError> + Send + Sync>;
type ListFn<S> = Box<dyn Fn(&str, &LabelSet) -> Result<Vec<S>, ApiError> + Send + Sync>;

/// Resource API that replays queued `get` responses in order, then falls
/// back to `tail` for every later call.
pub struct ScriptedApi<S> {
    script: Mutex<VecDeque<Result<S, ApiError>>>,
    tail: GetFn<S>,
    listing: ListFn<S>,
    gets: Mutex<Vec<Instant>>,
}

impl<S: Send + 'static> ScriptedApi<S> {
    pub fn new<F>(tail: F) -> Self
    where
        F: Fn(&ResourceId) -> Result<S, ApiError> + Send + Sync + 'static,
    {
        Self {
            script: Mutex::new(VecDeque::new()),
            tail: Box::new(tail),
            listing: Box::new(|_, _| Ok(Vec::new())),
            gets: Mutex::new(Vec::new()),
        }
    }

    pub fn then(self, response: Result<S, ApiError>) -> Self {
        self.script.lock().unwrap().push_back(response);
        self
    }

    pub fn with_listing<F>(mut self, listing: F) -> Self
    where
        F: Fn(&str, &LabelSet) -> Result<Vec<S>, ApiError> + Send + Sync + 'static,
    {
        self.listing = Box::new(listing);
        self
    }

    pub fn get_count(&self) -> usize {
        self.gets.lock().unwrap().len()
    }

    /// Clock readings of every `get` call so far.
    pub fn get_times(&self) -> Vec<Instant> {
        self.gets.lock().unwrap().clone()
    }
}

impl ScriptedApi<FakePod> {
    /// Serves `list` from a fixed set of pods, filtered by namespace and
    /// labels. `get` always reports not found.
    pub fn with_pods(pods: Vec<FakePod>) -> Self {
        Self::new(|id| Err(not_found(id))).with_listing(move |ns, labels| {
            Ok(pods
                .iter()
                .filter(|p| p.namespace == ns && labels.matches(&p.labels))
                .cloned()
                .collect())
        })
    }
}

#[async_trait]
impl<S: Send + 'static> ResourceApi for ScriptedApi<S> {
    type State = S;

    async fn get(&self, id: &ResourceId) -> Result<S, ApiError> {
        self.gets.lock().unwrap().push(Instant::now());
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| (self.tail)(id))
    }

    async fn list(&self, namespace: &str, labels: &LabelSet) -> Result<Vec<S>, ApiError> {
        (self.listing)(namespace, labels)
    }
}

pub fn transient(msg: &str) -> ApiError {
    ApiError::request(anyhow::anyhow!(msg.to_string()))
}

pub fn not_found(id: &ResourceId) -> ApiError {
    ApiError::NotFound(id.clone())
}

/// Alerter that keeps every message it receives.
#[derive(Default)]
pub struct RecordingAlerter {
    messages: Mutex<Vec<String>>,
}

impl RecordingAlerter {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Alerter for RecordingAlerter {
    async fn alert(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
