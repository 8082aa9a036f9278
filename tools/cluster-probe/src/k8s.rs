use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::{
    Client,
    api::{Api, ListParams},
};

use crate::error::ApiError;
use crate::resource::{LabelSet, Phased, PodPhase, ResourceApi, ResourceId, Scheduled};

/// Pod access through a kube client.
#[derive(Clone)]
pub struct PodApi {
    client: Client,
}

impl PodApi {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Client from the local kubeconfig or in-cluster environment.
    pub async fn infer() -> Result<Self, ApiError> {
        let client = Client::try_default().await.map_err(ApiError::request)?;
        Ok(Self::new(client))
    }
}

fn classify(id: &ResourceId, err: kube::Error) -> ApiError {
    match err {
        kube::Error::Api(ae) if ae.code == 404 => ApiError::NotFound(id.clone()),
        other => ApiError::request(other),
    }
}

#[async_trait]
impl ResourceApi for PodApi {
    type State = Pod;

    async fn get(&self, id: &ResourceId) -> Result<Pod, ApiError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &id.namespace);
        pods.get(&id.name).await.map_err(|e| classify(id, e))
    }

    async fn list(&self, namespace: &str, labels: &LabelSet) -> Result<Vec<Pod>, ApiError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let lp = ListParams::default().labels(&labels.to_string());
        let list = pods.list(&lp).await.map_err(ApiError::request)?;
        Ok(list.items)
    }
}

impl Phased for Pod {
    fn phase(&self) -> PodPhase {
        PodPhase::parse(self.status.as_ref().and_then(|s| s.phase.as_deref()))
    }

    fn reason(&self) -> Option<&str> {
        self.status.as_ref().and_then(|s| s.reason.as_deref())
    }

    fn is_ready(&self) -> bool {
        self.status
            .as_ref()
            .and_then(|s| s.conditions.as_ref())
            .map(|conditions| {
                conditions
                    .iter()
                    .any(|c| c.type_ == "Ready" && c.status == "True")
            })
            .unwrap_or(false)
    }
}

impl Scheduled for Pod {
    fn node_name(&self) -> Option<&str> {
        self.spec.as_ref().and_then(|s| s.node_name.as_deref())
    }
}
