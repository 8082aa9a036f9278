use tracing::debug;

use crate::error::ApiError;
use crate::resource::{LabelSet, ResourceApi, Scheduled};

pub const SYSTEM_NAMESPACE: &str = "kube-system";

/// Lists resources matching `labels` in `namespace` and returns the first one
/// assigned to `node`.
///
/// `Ok(None)` means the query worked but nothing matching runs on that node
/// (yet); it is not an error.
pub async fn find_resource_on_node<A>(
    api: &A,
    namespace: &str,
    labels: &LabelSet,
    node: &str,
) -> Result<Option<A::State>, ApiError>
where
    A: ResourceApi + ?Sized,
    A::State: Scheduled,
{
    let items = api.list(namespace, labels).await?;
    debug!(
        namespace,
        selector = %labels,
        matched = items.len(),
        node,
        "listed resources"
    );
    Ok(items
        .into_iter()
        .find(|item| item.node_name() == Some(node)))
}

/// Control plane components that run as static or daemon pods.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SystemComponent {
    ApiServer,
    Scheduler,
    ControllerManager,
    Dns,
    Proxy,
}

impl SystemComponent {
    pub const ALL: [SystemComponent; 5] = [
        SystemComponent::ApiServer,
        SystemComponent::Scheduler,
        SystemComponent::ControllerManager,
        SystemComponent::Dns,
        SystemComponent::Proxy,
    ];

    pub fn labels(self) -> LabelSet {
        let (key, value) = match self {
            SystemComponent::ApiServer => ("component", "kube-apiserver"),
            SystemComponent::Scheduler => ("component", "kube-scheduler"),
            SystemComponent::ControllerManager => {
                ("component", "kube-controller-manager")
            }
            SystemComponent::Dns => ("k8s-app", "kube-dns"),
            SystemComponent::Proxy => ("k8s-app", "kube-proxy"),
        };
        LabelSet::new().with(key, value)
    }
}

pub async fn find_system_pod<A>(
    api: &A,
    namespace: &str,
    component: SystemComponent,
    node: &str,
) -> Result<Option<A::State>, ApiError>
where
    A: ResourceApi + ?Sized,
    A::State: Scheduled,
{
    find_resource_on_node(api, namespace, &component.labels(), node).await
}
