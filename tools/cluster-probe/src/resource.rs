use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;

use crate::error::ApiError;

/// Identity of a namespaced cluster resource.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceId {
    pub namespace: String,
    pub name: String,
}

impl ResourceId {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Exact label-equality selector.
///
/// Renders as `k1=v1,k2=v2` with keys sorted, the form accepted by the
/// `labelSelector` list parameter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelSet(BTreeMap<String, String>);

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// True when every label in the set is present with the same value.
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.0.iter().all(|(k, v)| labels.get(k) == Some(v))
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (k, v) in &self.0 {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{k}={v}")?;
            first = false;
        }
        Ok(())
    }
}

impl<K, V> FromIterator<(K, V)> for LabelSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<BTreeMap<String, String>> for LabelSet {
    fn from(value: BTreeMap<String, String>) -> Self {
        Self(value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl PodPhase {
    pub fn parse(phase: Option<&str>) -> Self {
        match phase {
            Some("Pending") => PodPhase::Pending,
            Some("Running") => PodPhase::Running,
            Some("Succeeded") => PodPhase::Succeeded,
            Some("Failed") => PodPhase::Failed,
            _ => PodPhase::Unknown,
        }
    }

    /// Phases a pod never leaves once entered.
    pub fn is_finished(self) -> bool {
        matches!(self, PodPhase::Succeeded | PodPhase::Failed)
    }
}

impl fmt::Display for PodPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PodPhase::Pending => "Pending",
            PodPhase::Running => "Running",
            PodPhase::Succeeded => "Succeeded",
            PodPhase::Failed => "Failed",
            PodPhase::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// Lifecycle view of an observed resource state.
pub trait Phased {
    fn phase(&self) -> PodPhase;

    fn reason(&self) -> Option<&str> {
        None
    }

    fn is_ready(&self) -> bool {
        false
    }
}

/// Node assignment of an observed resource state.
pub trait Scheduled {
    fn node_name(&self) -> Option<&str>;
}

/// Read access to the cluster. Implementations must be safe to share
/// between independent pollers.
#[async_trait]
pub trait ResourceApi: Send + Sync {
    type State: Send;

    async fn get(&self, id: &ResourceId) -> Result<Self::State, ApiError>;

    async fn list(
        &self,
        namespace: &str,
        labels: &LabelSet,
    ) -> Result<Vec<Self::State>, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_is_sorted_and_comma_joined() {
        let labels = LabelSet::new()
            .with("k8s-app", "kube-dns")
            .with("component", "x");
        assert_eq!(labels.to_string(), "component=x,k8s-app=kube-dns");
        assert_eq!(LabelSet::new().to_string(), "");
    }

    #[test]
    fn matches_requires_every_label() {
        let labels: LabelSet = [("app", "db"), ("tier", "b")].into_iter().collect();
        let mut pod = BTreeMap::from([
            ("app".to_string(), "db".to_string()),
            ("tier".to_string(), "b".to_string()),
            ("extra".to_string(), "1".to_string()),
        ]);
        assert!(labels.matches(&pod));
        pod.insert("tier".into(), "a".into());
        assert!(!labels.matches(&pod));
    }

    #[test]
    fn phase_parsing() {
        assert_eq!(PodPhase::parse(Some("Running")), PodPhase::Running);
        assert_eq!(PodPhase::parse(Some("Evicted")), PodPhase::Unknown);
        assert_eq!(PodPhase::parse(None), PodPhase::Unknown);
        assert!(PodPhase::Failed.is_finished());
        assert!(!PodPhase::Pending.is_finished());
    }
}
