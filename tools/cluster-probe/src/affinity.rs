//! Anti-affinity values for the database components.
//!
//! Each component kind gets a soft rule asking the scheduler not to place two
//! replicas of that kind in the same topology domain. The rendered YAML is
//! the per-component values fragment consumed by the manifest composer.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    Affinity, PodAffinityTerm, PodAntiAffinity, WeightedPodAffinityTerm,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use serde::{Deserialize, Serialize};

use crate::error::TemplateError;

pub const DEFAULT_KINDS: [&str; 3] = ["pd", "tikv", "tidb"];
pub const DEFAULT_WEIGHT: i32 = 50;
pub const DEFAULT_TOPOLOGY_KEY: &str = "rack";

const INSTANCE_LABEL: &str = "app.kubernetes.io/instance";
const COMPONENT_LABEL: &str = "app.kubernetes.io/component";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AffinityInfo {
    pub cluster_name: String,
    pub kind: String,
    pub weight: i32,
    pub namespace: String,
}

/// The values entry rendered for one component kind.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentAffinity {
    pub affinity: Affinity,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AffinityTemplate {
    pub weight: i32,
    pub topology_key: String,
    pub kinds: Vec<String>,
}

impl Default for AffinityTemplate {
    fn default() -> Self {
        Self {
            weight: DEFAULT_WEIGHT,
            topology_key: DEFAULT_TOPOLOGY_KEY.to_string(),
            kinds: DEFAULT_KINDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl AffinityTemplate {
    pub fn affinity_for(&self, info: &AffinityInfo) -> Result<Affinity, TemplateError> {
        if !(1..=100).contains(&info.weight) {
            return Err(TemplateError::InvalidWeight(info.weight, info.kind.clone()));
        }
        let match_labels = BTreeMap::from([
            (INSTANCE_LABEL.to_string(), info.cluster_name.clone()),
            (COMPONENT_LABEL.to_string(), info.kind.clone()),
        ]);
        Ok(Affinity {
            pod_anti_affinity: Some(PodAntiAffinity {
                preferred_during_scheduling_ignored_during_execution: Some(vec![
                    WeightedPodAffinityTerm {
                        weight: info.weight,
                        pod_affinity_term: PodAffinityTerm {
                            label_selector: Some(LabelSelector {
                                match_labels: Some(match_labels),
                                ..Default::default()
                            }),
                            topology_key: self.topology_key.clone(),
                            namespaces: Some(vec![info.namespace.clone()]),
                            ..Default::default()
                        },
                    },
                ]),
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    /// Renders the `<kind>:` values entry for a single component.
    pub fn render(&self, info: &AffinityInfo) -> Result<String, TemplateError> {
        let entry = BTreeMap::from([(
            info.kind.as_str(),
            ComponentAffinity {
                affinity: self.affinity_for(info)?,
            },
        )]);
        serde_yaml::to_string(&entry).map_err(|source| TemplateError::Render {
            kind: info.kind.clone(),
            source,
        })
    }

    /// Renders every configured kind, in order, into one document.
    pub fn render_all(
        &self,
        cluster_name: &str,
        namespace: &str,
    ) -> Result<String, TemplateError> {
        let mut out = String::new();
        for kind in &self.kinds {
            out.push_str(&self.render(&AffinityInfo {
                cluster_name: cluster_name.to_string(),
                kind: kind.clone(),
                weight: self.weight,
                namespace: namespace.to_string(),
            })?);
        }
        Ok(out)
    }
}

/// pd, tikv and tidb anti-affinity with the default weight and topology key.
pub fn affinity_config(cluster_name: &str, namespace: &str) -> Result<String, TemplateError> {
    AffinityTemplate::default().render_all(cluster_name, namespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_kinds_in_order() {
        let doc = affinity_config("demo", "tidb-ns").unwrap();
        let pd = doc.find("pd:\n").unwrap();
        let tikv = doc.find("\ntikv:\n").unwrap();
        let tidb = doc.find("\ntidb:\n").unwrap();
        assert_eq!(pd, 0);
        assert!(pd < tikv && tikv < tidb);
    }

    #[test]
    fn rendered_document_round_trips() {
        let doc = affinity_config("demo", "tidb-ns").unwrap();
        let parsed: BTreeMap<String, ComponentAffinity> = serde_yaml::from_str(&doc).unwrap();
        assert_eq!(parsed.len(), 3);

        let tikv = &parsed["tikv"].affinity;
        let terms = tikv
            .pod_anti_affinity
            .as_ref()
            .and_then(|a| a.preferred_during_scheduling_ignored_during_execution.as_ref())
            .unwrap();
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].weight, 50);
        let term = &terms[0].pod_affinity_term;
        assert_eq!(term.topology_key, "rack");
        assert_eq!(term.namespaces, Some(vec!["tidb-ns".to_string()]));
        let labels = term
            .label_selector
            .as_ref()
            .and_then(|s| s.match_labels.as_ref())
            .unwrap();
        assert_eq!(labels[INSTANCE_LABEL], "demo");
        assert_eq!(labels[COMPONENT_LABEL], "tikv");
        assert!(tikv.node_affinity.is_none());
        assert!(tikv.pod_affinity.is_none());
    }

    #[test]
    fn custom_kind_and_topology() {
        let template = AffinityTemplate {
            weight: 80,
            topology_key: "kubernetes.io/hostname".to_string(),
            kinds: vec!["ticdc".to_string()],
        };
        let doc = template.render_all("demo", "ns").unwrap();
        assert!(doc.starts_with("ticdc:\n"));
        assert!(doc.contains("topologyKey: kubernetes.io/hostname"));
        assert!(doc.contains("weight: 80"));
    }

    #[test]
    fn out_of_range_weight_is_rejected() {
        let template = AffinityTemplate {
            weight: 0,
            ..Default::default()
        };
        let err = template.render_all("demo", "ns").unwrap_err();
        assert!(matches!(err, TemplateError::InvalidWeight(0, ref kind) if kind == "pd"));
    }
}
