use std::time::Duration;

use envconfig::Envconfig;

use crate::affinity::{AffinityTemplate, DEFAULT_KINDS};
use crate::poller::PollWindow;

#[derive(Envconfig, Debug, Clone)]
pub struct ProbeConfig {
    #[envconfig(from = "PROBE_POLL_INTERVAL_MS", default = "2000")]
    pub poll_interval_ms: u64,

    #[envconfig(from = "PROBE_POD_TIMEOUT_SECS", default = "300")]
    pub pod_timeout_secs: u64,

    #[envconfig(from = "PROBE_SYSTEM_NAMESPACE", default = "kube-system")]
    pub system_namespace: String,

    #[envconfig(from = "PROBE_AFFINITY_WEIGHT", default = "50")]
    pub affinity_weight: i32,

    #[envconfig(from = "PROBE_AFFINITY_TOPOLOGY_KEY", default = "rack")]
    pub affinity_topology_key: String,
}

impl ProbeConfig {
    pub fn poll_window(&self) -> PollWindow {
        PollWindow::new(
            Duration::from_millis(self.poll_interval_ms),
            Duration::from_secs(self.pod_timeout_secs),
        )
    }

    pub fn affinity_template(&self) -> AffinityTemplate {
        AffinityTemplate {
            weight: self.affinity_weight,
            topology_key: self.affinity_topology_key.clone(),
            kinds: DEFAULT_KINDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}
