use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

/// Cluster nodes hosted on one VM.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeGroup {
    pub vm: String,
    pub nodes: Vec<String>,
}

/// Picks fault-injection targets at random.
///
/// The generator is seeded once when the selector is built.
pub struct NodeSelector {
    rng: StdRng,
}

impl NodeSelector {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic selector for reproducible runs.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Chooses a VM uniformly among those hosting at least one node, then a
    /// node on it. `None` when there are no nodes at all.
    pub fn select<'a>(&mut self, groups: &'a [NodeGroup]) -> Option<&'a str> {
        let candidates: Vec<&NodeGroup> =
            groups.iter().filter(|g| !g.nodes.is_empty()).collect();
        let group: &'a NodeGroup = candidates.choose(&mut self.rng).copied()?;
        group.nodes.choose(&mut self.rng).map(String::as_str)
    }
}

impl Default for NodeSelector {
    fn default() -> Self {
        Self::new()
    }
}
