use std::collections::HashSet;

use crate::domain::ids::{NodeId, SrgId};
use crate::domain::topology::{FiberId, Path, Topology};

/// A set of fibers and/or nodes that fail together under a single risk event.
#[derive(Debug, Clone)]
pub struct SharedRiskGroup {
    pub id: SrgId,
    pub fibers: HashSet<FiberId>,
    pub nodes: HashSet<NodeId>,
}

impl SharedRiskGroup {
    pub fn affects_path(&self, topology: &Topology, path: &Path) -> bool {
        if path.fibers.iter().any(|f| self.fibers.contains(f)) {
            return true;
        }

        return path.nodes(topology).iter().any(|n| self.nodes.contains(n));
    }
}

/// All shared risk groups of a scenario.
#[derive(Debug, Clone, Default)]
pub struct SrgSet {
    groups: Vec<SharedRiskGroup>,
}

impl SrgSet {
    pub fn new(groups: Vec<SharedRiskGroup>) -> Self {
        SrgSet { groups }
    }

    pub fn groups(&self) -> &[SharedRiskGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// The ids of all groups the path is a member of.
    pub fn srgs_of_path(&self, topology: &Topology, path: &Path) -> HashSet<SrgId> {
        self.groups.iter().filter(|g| g.affects_path(topology, path)).map(|g| g.id.clone()).collect()
    }

    /// True if the two paths share membership in at least one group.
    pub fn share_risk(&self, topology: &Topology, path_a: &Path, path_b: &Path) -> bool {
        self.groups.iter().any(|g| g.affects_path(topology, path_a) && g.affects_path(topology, path_b))
    }
}
