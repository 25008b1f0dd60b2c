use crate::domain::ids::{DemandId, NodeId};

/// A traffic request between a node pair. Offered and carried traffic
/// counters drive the batch heuristic's greedy ordering.
#[derive(Debug, Clone)]
pub struct Demand {
    pub id: DemandId,
    pub ingress: NodeId,
    pub egress: NodeId,
    pub offered_gbps: f64,
}

impl Demand {
    pub fn blocked_gbps(&self, carried_gbps: f64) -> f64 {
        (self.offered_gbps - carried_gbps).max(0.0)
    }
}
