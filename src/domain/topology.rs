use std::collections::{HashMap, HashSet};

use crate::domain::ids::NodeId;
use crate::error::{Error, Result};

/// Propagation speed of light in fiber, used to derive per-path delay.
pub const PROPAGATION_SPEED_KM_PER_S: f64 = 200_000.0;

/// Dense index of a fiber within a topology snapshot.
///
/// Fibers are numbered `0..num_fibers()` at construction time so that the
/// spectrum occupancy grid can address them as matrix columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FiberId(pub usize);

impl std::fmt::Display for FiberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fiber-{}", self.0)
    }
}

/// A directed link between two nodes. Capacity is expressed in frequency
/// slots (uniform across the topology), not in bits.
#[derive(Debug, Clone)]
pub struct Fiber {
    pub id: FiberId,
    pub name: String,
    pub source: NodeId,
    pub target: NodeId,
    pub length_km: f64,
}

impl Fiber {
    pub fn delay_ms(&self) -> f64 {
        self.length_km / PROPAGATION_SPEED_KM_PER_S * 1_000.0
    }
}

/// The physical node/fiber graph of one topology snapshot.
///
/// The topology is immutable after construction; failure states are tracked
/// by the session on top of it, never by mutating the graph itself.
#[derive(Debug, Clone)]
pub struct Topology {
    nodes: Vec<NodeId>,
    fibers: Vec<Fiber>,

    /// Maps a node to its outgoing fibers, sorted by `FiberId` so that any
    /// traversal of the adjacency is deterministic.
    adjacency: HashMap<NodeId, Vec<FiberId>>,

    /// Uniform number of frequency slots `S` on every fiber.
    num_slots: usize,

    name_index: HashMap<String, FiberId>,
}

impl Topology {
    pub fn new(nodes: Vec<NodeId>, fiber_specs: Vec<(String, NodeId, NodeId, f64)>, num_slots: usize) -> Result<Self> {
        if num_slots == 0 {
            return Err(Error::ModelConstruction("the number of frequency slots per fiber must be positive".to_string()));
        }

        let node_set: HashSet<&NodeId> = nodes.iter().collect();
        let mut fibers: Vec<Fiber> = Vec::with_capacity(fiber_specs.len());
        let mut adjacency: HashMap<NodeId, Vec<FiberId>> = HashMap::new();
        let mut name_index: HashMap<String, FiberId> = HashMap::new();

        for (name, source, target, length_km) in fiber_specs {
            if !node_set.contains(&source) {
                return Err(Error::ModelConstruction(format!("fiber '{}' references unknown source node '{}'", name, source)));
            }

            if !node_set.contains(&target) {
                return Err(Error::ModelConstruction(format!("fiber '{}' references unknown target node '{}'", name, target)));
            }

            if length_km <= 0.0 {
                return Err(Error::ModelConstruction(format!("fiber '{}' has non-positive length {} km", name, length_km)));
            }

            let id = FiberId(fibers.len());

            if name_index.insert(name.clone(), id).is_some() {
                return Err(Error::ModelConstruction(format!("duplicate fiber id '{}'", name)));
            }

            adjacency.entry(source.clone()).or_default().push(id);
            fibers.push(Fiber { id, name, source, target, length_km });
        }

        for outgoing in adjacency.values_mut() {
            outgoing.sort();
        }

        Ok(Topology { nodes, fibers, adjacency, num_slots, name_index })
    }

    pub fn num_slots(&self) -> usize {
        self.num_slots
    }

    pub fn num_fibers(&self) -> usize {
        self.fibers.len()
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn fibers(&self) -> &[Fiber] {
        &self.fibers
    }

    pub fn fiber(&self, id: FiberId) -> &Fiber {
        &self.fibers[id.0]
    }

    pub fn fiber_by_name(&self, name: &str) -> Option<FiberId> {
        self.name_index.get(name).copied()
    }

    pub fn contains_node(&self, node: &NodeId) -> bool {
        self.nodes.iter().any(|n| n == node)
    }

    /// Outgoing fibers of `node` in deterministic order. Nodes without
    /// outgoing fibers are not present in the adjacency map.
    pub fn outgoing(&self, node: &NodeId) -> &[FiberId] {
        self.adjacency.get(node).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

/// An ordered, loop-free sequence of fibers connecting two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub fibers: Vec<FiberId>,
}

impl Path {
    pub fn new(fibers: Vec<FiberId>) -> Self {
        Path { fibers }
    }

    pub fn hop_count(&self) -> usize {
        self.fibers.len()
    }

    pub fn length_km(&self, topology: &Topology) -> f64 {
        self.fibers.iter().map(|f| topology.fiber(*f).length_km).sum()
    }

    pub fn delay_ms(&self, topology: &Topology) -> f64 {
        self.fibers.iter().map(|f| topology.fiber(*f).delay_ms()).sum()
    }

    pub fn source(&self, topology: &Topology) -> NodeId {
        topology.fiber(self.fibers[0]).source.clone()
    }

    pub fn target(&self, topology: &Topology) -> NodeId {
        topology.fiber(*self.fibers.last().expect("a path contains at least one fiber")).target.clone()
    }

    pub fn traverses_fiber(&self, fiber: FiberId) -> bool {
        self.fibers.contains(&fiber)
    }

    /// All nodes the path touches, endpoints included, in traversal order.
    pub fn nodes(&self, topology: &Topology) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = Vec::with_capacity(self.fibers.len() + 1);
        nodes.push(self.source(topology));

        for fiber in &self.fibers {
            nodes.push(topology.fiber(*fiber).target.clone());
        }

        return nodes;
    }

    /// Nodes strictly between the endpoints, used for node-disjointness checks.
    pub fn interior_nodes(&self, topology: &Topology) -> Vec<NodeId> {
        let nodes = self.nodes(topology);

        if nodes.len() <= 2 {
            return Vec::new();
        }

        return nodes[1..nodes.len() - 1].to_vec();
    }

    pub fn traverses_node(&self, topology: &Topology, node: &NodeId) -> bool {
        self.nodes(topology).iter().any(|n| n == node)
    }
}
