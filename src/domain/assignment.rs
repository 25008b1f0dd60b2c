use std::ops::Range;

use crate::domain::topology::{FiberId, Path};

/// Tags which of a lightpath's assignments a value represents. Primary and
/// backup share one value type so that allocate/release logic exists once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentRole {
    Primary,
    Backup,
}

/// A committed (or candidate) realization of a lightpath on the network: the
/// physical route, the contiguous slot block occupied on every fiber of that
/// route, and the positions along the route where a regenerator is inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceAssignment {
    pub path: Path,

    /// First slot of the contiguous block `[start_slot, start_slot + num_slots)`.
    pub start_slot: usize,
    pub num_slots: usize,

    /// Indices into `path.fibers` at whose entry node a regenerator is
    /// placed. Empty if the path is within reach unregenerated.
    pub regenerator_positions: Vec<usize>,
}

impl ResourceAssignment {
    pub fn new(path: Path, start_slot: usize, num_slots: usize, regenerator_positions: Vec<usize>) -> Self {
        ResourceAssignment { path, start_slot, num_slots, regenerator_positions }
    }

    pub fn slot_range(&self) -> Range<usize> {
        self.start_slot..self.start_slot + self.num_slots
    }

    pub fn regenerator_count(&self) -> usize {
        self.regenerator_positions.len()
    }

    pub fn covers(&self, fiber: FiberId, slot: usize) -> bool {
        self.slot_range().contains(&slot) && self.path.traverses_fiber(fiber)
    }
}
