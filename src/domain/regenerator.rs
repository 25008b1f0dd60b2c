use crate::domain::topology::{Path, Topology};

/// Computes the positions along `path` where signal regeneration is
/// mandatory for a transponder with optical reach `reach_km`.
///
/// The path is partitioned greedily into maximal contiguous runs whose
/// cumulative length does not exceed the reach; a regenerator is inserted at
/// the start of every run after the first. Returned positions are indices
/// into `path.fibers`: a position `i` means a regenerator at the entry node
/// of the i-th fiber.
///
/// # Returns
/// `Some(positions)` (empty if the whole path is within reach), or `None` if
/// a single fiber alone exceeds the reach, in which case no regenerator
/// placement can make the path feasible.
pub fn regenerator_positions(topology: &Topology, path: &Path, reach_km: f64) -> Option<Vec<usize>> {
    if reach_km <= 0.0 {
        // Non-positive reach means unlimited.
        return Some(Vec::new());
    }

    let mut positions: Vec<usize> = Vec::new();
    let mut run_length_km: f64 = 0.0;

    for (index, fiber) in path.fibers.iter().enumerate() {
        let fiber_length_km = topology.fiber(*fiber).length_km;

        if fiber_length_km > reach_km {
            return None;
        }

        if run_length_km + fiber_length_km > reach_km {
            positions.push(index);
            run_length_km = fiber_length_km;
        } else {
            run_length_km += fiber_length_km;
        }
    }

    return Some(positions);
}
