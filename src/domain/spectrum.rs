use crate::domain::assignment::ResourceAssignment;
use crate::domain::topology::{FiberId, Path};
use crate::error::{Error, Result};

/// The slot-by-fiber spectrum occupancy grid.
///
/// This is the single source of truth for occupancy: a cell `(slot, fiber)`
/// is occupied iff the union of all currently allocated assignments covers
/// it. No other component holds occupancy state; lightpaths only keep their
/// `ResourceAssignment` as a back-reference into this grid.
///
/// All operations assume exclusive access for their duration. The grid has
/// no internal locking; the owning session serializes every mutation.
#[derive(Debug, Clone)]
pub struct SpectrumGrid {
    /// One occupancy row per fiber, each `num_slots` cells wide.
    occupied: Vec<Vec<bool>>,
    num_slots: usize,
}

impl SpectrumGrid {
    pub fn new(num_fibers: usize, num_slots: usize) -> Self {
        SpectrumGrid { occupied: vec![vec![false; num_slots]; num_fibers], num_slots }
    }

    pub fn num_slots(&self) -> usize {
        self.num_slots
    }

    pub fn num_fibers(&self) -> usize {
        self.occupied.len()
    }

    fn is_block_free(&self, path: &Path, start_slot: usize, num_slots: usize) -> bool {
        for fiber in &path.fibers {
            let row = &self.occupied[fiber.0];

            for slot in start_slot..start_slot + num_slots {
                if row[slot] {
                    return false;
                }
            }
        }

        return true;
    }

    /// Scans slot indices in increasing order and returns the first start
    /// slot such that all `num_slots` consecutive slots are free on every
    /// fiber of `path`.
    ///
    /// The lowest feasible start slot always wins; the heuristic's
    /// reproducibility depends on this tie-break.
    pub fn first_fit(&self, path: &Path, num_slots: usize) -> Option<usize> {
        if num_slots == 0 || num_slots > self.num_slots {
            return None;
        }

        for start_slot in 0..=self.num_slots - num_slots {
            if self.is_block_free(path, start_slot, num_slots) {
                return Some(start_slot);
            }
        }

        return None;
    }

    /// First-fit over a pair of paths. The two paths may use different start
    /// slots; the backup need not mirror the primary's slot block.
    ///
    /// When the pair is not perfectly disjoint (maximum-disjointness
    /// fallback), the second block must also not overlap the first one on
    /// any fiber the paths share.
    pub fn first_fit_pair(&self, path_a: &Path, path_b: &Path, num_slots: usize) -> Option<(usize, usize)> {
        let start_a = self.first_fit(path_a, num_slots)?;

        let shared: Vec<FiberId> = path_a.fibers.iter().copied().filter(|f| path_b.traverses_fiber(*f)).collect();

        for start_b in 0..=self.num_slots - num_slots {
            if !self.is_block_free(path_b, start_b, num_slots) {
                continue;
            }

            let overlaps_a = !shared.is_empty() && start_b < start_a + num_slots && start_a < start_b + num_slots;

            if !overlaps_a {
                return Some((start_a, start_b));
            }
        }

        return None;
    }

    /// Pure predicate version of `allocate`, used to validate externally
    /// supplied assignments before committing them.
    pub fn is_allocatable(&self, assignment: &ResourceAssignment) -> bool {
        if assignment.start_slot + assignment.num_slots > self.num_slots {
            return false;
        }

        return self.is_block_free(&assignment.path, assignment.start_slot, assignment.num_slots);
    }

    /// Marks every `(slot, fiber)` cell covered by the assignment occupied.
    ///
    /// Fails without mutating anything if any covered cell is already
    /// occupied. Whether that failure is a recoverable `ResourceConflict`
    /// (caller-supplied assignment) or a fatal bookkeeping bug (internally
    /// computed allocation) is the caller's decision.
    pub fn allocate(&mut self, assignment: &ResourceAssignment) -> Result<()> {
        if assignment.start_slot + assignment.num_slots > self.num_slots {
            return Err(Error::ResourceConflict { fiber: assignment.path.fibers[0].0, slot: self.num_slots });
        }

        for fiber in &assignment.path.fibers {
            for slot in assignment.slot_range() {
                if self.occupied[fiber.0][slot] {
                    return Err(Error::ResourceConflict { fiber: fiber.0, slot });
                }
            }
        }

        for fiber in &assignment.path.fibers {
            for slot in assignment.slot_range() {
                self.occupied[fiber.0][slot] = true;
            }
        }

        Ok(())
    }

    /// Clears every cell covered by the assignment.
    ///
    /// Releasing a cell that is already free means the incremental grid and
    /// the set of live assignments have diverged; that is a fatal
    /// `InvariantViolation`, never a recoverable condition.
    pub fn release(&mut self, assignment: &ResourceAssignment) -> Result<()> {
        for fiber in &assignment.path.fibers {
            for slot in assignment.slot_range() {
                if !self.occupied[fiber.0][slot] {
                    log::error!("Release of an unoccupied cell: fiber {} slot {}. The occupancy bookkeeping is corrupt.", fiber.0, slot);

                    return Err(Error::InvariantViolation { fiber: fiber.0, slot });
                }
            }
        }

        for fiber in &assignment.path.fibers {
            for slot in assignment.slot_range() {
                self.occupied[fiber.0][slot] = false;
            }
        }

        Ok(())
    }

    pub fn occupied_slot_count(&self, fiber: FiberId) -> usize {
        self.occupied[fiber.0].iter().filter(|c| **c).count()
    }

    pub fn free_slot_count(&self, fiber: FiberId) -> usize {
        self.num_slots - self.occupied_slot_count(fiber)
    }

    /// The worst-case residual capacity of a path: the minimum number of free
    /// slots across its fibers. Used by the least-congested routing policy.
    pub fn min_free_slots(&self, path: &Path) -> usize {
        path.fibers.iter().map(|f| self.free_slot_count(*f)).min().unwrap_or(self.num_slots)
    }

    /// Recomputes the full grid from the set of live assignments and compares
    /// it against the incrementally maintained grid.
    ///
    /// Any mismatch is a fatal internal-consistency error. Run under test and
    /// after recovery events, not on the hot allocation path.
    pub fn verify_invariant<'a>(&self, live_assignments: impl Iterator<Item = &'a ResourceAssignment>) -> Result<()> {
        let mut recomputed = vec![vec![false; self.num_slots]; self.occupied.len()];

        for assignment in live_assignments {
            for fiber in &assignment.path.fibers {
                for slot in assignment.slot_range() {
                    if recomputed[fiber.0][slot] {
                        // Two live assignments cover the same cell.
                        log::error!("Clash-freedom violated: two live assignments cover fiber {} slot {}.", fiber.0, slot);

                        return Err(Error::InvariantViolation { fiber: fiber.0, slot });
                    }

                    recomputed[fiber.0][slot] = true;
                }
            }
        }

        for (fiber, row) in self.occupied.iter().enumerate() {
            for (slot, cell) in row.iter().enumerate() {
                if *cell != recomputed[fiber][slot] {
                    log::error!(
                        "Occupancy grid diverged at fiber {} slot {}: incremental = {}, recomputed = {}.",
                        fiber,
                        slot,
                        cell,
                        recomputed[fiber][slot]
                    );

                    return Err(Error::InvariantViolation { fiber, slot });
                }
            }
        }

        Ok(())
    }
}
