use std::collections::HashSet;

use rand::Rng;
use rand::rngs::StdRng;

use crate::domain::assignment::ResourceAssignment;
use crate::domain::candidates::CandidateRepository;
use crate::domain::ids::{DemandId, NodeId};
use crate::domain::regenerator::regenerator_positions;
use crate::domain::spectrum::SpectrumGrid;
use crate::domain::srg::SrgSet;
use crate::domain::topology::{FiberId, Path, Topology};
use crate::domain::transponder::{TransponderCatalog, TransponderType};
use crate::error::{Error, Result};

/// Routing policy used to select amongst feasible candidate combinations.
///
/// A closed enum: new policies are added here, never dispatched by string
/// comparison. `LoadSharing` carries its own seeded generator so that runs
/// are reproducible.
#[derive(Debug)]
pub enum RoutingPolicy {
    /// Take the first feasible combination in enumeration order.
    FirstFound,

    /// Keep the feasible combination maximizing the worst-case residual
    /// capacity (minimum free slots) across its fibers.
    LeastCongested,

    /// Pick uniformly at random amongst the feasible combinations.
    LoadSharing { rng: StdRng },

    /// Minimize the count of existing lightpaths between the same node pair
    /// that share an SRG with the candidate; stop early on zero overlap.
    SrgAware,
}

/// One per-demand routing request.
#[derive(Debug)]
pub struct RouteRequest<'a> {
    pub demand: &'a DemandId,
    pub ingress: &'a NodeId,
    pub egress: &'a NodeId,

    /// Search disjoint pairs instead of single paths.
    pub protected: bool,

    /// Transponder types with a lower line rate are skipped. Zero admits
    /// every type.
    pub min_line_rate_gbps: f64,

    /// Failed elements excluded from restoration-time routing. Empty for
    /// ordinary adds.
    pub excluded_fibers: &'a HashSet<FiberId>,
    pub excluded_nodes: &'a HashSet<NodeId>,
}

/// A fully feasible (transponder, route, spectrum) combination.
#[derive(Debug, Clone)]
pub struct CandidateChoice {
    pub transponder_index: usize,
    pub primary: ResourceAssignment,
    pub backup: Option<ResourceAssignment>,

    /// Transponder cost (doubled for protected pairs) plus regenerator cost.
    pub cost: f64,
}

impl CandidateChoice {
    pub fn line_rate_gbps(&self, catalog: &TransponderCatalog) -> f64 {
        catalog.get(self.transponder_index).line_rate_gbps
    }
}

/// Read-only view of everything a routing decision consults.
#[derive(Debug, Clone, Copy)]
pub struct RoutingContext<'a> {
    pub topology: &'a Topology,
    pub catalog: &'a TransponderCatalog,
    pub repository: &'a CandidateRepository,
    pub grid: &'a SpectrumGrid,
    pub srgs: &'a SrgSet,
}

fn path_is_excluded(topology: &Topology, path: &Path, req: &RouteRequest<'_>) -> bool {
    if path.fibers.iter().any(|f| req.excluded_fibers.contains(f)) {
        return true;
    }

    if req.excluded_nodes.is_empty() {
        return false;
    }

    return path.nodes(topology).iter().any(|n| req.excluded_nodes.contains(n));
}

/// Reach check plus regenerator placement for one leg of a candidate.
///
/// # Returns
/// `Some(positions)` if the leg is usable with this transponder type,
/// otherwise `None` (combination rejected early).
fn leg_regenerators(topology: &Topology, path: &Path, typ: &TransponderType) -> Option<Vec<usize>> {
    if typ.is_within_reach(path.length_km(topology)) {
        return Some(Vec::new());
    }

    if !typ.supports_regeneration() {
        return None;
    }

    return regenerator_positions(topology, path, typ.optical_reach_km);
}

fn unprotected_candidate(ctx: &RoutingContext<'_>, transponder_index: usize, path: &Path) -> Option<CandidateChoice> {
    let typ = ctx.catalog.get(transponder_index);

    let regenerators = leg_regenerators(ctx.topology, path, typ)?;
    let start_slot = ctx.grid.first_fit(path, typ.num_slots)?;

    let cost = typ.cost + typ.regenerator_cost * regenerators.len() as f64;

    Some(CandidateChoice {
        transponder_index,
        primary: ResourceAssignment::new(path.clone(), start_slot, typ.num_slots, regenerators),
        backup: None,
        cost,
    })
}

fn protected_candidate(ctx: &RoutingContext<'_>, transponder_index: usize, primary: &Path, backup: &Path) -> Option<CandidateChoice> {
    let typ = ctx.catalog.get(transponder_index);

    let primary_regenerators = leg_regenerators(ctx.topology, primary, typ)?;
    let backup_regenerators = leg_regenerators(ctx.topology, backup, typ)?;

    let (start_primary, start_backup) = ctx.grid.first_fit_pair(primary, backup, typ.num_slots)?;

    let regenerator_count = primary_regenerators.len() + backup_regenerators.len();
    let cost = 2.0 * typ.cost + typ.regenerator_cost * regenerator_count as f64;

    Some(CandidateChoice {
        transponder_index,
        primary: ResourceAssignment::new(primary.clone(), start_primary, typ.num_slots, primary_regenerators),
        backup: Some(ResourceAssignment::new(backup.clone(), start_backup, typ.num_slots, backup_regenerators)),
        cost,
    })
}

/// Enumerates feasible combinations in the canonical order: transponder
/// types in priority order, then candidate paths (or pairs) in repository
/// order. `on_candidate` returning `true` stops the enumeration.
fn enumerate_candidates(ctx: &RoutingContext<'_>, req: &RouteRequest<'_>, mut on_candidate: impl FnMut(CandidateChoice) -> bool) {
    for transponder_index in 0..ctx.catalog.len() {
        if ctx.catalog.get(transponder_index).line_rate_gbps < req.min_line_rate_gbps {
            continue;
        }

        if req.protected {
            for pair in ctx.repository.pairs(req.ingress, req.egress) {
                if path_is_excluded(ctx.topology, &pair.primary, req) || path_is_excluded(ctx.topology, &pair.backup, req) {
                    continue;
                }

                if let Some(candidate) = protected_candidate(ctx, transponder_index, &pair.primary, &pair.backup) {
                    if on_candidate(candidate) {
                        return;
                    }
                }
            }
        } else {
            for path in ctx.repository.paths(req.ingress, req.egress) {
                if path_is_excluded(ctx.topology, path, req) {
                    continue;
                }

                if let Some(candidate) = unprotected_candidate(ctx, transponder_index, path) {
                    if on_candidate(candidate) {
                        return;
                    }
                }
            }
        }
    }
}

/// All feasible combinations for the request, in enumeration order. Used by
/// the batch heuristic's ratio selection.
pub fn feasible_candidates(ctx: &RoutingContext<'_>, req: &RouteRequest<'_>) -> Vec<CandidateChoice> {
    let mut candidates = Vec::new();

    enumerate_candidates(ctx, req, |candidate| {
        candidates.push(candidate);
        false
    });

    return candidates;
}

/// The worst-case residual free-slot count across every fiber the candidate
/// occupies (both legs for a protected pair).
fn residual_capacity(ctx: &RoutingContext<'_>, candidate: &CandidateChoice) -> usize {
    let mut residual = ctx.grid.min_free_slots(&candidate.primary.path);

    if let Some(backup) = &candidate.backup {
        residual = residual.min(ctx.grid.min_free_slots(&backup.path));
    }

    return residual;
}

/// Count of `existing_same_pair` paths sharing an SRG with the candidate's
/// primary route.
fn srg_overlap(ctx: &RoutingContext<'_>, candidate: &CandidateChoice, existing_same_pair: &[Path]) -> usize {
    existing_same_pair.iter().filter(|p| ctx.srgs.share_risk(ctx.topology, &candidate.primary.path, p)).count()
}

/// Decides the best feasible (path, transponder, spectrum, optional backup)
/// combination for one demand under the configured policy.
///
/// # Returns
/// The chosen combination, or `Error::NoFeasiblePath` when no candidate
/// passes reach and spectrum constraints. No state is mutated either way.
pub fn find_assignment(
    ctx: &RoutingContext<'_>,
    req: &RouteRequest<'_>,
    policy: &mut RoutingPolicy,
    existing_same_pair: &[Path],
) -> Result<CandidateChoice> {
    let selected: Option<CandidateChoice> = match policy {
        RoutingPolicy::FirstFound => {
            let mut first = None;

            enumerate_candidates(ctx, req, |candidate| {
                first = Some(candidate);
                true
            });

            first
        }

        RoutingPolicy::LeastCongested => {
            let mut best: Option<(usize, CandidateChoice)> = None;

            enumerate_candidates(ctx, req, |candidate| {
                let residual = residual_capacity(ctx, &candidate);

                // Strict comparison keeps the earliest candidate on ties.
                if best.as_ref().map(|(r, _)| residual > *r).unwrap_or(true) {
                    best = Some((residual, candidate));
                }

                false
            });

            best.map(|(_, candidate)| candidate)
        }

        RoutingPolicy::LoadSharing { rng } => {
            let candidates = feasible_candidates(ctx, req);

            if candidates.is_empty() {
                None
            } else {
                let index = rng.random_range(0..candidates.len());
                candidates.into_iter().nth(index)
            }
        }

        RoutingPolicy::SrgAware => {
            let mut best: Option<(usize, CandidateChoice)> = None;

            enumerate_candidates(ctx, req, |candidate| {
                let overlap = srg_overlap(ctx, &candidate, existing_same_pair);

                let improved = best.as_ref().map(|(o, _)| overlap < *o).unwrap_or(true);

                if improved {
                    best = Some((overlap, candidate));
                }

                // A zero-overlap candidate cannot be beaten.
                overlap == 0
            });

            best.map(|(_, candidate)| candidate)
        }
    };

    selected.ok_or_else(|| Error::NoFeasiblePath(req.demand.to_string()))
}
