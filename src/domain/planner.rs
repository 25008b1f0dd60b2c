use std::collections::HashSet;

use crate::domain::engine::CandidateChoice;
use crate::domain::ids::{DemandId, SrgId};
use crate::domain::lightpath::Lightpath;
use crate::domain::session::NetworkSession;
use crate::error::Result;

/// Traffic below this threshold counts as fully carried.
const TRAFFIC_EPS: f64 = 1e-9;

/// Result of one batch planning run.
#[derive(Debug)]
pub struct PlanReport {
    pub total_cost: f64,
    pub established: usize,

    /// Demands still blocked (in the no-failure state) when the heuristic
    /// reached its fixed point.
    pub unsatisfied: Vec<DemandId>,
}

/// The offline greedy planner.
///
/// Repeatedly picks the most-blocked demand, selects the feasible
/// combination maximizing carried-traffic-per-cost, commits it, and stops
/// once a full pass over the demands produces no further allocation.
///
/// With `srg_tolerance` enabled, blocked and additionally carried traffic
/// are averaged across the no-failure state plus one state per single SRG
/// failure. Overlapping SRGs are deliberately not corrected for double
/// counting; the simple additive average is the intended semantics.
#[derive(Debug, Clone, Copy)]
pub struct GreedyPlanner {
    pub srg_tolerance: bool,
}

/// The failure states the tolerance average runs over: no failure, then one
/// state per SRG.
fn failure_states(session: &NetworkSession, srg_tolerance: bool) -> Vec<Option<SrgId>> {
    let mut states: Vec<Option<SrgId>> = vec![None];

    if srg_tolerance {
        states.extend(session.srgs().groups().iter().map(|g| Some(g.id.clone())));
    }

    return states;
}

/// True if the lightpath still carries traffic under the given single-SRG
/// failure: its primary survives, or a pre-provisioned backup does.
fn lightpath_survives(session: &NetworkSession, lightpath: &Lightpath, state: &Option<SrgId>) -> bool {
    let Some(srg_id) = state else {
        return true;
    };

    let group = session.srgs().groups().iter().find(|g| &g.id == srg_id).expect("failure states are built from the session's SRG set");

    if !group.affects_path(session.topology(), &lightpath.primary.path) {
        return true;
    }

    if let Some(backup) = &lightpath.backup {
        return !group.affects_path(session.topology(), &backup.path);
    }

    return false;
}

/// True if a candidate combination would still carry traffic under the
/// given single-SRG failure.
fn candidate_survives(session: &NetworkSession, candidate: &CandidateChoice, state: &Option<SrgId>) -> bool {
    let Some(srg_id) = state else {
        return true;
    };

    let group = session.srgs().groups().iter().find(|g| &g.id == srg_id).expect("failure states are built from the session's SRG set");

    if !group.affects_path(session.topology(), &candidate.primary.path) {
        return true;
    }

    if let Some(backup) = &candidate.backup {
        return !group.affects_path(session.topology(), &backup.path);
    }

    return false;
}

fn carried_in_state(session: &NetworkSession, demand: &DemandId, state: &Option<SrgId>) -> f64 {
    session
        .lightpaths()
        .filter(|(_, lp)| &lp.demand == demand)
        .filter(|(_, lp)| lightpath_survives(session, lp, state))
        .map(|(_, lp)| lp.line_rate_gbps)
        .sum()
}

fn blocked_in_state(session: &NetworkSession, demand: &DemandId, state: &Option<SrgId>) -> f64 {
    let offered = session.demand(demand).expect("planner iterates the session's own demands").offered_gbps;

    (offered - carried_in_state(session, demand, state)).max(0.0)
}

/// Average blocked traffic across the failure states; the greedy ordering key.
fn blocked_score(session: &NetworkSession, demand: &DemandId, states: &[Option<SrgId>]) -> f64 {
    let total: f64 = states.iter().map(|s| blocked_in_state(session, demand, s)).sum();

    total / states.len() as f64
}

/// Average additional traffic of `demand` that becomes carried if the
/// candidate is committed at `rate` Gbps.
fn added_score(session: &NetworkSession, demand: &DemandId, candidate: &CandidateChoice, rate: f64, states: &[Option<SrgId>]) -> f64 {
    let total: f64 = states
        .iter()
        .map(|state| {
            if candidate_survives(session, candidate, state) {
                blocked_in_state(session, demand, state).min(rate)
            } else {
                0.0
            }
        })
        .sum();

    total / states.len() as f64
}

impl GreedyPlanner {
    pub fn new(srg_tolerance: bool) -> Self {
        GreedyPlanner { srg_tolerance }
    }

    pub fn plan(&self, session: &mut NetworkSession) -> Result<PlanReport> {
        let states = failure_states(session, self.srg_tolerance);
        let demand_ids: Vec<DemandId> = session.demand_ids().to_vec();

        let mut total_cost = 0.0;
        let mut established = 0;

        // Demands that produced no feasible candidate: committed spectrum is
        // never given back during planning, so they cannot become feasible
        // again and are excluded from all further passes.
        let mut exhausted: HashSet<DemandId> = HashSet::new();

        loop {
            // Most-blocked demand first; earliest scenario order wins ties.
            let mut target: Option<(&DemandId, f64)> = None;

            for demand in &demand_ids {
                if exhausted.contains(demand) {
                    continue;
                }

                let score = blocked_score(session, demand, &states);

                if score <= TRAFFIC_EPS {
                    continue;
                }

                if target.map(|(_, best)| score > best).unwrap_or(true) {
                    target = Some((demand, score));
                }
            }

            let Some((demand, score)) = target else {
                break;
            };
            let demand = demand.clone();

            log::debug!("Planning pass: demand {} is most blocked ({:.1} Gbps average).", demand, score);

            match self.best_candidate(session, &demand, &states) {
                Some((candidate, rate)) => {
                    total_cost += candidate.cost;
                    established += 1;

                    session.commit_candidate(&demand, candidate, rate)?;
                }
                None => {
                    // Recovered at this boundary: the demand is dropped from
                    // further attempts, everything else stays untouched.
                    exhausted.insert(demand);
                }
            }
        }

        let unsatisfied: Vec<DemandId> =
            demand_ids.iter().filter(|d| blocked_in_state(session, d, &None) > TRAFFIC_EPS).cloned().collect();

        log::info!(
            "Batch planning finished: {} lightpaths established, total cost {:.2}, {} unsatisfied demands.",
            established,
            total_cost,
            unsatisfied.len()
        );

        Ok(PlanReport { total_cost, established, unsatisfied })
    }

    /// Ratio selection amongst the feasible combinations: maximize additional
    /// carried traffic per cost. Enumeration order already encodes the
    /// transponder-priority and path-rank tie-breaks, so a strictly-greater
    /// comparison keeps the canonical winner.
    fn best_candidate(&self, session: &NetworkSession, demand: &DemandId, states: &[Option<SrgId>]) -> Option<(CandidateChoice, f64)> {
        let offered = session.demand(demand).expect("planner iterates the session's own demands").offered_gbps;

        let candidates = session.feasible_candidates_for(demand).ok()?;

        let mut best: Option<(f64, CandidateChoice, f64)> = None;

        for candidate in candidates {
            let rate = candidate.line_rate_gbps(session.catalog()).min(offered);
            let added = added_score(session, demand, &candidate, rate, states);

            if added <= TRAFFIC_EPS {
                continue;
            }

            let ratio = if candidate.cost > 0.0 { added / candidate.cost } else { f64::INFINITY };

            if best.as_ref().map(|(r, _, _)| ratio > *r).unwrap_or(true) {
                best = Some((ratio, candidate, rate));
            }
        }

        best.map(|(_, candidate, rate)| (candidate, rate))
    }
}
