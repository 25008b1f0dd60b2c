use std::collections::{HashMap, HashSet};

use rand::SeedableRng;
use rand::rngs::StdRng;
use slotmap::SlotMap;

use crate::api::scenario_dto::{DisjointnessDto, PolicyDto, RankingDto, RecoveryDto, ScenarioDto};
use crate::domain::assignment::ResourceAssignment;
use crate::domain::candidates::{CandidateRepository, DisjointnessType, RankingMetric};
use crate::domain::demand::Demand;
use crate::domain::engine::{self, RouteRequest, RoutingContext, RoutingPolicy};
use crate::domain::ids::{DemandId, NodeId, SrgId, TransponderName};
use crate::domain::lightpath::{ActivePath, Lightpath, LightpathId, LightpathState};
use crate::domain::spectrum::SpectrumGrid;
use crate::domain::srg::{SharedRiskGroup, SrgSet};
use crate::domain::topology::{FiberId, Path, Topology};
use crate::domain::transponder::{TransponderCatalog, TransponderType};
use crate::error::{Error, Result};

/// How the session reacts to failure notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryMode {
    /// No tolerance: affected lightpaths simply go down.
    None,

    /// Planning-time overprovisioning against single-SRG failures; online
    /// behavior is the same as `None`.
    StaticOverprovision,

    /// 1+1 protection: every lightpath is provisioned with a disjoint
    /// backup; failures switch over without a new spectrum search.
    Protection { disjointness: DisjointnessType },

    /// On-demand restoration: failures trigger a fresh routing attempt
    /// against the surviving topology.
    Restoration,
}

/// What `apply_failure_state` did for one affected lightpath.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    SwitchedToBackup,
    Restored,
    LeftDown,
    Reverted,
}

/// Per-lightpath outcome of one failure/repair notification.
#[derive(Debug, Default)]
pub struct RecoveryReport {
    pub actions: Vec<(LightpathId, RecoveryAction)>,
}

impl RecoveryReport {
    pub fn count(&self, action: RecoveryAction) -> usize {
        self.actions.iter().filter(|(_, a)| *a == action).count()
    }

    pub fn action_for(&self, id: LightpathId) -> Option<RecoveryAction> {
        self.actions.iter().find(|(lp, _)| *lp == id).map(|(_, a)| *a)
    }
}

/// The allocation/simulation session: the single owner of the spectrum grid
/// and of the set of live lightpaths.
///
/// Every external event (add, remove, modify, failure state) is handled to
/// completion before the next is accepted; the grid has no internal locking
/// and every operation assumes exclusive access for its duration.
#[derive(Debug)]
pub struct NetworkSession {
    topology: Topology,
    catalog: TransponderCatalog,
    srgs: SrgSet,
    repository: CandidateRepository,
    grid: SpectrumGrid,

    lightpaths: SlotMap<LightpathId, Lightpath>,
    demands: HashMap<DemandId, Demand>,
    demand_order: Vec<DemandId>,

    policy: RoutingPolicy,
    recovery_mode: RecoveryMode,

    failed_fibers: HashSet<FiberId>,
    failed_nodes: HashSet<NodeId>,
}

impl NetworkSession {
    pub fn new(
        topology: Topology,
        catalog: TransponderCatalog,
        demands: Vec<Demand>,
        srgs: SrgSet,
        policy: RoutingPolicy,
        recovery_mode: RecoveryMode,
        k_paths: usize,
        metric: RankingMetric,
    ) -> Result<Self> {
        // Paths beyond every type's reach can never be used when no type
        // supports regeneration; filter them out of the repository once.
        let length_ceiling_km = if catalog.any_type_supports_regeneration() { None } else { catalog.max_unregenerated_reach_km() };

        let protection = match recovery_mode {
            RecoveryMode::Protection { disjointness } => Some(disjointness),
            _ => None,
        };

        let repository = CandidateRepository::build(&topology, k_paths, metric, length_ceiling_km, protection.map(|d| (d, &srgs)))?;

        let grid = SpectrumGrid::new(topology.num_fibers(), topology.num_slots());

        let demand_order: Vec<DemandId> = demands.iter().map(|d| d.id.clone()).collect();
        let demands: HashMap<DemandId, Demand> = demands.into_iter().map(|d| (d.id.clone(), d)).collect();

        log::info!(
            "Session initialized: {} nodes, {} fibers x {} slots, {} demands, recovery mode {:?}.",
            topology.nodes().len(),
            topology.num_fibers(),
            topology.num_slots(),
            demands.len(),
            recovery_mode
        );

        Ok(NetworkSession {
            topology,
            catalog,
            srgs,
            repository,
            grid,
            lightpaths: SlotMap::with_key(),
            demands,
            demand_order,
            policy,
            recovery_mode,
            failed_fibers: HashSet::new(),
            failed_nodes: HashSet::new(),
        })
    }

    /// Builds the full session from a parsed scenario document, validating
    /// every cross-reference on the way.
    pub fn from_dto(dto: ScenarioDto) -> Result<Self> {
        let nodes: Vec<NodeId> = dto.topology.nodes.into_iter().map(|n| NodeId::new(n.id)).collect();

        let fiber_specs: Vec<(String, NodeId, NodeId, f64)> =
            dto.topology.fibers.into_iter().map(|f| (f.id, NodeId::new(f.source), NodeId::new(f.target), f.length_km)).collect();

        let topology = Topology::new(nodes, fiber_specs, dto.topology.num_slots)?;

        let types: Vec<TransponderType> = dto
            .transponders
            .into_iter()
            .map(|t| TransponderType {
                name: TransponderName::new(t.id),
                line_rate_gbps: t.line_rate_gbps,
                cost: t.cost,
                num_slots: t.num_slots,
                optical_reach_km: t.optical_reach_km,
                regenerator_cost: t.regenerator_cost,
            })
            .collect();

        let catalog = TransponderCatalog::new(types)?;

        let mut demands: Vec<Demand> = Vec::with_capacity(dto.demands.len());

        for d in dto.demands {
            let ingress = NodeId::new(d.ingress);
            let egress = NodeId::new(d.egress);

            if !topology.contains_node(&ingress) {
                return Err(Error::ModelConstruction(format!("demand '{}' references unknown ingress node '{}'", d.id, ingress)));
            }

            if !topology.contains_node(&egress) {
                return Err(Error::ModelConstruction(format!("demand '{}' references unknown egress node '{}'", d.id, egress)));
            }

            demands.push(Demand { id: DemandId::new(d.id), ingress, egress, offered_gbps: d.offered_gbps });
        }

        let mut groups: Vec<SharedRiskGroup> = Vec::with_capacity(dto.srgs.len());

        for s in dto.srgs {
            let mut fibers = HashSet::new();

            for fiber_name in &s.fibers {
                let fiber = topology
                    .fiber_by_name(fiber_name)
                    .ok_or_else(|| Error::ModelConstruction(format!("SRG '{}' references unknown fiber '{}'", s.id, fiber_name)))?;
                fibers.insert(fiber);
            }

            let mut srg_nodes = HashSet::new();

            for node_name in s.nodes {
                let node = NodeId::new(node_name);

                if !topology.contains_node(&node) {
                    return Err(Error::ModelConstruction(format!("SRG '{}' references unknown node '{}'", s.id, node)));
                }

                srg_nodes.insert(node);
            }

            groups.push(SharedRiskGroup { id: SrgId::new(s.id), fibers, nodes: srg_nodes });
        }

        let policy = match dto.config.policy {
            PolicyDto::FirstFound => RoutingPolicy::FirstFound,
            PolicyDto::LeastCongested => RoutingPolicy::LeastCongested,
            PolicyDto::LoadSharing { seed } => RoutingPolicy::LoadSharing { rng: StdRng::seed_from_u64(seed) },
            PolicyDto::SrgAware => RoutingPolicy::SrgAware,
        };

        let recovery_mode = match dto.config.recovery {
            RecoveryDto::None => RecoveryMode::None,
            RecoveryDto::StaticOverprovision => RecoveryMode::StaticOverprovision,
            RecoveryDto::Restoration => RecoveryMode::Restoration,
            RecoveryDto::Protection => {
                let disjointness = dto
                    .config
                    .disjointness
                    .ok_or_else(|| Error::ModelConstruction("protection recovery requires a disjointness type".to_string()))?;

                RecoveryMode::Protection {
                    disjointness: match disjointness {
                        DisjointnessDto::Link => DisjointnessType::Link,
                        DisjointnessDto::Node => DisjointnessType::Node,
                        DisjointnessDto::Srg => DisjointnessType::Srg,
                    },
                }
            }
        };

        let metric = match dto.config.ranking {
            RankingDto::Hops => RankingMetric::HopCount,
            RankingDto::Length => RankingMetric::LengthKm,
        };

        NetworkSession::new(topology, catalog, demands, SrgSet::new(groups), policy, recovery_mode, dto.config.k_paths, metric)
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn catalog(&self) -> &TransponderCatalog {
        &self.catalog
    }

    pub fn repository(&self) -> &CandidateRepository {
        &self.repository
    }

    pub fn recovery_mode(&self) -> RecoveryMode {
        self.recovery_mode
    }

    pub fn srgs(&self) -> &SrgSet {
        &self.srgs
    }

    pub fn demand(&self, id: &DemandId) -> Option<&Demand> {
        self.demands.get(id)
    }

    /// Demand ids in scenario order, for deterministic iteration.
    pub fn demand_ids(&self) -> &[DemandId] {
        &self.demand_order
    }

    pub fn lightpath(&self, id: LightpathId) -> Option<&Lightpath> {
        self.lightpaths.get(id)
    }

    pub fn lightpaths(&self) -> impl Iterator<Item = (LightpathId, &Lightpath)> {
        self.lightpaths.iter()
    }

    pub fn occupied_slot_count(&self, fiber: FiberId) -> usize {
        self.grid.occupied_slot_count(fiber)
    }

    /// Sum of the line rates of this demand's lightpaths that are up.
    pub fn carried_gbps(&self, demand: &DemandId) -> f64 {
        self.lightpaths.values().filter(|lp| &lp.demand == demand).map(|lp| lp.carried_gbps()).sum()
    }

    pub fn total_carried_gbps(&self) -> f64 {
        self.lightpaths.values().map(|lp| lp.carried_gbps()).sum()
    }

    pub fn total_blocked_gbps(&self) -> f64 {
        self.demand_order.iter().map(|id| self.demands[id].blocked_gbps(self.carried_gbps(id))).sum()
    }

    fn routing_context(&self) -> RoutingContext<'_> {
        RoutingContext { topology: &self.topology, catalog: &self.catalog, repository: &self.repository, grid: &self.grid, srgs: &self.srgs }
    }

    /// Primary routes of live lightpaths between the same node pair, used by
    /// the SRG-aware policy.
    fn same_pair_paths(&self, ingress: &NodeId, egress: &NodeId) -> Vec<Path> {
        self.lightpaths
            .values()
            .filter(|lp| lp.holds_spectrum && &lp.ingress == ingress && &lp.egress == egress)
            .map(|lp| lp.primary.path.clone())
            .collect()
    }

    /// Escalates an allocation conflict on an internally computed assignment
    /// to the fatal taxonomy: first-fit guaranteed those cells free, so a
    /// conflict here means the bookkeeping is broken.
    fn commit_computed(&mut self, assignment: &ResourceAssignment) -> Result<()> {
        self.grid.allocate(assignment).map_err(|e| match e {
            Error::ResourceConflict { fiber, slot } => {
                log::error!("Internally computed assignment conflicted at fiber {} slot {}.", fiber, slot);
                Error::InvariantViolation { fiber, slot }
            }
            other => other,
        })
    }

    /// Establishes a lightpath for `demand`, choosing route, transponder and
    /// spectrum under the session policy, or validating `explicit` if the
    /// caller supplies an exact assignment.
    ///
    /// # Returns
    /// The new lightpath's id. `NoFeasiblePath` and `ResourceConflict` are
    /// rejected requests: no partial state is created.
    pub fn add_lightpath(&mut self, demand_id: &DemandId, line_rate_gbps: f64, explicit: Option<ResourceAssignment>) -> Result<LightpathId> {
        let demand = self.demands.get(demand_id).ok_or_else(|| Error::not_found("demand", demand_id.to_string()))?;

        let (ingress, egress) = (demand.ingress.clone(), demand.egress.clone());

        let (transponder_index, primary, backup) = match explicit {
            Some(assignment) => {
                let transponder_index = self.transponder_for_explicit(&assignment, line_rate_gbps).ok_or_else(|| Error::NoFeasiblePath(demand_id.to_string()))?;

                // Caller-supplied slots overlapping existing occupancy are a
                // rejected request, never a crash.
                self.grid.allocate(&assignment)?;

                (transponder_index, assignment, None)
            }
            None => {
                let protected = matches!(self.recovery_mode, RecoveryMode::Protection { .. });
                let same_pair = self.same_pair_paths(&ingress, &egress);

                let choice = {
                    let ctx = RoutingContext {
                        topology: &self.topology,
                        catalog: &self.catalog,
                        repository: &self.repository,
                        grid: &self.grid,
                        srgs: &self.srgs,
                    };

                    let req = RouteRequest {
                        demand: demand_id,
                        ingress: &ingress,
                        egress: &egress,
                        protected,
                        min_line_rate_gbps: line_rate_gbps,
                        excluded_fibers: &self.failed_fibers,
                        excluded_nodes: &self.failed_nodes,
                    };

                    engine::find_assignment(&ctx, &req, &mut self.policy, &same_pair)?
                };

                self.commit_computed(&choice.primary)?;

                if let Some(backup) = &choice.backup {
                    self.commit_computed(backup)?;
                }

                (choice.transponder_index, choice.primary, choice.backup)
            }
        };

        let id = self.lightpaths.insert(Lightpath {
            demand: demand_id.clone(),
            ingress,
            egress,
            line_rate_gbps,
            transponder_index,
            primary,
            backup,
            state: LightpathState::Up { active: ActivePath::Primary },
            holds_spectrum: true,
        });

        log::debug!("Lightpath {:?} established for demand {} at {} Gbps.", id, demand_id, line_rate_gbps);

        return Ok(id);
    }

    /// First catalog type compatible with an externally supplied assignment:
    /// matching slot count, sufficient line rate, and a reach the assignment's
    /// regenerator positions can satisfy.
    fn transponder_for_explicit(&self, assignment: &ResourceAssignment, line_rate_gbps: f64) -> Option<usize> {
        let length_km = assignment.path.length_km(&self.topology);

        for (index, typ) in self.catalog.types().iter().enumerate() {
            if typ.num_slots != assignment.num_slots || typ.line_rate_gbps < line_rate_gbps {
                continue;
            }

            if typ.is_within_reach(length_km) {
                return Some(index);
            }

            if typ.supports_regeneration() && assignment.regenerator_count() > 0 {
                return Some(index);
            }
        }

        return None;
    }

    /// Releases all resources of the lightpath, then deletes it.
    pub fn remove_lightpath(&mut self, id: LightpathId) -> Result<()> {
        let lightpath = self.lightpaths.get(id).ok_or_else(|| Error::not_found("lightpath", format!("{:?}", id)))?.clone();

        if lightpath.holds_spectrum {
            self.grid.release(&lightpath.primary)?;

            if let Some(backup) = &lightpath.backup {
                self.grid.release(backup)?;
            }
        }

        self.lightpaths.remove(id);

        log::debug!("Lightpath {:?} removed.", id);

        return Ok(());
    }

    /// Changes a lightpath's carried traffic and, optionally, replaces its
    /// primary assignment.
    ///
    /// The replacement is staged: the new assignment is checked against the
    /// grid with the old assignment's cells masked out before anything is
    /// released, so a rejected modify leaves the old assignment intact.
    pub fn modify_lightpath(&mut self, id: LightpathId, new_carried_gbps: f64, new_assignment: Option<ResourceAssignment>) -> Result<()> {
        let old = self.lightpaths.get(id).ok_or_else(|| Error::not_found("lightpath", format!("{:?}", id)))?.clone();

        if let Some(new_assignment) = new_assignment {
            if !old.holds_spectrum {
                return Err(Error::not_found("lightpath assignment", format!("{:?}", id)));
            }

            let mut staged = self.grid.clone();
            staged.release(&old.primary)?;

            // Staged check only; the conflict is surfaced before the live
            // grid is touched.
            staged.allocate(&new_assignment)?;

            self.grid.release(&old.primary)?;
            self.commit_computed(&new_assignment)?;

            let lightpath = self.lightpaths.get_mut(id).expect("lightpath looked up above");
            lightpath.primary = new_assignment;
        }

        let lightpath = self.lightpaths.get_mut(id).expect("lightpath looked up above");
        lightpath.line_rate_gbps = new_carried_gbps;

        return Ok(());
    }

    fn assignment_unaffected(&self, assignment: &ResourceAssignment) -> bool {
        if assignment.path.fibers.iter().any(|f| self.failed_fibers.contains(f)) {
            return false;
        }

        if self.failed_nodes.is_empty() {
            return true;
        }

        return !assignment.path.nodes(&self.topology).iter().any(|n| self.failed_nodes.contains(n));
    }

    /// Applies a failure/repair notification and drives the configured
    /// recovery behavior for every affected lightpath.
    pub fn apply_failure_state(
        &mut self,
        links_up: &[FiberId],
        links_down: &[FiberId],
        nodes_up: &[NodeId],
        nodes_down: &[NodeId],
    ) -> Result<RecoveryReport> {
        for fiber in links_up {
            self.failed_fibers.remove(fiber);
        }
        for fiber in links_down {
            self.failed_fibers.insert(*fiber);
        }
        for node in nodes_up {
            self.failed_nodes.remove(node);
        }
        for node in nodes_down {
            self.failed_nodes.insert(node.clone());
        }

        log::info!(
            "Failure state applied: {} fibers down, {} nodes down.",
            self.failed_fibers.len(),
            self.failed_nodes.len()
        );

        let mut report = RecoveryReport::default();
        let ids: Vec<LightpathId> = self.lightpaths.keys().collect();

        for id in ids {
            match self.recovery_mode {
                RecoveryMode::Protection { .. } => self.recover_protected(id, &mut report),
                RecoveryMode::Restoration => self.recover_restoration(id, &mut report)?,
                RecoveryMode::None | RecoveryMode::StaticOverprovision => self.recover_unprotected(id, &mut report),
            }
        }

        // Recovery transitions are the most state-heavy paths in the session;
        // cross-check the grid against the live assignments before returning.
        self.verify_invariant()?;

        return Ok(report);
    }

    /// Protection mode: the backup was pre-allocated at add time, so failure
    /// handling is pure switchover, never a spectrum search.
    fn recover_protected(&mut self, id: LightpathId, report: &mut RecoveryReport) {
        let lightpath = &self.lightpaths[id];

        if !matches!(lightpath.state, LightpathState::Up { .. } | LightpathState::Down) {
            return;
        }

        let primary_ok = self.assignment_unaffected(&lightpath.primary);
        let backup_ok = lightpath.backup.as_ref().map(|b| self.assignment_unaffected(b)).unwrap_or(false);
        let state = lightpath.state;

        let lightpath = self.lightpaths.get_mut(id).expect("id taken from live key set");

        if primary_ok {
            if state != (LightpathState::Up { active: ActivePath::Primary }) {
                lightpath.state = LightpathState::Up { active: ActivePath::Primary };
                report.actions.push((id, RecoveryAction::Reverted));
            }
        } else if backup_ok {
            if state != (LightpathState::Up { active: ActivePath::Backup }) {
                lightpath.state = LightpathState::Up { active: ActivePath::Backup };
                report.actions.push((id, RecoveryAction::SwitchedToBackup));
            }
        } else if state != LightpathState::Down {
            lightpath.state = LightpathState::Down;
            report.actions.push((id, RecoveryAction::LeftDown));
        }
    }

    /// No-tolerance modes: state tracks the health of the primary route;
    /// resources are never moved or released.
    fn recover_unprotected(&mut self, id: LightpathId, report: &mut RecoveryReport) {
        let lightpath = &self.lightpaths[id];

        if !matches!(lightpath.state, LightpathState::Up { .. } | LightpathState::Down) {
            return;
        }

        let primary_ok = self.assignment_unaffected(&lightpath.primary);
        let was_up = lightpath.is_up();

        let lightpath = self.lightpaths.get_mut(id).expect("id taken from live key set");

        if primary_ok && !was_up {
            lightpath.state = LightpathState::Up { active: ActivePath::Primary };
            report.actions.push((id, RecoveryAction::Reverted));
        } else if !primary_ok && was_up {
            lightpath.state = LightpathState::Down;
            report.actions.push((id, RecoveryAction::LeftDown));
        }
    }

    /// Restoration mode: release the dead assignment, then search for a
    /// brand-new feasible route on the surviving topology. A successful
    /// reroute becomes the lightpath's assignment for all future events.
    fn recover_restoration(&mut self, id: LightpathId, report: &mut RecoveryReport) -> Result<()> {
        let lightpath = &self.lightpaths[id];

        if !lightpath.is_up() || self.assignment_unaffected(&lightpath.primary) {
            return Ok(());
        }

        let old_assignment = lightpath.primary.clone();
        let demand_id = lightpath.demand.clone();
        let (ingress, egress) = (lightpath.ingress.clone(), lightpath.egress.clone());
        let line_rate_gbps = lightpath.line_rate_gbps;

        self.grid.release(&old_assignment)?;

        {
            let lightpath = self.lightpaths.get_mut(id).expect("id taken from live key set");
            lightpath.holds_spectrum = false;
            lightpath.state = LightpathState::Rerouting;
        }

        let same_pair = self.same_pair_paths(&ingress, &egress);

        let found = {
            let ctx = RoutingContext {
                topology: &self.topology,
                catalog: &self.catalog,
                repository: &self.repository,
                grid: &self.grid,
                srgs: &self.srgs,
            };

            let req = RouteRequest {
                demand: &demand_id,
                ingress: &ingress,
                egress: &egress,
                protected: false,
                min_line_rate_gbps: line_rate_gbps,
                excluded_fibers: &self.failed_fibers,
                excluded_nodes: &self.failed_nodes,
            };

            engine::find_assignment(&ctx, &req, &mut self.policy, &same_pair)
        };

        match found {
            Ok(choice) => {
                self.commit_computed(&choice.primary)?;

                let lightpath = self.lightpaths.get_mut(id).expect("id taken from live key set");
                lightpath.primary = choice.primary;
                lightpath.transponder_index = choice.transponder_index;
                lightpath.holds_spectrum = true;
                lightpath.state = LightpathState::Up { active: ActivePath::Primary };

                report.actions.push((id, RecoveryAction::Restored));
            }
            Err(Error::NoFeasiblePath(_)) => {
                log::warn!("Restoration found no feasible path for lightpath {:?}; it stays down with its resources released.", id);

                let lightpath = self.lightpaths.get_mut(id).expect("id taken from live key set");
                lightpath.state = LightpathState::Down;

                report.actions.push((id, RecoveryAction::LeftDown));
            }
            Err(fatal) => return Err(fatal),
        }

        return Ok(());
    }

    /// All feasible combinations for a demand in canonical enumeration
    /// order, without committing anything. Used by the batch heuristic's
    /// ratio selection.
    pub fn feasible_candidates_for(&self, demand_id: &DemandId) -> Result<Vec<engine::CandidateChoice>> {
        let demand = self.demands.get(demand_id).ok_or_else(|| Error::not_found("demand", demand_id.to_string()))?;

        let protected = matches!(self.recovery_mode, RecoveryMode::Protection { .. });

        let ctx = self.routing_context();
        let req = RouteRequest {
            demand: demand_id,
            ingress: &demand.ingress,
            egress: &demand.egress,
            protected,
            min_line_rate_gbps: 0.0,
            excluded_fibers: &self.failed_fibers,
            excluded_nodes: &self.failed_nodes,
        };

        Ok(engine::feasible_candidates(&ctx, &req))
    }

    /// Commits a combination the batch heuristic selected: allocates its
    /// spectrum and creates the lightpath at the given provisioned rate.
    pub fn commit_candidate(&mut self, demand_id: &DemandId, choice: engine::CandidateChoice, carried_gbps: f64) -> Result<LightpathId> {
        let demand = self.demands.get(demand_id).ok_or_else(|| Error::not_found("demand", demand_id.to_string()))?;
        let (ingress, egress) = (demand.ingress.clone(), demand.egress.clone());

        self.commit_computed(&choice.primary)?;

        if let Some(backup) = &choice.backup {
            self.commit_computed(backup)?;
        }

        let id = self.lightpaths.insert(Lightpath {
            demand: demand_id.clone(),
            ingress,
            egress,
            line_rate_gbps: carried_gbps,
            transponder_index: choice.transponder_index,
            primary: choice.primary,
            backup: choice.backup,
            state: LightpathState::Up { active: ActivePath::Primary },
            holds_spectrum: true,
        });

        return Ok(id);
    }

    /// Recomputes the occupancy grid from the live assignments and compares
    /// it with the incrementally maintained one. Any divergence is fatal.
    pub fn verify_invariant(&self) -> Result<()> {
        let live: Vec<&ResourceAssignment> = self
            .lightpaths
            .values()
            .filter(|lp| lp.holds_spectrum)
            .flat_map(|lp| std::iter::once(&lp.primary).chain(lp.backup.as_ref()))
            .collect();

        self.grid.verify_invariant(live.into_iter())
    }
}
