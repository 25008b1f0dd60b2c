use std::collections::HashSet;

use flexgrid_planner::domain::candidates::{DisjointnessType, RankingMetric};
use flexgrid_planner::domain::demand::Demand;
use flexgrid_planner::domain::engine::RoutingPolicy;
use flexgrid_planner::domain::ids::{DemandId, NodeId, SrgId, TransponderName};
use flexgrid_planner::domain::lightpath::{ActivePath, LightpathState};
use flexgrid_planner::domain::session::{NetworkSession, RecoveryAction, RecoveryMode};
use flexgrid_planner::domain::srg::{SharedRiskGroup, SrgSet};
use flexgrid_planner::domain::topology::{FiberId, Topology};
use flexgrid_planner::domain::transponder::{TransponderCatalog, TransponderType};

fn node(name: &str) -> NodeId {
    NodeId::new(name)
}

/// Triangle: direct fiber A -> B plus a detour over C.
fn triangle_topology() -> Topology {
    Topology::new(
        vec![node("A"), node("B"), node("C")],
        vec![
            ("A--To--B".to_string(), node("A"), node("B"), 100.0),
            ("A--To--C".to_string(), node("A"), node("C"), 60.0),
            ("C--To--B".to_string(), node("C"), node("B"), 60.0),
        ],
        10,
    )
    .unwrap()
}

fn catalog() -> TransponderCatalog {
    TransponderCatalog::new(vec![TransponderType {
        name: TransponderName::new("100G"),
        line_rate_gbps: 100.0,
        cost: 1.0,
        num_slots: 2,
        optical_reach_km: 0.0,
        regenerator_cost: -1.0,
    }])
    .unwrap()
}

fn demand_ab() -> Vec<Demand> {
    vec![Demand { id: DemandId::new("d-ab"), ingress: node("A"), egress: node("B"), offered_gbps: 100.0 }]
}

/// Risk groups splitting the triangle into the direct route and the detour.
fn triangle_srgs() -> SrgSet {
    SrgSet::new(vec![
        SharedRiskGroup { id: SrgId::new("srg-direct"), fibers: HashSet::from([FiberId(0)]), nodes: HashSet::new() },
        SharedRiskGroup { id: SrgId::new("srg-detour"), fibers: HashSet::from([FiberId(1), FiberId(2)]), nodes: HashSet::new() },
    ])
}

fn protected_session() -> NetworkSession {
    NetworkSession::new(
        triangle_topology(),
        catalog(),
        demand_ab(),
        triangle_srgs(),
        RoutingPolicy::FirstFound,
        RecoveryMode::Protection { disjointness: DisjointnessType::Srg },
        3,
        RankingMetric::HopCount,
    )
    .unwrap()
}

#[test]
fn protection_switchover_and_reversion() {
    let mut session = protected_session();
    let demand = DemandId::new("d-ab");

    let id = session.add_lightpath(&demand, 100.0, None).unwrap();

    let lightpath = session.lightpath(id).unwrap();
    assert!(lightpath.backup.is_some(), "protection mode must pre-provision a backup");
    assert_eq!(lightpath.state, LightpathState::Up { active: ActivePath::Primary });
    assert_eq!(lightpath.primary.path.fibers, vec![FiberId(0)]);

    // Fail every fiber of the primary's SRG.
    let report = session.apply_failure_state(&[], &[FiberId(0)], &[], &[]).unwrap();

    assert_eq!(report.action_for(id), Some(RecoveryAction::SwitchedToBackup));
    assert_eq!(session.lightpath(id).unwrap().state, LightpathState::Up { active: ActivePath::Backup });
    assert_eq!(session.lightpath(id).unwrap().carried_gbps(), 100.0);

    // Repair those fibers: reversion to the original primary.
    let report = session.apply_failure_state(&[FiberId(0)], &[], &[], &[]).unwrap();

    assert_eq!(report.action_for(id), Some(RecoveryAction::Reverted));
    assert_eq!(session.lightpath(id).unwrap().state, LightpathState::Up { active: ActivePath::Primary });
}

#[test]
fn protection_with_both_legs_down_carries_nothing() {
    let mut session = protected_session();
    let demand = DemandId::new("d-ab");

    let id = session.add_lightpath(&demand, 100.0, None).unwrap();

    let report = session.apply_failure_state(&[], &[FiberId(0), FiberId(1)], &[], &[]).unwrap();

    assert_eq!(report.action_for(id), Some(RecoveryAction::LeftDown));
    assert_eq!(session.lightpath(id).unwrap().state, LightpathState::Down);
    assert_eq!(session.lightpath(id).unwrap().carried_gbps(), 0.0);

    // Protection never releases the pre-provisioned spectrum.
    assert_eq!(session.occupied_slot_count(FiberId(0)), 2);
    session.verify_invariant().unwrap();
}

#[test]
fn protection_switchover_needs_no_new_spectrum_search() {
    let mut session = protected_session();
    let demand = DemandId::new("d-ab");

    let id = session.add_lightpath(&demand, 100.0, None).unwrap();
    let backup_before = session.lightpath(id).unwrap().backup.clone().unwrap();

    session.apply_failure_state(&[], &[FiberId(0)], &[], &[]).unwrap();

    // The active assignment is exactly the one reserved at add time.
    assert_eq!(session.lightpath(id).unwrap().active_assignment(), Some(&backup_before));
}

fn restoration_session() -> NetworkSession {
    NetworkSession::new(
        triangle_topology(),
        catalog(),
        demand_ab(),
        SrgSet::default(),
        RoutingPolicy::FirstFound,
        RecoveryMode::Restoration,
        3,
        RankingMetric::HopCount,
    )
    .unwrap()
}

#[test]
fn restoration_reroutes_over_surviving_capacity() {
    let mut session = restoration_session();
    let demand = DemandId::new("d-ab");

    let id = session.add_lightpath(&demand, 100.0, None).unwrap();
    assert_eq!(session.lightpath(id).unwrap().primary.path.fibers, vec![FiberId(0)]);

    let report = session.apply_failure_state(&[], &[FiberId(0)], &[], &[]).unwrap();

    assert_eq!(report.action_for(id), Some(RecoveryAction::Restored));

    let lightpath = session.lightpath(id).unwrap();
    assert_eq!(lightpath.state, LightpathState::Up { active: ActivePath::Primary });
    assert_eq!(lightpath.primary.path.fibers, vec![FiberId(1), FiberId(2)]);
    assert_eq!(lightpath.carried_gbps(), 100.0);

    // The dead route's slots were released.
    assert_eq!(session.occupied_slot_count(FiberId(0)), 0);
    assert_eq!(session.occupied_slot_count(FiberId(1)), 2);

    session.verify_invariant().unwrap();
}

#[test]
fn restoration_without_alternative_releases_resources() {
    let mut session = restoration_session();
    let demand = DemandId::new("d-ab");

    let id = session.add_lightpath(&demand, 100.0, None).unwrap();

    // Kill both the direct route and the detour.
    let report = session.apply_failure_state(&[], &[FiberId(0), FiberId(1)], &[], &[]).unwrap();

    assert_eq!(report.action_for(id), Some(RecoveryAction::LeftDown));
    assert_eq!(session.lightpath(id).unwrap().state, LightpathState::Down);

    // Down, with all resources released, not leaked.
    for fiber in 0..session.topology().num_fibers() {
        assert_eq!(session.occupied_slot_count(FiberId(fiber)), 0);
    }

    session.verify_invariant().unwrap();
}

#[test]
fn restoration_does_not_revert_on_repair() {
    let mut session = restoration_session();
    let demand = DemandId::new("d-ab");

    let id = session.add_lightpath(&demand, 100.0, None).unwrap();
    session.apply_failure_state(&[], &[FiberId(0)], &[], &[]).unwrap();

    // The rerouted assignment became the lightpath's assignment; repairing
    // the old fiber must not move it back.
    session.apply_failure_state(&[FiberId(0)], &[], &[], &[]).unwrap();

    let lightpath = session.lightpath(id).unwrap();
    assert_eq!(lightpath.primary.path.fibers, vec![FiberId(1), FiberId(2)]);
    assert_eq!(lightpath.state, LightpathState::Up { active: ActivePath::Primary });
}

#[test]
fn rerouted_assignment_is_the_baseline_for_the_next_failure() {
    let mut session = restoration_session();
    let demand = DemandId::new("d-ab");

    let id = session.add_lightpath(&demand, 100.0, None).unwrap();
    session.apply_failure_state(&[], &[FiberId(0)], &[], &[]).unwrap();

    // Repair the direct fiber, then kill the detour the lightpath now uses:
    // restoration must route it back over the direct fiber.
    session.apply_failure_state(&[FiberId(0)], &[], &[], &[]).unwrap();
    let report = session.apply_failure_state(&[], &[FiberId(1)], &[], &[]).unwrap();

    assert_eq!(report.action_for(id), Some(RecoveryAction::Restored));
    assert_eq!(session.lightpath(id).unwrap().primary.path.fibers, vec![FiberId(0)]);

    session.verify_invariant().unwrap();
}

#[test]
fn no_tolerance_mode_marks_down_and_recovers_on_repair() {
    let mut session = NetworkSession::new(
        triangle_topology(),
        catalog(),
        demand_ab(),
        SrgSet::default(),
        RoutingPolicy::FirstFound,
        RecoveryMode::None,
        3,
        RankingMetric::HopCount,
    )
    .unwrap();

    let demand = DemandId::new("d-ab");
    let id = session.add_lightpath(&demand, 100.0, None).unwrap();

    let report = session.apply_failure_state(&[], &[FiberId(0)], &[], &[]).unwrap();
    assert_eq!(report.action_for(id), Some(RecoveryAction::LeftDown));
    assert_eq!(session.lightpath(id).unwrap().state, LightpathState::Down);

    // Resources stay allocated while down.
    assert_eq!(session.occupied_slot_count(FiberId(0)), 2);

    let report = session.apply_failure_state(&[FiberId(0)], &[], &[], &[]).unwrap();
    assert_eq!(report.action_for(id), Some(RecoveryAction::Reverted));
    assert_eq!(session.lightpath(id).unwrap().state, LightpathState::Up { active: ActivePath::Primary });
}

#[test]
fn node_failure_takes_down_traversing_lightpaths() {
    let mut session = restoration_session();
    let demand = DemandId::new("d-ab");

    let id = session.add_lightpath(&demand, 100.0, None).unwrap();

    // The direct route does not touch C; failing C must not affect it.
    let report = session.apply_failure_state(&[], &[], &[], &[node("C")]).unwrap();
    assert!(report.action_for(id).is_none());

    // Failing the direct fiber with C still down leaves no route at all.
    let report = session.apply_failure_state(&[], &[FiberId(0)], &[], &[]).unwrap();
    assert_eq!(report.action_for(id), Some(RecoveryAction::LeftDown));
}
