use std::collections::HashSet;

use flexgrid_planner::domain::candidates::RankingMetric;
use flexgrid_planner::domain::demand::Demand;
use flexgrid_planner::domain::engine::RoutingPolicy;
use flexgrid_planner::domain::ids::{DemandId, NodeId, SrgId, TransponderName};
use flexgrid_planner::domain::planner::GreedyPlanner;
use flexgrid_planner::domain::session::{NetworkSession, RecoveryMode};
use flexgrid_planner::domain::srg::{SharedRiskGroup, SrgSet};
use flexgrid_planner::domain::topology::{FiberId, Topology};
use flexgrid_planner::domain::transponder::{TransponderCatalog, TransponderType};

fn node(name: &str) -> NodeId {
    NodeId::new(name)
}

fn transponder(name: &str, line_rate_gbps: f64, cost: f64, num_slots: usize) -> TransponderType {
    TransponderType { name: TransponderName::new(name), line_rate_gbps, cost, num_slots, optical_reach_km: 0.0, regenerator_cost: -1.0 }
}

fn single_link_session(offered_gbps: f64) -> NetworkSession {
    let topology = Topology::new(vec![node("A"), node("B")], vec![("A--To--B".to_string(), node("A"), node("B"), 100.0)], 10).unwrap();

    let catalog = TransponderCatalog::new(vec![transponder("100G", 100.0, 1.0, 2)]).unwrap();

    let demands = vec![Demand { id: DemandId::new("d-ab"), ingress: node("A"), egress: node("B"), offered_gbps }];

    NetworkSession::new(topology, catalog, demands, SrgSet::default(), RoutingPolicy::FirstFound, RecoveryMode::None, 3, RankingMetric::HopCount)
        .unwrap()
}

#[test]
fn planner_stacks_lightpaths_until_the_demand_is_carried() {
    let mut session = single_link_session(250.0);

    let report = GreedyPlanner::new(false).plan(&mut session).unwrap();

    assert_eq!(report.established, 3);
    assert_eq!(report.total_cost, 3.0);
    assert!(report.unsatisfied.is_empty());
    assert_eq!(session.total_blocked_gbps(), 0.0);

    // 3 lightpaths x 2 slots on the single fiber.
    assert_eq!(session.occupied_slot_count(FiberId(0)), 6);

    session.verify_invariant().unwrap();
}

#[test]
fn planner_reports_demands_it_cannot_satisfy() {
    // 600 Gbps offered, but 10 slots only fit five 2-slot lightpaths.
    let mut session = single_link_session(600.0);

    let report = GreedyPlanner::new(false).plan(&mut session).unwrap();

    assert_eq!(report.established, 5);
    assert_eq!(session.total_blocked_gbps(), 100.0);
    assert_eq!(report.unsatisfied, vec![DemandId::new("d-ab")]);

    session.verify_invariant().unwrap();
}

#[test]
fn planner_prefers_cheap_capacity_per_carried_traffic() {
    // A 400G type at cost 10 carries traffic at 40x the cost of the 100G
    // type at cost 1; the ratio selection must pick four 100G lightpaths.
    let topology = Topology::new(vec![node("A"), node("B")], vec![("A--To--B".to_string(), node("A"), node("B"), 100.0)], 20).unwrap();

    let catalog = TransponderCatalog::new(vec![transponder("400G", 400.0, 100.0, 8), transponder("100G", 100.0, 1.0, 2)]).unwrap();

    let demands = vec![Demand { id: DemandId::new("d-ab"), ingress: node("A"), egress: node("B"), offered_gbps: 400.0 }];

    let mut session =
        NetworkSession::new(topology, catalog, demands, SrgSet::default(), RoutingPolicy::FirstFound, RecoveryMode::None, 3, RankingMetric::HopCount)
            .unwrap();

    let report = GreedyPlanner::new(false).plan(&mut session).unwrap();

    assert_eq!(report.established, 4);
    assert_eq!(report.total_cost, 4.0);
    assert_eq!(session.total_blocked_gbps(), 0.0);
}

#[test]
fn srg_tolerance_overprovisions_against_single_failures() {
    // Triangle with the direct route and the detour in separate risk
    // groups. Without tolerance one lightpath suffices; with tolerance the
    // planner adds a second one so the demand survives either SRG failure.
    let topology = Topology::new(
        vec![node("A"), node("B"), node("C")],
        vec![
            ("A--To--B".to_string(), node("A"), node("B"), 100.0),
            ("A--To--C".to_string(), node("A"), node("C"), 60.0),
            ("C--To--B".to_string(), node("C"), node("B"), 60.0),
        ],
        10,
    )
    .unwrap();

    let catalog = TransponderCatalog::new(vec![transponder("100G", 100.0, 1.0, 2)]).unwrap();
    let demands = vec![Demand { id: DemandId::new("d-ab"), ingress: node("A"), egress: node("B"), offered_gbps: 100.0 }];

    let srgs = SrgSet::new(vec![
        SharedRiskGroup { id: SrgId::new("srg-direct"), fibers: HashSet::from([FiberId(0)]), nodes: HashSet::new() },
        SharedRiskGroup { id: SrgId::new("srg-detour"), fibers: HashSet::from([FiberId(1), FiberId(2)]), nodes: HashSet::new() },
    ]);

    let mut session = NetworkSession::new(
        topology,
        catalog,
        demands,
        srgs,
        RoutingPolicy::FirstFound,
        RecoveryMode::StaticOverprovision,
        3,
        RankingMetric::HopCount,
    )
    .unwrap();

    let report = GreedyPlanner::new(true).plan(&mut session).unwrap();

    assert_eq!(report.established, 2);
    assert!(report.unsatisfied.is_empty());

    // One lightpath on the direct fiber, one on the detour.
    assert_eq!(session.occupied_slot_count(FiberId(0)), 2);
    assert_eq!(session.occupied_slot_count(FiberId(1)), 2);

    session.verify_invariant().unwrap();
}

#[test]
fn planner_reaches_a_fixed_point_on_an_unroutable_demand() {
    // No path from B to A exists (the single fiber is directed).
    let topology = Topology::new(vec![node("A"), node("B")], vec![("A--To--B".to_string(), node("A"), node("B"), 100.0)], 10).unwrap();

    let catalog = TransponderCatalog::new(vec![transponder("100G", 100.0, 1.0, 2)]).unwrap();

    let demands = vec![
        Demand { id: DemandId::new("d-ab"), ingress: node("A"), egress: node("B"), offered_gbps: 100.0 },
        Demand { id: DemandId::new("d-ba"), ingress: node("B"), egress: node("A"), offered_gbps: 100.0 },
    ];

    let mut session =
        NetworkSession::new(topology, catalog, demands, SrgSet::default(), RoutingPolicy::FirstFound, RecoveryMode::None, 3, RankingMetric::HopCount)
            .unwrap();

    let report = GreedyPlanner::new(false).plan(&mut session).unwrap();

    assert_eq!(report.established, 1);
    assert_eq!(report.unsatisfied, vec![DemandId::new("d-ba")]);
}
