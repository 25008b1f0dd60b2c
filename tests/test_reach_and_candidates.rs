use std::collections::HashSet;

use flexgrid_planner::domain::candidates::{CandidateRepository, DisjointnessType, RankingMetric};
use flexgrid_planner::domain::demand::Demand;
use flexgrid_planner::domain::engine::RoutingPolicy;
use flexgrid_planner::domain::ids::{DemandId, NodeId, SrgId, TransponderName};
use flexgrid_planner::domain::session::{NetworkSession, RecoveryMode};
use flexgrid_planner::domain::srg::{SharedRiskGroup, SrgSet};
use flexgrid_planner::domain::topology::{FiberId, Topology};
use flexgrid_planner::domain::transponder::{TransponderCatalog, TransponderType};
use flexgrid_planner::error::Error;

fn node(name: &str) -> NodeId {
    NodeId::new(name)
}

fn catalog(optical_reach_km: f64, regenerator_cost: f64) -> TransponderCatalog {
    TransponderCatalog::new(vec![TransponderType {
        name: TransponderName::new("100G"),
        line_rate_gbps: 100.0,
        cost: 10.0,
        num_slots: 2,
        optical_reach_km,
        regenerator_cost,
    }])
    .unwrap()
}

fn demand_ab() -> Vec<Demand> {
    vec![Demand { id: DemandId::new("d-ab"), ingress: node("A"), egress: node("B"), offered_gbps: 100.0 }]
}

#[test]
fn path_beyond_reach_without_regeneration_is_no_feasible_path() {
    // The only candidate path is 150 km; the type reaches 100 km and cannot
    // regenerate.
    let topology =
        Topology::new(vec![node("A"), node("B")], vec![("A--To--B".to_string(), node("A"), node("B"), 150.0)], 10).unwrap();

    let mut session = NetworkSession::new(
        topology,
        catalog(100.0, -1.0),
        demand_ab(),
        SrgSet::default(),
        RoutingPolicy::FirstFound,
        RecoveryMode::None,
        3,
        RankingMetric::HopCount,
    )
    .unwrap();

    let result = session.add_lightpath(&DemandId::new("d-ab"), 100.0, None);

    assert!(matches!(result, Err(Error::NoFeasiblePath(_))));
    assert_eq!(session.lightpaths().count(), 0);
}

#[test]
fn regeneration_extends_reach_and_is_costed() {
    // A -> M -> B, 80 km + 80 km, against a 100 km reach with regeneration
    // support: one regenerator at the entry of the second fiber.
    let topology = Topology::new(
        vec![node("A"), node("M"), node("B")],
        vec![("A--To--M".to_string(), node("A"), node("M"), 80.0), ("M--To--B".to_string(), node("M"), node("B"), 80.0)],
        10,
    )
    .unwrap();

    let mut session = NetworkSession::new(
        topology,
        catalog(100.0, 3.0),
        demand_ab(),
        SrgSet::default(),
        RoutingPolicy::FirstFound,
        RecoveryMode::None,
        3,
        RankingMetric::HopCount,
    )
    .unwrap();

    let demand = DemandId::new("d-ab");

    let candidates = session.feasible_candidates_for(&demand).unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].primary.regenerator_positions, vec![1]);
    assert_eq!(candidates[0].cost, 10.0 + 3.0);

    let id = session.add_lightpath(&demand, 100.0, None).unwrap();
    assert_eq!(session.lightpath(id).unwrap().primary.regenerator_positions, vec![1]);
}

/// Diamond: A -> B directly (long) and A -> C -> B (short detour).
fn diamond_topology() -> Topology {
    Topology::new(
        vec![node("A"), node("B"), node("C")],
        vec![
            ("A--To--B".to_string(), node("A"), node("B"), 200.0),
            ("A--To--C".to_string(), node("A"), node("C"), 50.0),
            ("C--To--B".to_string(), node("C"), node("B"), 50.0),
        ],
        10,
    )
    .unwrap()
}

#[test]
fn ranking_metric_orders_candidate_paths() {
    let topology = diamond_topology();

    let by_hops = CandidateRepository::build(&topology, 3, RankingMetric::HopCount, None, None).unwrap();
    let paths = by_hops.paths(&node("A"), &node("B"));
    assert_eq!(paths.len(), 2);
    assert_eq!(paths[0].hop_count(), 1);

    let by_length = CandidateRepository::build(&topology, 3, RankingMetric::LengthKm, None, None).unwrap();
    let paths = by_length.paths(&node("A"), &node("B"));
    assert_eq!(paths.len(), 2);
    assert_eq!(paths[0].hop_count(), 2, "the 100 km detour ranks before the 200 km direct fiber");
}

#[test]
fn length_ceiling_filters_unreachable_paths() {
    let topology = diamond_topology();

    let repository = CandidateRepository::build(&topology, 3, RankingMetric::HopCount, Some(150.0), None).unwrap();
    let paths = repository.paths(&node("A"), &node("B"));

    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].hop_count(), 2);
}

#[test]
fn link_disjoint_pairs_share_no_fiber() {
    let topology = diamond_topology();
    let srgs = SrgSet::default();

    let repository = CandidateRepository::build(&topology, 3, RankingMetric::HopCount, None, Some((DisjointnessType::Link, &srgs))).unwrap();

    let pairs = repository.pairs(&node("A"), &node("B"));
    assert!(!pairs.is_empty());

    for pair in pairs {
        assert!(pair.fully_disjoint);

        for fiber in &pair.primary.fibers {
            assert!(!pair.backup.traverses_fiber(*fiber), "protection pair shares fiber {:?}", fiber);
        }
    }
}

#[test]
fn node_disjoint_pairs_share_no_interior_node() {
    // Two detours over distinct intermediate nodes plus one direct fiber.
    let topology = Topology::new(
        vec![node("A"), node("B"), node("C"), node("D")],
        vec![
            ("A--To--C".to_string(), node("A"), node("C"), 50.0),
            ("C--To--B".to_string(), node("C"), node("B"), 50.0),
            ("A--To--D".to_string(), node("A"), node("D"), 60.0),
            ("D--To--B".to_string(), node("D"), node("B"), 60.0),
        ],
        10,
    )
    .unwrap();

    let srgs = SrgSet::default();
    let repository = CandidateRepository::build(&topology, 4, RankingMetric::HopCount, None, Some((DisjointnessType::Node, &srgs))).unwrap();

    let pairs = repository.pairs(&node("A"), &node("B"));
    assert!(!pairs.is_empty());

    for pair in pairs {
        assert!(pair.fully_disjoint);

        let primary_interior = pair.primary.interior_nodes(&topology);
        for n in pair.backup.interior_nodes(&topology) {
            assert!(!primary_interior.contains(&n), "protection pair shares interior node {}", n);
        }
    }
}

#[test]
fn srg_disjointness_falls_back_to_maximum_disjointness() {
    let topology = diamond_topology();

    // Both routes belong to the same risk group, so no perfect pair exists.
    let srgs = SrgSet::new(vec![SharedRiskGroup {
        id: SrgId::new("conduit-1"),
        fibers: HashSet::from([FiberId(0), FiberId(1)]),
        nodes: HashSet::new(),
    }]);

    let repository = CandidateRepository::build(&topology, 3, RankingMetric::HopCount, None, Some((DisjointnessType::Srg, &srgs))).unwrap();

    let pairs = repository.pairs(&node("A"), &node("B"));
    assert!(!pairs.is_empty());
    assert!(pairs.iter().all(|p| !p.fully_disjoint));
}

#[test]
fn srg_disjoint_pairs_share_no_risk_group() {
    let topology = diamond_topology();

    let srgs = SrgSet::new(vec![
        SharedRiskGroup { id: SrgId::new("direct"), fibers: HashSet::from([FiberId(0)]), nodes: HashSet::new() },
        SharedRiskGroup { id: SrgId::new("detour"), fibers: HashSet::from([FiberId(1), FiberId(2)]), nodes: HashSet::new() },
    ]);

    let repository = CandidateRepository::build(&topology, 3, RankingMetric::HopCount, None, Some((DisjointnessType::Srg, &srgs))).unwrap();

    let pairs = repository.pairs(&node("A"), &node("B"));
    assert!(!pairs.is_empty());

    for pair in pairs {
        assert!(pair.fully_disjoint);
        assert!(!srgs.share_risk(&topology, &pair.primary, &pair.backup));
    }
}
