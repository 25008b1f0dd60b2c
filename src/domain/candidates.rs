use std::collections::{HashMap, VecDeque};

use crate::domain::ids::NodeId;
use crate::domain::srg::SrgSet;
use crate::domain::topology::{Path, Topology};
use crate::error::{Error, Result};

/// Oversampling factor for the raw BFS enumeration: more paths than `k` are
/// collected first so that ranking by the configured metric is meaningful.
const PATH_OVERSAMPLE: usize = 4;

/// Metric used to rank the candidate paths of a node pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingMetric {
    HopCount,
    LengthKm,
}

/// Disjointness required between the two legs of a protection pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisjointnessType {
    Link,
    Node,
    Srg,
}

impl std::fmt::Display for DisjointnessType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisjointnessType::Link => write!(f, "link"),
            DisjointnessType::Node => write!(f, "node"),
            DisjointnessType::Srg => write!(f, "srg"),
        }
    }
}

/// A precomputed primary/backup route pair.
///
/// `fully_disjoint` is false only for maximum-disjointness fallback pairs,
/// kept when no perfectly disjoint pair exists for the node pair.
#[derive(Debug, Clone)]
pub struct PathPair {
    pub primary: Path,
    pub backup: Path,
    pub fully_disjoint: bool,
}

/// The candidate path repository: for every ordered node pair, a bounded
/// list of precomputed loop-free paths, and, when protection is requested,
/// precomputed disjoint path pairs.
///
/// Built once per topology snapshot and read-only afterwards; shared by all
/// allocation attempts.
#[derive(Debug, Clone)]
pub struct CandidateRepository {
    k: usize,
    paths: HashMap<(NodeId, NodeId), Vec<Path>>,
    pairs: HashMap<(NodeId, NodeId), Vec<PathPair>>,
}

impl CandidateRepository {
    /// Builds the repository for all ordered node pairs of `topology`.
    ///
    /// `length_ceiling_km` excludes paths beyond the hard optical-reach
    /// ceiling; it is set when no transponder type supports regeneration.
    /// `protection` triggers the disjoint-pair computation; the `SrgSet` is
    /// only consulted for SRG-disjointness.
    pub fn build(
        topology: &Topology,
        k: usize,
        metric: RankingMetric,
        length_ceiling_km: Option<f64>,
        protection: Option<(DisjointnessType, &SrgSet)>,
    ) -> Result<Self> {
        let mut repository = CandidateRepository { k, paths: HashMap::new(), pairs: HashMap::new() };

        for source in topology.nodes() {
            for target in topology.nodes() {
                if source == target {
                    continue;
                }

                let mut found = enumerate_loop_free_paths(topology, source, target, k * PATH_OVERSAMPLE);

                if let Some(ceiling) = length_ceiling_km {
                    found.retain(|p| p.length_km(topology) <= ceiling);
                }

                rank_paths(topology, &mut found, metric);
                found.truncate(k);

                if found.is_empty() {
                    log::debug!("No loop-free path found: {} => {}", source, target);
                    continue;
                }

                if let Some((disjointness, srgs)) = protection {
                    let pairs = build_disjoint_pairs(topology, srgs, &found, k, metric, disjointness)?;

                    if !pairs.is_empty() {
                        repository.pairs.insert((source.clone(), target.clone()), pairs);
                    }
                }

                repository.paths.insert((source.clone(), target.clone()), found);
            }
        }

        Ok(repository)
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Candidate paths for the ordered pair, in repository (rank) order.
    pub fn paths(&self, source: &NodeId, target: &NodeId) -> &[Path] {
        self.paths.get(&(source.clone(), target.clone())).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Precomputed protection pairs for the ordered pair, best first.
    pub fn pairs(&self, source: &NodeId, target: &NodeId) -> &[PathPair] {
        self.pairs.get(&(source.clone(), target.clone())).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

/// Enumerates loop-free paths from `source` to `target` using a BFS over
/// partial paths, shortest-by-hops first, up to `limit` solutions.
fn enumerate_loop_free_paths(topology: &Topology, source: &NodeId, target: &NodeId, limit: usize) -> Vec<Path> {
    let mut found_solutions: Vec<Path> = Vec::new();
    let mut queue: VecDeque<Path> = VecDeque::new();

    // Initialize queue with all outgoing fibers of the source node.
    for fiber_id in topology.outgoing(source) {
        queue.push_back(Path::new(vec![*fiber_id]));
    }

    while let Some(current_path) = queue.pop_front() {
        let last_fiber = *current_path.fibers.last().expect("a partial path is never empty");
        let current_end = &topology.fiber(last_fiber).target;

        if current_end == target {
            found_solutions.push(current_path);

            if found_solutions.len() >= limit {
                break;
            }

            continue;
        }

        let visited = current_path.nodes(topology);

        for outgoing_fiber in topology.outgoing(current_end) {
            let next_node = &topology.fiber(*outgoing_fiber).target;

            let is_loop = visited.iter().any(|n| n == next_node);

            if !is_loop {
                let mut new_path = current_path.clone();
                new_path.fibers.push(*outgoing_fiber);
                queue.push_back(new_path);
            }
        }
    }

    return found_solutions;
}

fn rank_paths(topology: &Topology, paths: &mut [Path], metric: RankingMetric) {
    match metric {
        RankingMetric::HopCount => {
            paths.sort_by(|a, b| {
                (a.hop_count(), a.length_km(topology)).partial_cmp(&(b.hop_count(), b.length_km(topology))).expect("path lengths are finite")
            });
        }
        RankingMetric::LengthKm => {
            paths.sort_by(|a, b| {
                (a.length_km(topology), a.hop_count()).partial_cmp(&(b.length_km(topology), b.hop_count())).expect("path lengths are finite")
            });
        }
    }
}

/// Number of disjointness violations between two paths under `disjointness`.
/// Zero means the pair is perfectly disjoint.
fn violation_count(topology: &Topology, srgs: &SrgSet, a: &Path, b: &Path, disjointness: DisjointnessType) -> usize {
    match disjointness {
        DisjointnessType::Link => a.fibers.iter().filter(|f| b.traverses_fiber(**f)).count(),
        DisjointnessType::Node => {
            let shared_fibers = a.fibers.iter().filter(|f| b.traverses_fiber(**f)).count();

            let b_interior = b.interior_nodes(topology);
            let shared_interior = a.interior_nodes(topology).iter().filter(|n| b_interior.contains(n)).count();

            shared_fibers + shared_interior
        }
        DisjointnessType::Srg => {
            let b_srgs = srgs.srgs_of_path(topology, b);

            srgs.srgs_of_path(topology, a).iter().filter(|s| b_srgs.contains(s)).count()
        }
    }
}

/// Explicit post-condition predicate for a pair claimed to be perfectly
/// disjoint. Kept separate from `violation_count` so construction re-checks
/// its own result instead of trusting it.
fn disjointness_holds(topology: &Topology, srgs: &SrgSet, pair: &PathPair, disjointness: DisjointnessType) -> bool {
    let no_common_fiber = !pair.primary.fibers.iter().any(|f| pair.backup.traverses_fiber(*f));

    match disjointness {
        DisjointnessType::Link => no_common_fiber,
        DisjointnessType::Node => {
            let backup_interior = pair.backup.interior_nodes(topology);
            let no_common_interior = !pair.primary.interior_nodes(topology).iter().any(|n| backup_interior.contains(n));

            no_common_fiber && no_common_interior
        }
        DisjointnessType::Srg => !srgs.share_risk(topology, &pair.primary, &pair.backup),
    }
}

/// Builds up to `k` protection pairs out of the ranked candidate list.
///
/// Perfectly disjoint pairs always win; maximum-disjointness fallback pairs
/// (fewest violations) are only produced when no perfect pair exists. Every
/// pair claimed perfect is re-checked with the explicit post-condition; a
/// failing check aborts the repository build.
fn build_disjoint_pairs(
    topology: &Topology,
    srgs: &SrgSet,
    candidates: &[Path],
    k: usize,
    metric: RankingMetric,
    disjointness: DisjointnessType,
) -> Result<Vec<PathPair>> {
    let mut scored: Vec<(usize, f64, usize, PathPair)> = Vec::new();

    for (i, primary) in candidates.iter().enumerate() {
        for (j, backup) in candidates.iter().enumerate() {
            if i == j {
                continue;
            }

            let violations = violation_count(topology, srgs, primary, backup, disjointness);

            let combined_metric = match metric {
                RankingMetric::HopCount => (primary.hop_count() + backup.hop_count()) as f64,
                RankingMetric::LengthKm => primary.length_km(topology) + backup.length_km(topology),
            };

            scored.push((
                violations,
                combined_metric,
                i * candidates.len() + j,
                PathPair { primary: primary.clone(), backup: backup.clone(), fully_disjoint: violations == 0 },
            ));
        }
    }

    if scored.is_empty() {
        return Ok(Vec::new());
    }

    scored.sort_by(|a, b| (a.0, a.1, a.2).partial_cmp(&(b.0, b.1, b.2)).expect("pair metrics are finite"));

    let best_violations = scored[0].0;

    // Perfect pairs exclude all fallback pairs; fallback pairs are only kept
    // at the minimal violation count actually achievable.
    let pairs: Vec<PathPair> = scored.into_iter().filter(|(v, _, _, _)| *v == best_violations).take(k).map(|(_, _, _, p)| p).collect();

    for pair in &pairs {
        if pair.fully_disjoint && !disjointness_holds(topology, srgs, pair, disjointness) {
            let source = pair.primary.source(topology);
            let target = pair.primary.target(topology);

            log::error!("Pair computation produced a non-disjoint pair claimed disjoint for {} => {}.", source, target);

            return Err(Error::DisjointnessViolation {
                src: source.to_string(),
                target: target.to_string(),
                disjointness: disjointness.to_string(),
            });
        }
    }

    Ok(pairs)
}
