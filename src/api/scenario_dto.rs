use serde::Deserialize;

/// Root document for a planning/simulation scenario.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDto {
    pub topology: TopologyDto,
    pub transponders: Vec<TransponderDto>,
    pub demands: Vec<DemandDto>,
    #[serde(default)]
    pub srgs: Vec<SrgDto>,
    pub config: ConfigDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyDto {
    pub num_slots: usize,
    pub nodes: Vec<NodeDto>,
    pub fibers: Vec<FiberDto>,
}

#[derive(Debug, Deserialize)]
pub struct NodeDto {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FiberDto {
    pub id: String,
    pub source: String,
    pub target: String,
    pub length_km: f64,
}

/// Transponder catalog entry. List order is the user-specified priority order.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransponderDto {
    pub id: String,
    pub line_rate_gbps: f64,
    pub cost: f64,
    pub num_slots: usize,
    /// A value `<= 0` means unlimited optical reach.
    pub optical_reach_km: f64,
    /// A value `< 0` means regeneration is not supported for this type.
    pub regenerator_cost: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemandDto {
    pub id: String,
    pub ingress: String,
    pub egress: String,
    pub offered_gbps: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SrgDto {
    pub id: String,
    #[serde(default)]
    pub fibers: Vec<String>,
    #[serde(default)]
    pub nodes: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDto {
    #[serde(default = "default_k_paths")]
    pub k_paths: usize,
    #[serde(default)]
    pub ranking: RankingDto,
    pub policy: PolicyDto,
    pub recovery: RecoveryDto,
    /// Required when `recovery` is `protection`.
    pub disjointness: Option<DisjointnessDto>,
    /// Averages blocked traffic over single-SRG failure states in the batch planner.
    #[serde(default)]
    pub srg_tolerance: bool,
}

fn default_k_paths() -> usize {
    5
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RankingDto {
    #[default]
    Hops,
    Length,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[serde(tag = "type")]
pub enum PolicyDto {
    FirstFound,
    LeastCongested,
    LoadSharing { seed: u64 },
    SrgAware,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecoveryDto {
    None,
    StaticOverprovision,
    Protection,
    Restoration,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisjointnessDto {
    Link,
    Node,
    Srg,
}

/// One entry of the online event file replayed by `simulate`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(tag = "type")]
pub enum EventDto {
    #[serde(rename_all = "camelCase")]
    Add { name: String, demand: String, line_rate_gbps: f64 },
    Remove { name: String },
    #[serde(rename_all = "camelCase")]
    Modify { name: String, new_carried_gbps: f64 },
    #[serde(rename_all = "camelCase")]
    FailureState {
        #[serde(default)]
        links_down: Vec<String>,
        #[serde(default)]
        links_up: Vec<String>,
        #[serde(default)]
        nodes_down: Vec<String>,
        #[serde(default)]
        nodes_up: Vec<String>,
    },
}
