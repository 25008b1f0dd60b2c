use crate::api::scenario_dto::ScenarioDto;
use crate::domain::session::NetworkSession;
use crate::error::Result;
use crate::loader::parser::parse_json_file;

pub mod api;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

/// Parses a scenario file and builds the allocation session from it.
pub fn load_scenario(file_path: &str) -> Result<NetworkSession> {
    let dto: ScenarioDto = parse_json_file::<ScenarioDto>(file_path)?;
    log::info!("Scenario file '{}' parsed successfully.", file_path);

    let session = NetworkSession::from_dto(dto)?;
    log::info!("Network session constructed successfully.");

    Ok(session)
}
