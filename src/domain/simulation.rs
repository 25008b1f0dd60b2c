use std::collections::HashMap;

use crate::api::scenario_dto::EventDto;
use crate::domain::ids::{DemandId, LightpathName, NodeId};
use crate::domain::lightpath::LightpathId;
use crate::domain::session::{NetworkSession, RecoveryAction};
use crate::domain::stats::{self, StatParameter, StatisticEvent};
use crate::domain::topology::FiberId;
use crate::error::{Error, Result};

/// Cumulative outcome of one online event replay.
#[derive(Debug, Default)]
pub struct SimulationReport {
    pub events_processed: usize,
    pub rejected: usize,
    pub switched_to_backup: usize,
    pub restored: usize,
    pub left_down: usize,
}

/// True for errors that reject the triggering request and leave all other
/// state untouched. Fatal errors propagate and terminate the run.
fn is_recoverable(error: &Error) -> bool {
    matches!(error, Error::NoFeasiblePath(_) | Error::ResourceConflict { .. } | Error::NotFound { .. })
}

fn record_event(session: &NetworkSession, kind: &str, name: Option<&str>, outcome: &str) {
    let mut event = StatisticEvent::new();
    event.set(StatParameter::EventKind, kind).set(StatParameter::Outcome, outcome);

    if let Some(name) = name {
        event.set(StatParameter::Lightpath, name);
    }

    event.set(StatParameter::CarriedGbps, session.total_carried_gbps()).set(StatParameter::BlockedGbps, session.total_blocked_gbps());

    stats::add_global_event(event);
}

/// Replays an event list against the session, one event at a time, each
/// handled to completion before the next is accepted.
pub fn run_events(session: &mut NetworkSession, events: Vec<EventDto>) -> Result<SimulationReport> {
    let mut report = SimulationReport::default();

    // Event files reference lightpaths by the name given at add time.
    let mut names: HashMap<LightpathName, LightpathId> = HashMap::new();

    for event in events {
        report.events_processed += 1;

        match event {
            EventDto::Add { name, demand, line_rate_gbps } => {
                let demand_id = DemandId::new(demand);
                let lightpath_name = LightpathName::new(name.clone());

                match session.add_lightpath(&demand_id, line_rate_gbps, None) {
                    Ok(id) => {
                        names.insert(lightpath_name, id);

                        let lightpath = session.lightpath(id).expect("lightpath was just created");
                        let typ = session.catalog().get(lightpath.transponder_index);

                        let mut stat = StatisticEvent::new();
                        stat.set(StatParameter::EventKind, "ADD")
                            .set(StatParameter::Demand, demand_id.to_string())
                            .set(StatParameter::Lightpath, name.as_str())
                            .set(StatParameter::Outcome, "OK")
                            .set(StatParameter::TransponderType, typ.name.to_string())
                            .set(StatParameter::PathLengthKm, lightpath.primary.path.length_km(session.topology()))
                            .set(StatParameter::StartSlot, lightpath.primary.start_slot)
                            .set(StatParameter::NumSlots, lightpath.primary.num_slots)
                            .set(StatParameter::CarriedGbps, session.total_carried_gbps())
                            .set(StatParameter::BlockedGbps, session.total_blocked_gbps());
                        stats::add_global_event(stat);
                    }
                    Err(e) if is_recoverable(&e) => {
                        log::warn!("Add request '{}' rejected: {}", name, e);
                        report.rejected += 1;
                        record_event(session, "ADD", Some(&name), "REJECTED");
                    }
                    Err(fatal) => return Err(fatal),
                }
            }

            EventDto::Remove { name } => {
                let outcome = match names.remove(&LightpathName::new(name.clone())) {
                    Some(id) => match session.remove_lightpath(id) {
                        Ok(()) => "OK",
                        Err(e) if is_recoverable(&e) => {
                            log::warn!("Remove request '{}' rejected: {}", name, e);
                            report.rejected += 1;
                            "REJECTED"
                        }
                        Err(fatal) => return Err(fatal),
                    },
                    None => {
                        log::warn!("Remove request references unknown lightpath '{}'.", name);
                        report.rejected += 1;
                        "REJECTED"
                    }
                };

                record_event(session, "REMOVE", Some(&name), outcome);
            }

            EventDto::Modify { name, new_carried_gbps } => {
                let outcome = match names.get(&LightpathName::new(name.clone())) {
                    Some(id) => match session.modify_lightpath(*id, new_carried_gbps, None) {
                        Ok(()) => "OK",
                        Err(e) if is_recoverable(&e) => {
                            log::warn!("Modify request '{}' rejected: {}", name, e);
                            report.rejected += 1;
                            "REJECTED"
                        }
                        Err(fatal) => return Err(fatal),
                    },
                    None => {
                        log::warn!("Modify request references unknown lightpath '{}'.", name);
                        report.rejected += 1;
                        "REJECTED"
                    }
                };

                record_event(session, "MODIFY", Some(&name), outcome);
            }

            EventDto::FailureState { links_down, links_up, nodes_down, nodes_up } => {
                let fibers_down = resolve_fibers(session, &links_down)?;
                let fibers_up = resolve_fibers(session, &links_up)?;

                let nodes_down: Vec<NodeId> = nodes_down.into_iter().map(NodeId::new).collect();
                let nodes_up: Vec<NodeId> = nodes_up.into_iter().map(NodeId::new).collect();

                let recovery = session.apply_failure_state(&fibers_up, &fibers_down, &nodes_up, &nodes_down)?;

                report.switched_to_backup += recovery.count(RecoveryAction::SwitchedToBackup);
                report.restored += recovery.count(RecoveryAction::Restored);
                report.left_down += recovery.count(RecoveryAction::LeftDown);

                for (id, action) in &recovery.actions {
                    let outcome = match action {
                        RecoveryAction::SwitchedToBackup => "SWITCHED_TO_BACKUP",
                        RecoveryAction::Restored => "RESTORED",
                        RecoveryAction::LeftDown => "LEFT_DOWN",
                        RecoveryAction::Reverted => "REVERTED",
                    };

                    let name = names.iter().find(|(_, v)| **v == *id).map(|(k, _)| k.to_string());

                    record_event(session, "FAILURE", name.as_deref(), outcome);
                }

                if recovery.actions.is_empty() {
                    record_event(session, "FAILURE", None, "NO_LIGHTPATH_AFFECTED");
                }
            }
        }
    }

    log::info!(
        "Simulation finished: {} events, {} rejected, carried {:.1} Gbps, blocked {:.1} Gbps.",
        report.events_processed,
        report.rejected,
        session.total_carried_gbps(),
        session.total_blocked_gbps()
    );

    stats::flush_global();

    return Ok(report);
}

fn resolve_fibers(session: &NetworkSession, names: &[String]) -> Result<Vec<FiberId>> {
    names
        .iter()
        .map(|name| session.topology().fiber_by_name(name).ok_or_else(|| Error::not_found("fiber", name.clone())))
        .collect()
}
