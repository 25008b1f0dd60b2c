use clap::{Parser, Subcommand};

use flexgrid_planner::api::scenario_dto::{EventDto, ScenarioDto};
use flexgrid_planner::domain::planner::GreedyPlanner;
use flexgrid_planner::domain::session::{NetworkSession, RecoveryMode};
use flexgrid_planner::domain::simulation::run_events;
use flexgrid_planner::domain::stats;
use flexgrid_planner::loader::parser::parse_json_file;
use flexgrid_planner::logger;

#[derive(Parser)]
#[command(name = "flexgrid_planner", about = "Lightpath planning and online operation over a frequency-slotted optical network")]
struct Cli {
    /// Write per-event statistics to this CSV file instead of stdout.
    #[arg(long, global = true)]
    stats_file: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the batch greedy planner over the scenario's demand set.
    Plan {
        /// Scenario JSON file (topology, transponders, demands, config).
        scenario: String,
    },

    /// Replay an online event file against the scenario.
    Simulate {
        /// Scenario JSON file (topology, transponders, demands, config).
        scenario: String,

        /// Event list JSON file.
        events: String,
    },
}

fn main() {
    logger::init();

    let cli = Cli::parse();

    stats::init_global(cli.stats_file.clone());

    let outcome = match cli.command {
        Command::Plan { scenario } => run_plan(&scenario),
        Command::Simulate { scenario, events } => run_simulate(&scenario, &events),
    };

    if let Err(e) = outcome {
        log::error!("Run aborted: {}", e);
        std::process::exit(1);
    }
}

fn run_plan(scenario_path: &str) -> flexgrid_planner::error::Result<()> {
    let dto: ScenarioDto = parse_json_file(scenario_path)?;
    let srg_tolerance = dto.config.srg_tolerance;

    let mut session = NetworkSession::from_dto(dto)?;

    // Static overprovisioning is planned against single-SRG failures even
    // when the tolerance flag was not set explicitly.
    let srg_tolerance = srg_tolerance || matches!(session.recovery_mode(), RecoveryMode::StaticOverprovision);

    let planner = GreedyPlanner::new(srg_tolerance);
    let report = planner.plan(&mut session)?;

    session.verify_invariant()?;

    println!("Lightpaths established: {}", report.established);
    println!("Total cost:             {:.2}", report.total_cost);
    println!("Carried traffic:        {:.1} Gbps", session.total_carried_gbps());
    println!("Blocked traffic:        {:.1} Gbps", session.total_blocked_gbps());

    if report.unsatisfied.is_empty() {
        println!("All demands fully satisfied.");
    } else {
        println!("Unsatisfied demands:");

        for demand in &report.unsatisfied {
            println!("  {}", demand);
        }
    }

    stats::flush_global();

    Ok(())
}

fn run_simulate(scenario_path: &str, events_path: &str) -> flexgrid_planner::error::Result<()> {
    let mut session = flexgrid_planner::load_scenario(scenario_path)?;

    let events: Vec<EventDto> = parse_json_file(events_path)?;

    let report = run_events(&mut session, events)?;

    println!("Events processed:    {}", report.events_processed);
    println!("Rejected requests:   {}", report.rejected);
    println!("Switched to backup:  {}", report.switched_to_backup);
    println!("Restored:            {}", report.restored);
    println!("Left down:           {}", report.left_down);
    println!("Carried traffic:     {:.1} Gbps", session.total_carried_gbps());
    println!("Blocked traffic:     {:.1} Gbps", session.total_blocked_gbps());

    Ok(())
}
