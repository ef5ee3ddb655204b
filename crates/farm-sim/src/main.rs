// crates/farm-sim/src/main.rs
//
// Binary entrypoint for the farm simulator.
//
// Initializes tracing, parses CLI arguments, loads configuration, and either
// prints the emission schedule or runs a scripted scenario against an
// in-memory controller.

mod config;
mod output;
mod scenario;

use std::path::Path;

use clap::{Parser, Subcommand};
use config::FarmConfig;
use output::{format_json, format_table, period_count, schedule_rows, OutputFormat};
use scenario::{Scenario, ScenarioRunner};

use farm_economics::EmissionSchedule;

/// Farm simulator: inspect emission schedules and replay farming scenarios.
#[derive(Parser, Debug)]
#[command(name = "farm-sim", version = "0.1.0", about = "Farming reward engine simulator")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "~/.farm/config.toml")]
    config: String,

    /// Print JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the reward rate and pool-side emission of each period.
    Schedule {
        /// Maximum number of periods to list.
        #[arg(long, default_value_t = 64)]
        periods: usize,
    },

    /// Run a scripted scenario and print the resulting pools and balances.
    Run {
        /// Path to the scenario TOML file.
        scenario: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Config is read before tracing starts so its log level can seed the filter.
    // A missing file means defaults; a file that exists must parse and validate.
    let config_path = expand_tilde(&cli.config);
    let loaded = if Path::new(&config_path).exists() {
        Some(FarmConfig::load(&config_path)?)
    } else {
        None
    };
    let log_level = loaded
        .as_ref()
        .map_or("info", |cfg| cfg.log_level.as_str())
        .to_string();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let config = match loaded {
        Some(cfg) => {
            tracing::info!("Loaded configuration from {}", config_path);
            cfg
        }
        None => {
            tracing::warn!("No config at {}. Using defaults.", config_path);
            FarmConfig::default()
        }
    };

    let format = OutputFormat::from_flag(cli.json);
    match &cli.command {
        Commands::Schedule { periods } => print_schedule(&config, *periods, format)?,
        Commands::Run { scenario } => run_scenario(&config, &expand_tilde(scenario), format)?,
    }

    Ok(())
}

fn print_schedule(
    config: &FarmConfig,
    periods: usize,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let schedule = EmissionSchedule::from_source(&config.emission)?;
    let rows = schedule_rows(&schedule, periods)?;
    let total = period_count(&schedule);
    if (rows.len() as u128) < total {
        tracing::info!("Showing {} of {} periods", rows.len(), total);
    }
    match format {
        OutputFormat::Json => println!("{}", format_json(&rows)),
        OutputFormat::Table => {
            println!(
                "Emission schedule: start block {}, max block {}, pool share {}%, incentive share {}%",
                schedule.start_block(),
                schedule.max_block(),
                schedule.master_chef_weight(),
                schedule.incentive_weight()
            );
            println!();
            println!("{}", format_table(&rows));
        }
    }
    Ok(())
}

fn run_scenario(
    config: &FarmConfig,
    path: &str,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = Scenario::load(path)?;
    tracing::info!(steps = scenario.steps.len(), "Running scenario {}", path);

    let runner = ScenarioRunner::new(&config.emission, &config.staking, scenario.start_block)?;
    let report = runner.run(&scenario)?;

    match format {
        OutputFormat::Json => println!("{}", format_json(&report)),
        OutputFormat::Table => {
            println!("Steps");
            println!("{}", format_table(&report.steps));
            println!();
            println!("Pools at block {}", report.final_block);
            println!("{}", format_table(&report.pools));
            println!();
            println!("Balances");
            println!("{}", format_table(&report.balances));
        }
    }
    Ok(())
}

/// Expand `~` at the start of a path to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}/{}", home.display(), rest);
        }
    }
    path.to_string()
}
