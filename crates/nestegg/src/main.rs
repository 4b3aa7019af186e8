use std::path::PathBuf;

use clap::Parser;
use nestegg::{OutputFormat, Overrides, init_logging, load_scenario, report};
use nestegg_core::monte_carlo::{MonteCarloConfig, monte_carlo};
use nestegg_core::simulation::simulate;

#[derive(Parser, Debug)]
#[command(name = "nestegg")]
#[command(about = "Year-by-year household savings and retirement simulator")]
struct Args {
    /// Scenario file (YAML); a bundled example is used when omitted
    scenario: Option<PathBuf>,

    /// Number of yearly periods to simulate
    #[arg(short, long)]
    periods: Option<u32>,

    /// Age at which to retire and start drawing down
    #[arg(short, long)]
    retire_at: Option<u32>,

    /// Share of each account withdrawn per retired period
    #[arg(short, long)]
    withdrawal_rate: Option<f64>,

    /// Run this many iterations under the scenario's return profile
    #[arg(short, long)]
    monte_carlo: Option<usize>,

    /// Seed for sampled returns
    #[arg(short, long)]
    seed: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_logging(args.log_file.as_deref(), &args.log_level)?;

    let mut scenario = load_scenario(args.scenario.as_deref())?;
    Overrides {
        periods: args.periods,
        retire_at: args.retire_at,
        withdrawal_rate: args.withdrawal_rate,
        seed: args.seed,
    }
    .apply(&mut scenario);

    let portfolio = scenario.build_portfolio()?;
    let seed = scenario.run.seed.unwrap_or(0);

    let output = match args.monte_carlo {
        Some(iterations) => {
            let config = MonteCarloConfig { iterations, seed };
            let summary = monte_carlo(&portfolio, &scenario.run, &config)?;
            report::render_summary(&summary, args.format)?
        }
        None => {
            let result = simulate(portfolio, &scenario.run, seed)?;
            report::render_result(&result, args.format)?
        }
    };

    print!("{output}");
    tracing::info!("Done");
    Ok(())
}
