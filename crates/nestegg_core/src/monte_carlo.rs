//! Monte Carlo sweep
//!
//! Runs the same scenario many times under sampled returns and summarizes
//! the spread of net worth per period. Iterations are split into batches,
//! each batch seeded deterministically from the sweep seed, so results do not
//! depend on how the batches are scheduled.

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::RunConfig;
use crate::error::Result;
use crate::portfolio::Portfolio;
use crate::simulation::{SimulationResult, simulate};

const MAX_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    pub iterations: usize,
    #[serde(default)]
    pub seed: u64,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            iterations: 1_000,
            seed: 0,
        }
    }
}

/// Net worth distribution at the end of one period
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileBand {
    pub period: u32,
    pub age: u32,
    pub p10: f64,
    pub p50: f64,
    pub p90: f64,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloSummary {
    pub iterations: usize,
    /// Share of runs that never had unpaid expenses or tax
    pub success_rate: f64,
    pub bands: Vec<PercentileBand>,
    pub final_net_worth: PercentileBand,
}

/// Run `portfolio` `config.iterations` times under `run`'s return profile
pub fn monte_carlo(
    portfolio: &Portfolio,
    run: &RunConfig,
    config: &MonteCarloConfig,
) -> Result<MonteCarloSummary> {
    run.returns.validate()?;
    let results = simulate_many(portfolio, run, config)?;
    let summary = summarize(&results);
    tracing::info!(
        iterations = summary.iterations,
        success_rate = summary.success_rate,
        median_final = summary.final_net_worth.p50,
        "Monte Carlo sweep complete"
    );
    Ok(summary)
}

/// Every individual run of the sweep
pub fn simulate_many(
    portfolio: &Portfolio,
    run: &RunConfig,
    config: &MonteCarloConfig,
) -> Result<Vec<SimulationResult>> {
    let num_iterations = config.iterations;
    let num_batches = num_iterations.div_ceil(MAX_BATCH_SIZE);

    let batch = |i: usize| -> Result<Vec<SimulationResult>> {
        let mut rng = SmallRng::seed_from_u64(config.seed.wrapping_add(i as u64));

        let batch_size = if i == num_batches - 1 {
            num_iterations - i * MAX_BATCH_SIZE
        } else {
            MAX_BATCH_SIZE
        };

        (0..batch_size)
            .map(|_| {
                let seed = rng.next_u64();
                simulate(portfolio.clone(), run, seed)
            })
            .collect()
    };

    #[cfg(feature = "parallel")]
    let batches: Vec<Result<Vec<SimulationResult>>> =
        (0..num_batches).into_par_iter().map(batch).collect();

    #[cfg(not(feature = "parallel"))]
    let batches: Vec<Result<Vec<SimulationResult>>> = (0..num_batches).map(batch).collect();

    let mut iterations = Vec::with_capacity(num_iterations);
    for batch in batches {
        iterations.extend(batch?);
    }
    Ok(iterations)
}

/// Percentile bands per period across `results`
pub fn summarize(results: &[SimulationResult]) -> MonteCarloSummary {
    let periods = results.iter().map(|r| r.history.len()).min().unwrap_or(0);

    let bands: Vec<PercentileBand> = (0..periods)
        .map(|p| {
            let first = &results[0].history[p];
            let values: Vec<f64> = results.iter().map(|r| r.history[p].net_worth).collect();
            band(first.period, first.age, values)
        })
        .collect();

    let finals: Vec<f64> = results.iter().map(|r| r.final_net_worth).collect();
    let (period, age) = bands.last().map_or((0, 0), |b| (b.period, b.age));
    let final_net_worth = band(period, age, finals);

    let successes = results.iter().filter(|r| r.is_success()).count();
    let success_rate = if results.is_empty() {
        0.0
    } else {
        successes as f64 / results.len() as f64
    };

    MonteCarloSummary {
        iterations: results.len(),
        success_rate,
        bands,
        final_net_worth,
    }
}

fn band(period: u32, age: u32, mut values: Vec<f64>) -> PercentileBand {
    values.sort_by(|a, b| a.total_cmp(b));
    let mean = if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    };
    PercentileBand {
        period,
        age,
        p10: percentile(&values, 0.10),
        p50: percentile(&values, 0.50),
        p90: percentile(&values, 0.90),
        mean,
    }
}

/// Nearest-rank percentile of already sorted values
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (p * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AccountBuilder, PortfolioBuilder};
    use crate::model::ReturnProfile;

    fn portfolio() -> Portfolio {
        PortfolioBuilder::new()
            .income(80_000.0)
            .expenses(40_000.0)
            .age(40)
            .tax_free()
            .account(
                AccountBuilder::brokerage("Brokerage")
                    .balance(50_000.0)
                    .contribution_rate(0.1)
                    .apr(0.06),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_percentile_nearest_rank() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        assert_eq!(percentile(&values, 0.10), 1.0);
        assert_eq!(percentile(&values, 0.50), 5.0);
        assert_eq!(percentile(&values, 0.90), 9.0);
        assert_eq!(percentile(&[], 0.5), 0.0);
    }

    #[test]
    fn test_fixed_returns_collapse_bands() {
        let run = RunConfig {
            periods: 5,
            ..RunConfig::default()
        };
        let config = MonteCarloConfig {
            iterations: 20,
            seed: 1,
        };
        let summary = monte_carlo(&portfolio(), &run, &config).unwrap();

        assert_eq!(summary.iterations, 20);
        assert_eq!(summary.bands.len(), 5);
        for band in &summary.bands {
            assert!((band.p10 - band.p90).abs() < 1e-6);
        }
        assert_eq!(summary.success_rate, 1.0);
    }

    #[test]
    fn test_sweep_is_reproducible_and_ordered() {
        let run = RunConfig {
            periods: 10,
            returns: ReturnProfile::Normal { std_dev: 0.2 },
            ..RunConfig::default()
        };
        let config = MonteCarloConfig {
            iterations: 250,
            seed: 9,
        };
        let a = monte_carlo(&portfolio(), &run, &config).unwrap();
        let b = monte_carlo(&portfolio(), &run, &config).unwrap();
        assert_eq!(a, b);

        for band in &a.bands {
            assert!(band.p10 <= band.p50 && band.p50 <= band.p90);
        }
        assert!(a.final_net_worth.p10 < a.final_net_worth.p90);
    }

    #[test]
    fn test_partial_final_batch() {
        let run = RunConfig {
            periods: 2,
            returns: ReturnProfile::LogNormal { std_dev: 0.1 },
            ..RunConfig::default()
        };
        let config = MonteCarloConfig {
            iterations: 130,
            seed: 3,
        };
        let results = simulate_many(&portfolio(), &run, &config).unwrap();
        assert_eq!(results.len(), 130);
    }

    #[test]
    fn test_zero_iterations() {
        let config = MonteCarloConfig {
            iterations: 0,
            seed: 0,
        };
        let summary = monte_carlo(&portfolio(), &RunConfig::default(), &config).unwrap();
        assert_eq!(summary.iterations, 0);
        assert!(summary.bands.is_empty());
    }
}
