//! Scenario runner
//!
//! Drives a [`Portfolio`] period by period, retiring it once the household
//! reaches the configured age, and collects the outcome.

use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::config::{RunConfig, ScenarioConfig};
use crate::error::Result;
use crate::model::{
    AccountKey, FixedGrowth, GrowthSource, PeriodRecord, ReturnProfile, SampledGrowth,
};
use crate::portfolio::Portfolio;

/// Outcome of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub history: Vec<PeriodRecord>,
    pub final_net_worth: f64,
    /// Closing balance of every account, `standard` first
    pub final_balances: Vec<(AccountKey, f64)>,
    /// Age at which the household retired, if it did
    pub retired_at: Option<u32>,
    /// Age at the end of the first period with unpaid expenses or tax
    pub depleted_at: Option<u32>,
}

impl SimulationResult {
    /// True when every period's expenses and tax were paid in full
    pub fn is_success(&self) -> bool {
        self.depleted_at.is_none()
    }

    fn from_portfolio(portfolio: &Portfolio, retired_at: Option<u32>) -> Self {
        let history = portfolio.history().to_vec();
        let depleted_at = history.iter().find(|r| r.shortfall > 0.0).map(|r| r.age);
        Self {
            final_net_worth: portfolio.net_worth(),
            final_balances: portfolio
                .accounts()
                .map(|(key, account)| (key.clone(), account.balance()))
                .collect(),
            retired_at,
            depleted_at,
            history,
        }
    }
}

/// Build the scenario's portfolio and run it, seeding sampled returns from
/// the scenario's own seed (or 0)
pub fn run(config: &ScenarioConfig) -> Result<SimulationResult> {
    let portfolio = config.build_portfolio()?;
    simulate(portfolio, &config.run, config.run.seed.unwrap_or(0))
}

/// Run an already built portfolio under `run`; `seed` only matters when the
/// return profile is random
pub fn simulate(portfolio: Portfolio, run: &RunConfig, seed: u64) -> Result<SimulationResult> {
    run.returns.validate()?;
    match run.returns {
        ReturnProfile::Fixed => simulate_with(portfolio, run, &mut FixedGrowth),
        profile => {
            let mut growth = SampledGrowth::new(profile, SmallRng::seed_from_u64(seed));
            simulate_with(portfolio, run, &mut growth)
        }
    }
}

/// Run with an explicit growth source
pub fn simulate_with<G: GrowthSource + ?Sized>(
    mut portfolio: Portfolio,
    run: &RunConfig,
    growth: &mut G,
) -> Result<SimulationResult> {
    let mut retired_at = portfolio.is_retired().then(|| portfolio.age());

    for _ in 0..run.periods {
        let due = run
            .retire_at_age
            .is_some_and(|age| portfolio.age() >= age);
        if due && !portfolio.is_retired() {
            portfolio.retire();
            retired_at = Some(portfolio.age());
        }
        portfolio.advance_with(1, growth)?;
    }

    let result = SimulationResult::from_portfolio(&portfolio, retired_at);
    tracing::info!(
        periods = run.periods,
        final_net_worth = result.final_net_worth,
        retired_at = ?result.retired_at,
        depleted_at = ?result.depleted_at,
        "Simulation complete"
    );
    Ok(result)
}
