//! Scenario files
//!
//! Scenarios are YAML documents matching [`ScenarioConfig`]. Command-line
//! flags override the `run` section after loading.

use std::path::Path;

use color_eyre::eyre::{Context, Result};
use nestegg_core::config::ScenarioConfig;

/// Bundled scenario used when no file is given
const DEFAULT_SCENARIO: &str = include_str!("../scenarios/default.yaml");

/// Run parameters given on the command line
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Overrides {
    pub periods: Option<u32>,
    pub retire_at: Option<u32>,
    pub withdrawal_rate: Option<f64>,
    pub seed: Option<u64>,
}

impl Overrides {
    pub fn apply(&self, scenario: &mut ScenarioConfig) {
        if let Some(periods) = self.periods {
            scenario.run.periods = periods;
        }
        if let Some(age) = self.retire_at {
            scenario.run.retire_at_age = Some(age);
        }
        if let Some(rate) = self.withdrawal_rate {
            scenario.run.withdrawal_rate = Some(rate);
        }
        if let Some(seed) = self.seed {
            scenario.run.seed = Some(seed);
        }
    }
}

pub fn parse_scenario(yaml: &str) -> Result<ScenarioConfig, serde_saphyr::Error> {
    serde_saphyr::from_str(yaml)
}

pub fn default_scenario() -> Result<ScenarioConfig> {
    parse_scenario(DEFAULT_SCENARIO).wrap_err("bundled scenario is malformed")
}

/// Read a scenario from `path`, or the bundled one when `path` is `None`
pub fn load_scenario(path: Option<&Path>) -> Result<ScenarioConfig> {
    let Some(path) = path else {
        tracing::debug!("Using bundled scenario");
        return default_scenario();
    };

    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read scenario {}", path.display()))?;
    let scenario = parse_scenario(&content)
        .wrap_err_with(|| format!("failed to parse scenario {}", path.display()))?;

    tracing::info!(
        path = %path.display(),
        accounts = scenario.accounts.len(),
        periods = scenario.run.periods,
        "Scenario loaded"
    );
    Ok(scenario)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nestegg_core::model::{FilingStatus, ReturnProfile};

    #[test]
    fn test_bundled_scenario_builds() {
        let scenario = default_scenario().unwrap();
        assert_eq!(scenario.household.age, 30);
        assert_eq!(scenario.accounts.len(), 3);
        assert_eq!(scenario.run.retire_at_age, Some(65));
        assert_eq!(
            scenario.run.returns,
            ReturnProfile::LogNormal { std_dev: 0.15 }
        );

        let portfolio = scenario.build_portfolio().unwrap();
        assert_eq!(portfolio.account_keys().count(), 4);
        assert_eq!(portfolio.income_tax().members().len(), 2);
    }

    #[test]
    fn test_load_scenario_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("couple.yaml");
        std::fs::write(
            &path,
            r#"
household:
  income: 120000.0
  expenses: 70000.0
  age: 40
  filing_status: married_joint
accounts:
  - name: IRA
    kind: traditional_ira
    balance: 50000.0
run:
  periods: 10
"#,
        )
        .unwrap();

        let scenario = load_scenario(Some(&path)).unwrap();
        assert_eq!(scenario.household.filing_status, FilingStatus::MarriedJoint);
        assert_eq!(scenario.run.periods, 10);
        assert_eq!(scenario.run.returns, ReturnProfile::Fixed);
        assert_eq!(scenario.accounts[0].balance, 50_000.0);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_scenario(Some(&dir.path().join("nope.yaml"))).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read scenario"));
    }

    #[test]
    fn test_overrides_replace_run_settings() {
        let mut scenario = default_scenario().unwrap();
        Overrides {
            periods: Some(5),
            retire_at: Some(50),
            withdrawal_rate: None,
            seed: Some(7),
        }
        .apply(&mut scenario);

        assert_eq!(scenario.run.periods, 5);
        assert_eq!(scenario.run.retire_at_age, Some(50));
        assert_eq!(scenario.run.withdrawal_rate, None);
        assert_eq!(scenario.run.seed, Some(7));
    }
}
