//! Portfolio configuration
//!
//! The serializable entry point is [`ScenarioConfig`]: a household, its tax
//! setup, its accounts and how long to run. It converts into a
//! [`PortfolioBuilder`], which can also be used directly from code.
//!
//! # Scenario file
//!
//! ```yaml
//! household:
//!   income: 100000
//!   expenses: 50000
//!   income_growth: 0.02
//!   age: 30
//!   filing_status: single
//! taxes:
//!   income:
//!     - type: federal
//!     - type: flat
//!       rate: 0.05
//!   payroll:
//!     type: payroll
//! accounts:
//!   - name: 401k
//!     kind: traditional_401k
//!     apr: 0.06
//!     contribution: { rate: 0.1, cap: 19500 }
//!     employer: { match_rate: 0.5 }
//! run:
//!   periods: 40
//!   retire_at_age: 65
//! ```

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::model::{
    ContributionPolicy, EmployerMatch, FilingStatus, ReturnProfile, Sleeve, TaxBracket,
};
use crate::portfolio::{Household, Portfolio};
use crate::taxes::{CombinedTax, TaxSchedule};

pub mod account_builder;
pub mod builder;

pub use account_builder::AccountBuilder;
pub use builder::PortfolioBuilder;

/// Everything needed to build and run one portfolio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub household: Household,
    #[serde(default)]
    pub taxes: TaxConfig,
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
    #[serde(default)]
    pub run: RunConfig,
}

impl ScenarioConfig {
    /// Builder carrying the household, taxes, accounts and withdrawal rate
    pub fn to_builder(&self) -> Result<PortfolioBuilder> {
        let status = self.household.filing_status;
        let mut builder = PortfolioBuilder::new()
            .household(self.household)
            .income_tax(self.taxes.income_tax(status)?)
            .payroll_tax(self.taxes.payroll_tax(status)?);

        if let Some(rate) = self.run.withdrawal_rate {
            builder = builder.withdrawal_rate(rate);
        }
        if let Some(date) = self.run.start_date {
            builder = builder.start_date(date);
        }

        Ok(self
            .accounts
            .iter()
            .fold(builder, |builder, account| builder.account(account.to_builder())))
    }

    pub fn build_portfolio(&self) -> Result<Portfolio> {
        self.run.returns.validate()?;
        self.to_builder()?.build()
    }
}

// ============================================================================
// Taxes
// ============================================================================

/// A named preset or an explicit bracket table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaxScheduleConfig {
    /// Federal table for the household's filing status
    Federal,
    Payroll,
    Exempt,
    Flat {
        rate: f64,
    },
    Brackets {
        brackets: Vec<TaxBracket>,
        #[serde(default)]
        standard_deduction: f64,
    },
}

impl TaxScheduleConfig {
    pub fn resolve(&self, status: FilingStatus) -> std::result::Result<TaxSchedule, ConfigError> {
        match self {
            TaxScheduleConfig::Federal => Ok(TaxSchedule::us_federal(status)),
            TaxScheduleConfig::Payroll => Ok(TaxSchedule::payroll()),
            TaxScheduleConfig::Exempt => Ok(TaxSchedule::exempt()),
            TaxScheduleConfig::Flat { rate } => {
                if rate.is_finite() && *rate >= 0.0 {
                    Ok(TaxSchedule::flat(*rate))
                } else {
                    Err(ConfigError::InvalidRate {
                        index: 0,
                        rate: *rate,
                    })
                }
            }
            TaxScheduleConfig::Brackets {
                brackets,
                standard_deduction,
            } => TaxSchedule::new(brackets.clone(), *standard_deduction),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxConfig {
    /// Schedules stacked on the income tax base
    #[serde(default = "default_income_taxes")]
    pub income: Vec<TaxScheduleConfig>,
    /// Schedule applied to earned income; standard payroll tax when absent
    #[serde(default)]
    pub payroll: Option<TaxScheduleConfig>,
}

fn default_income_taxes() -> Vec<TaxScheduleConfig> {
    vec![TaxScheduleConfig::Federal]
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self {
            income: default_income_taxes(),
            payroll: None,
        }
    }
}

impl TaxConfig {
    pub fn income_tax(
        &self,
        status: FilingStatus,
    ) -> std::result::Result<CombinedTax, ConfigError> {
        let members = self
            .income
            .iter()
            .map(|s| s.resolve(status))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(CombinedTax::new(members))
    }

    pub fn payroll_tax(
        &self,
        status: FilingStatus,
    ) -> std::result::Result<TaxSchedule, ConfigError> {
        match &self.payroll {
            Some(schedule) => schedule.resolve(status),
            None => Ok(TaxSchedule::payroll()),
        }
    }
}

// ============================================================================
// Accounts
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Brokerage,
    Savings,
    TraditionalIra,
    RothIra,
    #[serde(rename = "traditional_401k")]
    Traditional401k,
    #[serde(rename = "roth_401k")]
    Roth401k,
    WorkplacePlan,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SleeveBalances {
    #[serde(default)]
    pub traditional: f64,
    #[serde(default)]
    pub roth: f64,
    #[serde(default)]
    pub after_tax: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountConfig {
    pub name: String,
    pub kind: AccountKind,
    #[serde(default)]
    pub balance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_basis: Option<f64>,
    #[serde(default)]
    pub apr: f64,
    #[serde(default)]
    pub contribution: ContributionPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employer: Option<EmployerMatch>,
    /// Workplace plans only; overrides `balance`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleeves: Option<SleeveBalances>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cap: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<Vec<Sleeve>>,
}

impl AccountConfig {
    pub fn to_builder(&self) -> AccountBuilder {
        let name = self.name.clone();
        let mut builder = match self.kind {
            AccountKind::Brokerage => AccountBuilder::brokerage(name),
            AccountKind::Savings => AccountBuilder::savings(name),
            AccountKind::TraditionalIra => AccountBuilder::traditional_ira(name),
            AccountKind::RothIra => AccountBuilder::roth_ira(name),
            AccountKind::Traditional401k => AccountBuilder::traditional_401k(name),
            AccountKind::Roth401k => AccountBuilder::roth_401k(name),
            AccountKind::WorkplacePlan => AccountBuilder::workplace_plan(name),
        }
        .balance(self.balance)
        .apr(self.apr)
        .contribution(self.contribution);

        if let Some(basis) = self.cost_basis {
            builder = builder.cost_basis(basis);
        }
        if let Some(employer) = self.employer {
            builder = builder.employer(employer);
        }
        if let Some(s) = self.sleeves {
            builder = builder.sleeve_balances(s.traditional, s.roth, s.after_tax);
        }
        if let Some(cap) = self.total_cap {
            builder = builder.total_cap(cap);
        }
        if let Some(route) = &self.route {
            builder = builder.route_to(route);
        }
        builder
    }
}

// ============================================================================
// Run parameters
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of yearly periods to simulate
    #[serde(default = "default_periods")]
    pub periods: u32,
    /// Retire at the start of the first period the household is this old
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retire_at_age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub withdrawal_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Date>,
    #[serde(default)]
    pub returns: ReturnProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_periods() -> u32 {
    30
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            periods: default_periods(),
            retire_at_age: None,
            withdrawal_rate: None,
            start_date: None,
            returns: ReturnProfile::Fixed,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_json() -> &'static str {
        r#"{
            "household": { "income": 100000, "expenses": 50000, "age": 30 },
            "taxes": {
                "income": [{ "type": "brackets", "brackets": [
                    { "threshold": 10000, "rate": 0.1 },
                    { "rate": 0.2 }
                ] }],
                "payroll": { "type": "exempt" }
            },
            "accounts": [
                { "name": "IRA", "kind": "traditional_ira", "apr": 0.05,
                  "contribution": { "rate": 0.1, "cap": 6000 } },
                { "name": "401k", "kind": "workplace_plan",
                  "sleeves": { "roth": 1000 }, "route": ["roth"] }
            ],
            "run": { "periods": 5, "retire_at_age": 33 }
        }"#
    }

    #[test]
    fn test_scenario_deserializes_with_defaults() {
        let config: ScenarioConfig = serde_json::from_str(scenario_json()).unwrap();
        assert_eq!(config.run.periods, 5);
        assert_eq!(config.run.retire_at_age, Some(33));
        assert_eq!(config.run.returns, ReturnProfile::Fixed);
        assert_eq!(config.accounts.len(), 2);
        assert_eq!(config.household.filing_status, FilingStatus::Single);
    }

    #[test]
    fn test_scenario_builds_portfolio() {
        let config: ScenarioConfig = serde_json::from_str(scenario_json()).unwrap();
        let portfolio = config.build_portfolio().unwrap();

        let keys: Vec<_> = portfolio.account_keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["standard", "IRA", "401k"]);

        let plan = portfolio.account("401k").unwrap();
        assert_eq!(plan.routing(), Some(Sleeve::Roth));
        assert_eq!(plan.balance(), 1_000.0);

        assert!((portfolio.income_tax().tax(20_000.0) - 3_000.0).abs() < 0.01);
        assert_eq!(portfolio.payroll_tax().tax(50_000.0), 0.0);
    }

    #[test]
    fn test_default_taxes_are_federal_and_payroll() {
        let taxes = TaxConfig::default();
        let income = taxes.income_tax(FilingStatus::MarriedJoint).unwrap();
        assert_eq!(
            income.members(),
            &[TaxSchedule::us_federal(FilingStatus::MarriedJoint)]
        );
        assert_eq!(
            taxes.payroll_tax(FilingStatus::Single).unwrap(),
            TaxSchedule::payroll()
        );
    }

    #[test]
    fn test_malformed_brackets_rejected_on_build() {
        let json = r#"{ "type": "brackets", "brackets": [
            { "threshold": 10000, "rate": 0.1 },
            { "threshold": 5000, "rate": 0.2 }
        ] }"#;
        let config: TaxScheduleConfig = serde_json::from_str(json).unwrap();
        assert!(matches!(
            config.resolve(FilingStatus::Single),
            Err(ConfigError::NonIncreasingThreshold { index: 1, .. })
        ));

        let flat = TaxScheduleConfig::Flat { rate: -0.1 };
        assert!(flat.resolve(FilingStatus::Single).is_err());
    }

    #[test]
    fn test_invalid_return_profile_rejected() {
        let mut config: ScenarioConfig = serde_json::from_str(scenario_json()).unwrap();
        config.run.returns = ReturnProfile::Normal { std_dev: -1.0 };
        assert!(config.build_portfolio().is_err());
    }
}
