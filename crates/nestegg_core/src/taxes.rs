//! Progressive tax calculation
//!
//! A [`TaxSchedule`] turns an amount into a liability by walking its brackets
//! and taxing only the slice of income that falls inside each one. A
//! [`CombinedTax`] stacks several schedules that all apply to the same base,
//! e.g. federal + state.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::{FilingStatus, TaxBase, TaxBracket};

/// Marginal-rate schedule with a standard deduction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxSchedule {
    brackets: Vec<TaxBracket>,
    standard_deduction: f64,
}

impl TaxSchedule {
    /// Build a schedule, rejecting tables that would not produce a continuous,
    /// non-decreasing liability.
    pub fn new(brackets: Vec<TaxBracket>, standard_deduction: f64) -> Result<Self, ConfigError> {
        if brackets.is_empty() {
            return Err(ConfigError::EmptyBrackets);
        }
        if !standard_deduction.is_finite() || standard_deduction < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "standard deduction",
                value: standard_deduction,
            });
        }

        let mut previous = 0.0;
        for (index, bracket) in brackets.iter().enumerate() {
            if !bracket.rate.is_finite() || bracket.rate < 0.0 {
                return Err(ConfigError::InvalidRate {
                    index,
                    rate: bracket.rate,
                });
            }
            if bracket.threshold.is_nan() || bracket.threshold <= previous {
                return Err(ConfigError::NonIncreasingThreshold {
                    index,
                    previous,
                    threshold: bracket.threshold,
                });
            }
            previous = bracket.threshold;
        }

        if previous.is_finite() {
            return Err(ConfigError::BoundedFinalBracket(previous));
        }

        Ok(Self {
            brackets,
            standard_deduction,
        })
    }

    /// A schedule that never charges anything
    #[must_use]
    pub fn exempt() -> Self {
        Self::flat(0.0)
    }

    /// Single unbounded bracket
    #[must_use]
    pub fn flat(rate: f64) -> Self {
        Self {
            brackets: vec![TaxBracket::unbounded(rate.max(0.0))],
            standard_deduction: 0.0,
        }
    }

    /// Illustrative federal income-tax table (2020 figures)
    #[must_use]
    pub fn us_federal(status: FilingStatus) -> Self {
        let (brackets, standard_deduction) = match status {
            FilingStatus::Single => (
                vec![
                    TaxBracket::new(9_875.0, 0.10),
                    TaxBracket::new(40_125.0, 0.12),
                    TaxBracket::new(85_525.0, 0.22),
                    TaxBracket::new(163_300.0, 0.24),
                    TaxBracket::new(207_350.0, 0.32),
                    TaxBracket::new(518_400.0, 0.35),
                    TaxBracket::unbounded(0.37),
                ],
                12_400.0,
            ),
            FilingStatus::MarriedJoint => (
                vec![
                    TaxBracket::new(19_750.0, 0.10),
                    TaxBracket::new(80_250.0, 0.12),
                    TaxBracket::new(171_050.0, 0.22),
                    TaxBracket::new(326_600.0, 0.24),
                    TaxBracket::new(414_700.0, 0.32),
                    TaxBracket::new(622_050.0, 0.35),
                    TaxBracket::unbounded(0.37),
                ],
                24_800.0,
            ),
        };
        Self {
            brackets,
            standard_deduction,
        }
    }

    /// Social security up to the wage base plus uncapped medicare
    #[must_use]
    pub fn payroll() -> Self {
        Self {
            brackets: vec![
                TaxBracket::new(137_700.0, 0.062 + 0.0145),
                TaxBracket::unbounded(0.0145),
            ],
            standard_deduction: 0.0,
        }
    }

    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }

    pub fn standard_deduction(&self) -> f64 {
        self.standard_deduction
    }

    /// Liability on `gross` after the standard deduction
    pub fn tax(&self, gross: f64) -> f64 {
        self.tax_with_deduction(gross, self.standard_deduction)
    }

    /// Liability on `gross` after an explicit deduction
    pub fn tax_with_deduction(&self, gross: f64, deduction: f64) -> f64 {
        let taxable = (gross - deduction).max(0.0);
        if taxable <= 0.0 {
            return 0.0;
        }

        let mut tax = 0.0;
        let mut floor = 0.0;
        for bracket in &self.brackets {
            let slice = taxable.min(bracket.threshold) - floor;
            if slice <= 0.0 {
                break;
            }
            tax += slice * bracket.rate;
            floor = bracket.threshold;
        }
        tax
    }

    /// Average rate paid on `amount`; zero income pays a zero rate
    pub fn effective_rate(&self, amount: f64) -> f64 {
        if amount == 0.0 {
            return 0.0;
        }
        self.tax(amount) / amount
    }

    /// Rate applied to the next unit of income above `amount`
    pub fn marginal_rate(&self, amount: f64) -> f64 {
        let taxable = (amount - self.standard_deduction).max(0.0);
        self.brackets
            .iter()
            .find(|b| taxable < b.threshold)
            .or(self.brackets.last())
            .map(|b| b.rate)
            .unwrap_or(0.0)
    }

    /// Extra tax owed when `additional` is stacked on top of `ytd_income`
    pub fn marginal_tax(&self, additional: f64, ytd_income: f64) -> f64 {
        self.tax(ytd_income + additional) - self.tax(ytd_income)
    }
}

impl<'de> Deserialize<'de> for TaxSchedule {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            brackets: Vec<TaxBracket>,
            #[serde(default)]
            standard_deduction: f64,
        }

        let raw = Raw::deserialize(deserializer)?;
        TaxSchedule::new(raw.brackets, raw.standard_deduction).map_err(serde::de::Error::custom)
    }
}

/// Several schedules applied to the same base, e.g. federal + state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombinedTax {
    members: Vec<TaxSchedule>,
}

impl CombinedTax {
    pub fn new(members: Vec<TaxSchedule>) -> Self {
        Self { members }
    }

    pub fn push(&mut self, schedule: TaxSchedule) {
        self.members.push(schedule);
    }

    pub fn members(&self) -> &[TaxSchedule] {
        &self.members
    }

    /// Sum of every member's liability on `amount`
    pub fn tax(&self, amount: f64) -> f64 {
        self.members.iter().map(|s| s.tax(amount)).sum()
    }

    /// Liability on a period's combined income, withdrawals and deductions
    pub fn tax_on(&self, base: &TaxBase) -> f64 {
        self.tax(base.taxable_income())
    }

    pub fn effective_rate(&self, amount: f64) -> f64 {
        if amount == 0.0 {
            return 0.0;
        }
        self.tax(amount) / amount
    }
}

impl From<TaxSchedule> for CombinedTax {
    fn from(schedule: TaxSchedule) -> Self {
        Self::new(vec![schedule])
    }
}
