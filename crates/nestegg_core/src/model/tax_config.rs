//! Tax input types shared by the schedule evaluator and the portfolio loop

use serde::{Deserialize, Serialize};

/// One row of a progressive schedule: income up to `threshold` is taxed at `rate`.
///
/// Thresholds are upper bounds. The last row of a schedule is unbounded; an
/// omitted threshold deserializes as `f64::INFINITY`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxBracket {
    #[serde(default = "unbounded", skip_serializing_if = "is_unbounded")]
    pub threshold: f64,
    pub rate: f64,
}

impl TaxBracket {
    pub const fn new(threshold: f64, rate: f64) -> Self {
        Self { threshold, rate }
    }

    pub const fn unbounded(rate: f64) -> Self {
        Self {
            threshold: f64::INFINITY,
            rate,
        }
    }
}

fn unbounded() -> f64 {
    f64::INFINITY
}

fn is_unbounded(threshold: &f64) -> bool {
    threshold.is_infinite()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    #[default]
    Single,
    MarriedJoint,
}

/// Everything that feeds a period's income-tax calculation.
///
/// Built fresh each period from the amounts the accounts report, so tax code
/// never needs to hold references into the accounts themselves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxBase {
    /// Wages and other earned income
    pub earned_income: f64,
    /// Portion of withdrawals counted as income
    pub taxable_withdrawals: f64,
    /// Contributions subtracted from income
    pub deductible_contributions: f64,
}

impl TaxBase {
    /// Amount subject to income tax, before any standard deduction
    pub fn taxable_income(&self) -> f64 {
        (self.earned_income + self.taxable_withdrawals - self.deductible_contributions).max(0.0)
    }
}

/// Tax paid during one period
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxSummary {
    pub taxable_income: f64,
    pub income_tax: f64,
    pub payroll_tax: f64,
}

impl TaxSummary {
    pub fn total(&self) -> f64 {
        self.income_tax + self.payroll_tax
    }
}
