use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use super::tax_config::TaxSummary;

/// What happened during one simulated period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRecord {
    /// Zero-based index of the period since the portfolio was built
    pub period: u32,
    /// Household age at the end of the period
    pub age: u32,
    /// Calendar date at the end of the period, when the portfolio has a start date
    pub date: Option<Date>,
    pub retired: bool,
    pub income: f64,
    pub expenses: f64,
    pub contributions: f64,
    pub employer_contributions: f64,
    pub withdrawals: f64,
    pub taxes: TaxSummary,
    /// Expenses and tax the standard account could not cover
    pub shortfall: f64,
    pub net_worth: f64,
}
