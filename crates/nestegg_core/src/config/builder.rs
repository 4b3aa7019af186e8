//! Portfolio Builder
//!
//! Fluent setup for a household: income, expenses, tax schedules and accounts.
//! Tax schedules default to the illustrative federal table for the chosen
//! filing status plus standard payroll tax.
//!
//! # Example
//!
//! ```ignore
//! use nestegg_core::config::{AccountBuilder, PortfolioBuilder};
//!
//! let mut portfolio = PortfolioBuilder::new()
//!     .income(85_000.0)
//!     .expenses(45_000.0)
//!     .income_growth(0.02)
//!     .expense_growth(0.02)
//!     .age(30)
//!     .state_tax(0.05)
//!     .account(AccountBuilder::traditional_401k("401k")
//!         .contribution_rate(0.10)
//!         .contribution_cap(19_500.0)
//!         .employer_match(0.5)
//!         .apr(0.06))
//!     .account(AccountBuilder::brokerage("Brokerage").balance(10_000.0).apr(0.05))
//!     .build()?;
//!
//! portfolio.advance(35)?;
//! ```

use jiff::civil::Date;

use super::account_builder::AccountBuilder;
use crate::error::{ConfigError, Result};
use crate::model::FilingStatus;
use crate::portfolio::{DEFAULT_WITHDRAWAL_RATE, Household, Portfolio};
use crate::taxes::{CombinedTax, TaxSchedule};

/// Builder for a [`Portfolio`]
#[derive(Debug, Clone)]
pub struct PortfolioBuilder {
    household: Household,
    income_tax: Option<CombinedTax>,
    extra_income_taxes: Vec<TaxSchedule>,
    payroll_tax: Option<TaxSchedule>,
    withdrawal_rate: f64,
    start_date: Option<std::result::Result<Date, ConfigError>>,
    accounts: Vec<AccountBuilder>,
}

impl Default for PortfolioBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PortfolioBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            household: Household::default(),
            income_tax: None,
            extra_income_taxes: Vec::new(),
            payroll_tax: None,
            withdrawal_rate: DEFAULT_WITHDRAWAL_RATE,
            start_date: None,
            accounts: Vec::new(),
        }
    }

    /// Start from a fully specified household
    #[must_use]
    pub fn household(mut self, household: Household) -> Self {
        self.household = household;
        self
    }

    // =========================================================================
    // Household
    // =========================================================================

    #[must_use]
    pub fn income(mut self, income: f64) -> Self {
        self.household.income = income;
        self
    }

    #[must_use]
    pub fn expenses(mut self, expenses: f64) -> Self {
        self.household.expenses = expenses;
        self
    }

    #[must_use]
    pub fn income_growth(mut self, rate: f64) -> Self {
        self.household.income_growth = rate;
        self
    }

    #[must_use]
    pub fn expense_growth(mut self, rate: f64) -> Self {
        self.household.expense_growth = rate;
        self
    }

    #[must_use]
    pub fn age(mut self, age: u32) -> Self {
        self.household.age = age;
        self
    }

    #[must_use]
    pub fn filing_status(mut self, status: FilingStatus) -> Self {
        self.household.filing_status = status;
        self
    }

    #[must_use]
    pub fn married(self, married: bool) -> Self {
        self.filing_status(if married {
            FilingStatus::MarriedJoint
        } else {
            FilingStatus::Single
        })
    }

    /// Opening balance of the standard account
    #[must_use]
    pub fn cash(mut self, amount: f64) -> Self {
        self.household.cash = amount;
        self
    }

    #[must_use]
    pub fn cash_apr(mut self, apr: f64) -> Self {
        self.household.cash_apr = apr;
        self
    }

    // =========================================================================
    // Taxes
    // =========================================================================

    /// Replace the default federal schedule
    #[must_use]
    pub fn income_tax(mut self, tax: impl Into<CombinedTax>) -> Self {
        self.income_tax = Some(tax.into());
        self
    }

    /// Stack another schedule on top of the income tax
    #[must_use]
    pub fn additional_income_tax(mut self, schedule: TaxSchedule) -> Self {
        self.extra_income_taxes.push(schedule);
        self
    }

    /// Flat state income tax on the same base as the federal schedule
    #[must_use]
    pub fn state_tax(self, rate: f64) -> Self {
        self.additional_income_tax(TaxSchedule::flat(rate))
    }

    #[must_use]
    pub fn payroll_tax(mut self, schedule: TaxSchedule) -> Self {
        self.payroll_tax = Some(schedule);
        self
    }

    /// Disable every default tax; useful for isolating account behaviour
    #[must_use]
    pub fn tax_free(mut self) -> Self {
        self.income_tax = Some(CombinedTax::default());
        self.extra_income_taxes.clear();
        self.payroll_tax = Some(TaxSchedule::exempt());
        self
    }

    // =========================================================================
    // Simulation
    // =========================================================================

    #[must_use]
    pub fn withdrawal_rate(mut self, rate: f64) -> Self {
        self.withdrawal_rate = rate;
        self
    }

    #[must_use]
    pub fn start_date(mut self, date: Date) -> Self {
        self.start_date = Some(Ok(date));
        self
    }

    /// Set the start date (convenience method); an impossible date fails `build()`
    #[must_use]
    pub fn start(mut self, year: i16, month: i8, day: i8) -> Self {
        let date = Date::new(year, month, day).map_err(|_| ConfigError::InvalidDate {
            year,
            month,
            day,
        });
        self.start_date = Some(date);
        self
    }

    #[must_use]
    pub fn account(mut self, account: AccountBuilder) -> Self {
        self.accounts.push(account);
        self
    }

    pub fn build(self) -> Result<Portfolio> {
        let household = self.household;
        for (name, value) in [
            ("income", household.income),
            ("expenses", household.expenses),
            ("cash", household.cash),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidParameter { name, value }.into());
            }
        }

        let mut income_tax = self
            .income_tax
            .unwrap_or_else(|| TaxSchedule::us_federal(household.filing_status).into());
        for schedule in self.extra_income_taxes {
            income_tax.push(schedule);
        }
        let payroll_tax = self.payroll_tax.unwrap_or_else(TaxSchedule::payroll);

        let accounts = self
            .accounts
            .into_iter()
            .map(AccountBuilder::build)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut portfolio = Portfolio::new(household, accounts, income_tax, payroll_tax)?;
        portfolio.set_withdrawal_rate(self.withdrawal_rate)?;
        if let Some(date) = self.start_date {
            portfolio.set_start_date(date?);
        }
        Ok(portfolio)
    }
}
