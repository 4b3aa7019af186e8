//! Household savings simulation library
//!
//! This crate projects a household's finances year by year. It supports:
//! - Taxable, tax-deferred, tax-free and cash accounts with contribution policies
//! - Workplace plans with traditional, Roth and after-tax sleeves under shared caps
//! - Employer contributions and matches
//! - Progressive tax schedules (income and payroll) with standard deductions
//! - Retirement drawdown at a fixed withdrawal rate
//! - Monte Carlo sweeps over sampled returns
//!
//! # Builder DSL
//!
//! ```ignore
//! use nestegg_core::config::{AccountBuilder, PortfolioBuilder};
//!
//! let mut portfolio = PortfolioBuilder::new()
//!     .income(100_000.0)
//!     .expenses(50_000.0)
//!     .age(30)
//!     .account(AccountBuilder::traditional_ira("IRA").contribution_rate(0.06).apr(0.05))
//!     .account(AccountBuilder::brokerage("Brokerage").balance(25_000.0).apr(0.05))
//!     .build()?;
//!
//! portfolio.advance(35)?;
//! portfolio.retire();
//! portfolio.advance(25)?;
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod error;
pub mod monte_carlo;
pub mod portfolio;
pub mod simulation;
pub mod taxes;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod config;
pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use config::{AccountBuilder, PortfolioBuilder, ScenarioConfig};
pub use error::{PortfolioError, Result};
pub use portfolio::{Household, Phase, Portfolio};
pub use taxes::{CombinedTax, TaxSchedule};
