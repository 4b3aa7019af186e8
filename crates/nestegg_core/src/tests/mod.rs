//! Integration tests for the nestegg simulation engine
//!
//! Tests are organized by topic:
//! - `accounts` - Single-balance accounts: caps, withdrawals, aging
//! - `composite` - Workplace plans with traditional, Roth and after-tax sleeves
//! - `portfolio` - Account registry, direct operations and the period step
//! - `retirement` - Drawdown after `retire()` and liquidation
//! - `builder_dsl` - Builder DSL for fluent portfolio setup
//! - `properties` - Property tests for account invariants

mod accounts;
mod properties;
