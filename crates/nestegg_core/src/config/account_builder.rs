//! Account Builder DSL
//!
//! Provides a fluent API for creating accounts with preset types and sensible defaults.
//!
//! # Examples
//!
//! ```ignore
//! use nestegg_core::config::AccountBuilder;
//!
//! // Traditional IRA putting away 10% of income, capped at $6,000 a year
//! let ira = AccountBuilder::traditional_ira("IRA")
//!     .balance(20_000.0)
//!     .apr(0.06)
//!     .contribution_rate(0.10)
//!     .contribution_cap(6_000.0);
//!
//! // Workplace plan with a 50% employer match, contributions going to Roth
//! let plan = AccountBuilder::workplace_plan("401k")
//!     .contribution_rate(0.08)
//!     .contribution_cap(19_500.0)
//!     .employer_match(0.5)
//!     .route_to(&[Sleeve::Roth]);
//! ```

use crate::error::ConfigError;
use crate::model::{
    Account, AccountKey, CompositeAccount, ContributionPolicy, EmployerMatch, Saver, Sleeve,
    TaxStatus,
};

/// Builder for creating accounts with a fluent API
#[derive(Debug, Clone)]
pub struct AccountBuilder {
    pub(crate) name: String,
    apr: f64,
    contribution: ContributionPolicy,
    employer: Option<EmployerMatch>,
    flavor: AccountFlavorBuilder,
}

#[derive(Debug, Clone)]
enum AccountFlavorBuilder {
    Saver {
        tax_status: TaxStatus,
        balance: f64,
        cost_basis: Option<f64>,
    },
    Composite {
        traditional: f64,
        roth: f64,
        after_tax: f64,
        total_cap: Option<f64>,
        route: Vec<Sleeve>,
    },
}

impl AccountBuilder {
    fn saver(name: impl Into<String>, tax_status: TaxStatus) -> Self {
        Self {
            name: name.into(),
            apr: 0.0,
            contribution: ContributionPolicy::default(),
            employer: None,
            flavor: AccountFlavorBuilder::Saver {
                tax_status,
                balance: 0.0,
                cost_basis: None,
            },
        }
    }

    // =========================================================================
    // Preset Account Type Constructors
    // =========================================================================

    /// Taxable brokerage: gains taxed on withdrawal
    #[must_use]
    pub fn brokerage(name: impl Into<String>) -> Self {
        Self::saver(name, TaxStatus::Taxable)
    }

    /// Savings account: cash-equivalent, withdrawals never taxed
    #[must_use]
    pub fn savings(name: impl Into<String>) -> Self {
        Self::saver(name, TaxStatus::Cash)
    }

    /// Traditional IRA: contributions deductible, withdrawals taxed as income
    #[must_use]
    pub fn traditional_ira(name: impl Into<String>) -> Self {
        Self::saver(name, TaxStatus::TaxDeferred)
    }

    /// Roth IRA: contributions post-tax, withdrawals tax-free
    #[must_use]
    pub fn roth_ira(name: impl Into<String>) -> Self {
        Self::saver(name, TaxStatus::TaxFree)
    }

    /// Traditional 401(k): tax-deferred, usually with an employer match
    #[must_use]
    pub fn traditional_401k(name: impl Into<String>) -> Self {
        Self::saver(name, TaxStatus::TaxDeferred)
    }

    /// Roth 401(k): tax-free, usually with an employer match
    #[must_use]
    pub fn roth_401k(name: impl Into<String>) -> Self {
        Self::saver(name, TaxStatus::TaxFree)
    }

    /// Workplace plan with traditional, Roth and after-tax sleeves sharing one
    /// elective limit. Personal contributions go to the traditional sleeve
    /// unless [`route_to`](Self::route_to) says otherwise.
    #[must_use]
    pub fn workplace_plan(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            apr: 0.0,
            contribution: ContributionPolicy::default(),
            employer: None,
            flavor: AccountFlavorBuilder::Composite {
                traditional: 0.0,
                roth: 0.0,
                after_tax: 0.0,
                total_cap: None,
                route: vec![Sleeve::Traditional],
            },
        }
    }

    // =========================================================================
    // Balances and growth
    // =========================================================================

    /// Opening balance; for a workplace plan this lands in the traditional sleeve
    #[must_use]
    pub fn balance(mut self, amount: f64) -> Self {
        match &mut self.flavor {
            AccountFlavorBuilder::Saver { balance, .. } => *balance = amount,
            AccountFlavorBuilder::Composite { traditional, .. } => *traditional = amount,
        }
        self
    }

    /// Contributed money in the opening balance; the rest counts as gains
    #[must_use]
    pub fn cost_basis(mut self, amount: f64) -> Self {
        if let AccountFlavorBuilder::Saver { cost_basis, .. } = &mut self.flavor {
            *cost_basis = Some(amount);
        }
        self
    }

    /// Opening balances of each sleeve of a workplace plan
    #[must_use]
    pub fn sleeve_balances(mut self, traditional: f64, roth: f64, after_tax: f64) -> Self {
        if let AccountFlavorBuilder::Composite {
            traditional: t,
            roth: r,
            after_tax: a,
            ..
        } = &mut self.flavor
        {
            *t = traditional;
            *r = roth;
            *a = after_tax;
        }
        self
    }

    #[must_use]
    pub fn apr(mut self, apr: f64) -> Self {
        self.apr = apr;
        self
    }

    // =========================================================================
    // Contributions
    // =========================================================================

    /// Fixed amount contributed every period
    #[must_use]
    pub fn base_contribution(mut self, amount: f64) -> Self {
        self.contribution.base = amount;
        self
    }

    /// Share of income contributed every period
    #[must_use]
    pub fn contribution_rate(mut self, rate: f64) -> Self {
        self.contribution.rate = rate;
        self
    }

    /// Per-period limit on personal contributions
    #[must_use]
    pub fn contribution_cap(mut self, cap: f64) -> Self {
        self.contribution.cap = Some(cap);
        self
    }

    #[must_use]
    pub fn contribution(mut self, policy: ContributionPolicy) -> Self {
        self.contribution = policy;
        self
    }

    /// Employer contribution as a share of income
    #[must_use]
    pub fn employer_rate(mut self, rate: f64) -> Self {
        self.employer.get_or_insert_with(EmployerMatch::default).income_rate = rate;
        self
    }

    /// Employer contribution as a share of the employee's own contribution
    #[must_use]
    pub fn employer_match(mut self, rate: f64) -> Self {
        self.employer.get_or_insert_with(EmployerMatch::default).match_rate = rate;
        self
    }

    #[must_use]
    pub fn employer_cap(mut self, cap: f64) -> Self {
        self.employer.get_or_insert_with(EmployerMatch::default).cap = Some(cap);
        self
    }

    #[must_use]
    pub fn employer(mut self, employer: EmployerMatch) -> Self {
        self.employer = Some(employer);
        self
    }

    /// Limit on all money entering a workplace plan per period
    #[must_use]
    pub fn total_cap(mut self, cap: f64) -> Self {
        if let AccountFlavorBuilder::Composite { total_cap, .. } = &mut self.flavor {
            *total_cap = Some(cap);
        }
        self
    }

    /// Sleeve receiving automatic contributions; exactly one must be named
    #[must_use]
    pub fn route_to(mut self, sleeves: &[Sleeve]) -> Self {
        if let AccountFlavorBuilder::Composite { route, .. } = &mut self.flavor {
            *route = sleeves.to_vec();
        }
        self
    }

    // =========================================================================
    // Build
    // =========================================================================

    pub fn build(self) -> Result<(AccountKey, Account), ConfigError> {
        non_negative("contribution base", self.contribution.base)?;
        non_negative("contribution rate", self.contribution.rate)?;
        if let Some(cap) = self.contribution.cap {
            non_negative("contribution cap", cap)?;
        }
        if let Some(employer) = &self.employer {
            non_negative("employer income rate", employer.income_rate)?;
            non_negative("employer match rate", employer.match_rate)?;
            if let Some(cap) = employer.cap {
                non_negative("employer cap", cap)?;
            }
        }
        if !self.apr.is_finite() || self.apr <= -1.0 {
            return Err(ConfigError::InvalidParameter {
                name: "apr",
                value: self.apr,
            });
        }

        let key = AccountKey::from(self.name);
        let account = match self.flavor {
            AccountFlavorBuilder::Saver {
                tax_status,
                balance,
                cost_basis,
            } => {
                non_negative("balance", balance)?;
                let mut saver = Saver::new(tax_status, balance)
                    .with_apr(self.apr)
                    .with_contribution(self.contribution);
                if let Some(employer) = self.employer {
                    saver = saver.with_employer_match(employer);
                }
                if let Some(basis) = cost_basis {
                    non_negative("cost basis", basis)?;
                    saver = saver.with_net_contributions(basis);
                }
                Account::from(saver)
            }
            AccountFlavorBuilder::Composite {
                traditional,
                roth,
                after_tax,
                total_cap,
                route,
            } => {
                non_negative("traditional balance", traditional)?;
                non_negative("roth balance", roth)?;
                non_negative("after-tax balance", after_tax)?;
                if let Some(cap) = total_cap {
                    non_negative("total cap", cap)?;
                }

                let mut plan =
                    CompositeAccount::new(self.apr).with_balances(traditional, roth, after_tax);
                plan.elective = self.contribution;
                plan.employer = self.employer;
                plan.total_cap = total_cap;
                plan.route = Sleeve::exactly_one(&route)?;
                Account::from(plan)
            }
        };

        Ok((key, account))
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AccountError;

    #[test]
    fn test_presets_map_to_tax_status() {
        let cases = [
            (AccountBuilder::brokerage("a"), TaxStatus::Taxable),
            (AccountBuilder::savings("b"), TaxStatus::Cash),
            (AccountBuilder::traditional_ira("c"), TaxStatus::TaxDeferred),
            (AccountBuilder::roth_ira("d"), TaxStatus::TaxFree),
            (AccountBuilder::traditional_401k("e"), TaxStatus::TaxDeferred),
            (AccountBuilder::roth_401k("f"), TaxStatus::TaxFree),
        ];
        for (builder, expected) in cases {
            let (_, account) = builder.build().unwrap();
            assert_eq!(account.tax_status(), Some(expected));
        }
    }

    #[test]
    fn test_cost_basis_sets_net_contributions() {
        let (key, account) = AccountBuilder::brokerage("Brokerage")
            .balance(10_000.0)
            .cost_basis(4_000.0)
            .build()
            .unwrap();
        assert_eq!(key.as_str(), "Brokerage");
        assert_eq!(account.balance(), 10_000.0);
        assert_eq!(account.net_contributions(), 4_000.0);
    }

    #[test]
    fn test_workplace_plan_routing() {
        let (_, account) = AccountBuilder::workplace_plan("401k")
            .route_to(&[Sleeve::Roth])
            .build()
            .unwrap();
        assert_eq!(account.routing(), Some(Sleeve::Roth));

        let err = AccountBuilder::workplace_plan("401k")
            .route_to(&[])
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::Account(AccountError::SleeveRequired));

        let err = AccountBuilder::workplace_plan("401k")
            .route_to(&[Sleeve::Traditional, Sleeve::Roth])
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Account(AccountError::AmbiguousSleeve(_))
        ));
    }

    #[test]
    fn test_rejects_negative_parameters() {
        assert!(AccountBuilder::roth_ira("r").balance(-1.0).build().is_err());
        assert!(
            AccountBuilder::roth_ira("r")
                .contribution_cap(-5.0)
                .build()
                .is_err()
        );
        assert!(AccountBuilder::roth_ira("r").apr(-1.5).build().is_err());
    }
}
