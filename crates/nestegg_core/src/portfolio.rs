//! Household portfolio and the yearly simulation loop
//!
//! A [`Portfolio`] owns a set of named accounts plus the reserved `standard`
//! cash account. Each period income lands in `standard`, personal
//! contributions move out of it into the dedicated accounts (or, once
//! retired, a fixed share of every account moves back), everything grows, and
//! expenses and tax are paid out of `standard`.

use jiff::ToSpan;
use jiff::civil::Date;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, LookupError, PortfolioError, Result};
use crate::model::{
    Account, AccountKey, Contribution, Contributor, FilingStatus, FixedGrowth, GrowthSource,
    PeriodRecord, Saver, Sleeve, TaxBase, TaxStatus, TaxSummary, Withdrawal,
};
use crate::taxes::{CombinedTax, TaxSchedule};

/// Share of each account withdrawn per period after retirement
pub const DEFAULT_WITHDRAWAL_RATE: f64 = 0.04;

/// Position of the standard account; it is created first and never removed
const STANDARD: usize = 0;

/// Bound on repeated drains of a single account in [`Portfolio::withdraw_all`]
const MAX_DRAIN_PASSES: usize = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Accumulating,
    Retired,
}

/// Starting circumstances of the household
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Household {
    pub income: f64,
    pub expenses: f64,
    #[serde(default)]
    pub income_growth: f64,
    #[serde(default)]
    pub expense_growth: f64,
    pub age: u32,
    #[serde(default)]
    pub filing_status: FilingStatus,
    /// Opening balance of the standard account
    #[serde(default)]
    pub cash: f64,
    /// Growth rate of the standard account
    #[serde(default)]
    pub cash_apr: f64,
}

impl Default for Household {
    fn default() -> Self {
        Self {
            income: 0.0,
            expenses: 0.0,
            income_growth: 0.0,
            expense_growth: 0.0,
            age: 18,
            filing_status: FilingStatus::Single,
            cash: 0.0,
            cash_apr: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Portfolio {
    accounts: Vec<(AccountKey, Account)>,
    index: FxHashMap<AccountKey, usize>,
    income: f64,
    expenses: f64,
    income_growth: f64,
    expense_growth: f64,
    age: u32,
    phase: Phase,
    withdrawal_rate: f64,
    filing_status: FilingStatus,
    income_tax: CombinedTax,
    payroll_tax: TaxSchedule,
    start_date: Option<Date>,
    periods_elapsed: u32,
    /// Tax inputs produced outside the loop (e.g. by removing an account)
    carryover: TaxBase,
    history: Vec<PeriodRecord>,
}

impl Portfolio {
    /// Build a portfolio; `standard` is created automatically and may not
    /// appear in `accounts`.
    pub fn new(
        household: Household,
        accounts: impl IntoIterator<Item = (AccountKey, Account)>,
        income_tax: CombinedTax,
        payroll_tax: TaxSchedule,
    ) -> Result<Self> {
        let standard = Saver::new(TaxStatus::Cash, household.cash).with_apr(household.cash_apr);

        let mut portfolio = Self {
            accounts: Vec::new(),
            index: FxHashMap::default(),
            income: household.income,
            expenses: household.expenses,
            income_growth: household.income_growth,
            expense_growth: household.expense_growth,
            age: household.age,
            phase: Phase::Accumulating,
            withdrawal_rate: DEFAULT_WITHDRAWAL_RATE,
            filing_status: household.filing_status,
            income_tax,
            payroll_tax,
            start_date: None,
            periods_elapsed: 0,
            carryover: TaxBase::default(),
            history: Vec::new(),
        };
        portfolio.insert(AccountKey::standard(), standard.into());

        for (key, account) in accounts {
            portfolio.add_account(key, account)?;
        }

        Ok(portfolio)
    }

    fn insert(&mut self, key: AccountKey, account: Account) {
        self.index.insert(key.clone(), self.accounts.len());
        self.accounts.push((key, account));
    }

    fn position(&self, key: &str) -> Result<usize> {
        self.index
            .get(key)
            .copied()
            .ok_or_else(|| LookupError::AccountNotFound(AccountKey::from(key)).into())
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    pub fn add_account(&mut self, key: impl Into<AccountKey>, account: Account) -> Result<()> {
        let key = key.into();
        if key.is_standard() {
            return Err(ConfigError::ReservedAccount(key).into());
        }
        if self.index.contains_key(&key) {
            return Err(ConfigError::DuplicateAccount(key).into());
        }

        tracing::info!(account = %key, balance = account.balance(), "Account added");
        self.insert(key, account);
        Ok(())
    }

    /// Detach an account. With `withdraw` set its balance is first moved into
    /// the standard account and the taxable part is taxed next period.
    pub fn remove_account(&mut self, key: &str, withdraw: bool) -> Result<Account> {
        if key == AccountKey::STANDARD {
            return Err(ConfigError::ReservedAccount(AccountKey::standard()).into());
        }
        let position = self.position(key)?;

        if withdraw {
            let account = &mut self.accounts[position].1;
            let balance = account.balance();
            let proceeds = account.take(balance);
            self.accounts[STANDARD].1.deposit(proceeds.gross);
            self.carryover.taxable_withdrawals += proceeds.taxable;
        }

        let (key, account) = self.accounts.remove(position);
        self.index = self
            .accounts
            .iter()
            .enumerate()
            .map(|(i, (k, _))| (k.clone(), i))
            .collect();

        tracing::info!(account = %key, withdrawn = withdraw, "Account removed");
        Ok(account)
    }

    pub fn set_withdrawal_rate(&mut self, rate: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&rate) {
            return Err(ConfigError::InvalidParameter {
                name: "withdrawal rate",
                value: rate,
            }
            .into());
        }
        self.withdrawal_rate = rate;
        Ok(())
    }

    /// Date the first period starts on; records then carry calendar dates
    pub fn set_start_date(&mut self, date: Date) {
        self.start_date = Some(date);
    }

    /// Stop earning and start drawing down; there is no way back
    pub fn retire(&mut self) {
        if self.phase == Phase::Retired {
            return;
        }
        tracing::info!(age = self.age, net_worth = self.net_worth(), "Retired");
        self.phase = Phase::Retired;
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn account(&self, key: &str) -> Result<&Account> {
        let position = self.position(key)?;
        Ok(&self.accounts[position].1)
    }

    pub fn account_mut(&mut self, key: &str) -> Result<&mut Account> {
        let position = self.position(key)?;
        Ok(&mut self.accounts[position].1)
    }

    pub fn standard(&self) -> &Account {
        &self.accounts[STANDARD].1
    }

    /// Accounts in insertion order, `standard` first
    pub fn accounts(&self) -> impl Iterator<Item = (&AccountKey, &Account)> {
        self.accounts.iter().map(|(k, a)| (k, a))
    }

    pub fn account_keys(&self) -> impl Iterator<Item = &AccountKey> {
        self.accounts.iter().map(|(k, _)| k)
    }

    pub fn income(&self) -> f64 {
        self.income
    }

    pub fn expenses(&self) -> f64 {
        self.expenses
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_retired(&self) -> bool {
        self.phase == Phase::Retired
    }

    pub fn withdrawal_rate(&self) -> f64 {
        self.withdrawal_rate
    }

    pub fn filing_status(&self) -> FilingStatus {
        self.filing_status
    }

    pub fn income_tax(&self) -> &CombinedTax {
        &self.income_tax
    }

    pub fn payroll_tax(&self) -> &TaxSchedule {
        &self.payroll_tax
    }

    pub fn history(&self) -> &[PeriodRecord] {
        &self.history
    }

    pub fn net_worth(&self) -> f64 {
        self.accounts.iter().map(|(_, a)| a.balance()).sum()
    }

    // =========================================================================
    // Direct account operations
    // =========================================================================

    /// Personal contribution into `key` from outside the portfolio.
    ///
    /// Without `amount` the account's own policy is applied to current income.
    pub fn contribute(
        &mut self,
        key: &str,
        sleeve: Option<Sleeve>,
        amount: Option<f64>,
    ) -> Result<Contribution> {
        let income = self.income;
        let position = self.position(key)?;
        let (key, account) = &mut self.accounts[position];
        account
            .contribute(sleeve, amount, income, Contributor::Individual)
            .map_err(|source| PortfolioError::Account {
                key: key.clone(),
                source,
            })
    }

    /// Take money out of `key`; the proceeds leave the portfolio and the
    /// taxable part is taxed at the next period step.
    pub fn withdraw(
        &mut self,
        key: &str,
        sleeve: Option<Sleeve>,
        amount: f64,
    ) -> Result<Withdrawal> {
        let position = self.position(key)?;
        let (key, account) = &mut self.accounts[position];
        account
            .withdraw(sleeve, amount)
            .map_err(|source| PortfolioError::Account {
                key: key.clone(),
                source,
            })
    }

    /// Contribute to every dedicated account, composite accounts through their
    /// routing sleeve
    pub fn contribute_to_all(&mut self, amount: Option<f64>) -> Result<Contribution> {
        let income = self.income;
        let mut total = Contribution::default();
        for (key, account) in &mut self.accounts[STANDARD + 1..] {
            let sleeve = account.routing();
            let contribution = account
                .contribute(sleeve, amount, income, Contributor::Individual)
                .map_err(|source| PortfolioError::Account {
                    key: key.clone(),
                    source,
                })?;
            total.accepted += contribution.accepted;
            total.overflow += contribution.overflow;
        }
        Ok(total)
    }

    /// Take up to `amount` from every dedicated account
    pub fn withdraw_from_all(&mut self, amount: f64) -> Withdrawal {
        let mut total = Withdrawal::default();
        for (_, account) in &mut self.accounts[STANDARD + 1..] {
            total += account.take(amount);
        }
        total
    }

    // =========================================================================
    // Simulation
    // =========================================================================

    /// Simulate `periods` years with every account growing at its own rate
    pub fn advance(&mut self, periods: u32) -> Result<()> {
        self.advance_with(periods, &mut FixedGrowth)
    }

    /// Simulate `periods` years with growth rates supplied by `growth`
    pub fn advance_with<G: GrowthSource + ?Sized>(
        &mut self,
        periods: u32,
        growth: &mut G,
    ) -> Result<()> {
        for _ in 0..periods {
            let record = self.step(growth)?;
            self.history.push(record);
        }
        Ok(())
    }

    fn step<G: GrowthSource + ?Sized>(&mut self, growth: &mut G) -> Result<PeriodRecord> {
        let retired = self.is_retired();
        if retired {
            self.income = 0.0;
        }
        let income = self.income;
        let expenses = self.expenses;
        let withdrawal_rate = self.withdrawal_rate;

        let mut base = std::mem::take(&mut self.carryover);
        base.earned_income += income;

        let mut contributions = 0.0;
        let mut employer_contributions = 0.0;
        let mut withdrawals = 0.0;

        let (head, rest) = self.accounts.split_at_mut(STANDARD + 1);
        let (standard_key, standard) = &mut head[STANDARD];

        standard.deposit(income);

        for (key, account) in rest.iter_mut() {
            if retired {
                let proceeds = account.withdraw_fraction(withdrawal_rate);
                standard.deposit(proceeds.gross);
                withdrawals += proceeds.gross;
            } else {
                let sleeve = account.routing();
                let wanted = account.personal_contribution(income);
                let funded = standard.take(wanted).gross;

                let personal = account
                    .contribute(sleeve, Some(funded), income, Contributor::Individual)
                    .map_err(|source| PortfolioError::Account {
                        key: key.clone(),
                        source,
                    })?;
                standard.deposit(personal.overflow);

                // Employer money always lands pre-tax
                let employer_sleeve = sleeve.map(|_| Sleeve::Traditional);
                let employer = account
                    .contribute(employer_sleeve, None, income, Contributor::Employer)
                    .map_err(|source| PortfolioError::Account {
                        key: key.clone(),
                        source,
                    })?;

                contributions += personal.accepted;
                employer_contributions += employer.accepted;
            }

            // Counters also include any direct operations since the last step
            base.deductible_contributions += account.deductible_contributions();
            base.taxable_withdrawals += account.taxable_withdrawals();

            let rate = growth.rate(key, account.apr());
            account.age_at(rate);
        }

        base.taxable_withdrawals += standard.taxable_withdrawals();
        let rate = growth.rate(standard_key, standard.apr());
        standard.age_at(rate);

        let mut shortfall = 0.0;
        let paid_expenses = standard.take(expenses).gross;
        shortfall += expenses - paid_expenses;

        self.expenses *= 1.0 + self.expense_growth;
        if !retired {
            self.income *= 1.0 + self.income_growth;
        }

        let taxes = TaxSummary {
            taxable_income: base.taxable_income(),
            income_tax: self.income_tax.tax_on(&base),
            payroll_tax: self.payroll_tax.tax(base.earned_income),
        };
        let paid_tax = standard.take(taxes.total()).gross;
        shortfall += taxes.total() - paid_tax;

        self.age += 1;
        self.periods_elapsed += 1;
        let date = self
            .start_date
            .map(|d| d.saturating_add((self.periods_elapsed as i64).years()));

        let net_worth = self.net_worth();
        if shortfall > 0.0 {
            tracing::warn!(
                age = self.age,
                shortfall,
                "Standard account could not cover expenses and tax"
            );
        }
        tracing::debug!(
            period = self.periods_elapsed - 1,
            age = self.age,
            income,
            tax = taxes.total(),
            net_worth,
            "Period complete"
        );

        Ok(PeriodRecord {
            period: self.periods_elapsed - 1,
            age: self.age,
            date,
            retired,
            income,
            expenses,
            contributions,
            employer_contributions,
            withdrawals,
            taxes,
            shortfall,
            net_worth,
        })
    }

    /// Empty every account and return the proceeds net of income tax on the
    /// taxable part.
    ///
    /// The tax also covers withdrawals and deductible contributions made since
    /// the last step. Those counters are settled here so the next `advance`
    /// does not tax them again.
    pub fn withdraw_all(&mut self) -> f64 {
        let mut base = std::mem::take(&mut self.carryover);
        let mut proceeds = 0.0;

        for (_, account) in &mut self.accounts {
            let mut passes = 0;
            while account.balance() > 0.0 && passes < MAX_DRAIN_PASSES {
                let balance = account.balance();
                proceeds += account.take(balance).gross;
                passes += 1;
            }

            base.deductible_contributions += account.deductible_contributions();
            base.taxable_withdrawals += account.taxable_withdrawals();
            account.settle_taxes();
        }

        let tax = self.income_tax.tax_on(&base);
        tracing::info!(proceeds, tax, "Portfolio liquidated");
        proceeds - tax
    }
}
