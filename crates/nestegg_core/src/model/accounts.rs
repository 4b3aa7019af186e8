//! Account definitions
//!
//! A [`Saver`] is a single balance with one tax treatment. A
//! [`CompositeAccount`] models a workplace plan that holds a traditional, a
//! Roth and an after-tax sleeve behind one shared elective limit. [`Account`]
//! wraps either and is what a portfolio stores.

use std::fmt;
use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use crate::error::AccountError;

/// Tax treatment for an account
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaxStatus {
    /// Cash-equivalent holding; income is taxed before it lands here
    Cash,
    /// Regular brokerage - gains taxed when withdrawn
    Taxable,
    /// 401k, Traditional IRA - contributions deductible, withdrawals taxed as income
    TaxDeferred,
    /// Roth IRA, Roth 401k - contributions post-tax, withdrawals tax-free
    TaxFree,
}

/// Sub-account of a [`CompositeAccount`]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Sleeve {
    Traditional,
    Roth,
    AfterTax,
}

impl Sleeve {
    pub const ALL: [Sleeve; 3] = [Sleeve::Traditional, Sleeve::Roth, Sleeve::AfterTax];

    /// Resolve a selector list to a single sleeve.
    ///
    /// Repeating the same sleeve is allowed; naming none or two different
    /// sleeves is an error.
    pub fn exactly_one(selected: &[Sleeve]) -> Result<Sleeve, AccountError> {
        let mut distinct: Vec<Sleeve> = Vec::with_capacity(selected.len());
        for sleeve in selected {
            if !distinct.contains(sleeve) {
                distinct.push(*sleeve);
            }
        }
        match distinct.as_slice() {
            [] => Err(AccountError::SleeveRequired),
            [only] => Ok(*only),
            _ => Err(AccountError::AmbiguousSleeve(distinct)),
        }
    }
}

impl fmt::Display for Sleeve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Sleeve::Traditional => "traditional",
            Sleeve::Roth => "roth",
            Sleeve::AfterTax => "after-tax",
        };
        f.write_str(name)
    }
}

/// Who is paying into an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Contributor {
    Individual,
    Employer,
}

/// Personal contribution rule: `base + income * rate`, limited per period by `cap`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ContributionPolicy {
    #[serde(default)]
    pub base: f64,
    #[serde(default)]
    pub rate: f64,
    #[serde(default)]
    pub cap: Option<f64>,
}

impl ContributionPolicy {
    pub fn amount_for(&self, income: f64) -> f64 {
        (self.base + income.max(0.0) * self.rate).max(0.0)
    }

    /// Room left under the cap after `used` has already gone in this period
    pub fn headroom(&self, used: f64) -> f64 {
        headroom(self.cap, used)
    }
}

/// Employer-funded contribution: a rate on income plus a match on the
/// employee's own contribution, limited per period by `cap`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployerMatch {
    #[serde(default)]
    pub income_rate: f64,
    #[serde(default)]
    pub match_rate: f64,
    #[serde(default)]
    pub cap: Option<f64>,
}

impl EmployerMatch {
    pub fn amount_for(&self, income: f64, individual: f64) -> f64 {
        (income.max(0.0) * self.income_rate + individual.max(0.0) * self.match_rate).max(0.0)
    }

    pub fn headroom(&self, used: f64) -> f64 {
        headroom(self.cap, used)
    }
}

fn headroom(cap: Option<f64>, used: f64) -> f64 {
    cap.map(|c| (c - used).max(0.0)).unwrap_or(f64::INFINITY)
}

/// Running totals for the current period, cleared by every aging step
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodActivity {
    pub individual: f64,
    pub employer: f64,
    pub deductible: f64,
    pub withdrawn: f64,
    pub taxable_withdrawals: f64,
}

/// Result of a contribution request
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub accepted: f64,
    /// Part of the request rejected by the cap
    pub overflow: f64,
}

impl Contribution {
    fn clamp(requested: f64, headroom: f64) -> Self {
        let requested = requested.max(0.0);
        let accepted = requested.min(headroom.max(0.0));
        Self {
            accepted,
            overflow: requested - accepted,
        }
    }
}

/// Result of a withdrawal
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Withdrawal {
    /// Amount removed from the account
    pub gross: f64,
    /// Portion of `gross` counted as income
    pub taxable: f64,
}

impl AddAssign for Withdrawal {
    fn add_assign(&mut self, rhs: Self) {
        self.gross += rhs.gross;
        self.taxable += rhs.taxable;
    }
}

/// A single balance with one tax treatment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Saver {
    pub tax_status: TaxStatus,
    /// Growth applied by each aging step
    pub apr: f64,
    pub contribution: ContributionPolicy,
    pub employer: Option<EmployerMatch>,
    balance: f64,
    net_contributions: f64,
    periods_held: u32,
    period: PeriodActivity,
}

impl Saver {
    /// Opening balance counts as already-contributed money
    pub fn new(tax_status: TaxStatus, balance: f64) -> Self {
        let balance = balance.max(0.0);
        Self {
            tax_status,
            apr: 0.0,
            contribution: ContributionPolicy::default(),
            employer: None,
            balance,
            net_contributions: balance,
            periods_held: 0,
            period: PeriodActivity::default(),
        }
    }

    #[must_use]
    pub fn with_apr(mut self, apr: f64) -> Self {
        self.apr = apr;
        self
    }

    #[must_use]
    pub fn with_contribution(mut self, policy: ContributionPolicy) -> Self {
        self.contribution = policy;
        self
    }

    #[must_use]
    pub fn with_employer_match(mut self, employer: EmployerMatch) -> Self {
        self.employer = Some(employer);
        self
    }

    /// Override the tracked cost basis, e.g. for a brokerage opened with gains
    #[must_use]
    pub fn with_net_contributions(mut self, net_contributions: f64) -> Self {
        self.net_contributions = net_contributions.max(0.0);
        self
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn net_contributions(&self) -> f64 {
        self.net_contributions
    }

    pub fn periods_held(&self) -> u32 {
        self.periods_held
    }

    pub fn period(&self) -> &PeriodActivity {
        &self.period
    }

    pub fn personal_contribution(&self, income: f64) -> f64 {
        self.contribution.amount_for(income)
    }

    /// Pay into the account.
    ///
    /// Without an explicit `amount` the request comes from the contribution
    /// policy (individual) or the employer match. Anything over the period cap
    /// is rejected and reported as overflow.
    pub fn contribute(
        &mut self,
        amount: Option<f64>,
        income: f64,
        contributor: Contributor,
    ) -> Contribution {
        let (requested, room) = match contributor {
            Contributor::Individual => (
                amount.unwrap_or_else(|| self.contribution.amount_for(income)),
                self.contribution.headroom(self.period.individual),
            ),
            Contributor::Employer => match self.employer {
                Some(employer) => (
                    amount.unwrap_or_else(|| employer.amount_for(income, self.period.individual)),
                    employer.headroom(self.period.employer),
                ),
                None => (amount.unwrap_or(0.0), f64::INFINITY),
            },
        };

        let contribution = Contribution::clamp(requested, room);
        self.credit(contribution.accepted, contributor);
        contribution
    }

    pub(crate) fn credit(&mut self, amount: f64, contributor: Contributor) {
        self.balance += amount;
        self.net_contributions += amount;
        match contributor {
            Contributor::Individual => {
                self.period.individual += amount;
                if self.tax_status == TaxStatus::TaxDeferred {
                    self.period.deductible += amount;
                }
            }
            Contributor::Employer => self.period.employer += amount,
        }
    }

    /// Add money that is neither capped nor deductible (income, transfers)
    pub fn deposit(&mut self, amount: f64) {
        let amount = amount.max(0.0);
        self.balance += amount;
        self.net_contributions += amount;
    }

    /// Take up to `amount` out; requests beyond the balance are clamped
    pub fn withdraw(&mut self, amount: f64) -> Withdrawal {
        let gross = amount.max(0.0).min(self.balance);
        let taxable = match self.tax_status {
            TaxStatus::Cash | TaxStatus::TaxFree => 0.0,
            TaxStatus::TaxDeferred => gross,
            TaxStatus::Taxable => gross * self.gains_fraction(),
        };

        self.balance = (self.balance - gross).max(0.0);
        self.period.withdrawn += gross;
        self.period.taxable_withdrawals += taxable;

        Withdrawal { gross, taxable }
    }

    /// Share of the balance that is growth rather than contributed money.
    ///
    /// Measured against lifetime net contributions, which withdrawals do not
    /// reduce. After a large drawdown this reports less gain than a cost-basis
    /// ledger would, and once the balance falls to the contributed total it
    /// reports none.
    pub fn gains_fraction(&self) -> f64 {
        if self.balance <= 0.0 {
            return 0.0;
        }
        ((self.balance - self.net_contributions) / self.balance).clamp(0.0, 1.0)
    }

    /// Advance one period at the account's own rate
    pub fn age(&mut self) {
        self.age_at(self.apr);
    }

    /// Advance one period at `rate`, then clear the period counters
    pub fn age_at(&mut self, rate: f64) {
        self.balance = (self.balance * (1.0 + rate)).max(0.0);
        self.periods_held += 1;
        self.period = PeriodActivity::default();
    }

    /// Zero the deductible and taxable counters once they have been taxed.
    /// Contribution counters are kept so period caps still hold.
    pub fn settle_taxes(&mut self) {
        self.period.deductible = 0.0;
        self.period.taxable_withdrawals = 0.0;
    }
}

/// Workplace plan with traditional, Roth and after-tax sleeves.
///
/// Personal contributions to the traditional and Roth sleeves share the
/// elective cap; `total_cap` bounds every source across all three sleeves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeAccount {
    pub elective: ContributionPolicy,
    pub employer: Option<EmployerMatch>,
    pub total_cap: Option<f64>,
    /// Sleeve that receives automatic personal contributions
    pub route: Sleeve,
    traditional: Saver,
    roth: Saver,
    after_tax: Saver,
}

impl CompositeAccount {
    pub fn new(apr: f64) -> Self {
        Self {
            elective: ContributionPolicy::default(),
            employer: None,
            total_cap: None,
            route: Sleeve::Traditional,
            traditional: Saver::new(TaxStatus::TaxDeferred, 0.0).with_apr(apr),
            roth: Saver::new(TaxStatus::TaxFree, 0.0).with_apr(apr),
            after_tax: Saver::new(TaxStatus::Taxable, 0.0).with_apr(apr),
        }
    }

    #[must_use]
    pub fn with_balances(mut self, traditional: f64, roth: f64, after_tax: f64) -> Self {
        let apr = self.traditional.apr;
        self.traditional = Saver::new(TaxStatus::TaxDeferred, traditional).with_apr(apr);
        self.roth = Saver::new(TaxStatus::TaxFree, roth).with_apr(apr);
        self.after_tax = Saver::new(TaxStatus::Taxable, after_tax).with_apr(apr);
        self
    }

    pub fn sleeve(&self, sleeve: Sleeve) -> &Saver {
        match sleeve {
            Sleeve::Traditional => &self.traditional,
            Sleeve::Roth => &self.roth,
            Sleeve::AfterTax => &self.after_tax,
        }
    }

    fn sleeve_mut(&mut self, sleeve: Sleeve) -> &mut Saver {
        match sleeve {
            Sleeve::Traditional => &mut self.traditional,
            Sleeve::Roth => &mut self.roth,
            Sleeve::AfterTax => &mut self.after_tax,
        }
    }

    fn sleeves(&self) -> [&Saver; 3] {
        [&self.traditional, &self.roth, &self.after_tax]
    }

    fn sleeves_mut(&mut self) -> [&mut Saver; 3] {
        [&mut self.traditional, &mut self.roth, &mut self.after_tax]
    }

    pub fn balance(&self) -> f64 {
        self.sleeves().iter().map(|s| s.balance()).sum()
    }

    pub fn net_contributions(&self) -> f64 {
        self.sleeves().iter().map(|s| s.net_contributions()).sum()
    }

    /// Period counters summed over every sleeve
    pub fn period(&self) -> PeriodActivity {
        self.sleeves()
            .iter()
            .fold(PeriodActivity::default(), |mut acc, s| {
                let p = s.period();
                acc.individual += p.individual;
                acc.employer += p.employer;
                acc.deductible += p.deductible;
                acc.withdrawn += p.withdrawn;
                acc.taxable_withdrawals += p.taxable_withdrawals;
                acc
            })
    }

    fn elective_used(&self) -> f64 {
        self.traditional.period().individual + self.roth.period().individual
    }

    fn total_headroom(&self) -> f64 {
        let period = self.period();
        headroom(self.total_cap, period.individual + period.employer)
    }

    pub fn contribute(
        &mut self,
        sleeve: Sleeve,
        amount: Option<f64>,
        income: f64,
        contributor: Contributor,
    ) -> Contribution {
        let total_room = self.total_headroom();
        let (requested, room) = match contributor {
            Contributor::Individual => {
                let requested = amount.unwrap_or_else(|| self.elective.amount_for(income));
                let room = match sleeve {
                    Sleeve::AfterTax => total_room,
                    Sleeve::Traditional | Sleeve::Roth => {
                        self.elective.headroom(self.elective_used()).min(total_room)
                    }
                };
                (requested, room)
            }
            Contributor::Employer => {
                let used = self.period().employer;
                match self.employer {
                    Some(employer) => (
                        amount.unwrap_or_else(|| employer.amount_for(income, self.elective_used())),
                        employer.headroom(used).min(total_room),
                    ),
                    None => (amount.unwrap_or(0.0), total_room),
                }
            }
        };

        let contribution = Contribution::clamp(requested, room);
        self.sleeve_mut(sleeve)
            .credit(contribution.accepted, contributor);
        contribution
    }

    pub fn withdraw(&mut self, sleeve: Sleeve, amount: f64) -> Withdrawal {
        self.sleeve_mut(sleeve).withdraw(amount)
    }

    /// Withdraw the same fraction of every sleeve
    pub fn withdraw_fraction(&mut self, fraction: f64) -> Withdrawal {
        let fraction = fraction.clamp(0.0, 1.0);
        let mut total = Withdrawal::default();
        for saver in self.sleeves_mut() {
            let amount = saver.balance() * fraction;
            total += saver.withdraw(amount);
        }
        total
    }

    pub fn age_at(&mut self, rate: f64) {
        for saver in self.sleeves_mut() {
            saver.age_at(rate);
        }
    }

    pub fn settle_taxes(&mut self) {
        for saver in self.sleeves_mut() {
            saver.settle_taxes();
        }
    }

    pub fn age(&mut self) {
        for saver in self.sleeves_mut() {
            saver.age();
        }
    }
}

/// Anything a portfolio can hold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Account {
    Saver(Saver),
    Composite(Box<CompositeAccount>),
}

impl From<Saver> for Account {
    fn from(saver: Saver) -> Self {
        Account::Saver(saver)
    }
}

impl From<CompositeAccount> for Account {
    fn from(composite: CompositeAccount) -> Self {
        Account::Composite(Box::new(composite))
    }
}

impl Account {
    pub fn balance(&self) -> f64 {
        match self {
            Account::Saver(s) => s.balance(),
            Account::Composite(c) => c.balance(),
        }
    }

    pub fn net_contributions(&self) -> f64 {
        match self {
            Account::Saver(s) => s.net_contributions(),
            Account::Composite(c) => c.net_contributions(),
        }
    }

    pub fn apr(&self) -> f64 {
        match self {
            Account::Saver(s) => s.apr,
            Account::Composite(c) => c.sleeve(Sleeve::Traditional).apr,
        }
    }

    /// `None` for composite accounts, whose sleeves differ
    pub fn tax_status(&self) -> Option<TaxStatus> {
        match self {
            Account::Saver(s) => Some(s.tax_status),
            Account::Composite(_) => None,
        }
    }

    /// Sleeve that automatic contributions go to, if the account has sleeves
    pub fn routing(&self) -> Option<Sleeve> {
        match self {
            Account::Saver(_) => None,
            Account::Composite(c) => Some(c.route),
        }
    }

    pub fn period(&self) -> PeriodActivity {
        match self {
            Account::Saver(s) => *s.period(),
            Account::Composite(c) => c.period(),
        }
    }

    pub fn deductible_contributions(&self) -> f64 {
        self.period().deductible
    }

    pub fn taxable_withdrawals(&self) -> f64 {
        self.period().taxable_withdrawals
    }

    pub fn personal_contribution(&self, income: f64) -> f64 {
        match self {
            Account::Saver(s) => s.personal_contribution(income),
            Account::Composite(c) => c.elective.amount_for(income),
        }
    }

    pub fn contribute(
        &mut self,
        sleeve: Option<Sleeve>,
        amount: Option<f64>,
        income: f64,
        contributor: Contributor,
    ) -> Result<Contribution, AccountError> {
        match (self, sleeve) {
            (Account::Saver(s), None) => Ok(s.contribute(amount, income, contributor)),
            (Account::Saver(_), Some(sleeve)) => Err(AccountError::SleeveNotSupported(sleeve)),
            (Account::Composite(c), Some(sleeve)) => {
                Ok(c.contribute(sleeve, amount, income, contributor))
            }
            (Account::Composite(_), None) => Err(AccountError::SleeveRequired),
        }
    }

    pub fn withdraw(
        &mut self,
        sleeve: Option<Sleeve>,
        amount: f64,
    ) -> Result<Withdrawal, AccountError> {
        match (self, sleeve) {
            (Account::Saver(s), None) => Ok(s.withdraw(amount)),
            (Account::Saver(_), Some(sleeve)) => Err(AccountError::SleeveNotSupported(sleeve)),
            (Account::Composite(c), Some(sleeve)) => Ok(c.withdraw(sleeve, amount)),
            (Account::Composite(_), None) => Err(AccountError::SleeveRequired),
        }
    }

    /// Withdraw `amount` without choosing a sleeve; composite accounts give up
    /// the same share of each sleeve.
    pub fn take(&mut self, amount: f64) -> Withdrawal {
        match self {
            Account::Saver(s) => s.withdraw(amount),
            Account::Composite(c) => {
                let balance = c.balance();
                if balance <= 0.0 {
                    return Withdrawal::default();
                }
                c.withdraw_fraction(amount.max(0.0) / balance)
            }
        }
    }

    pub fn withdraw_fraction(&mut self, fraction: f64) -> Withdrawal {
        match self {
            Account::Saver(s) => {
                let amount = s.balance() * fraction.clamp(0.0, 1.0);
                s.withdraw(amount)
            }
            Account::Composite(c) => c.withdraw_fraction(fraction),
        }
    }

    /// Add uncapped money; composite accounts take it into the after-tax sleeve
    pub fn deposit(&mut self, amount: f64) {
        match self {
            Account::Saver(s) => s.deposit(amount),
            Account::Composite(c) => c.sleeve_mut(Sleeve::AfterTax).deposit(amount),
        }
    }

    pub fn age(&mut self) {
        match self {
            Account::Saver(s) => s.age(),
            Account::Composite(c) => c.age(),
        }
    }

    pub fn age_at(&mut self, rate: f64) {
        match self {
            Account::Saver(s) => s.age_at(rate),
            Account::Composite(c) => c.age_at(rate),
        }
    }

    pub fn settle_taxes(&mut self) {
        match self {
            Account::Saver(s) => s.settle_taxes(),
            Account::Composite(c) => c.settle_taxes(),
        }
    }
}
