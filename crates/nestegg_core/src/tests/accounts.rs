//! Tests for single-balance accounts

use crate::error::AccountError;
use crate::model::{
    Account, ContributionPolicy, Contributor, EmployerMatch, Saver, Sleeve, TaxStatus,
};

fn capped(cap: f64) -> Saver {
    Saver::new(TaxStatus::TaxDeferred, 0.0).with_contribution(ContributionPolicy {
        base: 0.0,
        rate: 0.1,
        cap: Some(cap),
    })
}

#[test]
fn test_policy_amount_from_income() {
    let policy = ContributionPolicy {
        base: 500.0,
        rate: 0.05,
        cap: None,
    };
    assert!((policy.amount_for(100_000.0) - 5_500.0).abs() < 0.01);
    assert!((policy.amount_for(-10.0) - 500.0).abs() < 0.01);
}

#[test]
fn test_contribution_cap_reports_overflow() {
    let mut ira = capped(6_000.0);

    let first = ira.contribute(Some(5_000.0), 0.0, Contributor::Individual);
    assert_eq!(first.accepted, 5_000.0);
    assert_eq!(first.overflow, 0.0);

    let second = ira.contribute(Some(2_000.0), 0.0, Contributor::Individual);
    assert_eq!(second.accepted, 1_000.0);
    assert_eq!(second.overflow, 1_000.0);

    assert_eq!(ira.balance(), 6_000.0);
    assert_eq!(ira.period().individual, 6_000.0);
    assert_eq!(ira.period().deductible, 6_000.0);
}

#[test]
fn test_cap_resets_after_aging() {
    let mut ira = capped(6_000.0);
    ira.contribute(Some(6_000.0), 0.0, Contributor::Individual);
    ira.age();

    assert_eq!(ira.period().individual, 0.0);
    assert_eq!(ira.periods_held(), 1);

    let again = ira.contribute(Some(6_000.0), 0.0, Contributor::Individual);
    assert_eq!(again.accepted, 6_000.0);
}

#[test]
fn test_policy_contribution_from_income() {
    let mut ira = capped(6_000.0);
    // 10% of 40k is under the cap
    let contribution = ira.contribute(None, 40_000.0, Contributor::Individual);
    assert!((contribution.accepted - 4_000.0).abs() < 0.01);

    // 10% of 100k is clamped to what is left
    let contribution = ira.contribute(None, 100_000.0, Contributor::Individual);
    assert!((contribution.accepted - 2_000.0).abs() < 0.01);
    assert!((contribution.overflow - 8_000.0).abs() < 0.01);
}

#[test]
fn test_employer_match_capped_separately() {
    let mut plan = capped(10_000.0).with_employer_match(EmployerMatch {
        income_rate: 0.0,
        match_rate: 1.0,
        cap: Some(3_000.0),
    });

    plan.contribute(Some(5_000.0), 0.0, Contributor::Individual);
    let employer = plan.contribute(None, 100_000.0, Contributor::Employer);

    assert_eq!(employer.accepted, 3_000.0);
    assert_eq!(employer.overflow, 2_000.0);
    assert_eq!(plan.period().employer, 3_000.0);
    // Employer money is never deductible for the household
    assert_eq!(plan.period().deductible, 5_000.0);
    assert_eq!(plan.balance(), 8_000.0);
}

#[test]
fn test_withdrawal_clamped_to_balance() {
    let mut savings = Saver::new(TaxStatus::Cash, 1_000.0);
    let withdrawal = savings.withdraw(2_500.0);

    assert_eq!(withdrawal.gross, 1_000.0);
    assert_eq!(withdrawal.taxable, 0.0);
    assert_eq!(savings.balance(), 0.0);

    let nothing = savings.withdraw(100.0);
    assert_eq!(nothing.gross, 0.0);
}

#[test]
fn test_taxable_withdrawal_by_status() {
    let mut deferred = Saver::new(TaxStatus::TaxDeferred, 10_000.0);
    assert_eq!(deferred.withdraw(4_000.0).taxable, 4_000.0);

    let mut roth = Saver::new(TaxStatus::TaxFree, 10_000.0);
    assert_eq!(roth.withdraw(4_000.0).taxable, 0.0);

    // 6k of the 10k balance is growth
    let mut brokerage = Saver::new(TaxStatus::Taxable, 10_000.0).with_net_contributions(4_000.0);
    assert!((brokerage.gains_fraction() - 0.6).abs() < 1e-9);
    let withdrawal = brokerage.withdraw(5_000.0);
    assert!((withdrawal.taxable - 3_000.0).abs() < 0.01);
    assert!((brokerage.period().taxable_withdrawals - 3_000.0).abs() < 0.01);
}

#[test]
fn test_withdrawals_leave_net_contributions_in_place() {
    let mut brokerage = Saver::new(TaxStatus::Taxable, 10_000.0).with_net_contributions(4_000.0);
    assert!((brokerage.withdraw(5_000.0).taxable - 3_000.0).abs() < 0.01);
    assert_eq!(brokerage.net_contributions(), 4_000.0);

    // 1k of the remaining 5k is measured as gain
    assert!((brokerage.gains_fraction() - 0.2).abs() < 1e-9);
    assert!((brokerage.withdraw(5_000.0).taxable - 1_000.0).abs() < 0.01);
    assert_eq!(brokerage.balance(), 0.0);
    assert_eq!(brokerage.gains_fraction(), 0.0);
}

#[test]
fn test_growth_creates_gains() {
    let mut brokerage = Saver::new(TaxStatus::Taxable, 10_000.0).with_apr(0.10);
    assert_eq!(brokerage.gains_fraction(), 0.0);

    brokerage.age();
    assert!((brokerage.balance() - 11_000.0).abs() < 0.01);
    assert_eq!(brokerage.net_contributions(), 10_000.0);
    assert!((brokerage.gains_fraction() - 1_000.0 / 11_000.0).abs() < 1e-9);
}

#[test]
fn test_aging_clears_withdrawal_counters() {
    let mut ira = Saver::new(TaxStatus::TaxDeferred, 10_000.0).with_apr(0.05);
    ira.withdraw(1_000.0);
    assert_eq!(ira.period().taxable_withdrawals, 1_000.0);

    ira.age();
    assert!((ira.balance() - 9_450.0).abs() < 0.01);
    assert_eq!(ira.period().taxable_withdrawals, 0.0);
    assert_eq!(ira.period().withdrawn, 0.0);
}

#[test]
fn test_account_rejects_sleeve_on_plain_account() {
    let mut account = Account::from(Saver::new(TaxStatus::Taxable, 100.0));
    let err = account
        .contribute(Some(Sleeve::Roth), Some(10.0), 0.0, Contributor::Individual)
        .unwrap_err();
    assert_eq!(err, AccountError::SleeveNotSupported(Sleeve::Roth));

    let err = account.withdraw(Some(Sleeve::AfterTax), 10.0).unwrap_err();
    assert_eq!(err, AccountError::SleeveNotSupported(Sleeve::AfterTax));

    assert_eq!(account.balance(), 100.0);
}

#[test]
fn test_withdraw_fraction() {
    let mut account = Account::from(Saver::new(TaxStatus::TaxFree, 50_000.0));
    let withdrawal = account.withdraw_fraction(0.04);
    assert!((withdrawal.gross - 2_000.0).abs() < 0.01);
    assert!((account.balance() - 48_000.0).abs() < 0.01);
}
