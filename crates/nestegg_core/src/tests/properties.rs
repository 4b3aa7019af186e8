//! Property tests for account invariants

use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

use crate::model::{
    Account, CompositeAccount, ContributionPolicy, Contributor, Saver, Sleeve, TaxStatus,
};

fn status(index: u8) -> TaxStatus {
    match index % 4 {
        0 => TaxStatus::Cash,
        1 => TaxStatus::Taxable,
        2 => TaxStatus::TaxDeferred,
        _ => TaxStatus::TaxFree,
    }
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(64))]

    #[test]
    fn prop_withdrawal_clamped(
        kind in 0u8..4,
        balance in 0.0f64..1_000_000.0,
        amount in 0.0f64..2_000_000.0,
    ) {
        let mut saver = Saver::new(status(kind), balance);
        let withdrawal = saver.withdraw(amount);

        prop_assert!(withdrawal.gross <= balance);
        prop_assert!(withdrawal.taxable <= withdrawal.gross + 1e-9);
        prop_assert!(saver.balance() >= 0.0);
        let expected = (balance - amount.min(balance)).max(0.0);
        prop_assert!((saver.balance() - expected).abs() < 1e-6);
    }

    #[test]
    fn prop_aging_compounds_and_resets(
        balance in 0.0f64..1_000_000.0,
        rate in -0.5f64..0.5,
        deposit in 0.0f64..10_000.0,
    ) {
        let mut saver = Saver::new(TaxStatus::TaxDeferred, balance).with_apr(rate);
        saver.contribute(Some(deposit), 0.0, Contributor::Individual);
        saver.withdraw(deposit / 2.0);
        let before = saver.balance();
        saver.age();

        prop_assert!((saver.balance() - before * (1.0 + rate)).abs() < 1e-6);
        prop_assert_eq!(saver.period().individual, 0.0);
        prop_assert_eq!(saver.period().deductible, 0.0);
        prop_assert_eq!(saver.period().taxable_withdrawals, 0.0);
    }

    #[test]
    fn prop_contribution_never_exceeds_cap(
        cap in 0.0f64..20_000.0,
        requests in proptest::collection::vec(0.0f64..10_000.0, 1..8),
    ) {
        let mut saver = Saver::new(TaxStatus::TaxFree, 0.0).with_contribution(ContributionPolicy {
            base: 0.0,
            rate: 0.0,
            cap: Some(cap),
        });
        for request in requests {
            let net_before = saver.net_contributions();
            let used_before = saver.period().individual;
            let contribution = saver.contribute(Some(request), 0.0, Contributor::Individual);

            let added = saver.net_contributions() - net_before;
            prop_assert!(added <= cap - used_before + 1e-6);
            prop_assert!((contribution.accepted + contribution.overflow - request).abs() < 1e-6);
        }
        prop_assert!(saver.period().individual <= cap + 1e-6);
    }

    #[test]
    fn prop_composite_balance_is_sum_of_sleeves(
        traditional in 0.0f64..100_000.0,
        roth in 0.0f64..100_000.0,
        after_tax in 0.0f64..100_000.0,
        fraction in 0.0f64..1.0,
    ) {
        let mut account = Account::from(
            CompositeAccount::new(0.05).with_balances(traditional, roth, after_tax),
        );
        let total = traditional + roth + after_tax;
        prop_assert!((account.balance() - total).abs() < 1e-6);

        let withdrawal = account.withdraw_fraction(fraction);
        prop_assert!((withdrawal.gross - total * fraction).abs() < 1e-6);

        let Account::Composite(plan) = &account else {
            unreachable!();
        };
        let sleeves: f64 = Sleeve::ALL.iter().map(|s| plan.sleeve(*s).balance()).sum();
        prop_assert!((account.balance() - sleeves).abs() < 1e-6);
    }
}
