mod accounts;
mod ids;
mod market;
mod records;
mod tax_config;

pub use accounts::{
    Account, CompositeAccount, Contribution, ContributionPolicy, Contributor, EmployerMatch,
    PeriodActivity, Saver, Sleeve, TaxStatus, Withdrawal,
};
pub use ids::AccountKey;
pub use market::{FixedGrowth, GrowthSource, ReturnProfile, SampledGrowth};
pub use records::PeriodRecord;
pub use tax_config::{FilingStatus, TaxBase, TaxBracket, TaxSummary};
