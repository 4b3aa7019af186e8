use thiserror::Error;

use crate::model::{AccountKey, Sleeve};

/// Errors related to resource lookups
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupError {
    #[error("account '{0}' not found")]
    AccountNotFound(AccountKey),
}

/// Errors raised while assembling a portfolio or a tax schedule
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error(
        "account '{0}' already exists; use a different name or remove the existing account first"
    )]
    DuplicateAccount(AccountKey),
    #[error("account '{0}' is reserved and cannot be added or removed")]
    ReservedAccount(AccountKey),
    #[error("tax schedule has no brackets")]
    EmptyBrackets,
    #[error("bracket {index} threshold {threshold} does not exceed the previous threshold {previous}")]
    NonIncreasingThreshold {
        index: usize,
        previous: f64,
        threshold: f64,
    },
    #[error("last bracket must be unbounded, found threshold {0}")]
    BoundedFinalBracket(f64),
    #[error("bracket {index} has invalid rate {rate}")]
    InvalidRate { index: usize, rate: f64 },
    #[error("invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error("invalid date {year}-{month:02}-{day:02}")]
    InvalidDate { year: i16, month: i8, day: i8 },
    #[error(transparent)]
    Account(#[from] AccountError),
}

/// Errors from routing an operation to the wrong part of an account
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    #[error("composite account requires a target sleeve")]
    SleeveRequired,
    #[error("exactly one sleeve must be selected, got {0:?}")]
    AmbiguousSleeve(Vec<Sleeve>),
    #[error("{0} sleeve selected on an account without sleeves")]
    SleeveNotSupported(Sleeve),
}

/// Errors related to return sampling
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarketError {
    #[error("invalid {profile_type} parameters (mean={mean}, std_dev={std_dev}): {reason}")]
    InvalidDistributionParameters {
        profile_type: &'static str,
        mean: f64,
        std_dev: f64,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PortfolioError {
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("account '{key}': {source}")]
    Account {
        key: AccountKey,
        #[source]
        source: AccountError,
    },
    #[error(transparent)]
    Market(#[from] MarketError),
}

pub type Result<T> = std::result::Result<T, PortfolioError>;
