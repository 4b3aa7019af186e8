//! Growth-rate sources
//!
//! Accounts carry a fixed `apr`. A [`GrowthSource`] decides what rate is
//! actually applied at each aging step, which lets the same portfolio loop run
//! deterministically or under sampled returns.

use rand::Rng;
use rand_distr::Distribution;
use serde::{Deserialize, Serialize};

use crate::error::MarketError;
use crate::model::AccountKey;

/// Distribution of annual returns around an account's own `apr`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReturnProfile {
    /// Always the account's `apr`
    #[default]
    Fixed,
    /// Normal with mean `apr`
    Normal { std_dev: f64 },
    /// Log-normal growth factor whose median is `1 + apr`
    LogNormal { std_dev: f64 },
}

impl ReturnProfile {
    /// Check parameters once so sampling never fails mid-run
    pub fn validate(&self) -> Result<(), MarketError> {
        match *self {
            ReturnProfile::Fixed => Ok(()),
            ReturnProfile::Normal { std_dev } => {
                if std_dev.is_finite() && std_dev >= 0.0 {
                    Ok(())
                } else {
                    Err(MarketError::InvalidDistributionParameters {
                        profile_type: "Normal return",
                        mean: 0.0,
                        std_dev,
                        reason: "std_dev must be non-negative and finite",
                    })
                }
            }
            ReturnProfile::LogNormal { std_dev } => {
                if std_dev.is_finite() && std_dev >= 0.0 {
                    Ok(())
                } else {
                    Err(MarketError::InvalidDistributionParameters {
                        profile_type: "LogNormal return",
                        mean: 0.0,
                        std_dev,
                        reason: "std_dev must be non-negative and finite",
                    })
                }
            }
        }
    }

    /// Sample one period's return for an account growing at `apr`
    pub fn sample<R: Rng + ?Sized>(&self, apr: f64, rng: &mut R) -> Result<f64, MarketError> {
        match *self {
            ReturnProfile::Fixed => Ok(apr),
            ReturnProfile::Normal { std_dev } => rand_distr::Normal::new(apr, std_dev)
                .map(|d| d.sample(rng).max(-1.0))
                .map_err(|_| MarketError::InvalidDistributionParameters {
                    profile_type: "Normal return",
                    mean: apr,
                    std_dev,
                    reason: "std_dev must be non-negative and finite",
                }),
            ReturnProfile::LogNormal { std_dev } => {
                let mu = (1.0 + apr).max(f64::MIN_POSITIVE).ln();
                rand_distr::LogNormal::new(mu, std_dev)
                    .map(|d| d.sample(rng) - 1.0)
                    .map_err(|_| MarketError::InvalidDistributionParameters {
                        profile_type: "LogNormal return",
                        mean: apr,
                        std_dev,
                        reason: "std_dev must be non-negative and finite",
                    })
            }
        }
    }
}

/// Supplies the growth rate applied to an account at an aging step
pub trait GrowthSource {
    fn rate(&mut self, key: &AccountKey, apr: f64) -> f64;
}

/// Every account grows at exactly its `apr`
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedGrowth;

impl GrowthSource for FixedGrowth {
    fn rate(&mut self, _key: &AccountKey, apr: f64) -> f64 {
        apr
    }
}

/// Draws each account's rate from a [`ReturnProfile`].
///
/// The profile must have passed [`ReturnProfile::validate`]; the account's
/// `apr` is used if sampling fails anyway.
#[derive(Debug, Clone)]
pub struct SampledGrowth<R> {
    profile: ReturnProfile,
    rng: R,
}

impl<R: Rng> SampledGrowth<R> {
    pub fn new(profile: ReturnProfile, rng: R) -> Self {
        Self { profile, rng }
    }
}

impl<R: Rng> GrowthSource for SampledGrowth<R> {
    fn rate(&mut self, _key: &AccountKey, apr: f64) -> f64 {
        self.profile.sample(apr, &mut self.rng).unwrap_or(apr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn test_fixed_profile_returns_apr() {
        let mut rng = SmallRng::seed_from_u64(7);
        assert_eq!(ReturnProfile::Fixed.sample(0.05, &mut rng), Ok(0.05));
    }

    #[test]
    fn test_zero_volatility_matches_apr() {
        let mut rng = SmallRng::seed_from_u64(7);
        let normal = ReturnProfile::Normal { std_dev: 0.0 };
        assert!((normal.sample(0.05, &mut rng).unwrap() - 0.05).abs() < 1e-12);

        let log_normal = ReturnProfile::LogNormal { std_dev: 0.0 };
        assert!((log_normal.sample(0.05, &mut rng).unwrap() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_sampled_returns_stay_above_total_loss() {
        let mut source = SampledGrowth::new(
            ReturnProfile::Normal { std_dev: 2.0 },
            SmallRng::seed_from_u64(11),
        );
        let key = AccountKey::from("brokerage");
        for _ in 0..1_000 {
            assert!(source.rate(&key, 0.07) >= -1.0);
        }
    }

    #[test]
    fn test_validate_rejects_bad_std_dev() {
        assert!(ReturnProfile::Normal { std_dev: -0.1 }.validate().is_err());
        assert!(
            ReturnProfile::LogNormal {
                std_dev: f64::NAN
            }
            .validate()
            .is_err()
        );
        assert!(ReturnProfile::Normal { std_dev: 0.15 }.validate().is_ok());
    }
}
