//! Identifiers for portfolio entities

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of an account within a portfolio
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountKey(String);

impl AccountKey {
    /// Key of the always-present cash account that absorbs income, expenses and tax
    pub const STANDARD: &'static str = "standard";

    #[must_use]
    pub fn standard() -> Self {
        Self(Self::STANDARD.to_string())
    }

    pub fn is_standard(&self) -> bool {
        self.0 == Self::STANDARD
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for AccountKey {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for AccountKey {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl Borrow<str> for AccountKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}
