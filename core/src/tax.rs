//! Sell tax arithmetic
//!
//! Both the on-ledger program and the group builders derive the split from
//! here, so the two sides always agree to the base unit.

use crate::constants::DEFAULT_TAX_RATE_PERCENT;
use crate::error::{CoreError, Result};
use crate::types::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whole-percent tax rate, fixed for the life of a program instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct TaxRate(u8);

impl TaxRate {
    pub fn new(percent: u8) -> Result<Self> {
        if percent > 100 {
            return Err(CoreError::InvalidRate(percent));
        }
        Ok(Self(percent))
    }

    pub fn percent(&self) -> u8 {
        self.0
    }

    /// Split a gross amount into net and tax
    pub fn split(&self, amount: Amount) -> TaxSplit {
        TaxSplit::compute(amount, *self)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        Self(DEFAULT_TAX_RATE_PERCENT)
    }
}

impl TryFrom<u8> for TaxRate {
    type Error = CoreError;

    fn try_from(percent: u8) -> Result<Self> {
        Self::new(percent)
    }
}

impl From<TaxRate> for u8 {
    fn from(rate: TaxRate) -> u8 {
        rate.0
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// `net + tax == amount`, `tax == floor(amount * rate / 100)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSplit {
    pub net: Amount,
    pub tax: Amount,
}

impl TaxSplit {
    pub fn compute(amount: Amount, rate: TaxRate) -> Self {
        // u128 keeps amount * 100 exact; rate <= 100 bounds tax by amount
        let tax = (amount as u128 * rate.0 as u128 / 100) as Amount;
        Self {
            net: amount - tax,
            tax,
        }
    }

    pub fn gross(&self) -> Amount {
        self.net + self.tax
    }
}
