//! Ledger identifiers and account roles

use crate::error::{CoreError, Result};
use dumbly_crypto::KeyPair;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Base units of the taxed asset
pub type Amount = u64;

pub type AssetId = u64;

/// Identifier of a deployed program
pub type ProgramId = u64;

/// Ledger transaction id (hex sha256)
pub type TxId = String;

/// Atomic group id (hex sha256)
pub type GroupId = String;

/// Ledger-addressable account
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn parse(value: &str) -> Result<Self> {
        dumbly_crypto::address_to_public_key(value)
            .map_err(|_| CoreError::InvalidAddress(value.to_string()))?;
        Ok(Self(value.to_string()))
    }

    pub fn of(keypair: &KeyPair) -> Self {
        Self(keypair.address())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Role an account plays towards the taxed asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    /// Tax sink and distribution source
    Treasury,
    Burn,
    Lp,
    Rewards,
    /// Designated sell destination (pool or market maker)
    Market,
    /// Ordinary holder
    Participant,
}

impl AccountRole {
    /// Burn, lp and rewards receive treasury distributions
    pub fn is_distribution_sink(&self) -> bool {
        matches!(self, AccountRole::Burn | AccountRole::Lp | AccountRole::Rewards)
    }
}

/// A request to move `amount` of `asset_id` from `sender` to `receiver`.
///
/// Lives only while a transaction group is being built or evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferIntent {
    pub sender: Address,
    pub receiver: Address,
    pub asset_id: AssetId,
    pub amount: Amount,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_parse() {
        let keypair = KeyPair::generate();
        let address = Address::parse(&keypair.address()).unwrap();
        assert_eq!(address, Address::of(&keypair));
        assert_eq!(address.to_string(), keypair.address());
    }

    #[test]
    fn test_address_parse_rejects_garbage() {
        assert!(matches!(
            Address::parse("treasury"),
            Err(CoreError::InvalidAddress(_))
        ));
        assert!("".parse::<Address>().is_err());
    }

    #[test]
    fn test_role_sinks() {
        assert!(AccountRole::Burn.is_distribution_sink());
        assert!(AccountRole::Lp.is_distribution_sink());
        assert!(AccountRole::Rewards.is_distribution_sink());
        assert!(!AccountRole::Treasury.is_distribution_sink());
        assert!(!AccountRole::Market.is_distribution_sink());
    }

    #[test]
    fn test_role_serde() {
        assert_eq!(serde_json::to_string(&AccountRole::Lp).unwrap(), "\"lp\"");
    }
}
