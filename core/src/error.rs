//! Core error types

use crate::types::Address;
use dumbly_crypto::CryptoError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid tax rate: {0}% (must be 0-100)")]
    InvalidRate(u8),

    #[error("Transaction group is empty")]
    EmptyGroup,

    #[error("Transaction group has {0} members, limit is {limit}", limit = crate::MAX_GROUP_SIZE)]
    GroupTooLarge(usize),

    #[error("No credential supplied for sender {0}")]
    MissingSigner(Address),

    #[error("Invalid group: {0}")]
    InvalidGroup(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
