//! Program rejection reasons
//!
//! Every error here rejects the whole group. Nothing is retried on the
//! ledger side; the submitter rebuilds the group and tries again.

use dumbly_core::{Address, Amount, AssetId, CoreError, ProgramId};
use thiserror::Error;

/// Malformed transfer intent
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassificationError {
    #[error("Transfer moves asset {found}, program taxes asset {expected}")]
    ForeignAsset { expected: AssetId, found: AssetId },
}

/// The tax leg of a taxable group is absent or wrong
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaxMismatch {
    #[error("Tax leg of {expected} missing from group")]
    MissingTaxLeg { expected: Amount },

    #[error("Net leg delivers {found}, expected {expected}")]
    NetAmount { expected: Amount, found: Amount },

    #[error("Tax leg carries {found}, expected {expected}")]
    TaxAmount { expected: Amount, found: Amount },

    #[error("Tax leg pays {found} instead of the treasury")]
    WrongRecipient { found: Address },

    #[error("Tax leg paid by {found}, seller is {expected}")]
    WrongPayer { expected: Address, found: Address },

    #[error("Tax leg moves asset {found}, expected {expected}")]
    WrongAsset { expected: AssetId, found: AssetId },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProgramError {
    #[error("Program has not been set up")]
    NotInitialized,

    #[error("Program is already set up")]
    AlreadyInitialized,

    #[error("Invalid setup: {0}")]
    InvalidSetup(String),

    #[error("Malformed group: {0}")]
    MalformedGroup(String),

    #[error("Taxable transfer without a call to tax program {0}")]
    MissingCall(ProgramId),

    #[error("Classification failed: {0}")]
    Classification(#[from] ClassificationError),

    #[error("Tax mismatch: {0}")]
    TaxMismatch(#[from] TaxMismatch),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type ProgramResult<T> = std::result::Result<T, ProgramError>;
