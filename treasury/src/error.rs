//! Treasury error types

use dumbly_core::{AccountRole, Address, Amount, CoreError, GroupId, LedgerError, TxId};
use serde::Serialize;
use thiserror::Error;

/// Planning errors; no ledger interaction has happened
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("Nothing to distribute")]
    NothingToDistribute,

    #[error("Insufficient treasury balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: Amount, available: Amount },

    #[error("Requested amounts overflow")]
    Overflow,
}

pub type PlanResult<T> = std::result::Result<T, PlanError>;

/// What a caller may assume about the ledger after a settlement attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementOutcome {
    Succeeded,
    /// Nothing was committed
    Failed,
    /// The group may or may not have committed; re-read treasury state first
    Unknown,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettlementError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("Treasury balance {available} no longer covers plan total {requested}")]
    InsufficientBalance { requested: Amount, available: Amount },

    #[error("{role:?} account {address} is not opted in to the asset")]
    NotOptedIn { role: AccountRole, address: Address },

    #[error("Invalid settlement configuration: {0}")]
    InvalidConfig(String),

    #[error("Ledger unavailable: {0}")]
    LedgerUnavailable(String),

    #[error("Ledger rejected settlement group: {0}")]
    Rejected(String),

    #[error("Settlement {tx_id} (group {group_id}) unconfirmed: {reason}; re-query treasury state before retrying")]
    ConfirmationTimeout {
        tx_id: TxId,
        group_id: GroupId,
        reason: String,
    },

    #[error("Failed to build settlement group: {0}")]
    Build(#[from] CoreError),
}

impl SettlementError {
    pub fn outcome(&self) -> SettlementOutcome {
        match self {
            SettlementError::ConfirmationTimeout { .. } => SettlementOutcome::Unknown,
            _ => SettlementOutcome::Failed,
        }
    }

    /// Only read failures before submission are safe to retry blindly
    pub fn is_retryable(&self) -> bool {
        matches!(self, SettlementError::LedgerUnavailable(_))
    }
}

/// Ledger failures while nothing has been submitted yet
impl From<LedgerError> for SettlementError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Unavailable(msg) | LedgerError::Malformed(msg) => {
                SettlementError::LedgerUnavailable(msg)
            }
            LedgerError::Rejected(msg) => SettlementError::Rejected(msg),
        }
    }
}

pub type SettlementResult<T> = std::result::Result<T, SettlementError>;
