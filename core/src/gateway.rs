//! Ledger Gateway
//!
//! The only seam between this system and the external ledger node.
//! Implementations must bound every call; callers never hold a lock
//! across these awaits.

use crate::transaction::SignedGroup;
use crate::types::{Address, Amount, AssetId, TxId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Node unreachable, timed out or failing; retry with backoff
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    /// The ledger refused the group; nothing was committed
    #[error("Group rejected by ledger: {0}")]
    Rejected(String),

    #[error("Unexpected ledger response: {0}")]
    Malformed(String),
}

impl LedgerError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Unavailable(_))
    }
}

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Result of waiting on a submitted group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confirmation {
    Confirmed { round: u64 },
    /// Not observed within the round budget; the group may still have committed
    TimedOut { rounds_waited: u64 },
}

#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Asset balance of an account, zero when not opted in
    async fn account_balance(&self, address: &Address, asset_id: AssetId) -> LedgerResult<Amount>;

    async fn is_opted_in(&self, address: &Address, asset_id: AssetId) -> LedgerResult<bool>;

    /// Submit a signed atomic group, returning the id of its first member
    async fn submit_group(&self, group: &SignedGroup) -> LedgerResult<TxId>;

    async fn wait_for_confirmation(&self, tx_id: &TxId, max_rounds: u64)
        -> LedgerResult<Confirmation>;
}
