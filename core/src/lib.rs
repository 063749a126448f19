//! Dumbly Core Library
//!
//! Ledger data model shared by the tax program, the treasury engine and
//! the ledger gateways.

pub mod constants;
pub mod error;
pub mod gateway;
pub mod tax;
pub mod transaction;
pub mod types;

// Re-export main types
pub use constants::*;
pub use error::{CoreError, Result};
pub use gateway::{Confirmation, LedgerError, LedgerGateway, LedgerResult};
pub use tax::{TaxRate, TaxSplit};
pub use transaction::{AssetTransfer, SignedGroup, Transaction, TransactionGroup, TxKind};
pub use types::{AccountRole, Address, Amount, AssetId, GroupId, ProgramId, TransferIntent, TxId};
