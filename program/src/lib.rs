//! Dumbly Tax Enforcement Program
//!
//! The on-ledger half of the system:
//! - [`SellPolicy`] decides whether a transfer is a taxable sell
//! - [`TaxProgram`] approves or rejects the enclosing atomic group
//! - [`SellOrder`] builds groups the program will accept
//!
//! The program holds no mutable state between calls. Its configuration is
//! fixed by the one-time setup call.

pub mod classifier;
pub mod error;
pub mod program;
pub mod sell;

pub use classifier::{Classification, ExemptReason, SellPolicy, TransferShape};
pub use error::{ClassificationError, ProgramError, ProgramResult, TaxMismatch};
pub use program::{Approval, ProgramConfig, ProgramSetup, ProgramState, TaxProgram};
pub use sell::SellOrder;
