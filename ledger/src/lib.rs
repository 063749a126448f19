//! Ledger Gateway implementations
//!
//! - [`NodeClient`]: REST client for a ledger node
//! - [`InMemoryLedger`]: a self-contained ledger that commits atomic groups
//!   and runs the tax program, used by dev mode and the test suites

pub mod memory;
pub mod node;

pub use memory::{AssetInfo, InMemoryLedger};
pub use node::{NodeClient, NodeClientConfig};
