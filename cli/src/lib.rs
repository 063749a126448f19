//! Shared pieces of the `dumblyd` daemon: configuration loading and the
//! seeded development ledger.

pub mod config;
pub mod dev;

pub use config::{ApiSettings, ConfigError, DaemonConfig, FileConfig, NodeSettings};
pub use dev::{seed_dev_ledger, DevLedger};
