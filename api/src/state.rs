//! API State Management
use std::sync::Arc;
use treasury::SettlementExecutor;

#[derive(Clone)]
pub struct ApiState {
    pub executor: Arc<SettlementExecutor>,
    /// Running against the seeded in-memory ledger
    pub dev_mode: bool,
}

impl ApiState {
    pub fn new(executor: Arc<SettlementExecutor>, dev_mode: bool) -> Self {
        Self { executor, dev_mode }
    }
}
