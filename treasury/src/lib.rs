//! Dumbly Treasury
//!
//! The treasury collects the sell tax and pays it out to three sinks:
//! - burn
//! - liquidity (lp)
//! - rewards
//!
//! [`plan`] turns a balance and a [`SplitPolicy`] into a validated
//! [`DistributionPlan`]; [`SettlementExecutor`] settles a plan as one
//! atomic group signed by the treasury.

pub mod error;
pub mod executor;
pub mod planner;

pub use error::{PlanError, PlanResult, SettlementError, SettlementOutcome, SettlementResult};
pub use executor::{
    DistributionTargets, SettlementConfig, SettlementExecutor, SettlementReceipt, TargetBalances,
};
pub use planner::{plan, DistributionPlan, SplitPolicy};
