//! Distribution Planner
//!
//! Pure arithmetic over a treasury balance. Plans are built fresh for every
//! request and never stored; the settled group is the audit record.

use crate::error::{PlanError, PlanResult};
use dumbly_core::{AccountRole, Amount};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SplitPolicy {
    /// Explicit amounts; anything left over stays in the treasury
    Manual {
        burn: Amount,
        lp: Amount,
        rewards: Amount,
    },
    /// The whole balance in thirds, remainder to burn
    AutomaticEqualSplit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionPlan {
    pub burn: Amount,
    pub lp: Amount,
    pub rewards: Amount,
}

impl DistributionPlan {
    /// `None` on overflow
    pub fn total(&self) -> Option<Amount> {
        self.burn
            .checked_add(self.lp)
            .and_then(|sum| sum.checked_add(self.rewards))
    }

    /// Destinations in settlement order
    pub fn shares(&self) -> [(AccountRole, Amount); 3] {
        [
            (AccountRole::Burn, self.burn),
            (AccountRole::Lp, self.lp),
            (AccountRole::Rewards, self.rewards),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.shares().iter().all(|(_, amount)| *amount == 0)
    }
}

/// Build a plan for `total_balance` under `policy`.
///
/// A zero balance, or a manual request for nothing, is
/// [`PlanError::NothingToDistribute`] rather than an empty settlement.
pub fn plan(total_balance: Amount, policy: SplitPolicy) -> PlanResult<DistributionPlan> {
    if total_balance == 0 {
        return Err(PlanError::NothingToDistribute);
    }

    match policy {
        SplitPolicy::Manual { burn, lp, rewards } => {
            let requested = DistributionPlan { burn, lp, rewards };
            let total = requested.total().ok_or(PlanError::Overflow)?;
            if total > total_balance {
                return Err(PlanError::InsufficientBalance {
                    requested: total,
                    available: total_balance,
                });
            }
            if total == 0 {
                return Err(PlanError::NothingToDistribute);
            }
            Ok(requested)
        }
        SplitPolicy::AutomaticEqualSplit => {
            let share = total_balance / 3;
            let remainder = total_balance % 3;
            Ok(DistributionPlan {
                burn: share + remainder,
                lp: share,
                rewards: share,
            })
        }
    }
}
