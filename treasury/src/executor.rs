//! Settlement Executor
//!
//! The only spender of treasury funds. "Read balance, plan, submit" runs
//! under a single in-flight guard so concurrent requests cannot plan
//! against the same balance. The guard is released once the group is
//! submitted; waiting for confirmation holds no lock.

use crate::error::{SettlementError, SettlementResult};
use crate::planner::{plan, DistributionPlan, SplitPolicy};
use dumbly_core::{
    AccountRole, Address, Amount, AssetId, Confirmation, GroupId, LedgerGateway, Transaction,
    TransactionGroup, TxId, DEFAULT_CONFIRMATION_ROUNDS,
};
use dumbly_crypto::KeyPair;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionTargets {
    pub burn: Address,
    pub lp: Address,
    pub rewards: Address,
}

impl DistributionTargets {
    pub fn address_of(&self, role: AccountRole) -> Option<&Address> {
        match role {
            AccountRole::Burn => Some(&self.burn),
            AccountRole::Lp => Some(&self.lp),
            AccountRole::Rewards => Some(&self.rewards),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementConfig {
    pub asset_id: AssetId,
    pub targets: DistributionTargets,
    /// Rounds to wait for confirmation before reporting an unknown outcome
    pub confirmation_rounds: u64,
}

impl SettlementConfig {
    pub fn new(asset_id: AssetId, targets: DistributionTargets) -> Self {
        Self {
            asset_id,
            targets,
            confirmation_rounds: DEFAULT_CONFIRMATION_ROUNDS,
        }
    }
}

/// A confirmed settlement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementReceipt {
    pub tx_id: TxId,
    pub group_id: GroupId,
    pub confirmed_round: u64,
    /// Amounts actually submitted
    pub distributed: DistributionPlan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TargetBalances {
    pub burn: Amount,
    pub lp: Amount,
    pub rewards: Amount,
}

/// A group that has left this process
struct Submitted {
    tx_id: TxId,
    group_id: GroupId,
    plan: DistributionPlan,
}

pub struct SettlementExecutor {
    gateway: Arc<dyn LedgerGateway>,
    treasury: KeyPair,
    treasury_address: Address,
    config: SettlementConfig,
    in_flight: Mutex<()>,
}

impl SettlementExecutor {
    pub fn new(
        gateway: Arc<dyn LedgerGateway>,
        treasury: KeyPair,
        config: SettlementConfig,
    ) -> SettlementResult<Self> {
        let treasury_address = Address::of(&treasury);
        let targets = &config.targets;

        if [&targets.burn, &targets.lp, &targets.rewards].contains(&&treasury_address) {
            return Err(SettlementError::InvalidConfig(
                "treasury cannot be a distribution target".to_string(),
            ));
        }
        if targets.burn == targets.lp || targets.burn == targets.rewards || targets.lp == targets.rewards {
            return Err(SettlementError::InvalidConfig(
                "burn, lp and rewards must be distinct accounts".to_string(),
            ));
        }

        Ok(Self {
            gateway,
            treasury,
            treasury_address,
            config,
            in_flight: Mutex::new(()),
        })
    }

    pub fn treasury_address(&self) -> &Address {
        &self.treasury_address
    }

    pub fn config(&self) -> &SettlementConfig {
        &self.config
    }

    pub async fn treasury_balance(&self) -> SettlementResult<Amount> {
        Ok(self
            .gateway
            .account_balance(&self.treasury_address, self.config.asset_id)
            .await?)
    }

    pub async fn target_balances(&self) -> SettlementResult<TargetBalances> {
        let asset_id = self.config.asset_id;
        let targets = &self.config.targets;
        Ok(TargetBalances {
            burn: self.gateway.account_balance(&targets.burn, asset_id).await?,
            lp: self.gateway.account_balance(&targets.lp, asset_id).await?,
            rewards: self.gateway.account_balance(&targets.rewards, asset_id).await?,
        })
    }

    /// Plan against the current balance and settle, as one critical section
    pub async fn distribute(&self, policy: SplitPolicy) -> SettlementResult<SettlementReceipt> {
        let submitted = {
            let _guard = self.in_flight.lock().await;
            let balance = self.treasury_balance().await?;
            let plan = plan(balance, policy)?;
            tracing::info!(?policy, balance, ?plan, "distribution planned");
            self.submit_locked(plan, balance).await?
        };

        self.await_settlement(submitted).await
    }

    /// Settle a plan built elsewhere, re-checking the balance first
    pub async fn execute(&self, plan: DistributionPlan) -> SettlementResult<SettlementReceipt> {
        let submitted = {
            let _guard = self.in_flight.lock().await;
            let balance = self.treasury_balance().await?;
            self.submit_locked(plan, balance).await?
        };

        self.await_settlement(submitted).await
    }

    /// Caller holds `in_flight`
    async fn submit_locked(
        &self,
        plan: DistributionPlan,
        balance: Amount,
    ) -> SettlementResult<Submitted> {
        let requested = plan.total().ok_or(crate::PlanError::Overflow)?;
        if plan.is_empty() {
            return Err(crate::PlanError::NothingToDistribute.into());
        }
        if requested > balance {
            tracing::warn!(requested, balance, "treasury balance drifted below plan");
            return Err(SettlementError::InsufficientBalance {
                requested,
                available: balance,
            });
        }

        let mut members = Vec::with_capacity(3);
        for (role, amount) in plan.shares() {
            if amount == 0 {
                continue;
            }
            let Some(address) = self.config.targets.address_of(role) else {
                continue;
            };
            if !self.gateway.is_opted_in(address, self.config.asset_id).await? {
                return Err(SettlementError::NotOptedIn {
                    role,
                    address: address.clone(),
                });
            }
            members.push(Transaction::asset_transfer(
                self.treasury_address.clone(),
                address.clone(),
                self.config.asset_id,
                amount,
                rand::random(),
            ));
        }

        let signed = TransactionGroup::new(members)?.sign(&[&self.treasury])?;
        let group_id = signed.group.id().clone();
        let local_tx_id = signed.tx_id()?;

        match self.gateway.submit_group(&signed).await {
            Ok(tx_id) => {
                tracing::info!(%tx_id, %group_id, ?plan, "settlement submitted");
                Ok(Submitted {
                    tx_id,
                    group_id,
                    plan,
                })
            }
            Err(dumbly_core::LedgerError::Rejected(reason)) => {
                tracing::error!(%group_id, "settlement rejected: {}", reason);
                Err(SettlementError::Rejected(reason))
            }
            // the request left this process; it may have landed
            Err(e) => {
                tracing::warn!(tx_id = %local_tx_id, %group_id, "submission outcome unknown: {}", e);
                Err(SettlementError::ConfirmationTimeout {
                    tx_id: local_tx_id,
                    group_id,
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn await_settlement(&self, submitted: Submitted) -> SettlementResult<SettlementReceipt> {
        let rounds = self.config.confirmation_rounds;
        let reason = match self.gateway.wait_for_confirmation(&submitted.tx_id, rounds).await {
            Ok(Confirmation::Confirmed { round }) => {
                tracing::info!(tx_id = %submitted.tx_id, round, "settlement confirmed");
                return Ok(SettlementReceipt {
                    tx_id: submitted.tx_id,
                    group_id: submitted.group_id,
                    confirmed_round: round,
                    distributed: submitted.plan,
                });
            }
            Ok(Confirmation::TimedOut { rounds_waited }) => {
                tracing::warn!(tx_id = %submitted.tx_id, rounds_waited, "settlement not confirmed in time");
                format!("not confirmed within {} rounds", rounds_waited)
            }
            Err(dumbly_core::LedgerError::Rejected(reason)) => {
                tracing::error!(tx_id = %submitted.tx_id, "settlement dropped from pool: {}", reason);
                return Err(SettlementError::Rejected(reason));
            }
            Err(e) => {
                tracing::warn!(tx_id = %submitted.tx_id, "confirmation wait failed: {}", e);
                e.to_string()
            }
        };

        Err(SettlementError::ConfirmationTimeout {
            tx_id: submitted.tx_id,
            group_id: submitted.group_id,
            reason,
        })
    }
}
