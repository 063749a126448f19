//! Treasury distribution handlers

use crate::{ok_json, ApiResult, ApiState};
use axum::{extract::State, Json};
use dumbly_core::Amount;
use serde::{Deserialize, Serialize};
use treasury::{DistributionPlan, SettlementReceipt, SplitPolicy, TargetBalances};

#[derive(Debug, Deserialize, Serialize)]
pub struct ManualDistributionRequest {
    pub burn: Amount,
    pub lp: Amount,
    pub rewards: Amount,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DistributionResponse {
    pub status: String,
    pub txid: String,
    pub group_id: String,
    pub confirmed_round: u64,
    pub distributed: DistributionPlan,
}

impl From<SettlementReceipt> for DistributionResponse {
    fn from(receipt: SettlementReceipt) -> Self {
        Self {
            status: "success".to_string(),
            txid: receipt.tx_id,
            group_id: receipt.group_id,
            confirmed_round: receipt.confirmed_round,
            distributed: receipt.distributed,
        }
    }
}

pub async fn get_treasury_balance(
    State(state): State<ApiState>,
) -> ApiResult<Json<serde_json::Value>> {
    let balance = state.executor.treasury_balance().await?;
    ok_json!(serde_json::json!({ "treasury_balance": balance }))
}

pub async fn get_targets_balance(State(state): State<ApiState>) -> ApiResult<Json<TargetBalances>> {
    ok_json!(state.executor.target_balances().await?)
}

pub async fn distribute_manual(
    State(state): State<ApiState>,
    Json(request): Json<ManualDistributionRequest>,
) -> ApiResult<Json<DistributionResponse>> {
    tracing::info!(
        burn = request.burn,
        lp = request.lp,
        rewards = request.rewards,
        "manual distribution requested"
    );

    let receipt = state
        .executor
        .distribute(SplitPolicy::Manual {
            burn: request.burn,
            lp: request.lp,
            rewards: request.rewards,
        })
        .await?;

    ok_json!(DistributionResponse::from(receipt))
}

pub async fn distribute_all(State(state): State<ApiState>) -> ApiResult<Json<DistributionResponse>> {
    tracing::info!("automatic distribution requested");

    let receipt = state
        .executor
        .distribute(SplitPolicy::AutomaticEqualSplit)
        .await?;

    ok_json!(DistributionResponse::from(receipt))
}
