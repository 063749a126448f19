//! API Error Handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use treasury::{PlanError, SettlementError};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Nothing to distribute")]
    NothingToDistribute,

    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: u64, need: u64 },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not opted in: {0}")]
    NotOptedIn(String),

    #[error("Settlement rejected: {0}")]
    Rejected(String),

    #[error("Ledger unavailable: {0}")]
    LedgerUnavailable(String),

    #[error("Settlement {txid} unconfirmed: {message}")]
    Unconfirmed {
        txid: String,
        group_id: String,
        message: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SettlementError> for ApiError {
    fn from(err: SettlementError) -> Self {
        match err {
            SettlementError::Plan(PlanError::NothingToDistribute) => ApiError::NothingToDistribute,
            SettlementError::Plan(PlanError::InsufficientBalance {
                requested,
                available,
            })
            | SettlementError::InsufficientBalance {
                requested,
                available,
            } => ApiError::InsufficientBalance {
                have: available,
                need: requested,
            },
            SettlementError::Plan(PlanError::Overflow) => {
                ApiError::BadRequest("requested amounts overflow".to_string())
            }
            e @ SettlementError::NotOptedIn { .. } => ApiError::NotOptedIn(e.to_string()),
            SettlementError::Rejected(msg) => ApiError::Rejected(msg),
            SettlementError::LedgerUnavailable(msg) => ApiError::LedgerUnavailable(msg),
            SettlementError::ConfirmationTimeout {
                tx_id,
                group_id,
                reason,
            } => ApiError::Unconfirmed {
                txid: tx_id,
                group_id,
                message: reason,
            },
            e @ (SettlementError::InvalidConfig(_) | SettlementError::Build(_)) => {
                ApiError::Internal(e.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::NothingToDistribute => (
                StatusCode::BAD_REQUEST,
                "nothing_to_distribute",
                "Treasury has nothing to distribute".to_string(),
            ),
            ApiError::InsufficientBalance { have, need } => (
                StatusCode::BAD_REQUEST,
                "insufficient_balance",
                format!("Requested ({}) > balance ({})", need, have),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::NotOptedIn(msg) => (StatusCode::CONFLICT, "not_opted_in", msg),
            ApiError::Rejected(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "rejected", msg),
            ApiError::LedgerUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "ledger_unavailable", msg)
            }
            ApiError::Unconfirmed {
                txid,
                group_id,
                message,
            } => {
                let body = Json(json!({
                    "error": "confirmation_timeout",
                    "message": format!(
                        "{}; re-check the treasury balance before retrying",
                        message
                    ),
                    "txid": txid,
                    "group_id": group_id,
                }));
                return (StatusCode::GATEWAY_TIMEOUT, body).into_response();
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
        };

        let body = Json(json!({
            "error": error_type,
            "message": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (
                ApiError::from(SettlementError::Plan(PlanError::NothingToDistribute)),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(SettlementError::Rejected("bad group".into())),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ApiError::from(SettlementError::LedgerUnavailable("down".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ApiError::from(SettlementError::ConfirmationTimeout {
                    tx_id: "tx".into(),
                    group_id: "group".into(),
                    reason: "not confirmed within 4 rounds".into(),
                }),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                ApiError::from(SettlementError::InvalidConfig("targets".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_drift_maps_to_insufficient_balance() {
        let err = ApiError::from(SettlementError::InsufficientBalance {
            requested: 90,
            available: 30,
        });
        assert!(matches!(
            err,
            ApiError::InsufficientBalance { have: 30, need: 90 }
        ));
    }
}
