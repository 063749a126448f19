//! Treasury balance and distribution endpoints

use crate::treasury_handlers::{
    distribute_all, distribute_manual, get_targets_balance, get_treasury_balance,
};
use crate::ApiState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn treasury_routes() -> Router<ApiState> {
    Router::new()
        .route("/treasury-balance", get(get_treasury_balance))
        .route("/targets-balance", get(get_targets_balance))
        .route("/distribute-manual", post(distribute_manual))
        .route("/distribute-all", post(distribute_all))
}
