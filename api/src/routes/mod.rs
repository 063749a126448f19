//! API routes
//!
//! - `/health` - liveness
//! - treasury balance queries and distribution triggers, see [`treasury`]

mod treasury;

use crate::ApiState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

pub fn create_routes() -> Router<ApiState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(treasury::treasury_routes())
}

async fn root() -> &'static str {
    "Dumbly Treasury API"
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    dev_mode: bool,
}

async fn health_check(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        dev_mode: state.dev_mode,
    })
}
