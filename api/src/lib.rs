//! Dumbly administrative API
//!
//! HTTP trigger surface over the settlement executor: treasury and target
//! balances, manual distribution and automatic distribution.

mod error;
mod response;
mod routes;
mod state;
mod treasury_handlers;

pub use error::{ApiError, ApiResult};
pub use state::ApiState;
pub use treasury_handlers::{DistributionResponse, ManualDistributionRequest};

use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    Router,
};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Router with CORS restricted to `allowed_origin`
pub fn create_app(state: ApiState, allowed_origin: &str) -> ApiResult<Router> {
    let origin = HeaderValue::from_str(allowed_origin)
        .map_err(|e| ApiError::Internal(format!("invalid CORS origin {}: {}", allowed_origin, e)))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Ok(routes::create_routes()
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

pub async fn start_server(
    addr: SocketAddr,
    allowed_origin: &str,
    state: ApiState,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_app(state, allowed_origin)?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("API listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
