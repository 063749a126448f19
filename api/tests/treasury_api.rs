//! Administrative endpoints driven through the router

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use dumbly_core::{Address, AssetId};
use dumbly_crypto::KeyPair;
use dumbly_ledger::InMemoryLedger;
use dumbly_api::{create_app, ApiState, DistributionResponse};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use treasury::{DistributionPlan, DistributionTargets, SettlementConfig, SettlementExecutor};

const ORIGIN: &str = "http://localhost:3000";

struct TestApi {
    app: Router,
    ledger: Arc<InMemoryLedger>,
    asset_id: AssetId,
    targets: DistributionTargets,
}

async fn setup(treasury_balance: u64, opt_in_targets: bool) -> TestApi {
    let ledger = Arc::new(InMemoryLedger::new());
    let admin = KeyPair::generate();
    let treasury = KeyPair::generate();
    let sinks = [KeyPair::generate(), KeyPair::generate(), KeyPair::generate()];

    let asset_id = ledger
        .create_asset(&Address::of(&admin), 1_000_000, 6, "Dumbly")
        .await;
    ledger.opt_in(&treasury, asset_id).await.unwrap();
    if opt_in_targets {
        for sink in &sinks {
            ledger.opt_in(sink, asset_id).await.unwrap();
        }
    }
    if treasury_balance > 0 {
        ledger
            .transfer(&admin, &Address::of(&treasury), asset_id, treasury_balance)
            .await
            .unwrap();
    }

    let targets = DistributionTargets {
        burn: Address::of(&sinks[0]),
        lp: Address::of(&sinks[1]),
        rewards: Address::of(&sinks[2]),
    };
    let executor = SettlementExecutor::new(
        ledger.clone(),
        treasury,
        SettlementConfig::new(asset_id, targets.clone()),
    )
    .unwrap();

    let app = create_app(ApiState::new(Arc::new(executor), true), ORIGIN).unwrap();
    TestApi {
        app,
        ledger,
        asset_id,
        targets,
    }
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let api = setup(0, true).await;
    let (status, body) = call(&api.app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["dev_mode"], true);
}

#[tokio::test]
async fn test_treasury_balance() {
    let api = setup(1234, true).await;
    let (status, body) = call(&api.app, Method::GET, "/treasury-balance", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "treasury_balance": 1234 }));
}

#[tokio::test]
async fn test_manual_distribution() {
    let api = setup(100, true).await;

    let (status, body) = call(
        &api.app,
        Method::POST,
        "/distribute-manual",
        Some(json!({ "burn": 10, "lp": 20, "rewards": 30 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let response: DistributionResponse = serde_json::from_value(body).unwrap();
    assert_eq!(response.status, "success");
    assert!(!response.txid.is_empty());
    assert_eq!(
        response.distributed,
        DistributionPlan {
            burn: 10,
            lp: 20,
            rewards: 30
        }
    );

    let (_, body) = call(&api.app, Method::GET, "/treasury-balance", None).await;
    assert_eq!(body["treasury_balance"], 40);

    let (_, body) = call(&api.app, Method::GET, "/targets-balance", None).await;
    assert_eq!(body, json!({ "burn": 10, "lp": 20, "rewards": 30 }));
}

#[tokio::test]
async fn test_distribute_all() {
    let api = setup(100, true).await;

    let (status, body) = call(&api.app, Method::POST, "/distribute-all", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["distributed"], json!({ "burn": 34, "lp": 33, "rewards": 33 }));

    let (_, body) = call(&api.app, Method::GET, "/treasury-balance", None).await;
    assert_eq!(body["treasury_balance"], 0);
}

#[tokio::test]
async fn test_distribute_all_with_empty_treasury() {
    let api = setup(0, true).await;
    let before = api.ledger.accepted_groups().await;

    let (status, body) = call(&api.app, Method::POST, "/distribute-all", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "nothing_to_distribute");
    assert_eq!(api.ledger.accepted_groups().await, before);
}

#[tokio::test]
async fn test_manual_over_balance() {
    let api = setup(50, true).await;

    let (status, body) = call(
        &api.app,
        Method::POST,
        "/distribute-manual",
        Some(json!({ "burn": 10, "lp": 20, "rewards": 30 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "insufficient_balance");
    assert_eq!(body["message"], "Requested (60) > balance (50)");
}

#[tokio::test]
async fn test_negative_amounts_rejected() {
    let api = setup(50, true).await;

    let (status, _) = call(
        &api.app,
        Method::POST,
        "/distribute-manual",
        Some(json!({ "burn": -1, "lp": 0, "rewards": 0 })),
    )
    .await;
    assert!(status.is_client_error());

    let (_, body) = call(&api.app, Method::GET, "/treasury-balance", None).await;
    assert_eq!(body["treasury_balance"], 50);
}

#[tokio::test]
async fn test_targets_not_opted_in() {
    let api = setup(90, false).await;

    let (status, body) = call(&api.app, Method::POST, "/distribute-all", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "not_opted_in");
    let message = body["message"].as_str().unwrap();
    assert!(message.contains(api.targets.burn.as_str()));
}

#[tokio::test]
async fn test_ledger_unavailable() {
    let api = setup(90, true).await;
    api.ledger.set_available(false);

    let (status, body) = call(&api.app, Method::GET, "/treasury-balance", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "ledger_unavailable");

    let (status, _) = call(&api.app, Method::POST, "/distribute-all", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_unconfirmed_distribution_reports_txid() {
    let api = setup(90, true).await;
    api.ledger.set_confirmation_lag(50);

    let (status, body) = call(&api.app, Method::POST, "/distribute-all", None).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"], "confirmation_timeout");
    assert!(!body["txid"].as_str().unwrap().is_empty());
    assert!(!body["group_id"].as_str().unwrap().is_empty());

    // the group committed even though confirmation was not observed
    api.ledger.set_confirmation_lag(0);
    let (_, body) = call(&api.app, Method::GET, "/treasury-balance", None).await;
    assert_eq!(body["treasury_balance"], 0);
}

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let api = setup(0, true).await;

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/distribute-all")
        .header(header::ORIGIN, ORIGIN)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = api.app.clone().oneshot(request).await.unwrap();

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        ORIGIN
    );
}

#[tokio::test]
async fn test_invalid_origin_is_rejected() {
    let api = setup(0, true).await;
    let executor = {
        let ledger = api.ledger.clone();
        let targets = api.targets.clone();
        SettlementExecutor::new(
            ledger,
            KeyPair::generate(),
            SettlementConfig::new(api.asset_id, targets),
        )
        .unwrap()
    };
    assert!(create_app(ApiState::new(Arc::new(executor), false), "bad\norigin").is_err());
}
