mod common;

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{
    ALICE, BOB, address, count_rows, crop_service, dev_wallet, read_only_crop_service,
    test_service,
};
use cropchain::api;
use ethers::signers::Signer;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => request.body(Body::from(body.to_string()))?,
        None => request.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, value))
}

async fn get(app: &Router, uri: &str) -> Result<(StatusCode, Value)> {
    send(app, Method::GET, uri, None).await
}

async fn post(app: &Router, uri: &str, body: Value) -> Result<(StatusCode, Value)> {
    send(app, Method::POST, uri, Some(body)).await
}

// ========================
// Record store
// ========================

#[tokio::test]
async fn test_farmer_post_then_list() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let app = api::records::router(service);

    let (status, body) = post(
        &app,
        "/farmers",
        json!({"farmer_id": "F1", "name": "Alice", "kyc_id": "K1"}),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));

    let (status, body) = get(&app, "/farmers").await?;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["farmer_id"], "F1");
    assert_eq!(rows[0]["name"], "Alice");

    let (status, body) = get(&app, "/farmers/F1").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kyc_id"], "K1");

    Ok(())
}

#[tokio::test]
async fn test_records_read_back_as_submitted() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let app = api::records::router(service);

    let order = json!({
        "order_id": "O1",
        "order_from": "consumer",
        "from_id": "C1",
        "receiver": "Retailer",
        "receiver_id": "R7",
        "batch_id": "B1",
        "quantity": 12.5,
        "price": 300.0,
    });
    let (status, body) = post(&app, "/orders", order.clone()).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));

    let (status, body) = get(&app, "/orders/O1").await?;
    assert_eq!(status, StatusCode::OK);
    for (field, value) in order.as_object().unwrap() {
        assert_eq!(&body[field], value, "order field {}", field);
    }
    assert_eq!(body["status"], "Pending");

    let consumer = json!({"consumer_id": "C1", "consumer_name": "Bob", "verification": "verified"});
    let (status, _) = post(&app, "/consumers", consumer.clone()).await?;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = get(&app, "/consumers/C1").await?;
    assert_eq!(body, consumer);

    Ok(())
}

#[tokio::test]
async fn test_record_errors() -> Result<()> {
    let (service, temp) = test_service().await?;
    let app = api::records::router(service);

    let (status, body) = post(&app, "/farmers", json!({"name": "Alice"})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Missing required field: farmer_id");

    let (status, body) = post(
        &app,
        "/ratings",
        json!({"rating_id": "R1", "consumer_id": "C1", "farmer_id": "F1", "rating": 7}),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = get(&app, "/batches/B404").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, _) = post(&app, "/kyc", json!("not an object")).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(count_rows(&temp, "farmers").await?, 0);
    assert_eq!(count_rows(&temp, "ratings").await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_batch_uses_type_field() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let app = api::records::router(service);

    let (status, _) = post(
        &app,
        "/batches",
        json!({"batch_id": "B1", "type": "paddy", "farmer_id": "F1"}),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = get(&app, "/farmers/F1/batches").await?;
    assert_eq!(body[0]["type"], "paddy");
    assert_eq!(body[0]["status"], "Created");

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/batches/B1/status",
        Some(json!({"status": "delivered"})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));

    let (_, body) = get(&app, "/batches/B1").await?;
    assert_eq!(body["status"], "Delivered");

    Ok(())
}

#[tokio::test]
async fn test_read_only_entities_have_no_write_route() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let app = api::records::router(service);

    for uri in ["/aggregators", "/manufacturers", "/inspections"] {
        let (status, body) = get(&app, uri).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        let (status, _) = post(&app, uri, json!({"name": "x"})).await?;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    Ok(())
}

// ========================
// Ledger gateway
// ========================

#[tokio::test]
async fn test_create_crop_for_unregistered_default_address() -> Result<()> {
    let (service, ledger) = crop_service();
    let app = api::crops::router(Arc::new(service));

    let (status, body) = post(&app, "/api/v1/crops", json!({"metadata": "wheat-lot-1"})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "User must be registered first"}));
    assert!(ledger.submitted().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_register_create_transfer_flow() -> Result<()> {
    let (service, ledger) = crop_service();
    ledger.register(address(BOB));
    let app = api::crops::router(Arc::new(service));

    let (status, body) = post(&app, "/api/v1/users/register", json!({})).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["gas_used"].as_u64().is_some());

    let (status, body) = post(&app, "/api/v1/crops", json!({"metadata": "wheat-lot-1"})).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["crop_id"], 0);
    assert_eq!(body["metadata"], "wheat-lot-1");

    let (_, body) = get(&app, "/api/v1/crops/next-id").await?;
    assert_eq!(body, json!({"next_id": 1}));

    let (status, body) = post(
        &app,
        "/api/v1/crops/0/transfer",
        json!({"to_address": BOB.to_lowercase()}),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["to_address"], BOB);

    let (_, body) = get(&app, "/api/v1/crops/0").await?;
    assert_eq!(body["owner"], BOB);
    assert_eq!(body["exists"], true);

    let (_, body) = get(&app, &format!("/api/v1/crops/owner/{}?limit=10", BOB)).await?;
    assert_eq!(body["total_found"], 1);
    assert_eq!(body["crops"][0]["id"], 0);

    Ok(())
}

#[tokio::test]
async fn test_transfer_by_non_owner_is_forbidden() -> Result<()> {
    let (service, ledger) = crop_service();
    ledger.register(address(BOB));
    let id = ledger.mint("maize", address(ALICE));
    let app = api::crops::router(Arc::new(service));

    let (status, body) = post(
        &app,
        &format!("/api/v1/crops/{}/transfer", id),
        json!({"to_address": BOB}),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({"error": "Only the owner can transfer this crop"}));
    assert!(ledger.submitted().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_ledger_validation_errors() -> Result<()> {
    let (service, _ledger) = crop_service();
    let app = api::crops::router(Arc::new(service));

    let (status, body) = get(&app, "/api/v1/users/0x1234/status").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Invalid address format"}));

    let (status, body) = post(&app, "/api/v1/crops/0/authenticate", json!({})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Owner address is required"}));

    let (status, body) = get(&app, &format!("/api/v1/crops/owner/{}?limit=0", ALICE)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["crops"], json!([]));
    assert_eq!(body["total_found"], 0);

    Ok(())
}

#[tokio::test]
async fn test_non_numeric_parameters_are_json_errors() -> Result<()> {
    let (service, ledger) = crop_service();
    let app = api::crops::router(Arc::new(service));

    let (status, body) = get(&app, "/api/v1/crops/abc").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Invalid crop ID: abc"}));

    let (status, body) = post(
        &app,
        "/api/v1/crops/-1/transfer",
        json!({"to_address": BOB}),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Invalid crop ID: -1"}));

    let (status, body) = get(&app, &format!("/api/v1/crops/owner/{}?limit=many", ALICE)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Invalid limit: many"}));
    assert!(ledger.submitted().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_no_credential_is_server_error() -> Result<()> {
    let (service, ledger) = read_only_crop_service();
    ledger.register(address(ALICE));
    let app = api::crops::router(Arc::new(service));

    let (status, body) = post(
        &app,
        "/api/v1/crops",
        json!({"metadata": "rye", "owner_address": ALICE}),
    )
    .await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Private key not configured"}));

    Ok(())
}

#[tokio::test]
async fn test_health_endpoint() -> Result<()> {
    let (service, ledger) = crop_service();
    let app = api::crops::router(Arc::new(service));

    let (status, body) = get(&app, "/").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["blockchain_connected"], true);
    assert_eq!(body["contract_address"], common::CONTRACT);

    ledger.fail_reads(true);
    let (status, body) = get(&app, "/").await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "unhealthy");
    assert!(body["error"].as_str().unwrap().contains("connection refused"));

    // Read failures behind other routes are server errors too
    let (status, body) = get(
        &app,
        &format!("/api/v1/users/{:?}/status", dev_wallet().address()),
    )
    .await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().starts_with("Failed to check registration"));

    Ok(())
}
