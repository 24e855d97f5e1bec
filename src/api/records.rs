//! HTTP surface of the record store.
//!
//! `GET /<entity>` lists the first rows, `GET /<entity>/{id}` fetches one,
//! `POST /<entity>` creates one and answers `{"success": bool}`.

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::routing::{get, patch};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::application::{RecordError, RecordService};
use crate::domain::{
    Aggregator, Batch, Consumer, Farmer, IdentityRecord, Inspection, Manufacturer, Order, Rating,
};

use super::error::parse_body;

type RecordResult<T> = Result<Json<T>, RecordError>;

#[derive(Debug, Serialize)]
pub struct Success {
    pub success: bool,
}

pub fn router(service: RecordService) -> Router {
    Router::new()
        .route("/kyc", get(list_kyc).post(create_kyc))
        .route("/kyc/{id}", get(get_kyc))
        .route("/kyc/{id}/status", patch(update_kyc_status))
        .route("/farmers", get(list_farmers).post(create_farmer))
        .route("/farmers/{id}", get(get_farmer))
        .route("/farmers/{id}/batches", get(farmer_batches))
        .route("/farmers/{id}/ratings", get(farmer_ratings))
        .route("/consumers", get(list_consumers).post(create_consumer))
        .route("/consumers/{id}", get(get_consumer))
        .route("/aggregators", get(list_aggregators))
        .route("/aggregators/{id}", get(get_aggregator))
        .route("/manufacturers", get(list_manufacturers))
        .route("/manufacturers/{id}", get(get_manufacturer))
        .route("/batches", get(list_batches).post(create_batch))
        .route("/batches/{id}", get(get_batch))
        .route("/batches/{id}/status", patch(update_batch_status))
        .route("/batches/{id}/orders", get(batch_orders))
        .route("/inspections", get(list_inspections))
        .route("/inspections/{id}", get(get_inspection))
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/status", patch(update_order_status))
        .route("/ratings", get(list_ratings).post(create_rating))
        .route("/ratings/{id}", get(get_rating))
        .with_state(service)
}

fn body<T: DeserializeOwned + Default>(bytes: &Bytes) -> Result<T, RecordError> {
    parse_body(bytes).map_err(|e| RecordError::InvalidBody(e.to_string()))
}

fn found<T>(record: Option<T>, entity: &'static str, id: String) -> RecordResult<T> {
    record
        .map(Json)
        .ok_or(RecordError::NotFound { entity, id })
}

fn success(success: bool) -> RecordResult<Success> {
    Ok(Json(Success { success }))
}

// ========================
// KYC
// ========================

async fn list_kyc(State(svc): State<RecordService>) -> RecordResult<Vec<IdentityRecord>> {
    Ok(Json(svc.list_kyc().await?))
}

async fn get_kyc(
    State(svc): State<RecordService>,
    Path(id): Path<String>,
) -> RecordResult<IdentityRecord> {
    found(svc.get_kyc(&id).await?, "KYC record", id)
}

async fn create_kyc(State(svc): State<RecordService>, bytes: Bytes) -> RecordResult<Success> {
    svc.create_kyc(body(&bytes)?).await?;
    success(true)
}

async fn update_kyc_status(
    State(svc): State<RecordService>,
    Path(id): Path<String>,
    bytes: Bytes,
) -> RecordResult<Success> {
    success(svc.update_kyc_status(&id, body(&bytes)?).await?)
}

// ========================
// Farmers
// ========================

async fn list_farmers(State(svc): State<RecordService>) -> RecordResult<Vec<Farmer>> {
    Ok(Json(svc.list_farmers().await?))
}

async fn get_farmer(
    State(svc): State<RecordService>,
    Path(id): Path<String>,
) -> RecordResult<Farmer> {
    found(svc.get_farmer(&id).await?, "Farmer", id)
}

async fn create_farmer(State(svc): State<RecordService>, bytes: Bytes) -> RecordResult<Success> {
    svc.create_farmer(body(&bytes)?).await?;
    success(true)
}

async fn farmer_batches(
    State(svc): State<RecordService>,
    Path(id): Path<String>,
) -> RecordResult<Vec<Batch>> {
    Ok(Json(svc.farmer_batches(&id).await?))
}

async fn farmer_ratings(
    State(svc): State<RecordService>,
    Path(id): Path<String>,
) -> RecordResult<Vec<Rating>> {
    Ok(Json(svc.farmer_ratings(&id).await?))
}

// ========================
// Consumers
// ========================

async fn list_consumers(State(svc): State<RecordService>) -> RecordResult<Vec<Consumer>> {
    Ok(Json(svc.list_consumers().await?))
}

async fn get_consumer(
    State(svc): State<RecordService>,
    Path(id): Path<String>,
) -> RecordResult<Consumer> {
    found(svc.get_consumer(&id).await?, "Consumer", id)
}

async fn create_consumer(
    State(svc): State<RecordService>,
    bytes: Bytes,
) -> RecordResult<Success> {
    svc.create_consumer(body(&bytes)?).await?;
    success(true)
}

// ========================
// Read-only collaborators
// ========================

async fn list_aggregators(State(svc): State<RecordService>) -> RecordResult<Vec<Aggregator>> {
    Ok(Json(svc.list_aggregators().await?))
}

async fn get_aggregator(
    State(svc): State<RecordService>,
    Path(id): Path<String>,
) -> RecordResult<Aggregator> {
    found(svc.get_aggregator(&id).await?, "Aggregator", id)
}

async fn list_manufacturers(
    State(svc): State<RecordService>,
) -> RecordResult<Vec<Manufacturer>> {
    Ok(Json(svc.list_manufacturers().await?))
}

async fn get_manufacturer(
    State(svc): State<RecordService>,
    Path(id): Path<String>,
) -> RecordResult<Manufacturer> {
    found(svc.get_manufacturer(&id).await?, "Manufacturer", id)
}

async fn list_inspections(State(svc): State<RecordService>) -> RecordResult<Vec<Inspection>> {
    Ok(Json(svc.list_inspections().await?))
}

async fn get_inspection(
    State(svc): State<RecordService>,
    Path(id): Path<String>,
) -> RecordResult<Inspection> {
    found(svc.get_inspection(&id).await?, "Inspection", id)
}

// ========================
// Batches
// ========================

async fn list_batches(State(svc): State<RecordService>) -> RecordResult<Vec<Batch>> {
    Ok(Json(svc.list_batches().await?))
}

async fn get_batch(
    State(svc): State<RecordService>,
    Path(id): Path<String>,
) -> RecordResult<Batch> {
    found(svc.get_batch(&id).await?, "Batch", id)
}

async fn create_batch(State(svc): State<RecordService>, bytes: Bytes) -> RecordResult<Success> {
    svc.create_batch(body(&bytes)?).await?;
    success(true)
}

async fn update_batch_status(
    State(svc): State<RecordService>,
    Path(id): Path<String>,
    bytes: Bytes,
) -> RecordResult<Success> {
    success(svc.update_batch_status(&id, body(&bytes)?).await?)
}

async fn batch_orders(
    State(svc): State<RecordService>,
    Path(id): Path<String>,
) -> RecordResult<Vec<Order>> {
    Ok(Json(svc.batch_orders(&id).await?))
}

// ========================
// Orders
// ========================

async fn list_orders(State(svc): State<RecordService>) -> RecordResult<Vec<Order>> {
    Ok(Json(svc.list_orders().await?))
}

async fn get_order(
    State(svc): State<RecordService>,
    Path(id): Path<String>,
) -> RecordResult<Order> {
    found(svc.get_order(&id).await?, "Order", id)
}

async fn create_order(State(svc): State<RecordService>, bytes: Bytes) -> RecordResult<Success> {
    svc.create_order(body(&bytes)?).await?;
    success(true)
}

async fn update_order_status(
    State(svc): State<RecordService>,
    Path(id): Path<String>,
    bytes: Bytes,
) -> RecordResult<Success> {
    success(svc.update_order_status(&id, body(&bytes)?).await?)
}

// ========================
// Ratings
// ========================

async fn list_ratings(State(svc): State<RecordService>) -> RecordResult<Vec<Rating>> {
    Ok(Json(svc.list_ratings().await?))
}

async fn get_rating(
    State(svc): State<RecordService>,
    Path(id): Path<String>,
) -> RecordResult<Rating> {
    found(svc.get_rating(&id).await?, "Rating", id)
}

async fn create_rating(State(svc): State<RecordService>, bytes: Bytes) -> RecordResult<Success> {
    svc.create_rating(body(&bytes)?).await?;
    success(true)
}
