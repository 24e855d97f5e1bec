//! HTTP surface of the crop ledger gateway.

use std::str::FromStr;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::error;

use crate::application::{
    Authenticity, CropCreated, CropService, CropTransferred, CropView, LedgerError, NextCropId,
    OwnerCrops, UserRegistered, UserStatus,
};
use crate::chain::LedgerClient;
use crate::domain::CropId;

use super::error::parse_body;

/// Versioned prefix for every route except the health check.
pub const API_PREFIX: &str = "/api/v1";

type LedgerResult<T> = Result<Json<T>, LedgerError>;
type Shared<L> = State<Arc<CropService<L>>>;

/// Query string of `GET /crops/owner/{address}`. `limit` is parsed by the handler.
#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub limit: Option<String>,
}

pub fn router<L: LedgerClient>(service: Arc<CropService<L>>) -> Router {
    let api = Router::new()
        .route("/users/register", post(register_user::<L>))
        .route("/users/{address}/status", get(user_status::<L>))
        .route("/crops", post(create_crop::<L>))
        .route("/crops/next-id", get(next_crop_id::<L>))
        .route("/crops/owner/{address}", get(crops_by_owner::<L>))
        .route("/crops/{id}", get(get_crop::<L>))
        .route("/crops/{id}/authenticate", post(authenticate::<L>))
        .route("/crops/{id}/transfer", post(transfer_crop::<L>));

    Router::new()
        .route("/", get(health::<L>))
        .nest(API_PREFIX, api)
        .layer(CorsLayer::permissive())
        .with_state(service)
}

fn body<T: DeserializeOwned + Default>(bytes: &Bytes) -> Result<T, LedgerError> {
    parse_body(bytes).map_err(|e| LedgerError::InvalidBody(e.to_string()))
}

fn number<T: FromStr>(raw: String, name: &'static str) -> Result<T, LedgerError> {
    raw.parse()
        .map_err(|_| LedgerError::InvalidParameter { name, value: raw })
}

async fn health<L: LedgerClient>(State(svc): Shared<L>) -> Response {
    match svc.health().await {
        Ok(health) => Json(health).into_response(),
        Err(e) => {
            error!(error = %e, "Health check failed");
            let body = json!({ "status": "unhealthy", "error": e.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

async fn register_user<L: LedgerClient>(
    State(svc): Shared<L>,
    bytes: Bytes,
) -> LedgerResult<UserRegistered> {
    Ok(Json(svc.register_user(body(&bytes)?).await?))
}

async fn user_status<L: LedgerClient>(
    State(svc): Shared<L>,
    Path(address): Path<String>,
) -> LedgerResult<UserStatus> {
    Ok(Json(svc.user_status(&address).await?))
}

async fn create_crop<L: LedgerClient>(
    State(svc): Shared<L>,
    bytes: Bytes,
) -> LedgerResult<CropCreated> {
    Ok(Json(svc.create_crop(body(&bytes)?).await?))
}

async fn get_crop<L: LedgerClient>(
    State(svc): Shared<L>,
    Path(id): Path<String>,
) -> LedgerResult<CropView> {
    let id: CropId = number(id, "crop ID")?;
    Ok(Json(svc.crop(id).await?))
}

async fn authenticate<L: LedgerClient>(
    State(svc): Shared<L>,
    Path(id): Path<String>,
    bytes: Bytes,
) -> LedgerResult<Authenticity> {
    let id: CropId = number(id, "crop ID")?;
    Ok(Json(svc.authenticate(id, body(&bytes)?).await?))
}

async fn transfer_crop<L: LedgerClient>(
    State(svc): Shared<L>,
    Path(id): Path<String>,
    bytes: Bytes,
) -> LedgerResult<CropTransferred> {
    let id: CropId = number(id, "crop ID")?;
    Ok(Json(svc.transfer_crop(id, body(&bytes)?).await?))
}

async fn next_crop_id<L: LedgerClient>(State(svc): Shared<L>) -> LedgerResult<NextCropId> {
    Ok(Json(svc.next_crop_id().await?))
}

async fn crops_by_owner<L: LedgerClient>(
    State(svc): Shared<L>,
    Path(address): Path<String>,
    Query(query): Query<OwnerQuery>,
) -> LedgerResult<OwnerCrops> {
    let limit = query.limit.map(|raw| number(raw, "limit")).transpose()?;
    Ok(Json(svc.crops_by_owner(&address, limit).await?))
}
