use axum::Json;
use axum::body::Bytes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{error, warn};

use crate::application::{LedgerError, RecordError};

/// Decode a JSON request body. An empty body or `null` yields `T::default()`,
/// so absent fields are reported by the service as missing, not as a decode error.
pub fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    let parsed: Option<T> = serde_json::from_slice(body)?;
    Ok(parsed.unwrap_or_default())
}

impl RecordError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RecordError::MissingField(_)
            | RecordError::InvalidRating(_)
            | RecordError::InvalidStatus { .. }
            | RecordError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            RecordError::NotFound { .. } => StatusCode::NOT_FOUND,
            RecordError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RecordError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = ?self, "Record store request failed");
        } else {
            warn!(error = %self, "Record store request rejected");
        }
        let body = json!({ "success": false, "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

impl LedgerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            LedgerError::NotOwner => StatusCode::FORBIDDEN,
            e if e.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Ledger request failed");
        } else {
            warn!(error = %self, "Ledger request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
