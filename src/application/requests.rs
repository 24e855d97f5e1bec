//! Request bodies for record creation and status changes.
//!
//! Every field is optional at the serde level so that an absent field
//! surfaces as [`RecordError::MissingField`] naming it, rather than as a
//! generic decode failure. Fields marked "required" below are checked by
//! [`RecordService`](super::RecordService) before anything is written.

use serde::Deserialize;

use super::RecordError;

/// Unwrap a required field or report it by name.
pub fn required<T>(value: Option<T>, field: &'static str) -> Result<T, RecordError> {
    value.ok_or(RecordError::MissingField(field))
}

/// `POST /kyc`. Required: `kyc_id`, `document_number`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct NewKyc {
    pub kyc_id: Option<String>,
    pub document_number: Option<String>,
}

/// `POST /farmers`. Required: `farmer_id`, `name`, `kyc_id`.
/// `location` and `contact_number` default to "".
#[derive(Debug, Default, Clone, Deserialize)]
pub struct NewFarmer {
    pub farmer_id: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub contact_number: Option<String>,
    pub kyc_id: Option<String>,
}

/// `POST /consumers`. Required: `consumer_id`, `consumer_name`.
/// `verification` defaults to `Pending`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct NewConsumer {
    pub consumer_id: Option<String>,
    pub consumer_name: Option<String>,
    pub verification: Option<String>,
}

/// `POST /batches`. Required: `batch_id`, `type`, `farmer_id`.
/// `geotag` defaults to "". Date and time are stamped on insert.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct NewBatch {
    pub batch_id: Option<String>,
    #[serde(rename = "type")]
    pub batch_type: Option<String>,
    pub geotag: Option<String>,
    pub farmer_id: Option<String>,
}

/// `POST /orders`. Every field is required.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct NewOrder {
    pub order_id: Option<String>,
    pub order_from: Option<String>,
    pub from_id: Option<String>,
    pub receiver: Option<String>,
    pub receiver_id: Option<String>,
    pub batch_id: Option<String>,
    pub quantity: Option<f64>,
    pub price: Option<f64>,
}

/// `POST /ratings`. Every field is required; `rating` must lie in [0, 5].
#[derive(Debug, Default, Clone, Deserialize)]
pub struct NewRating {
    pub rating_id: Option<String>,
    pub consumer_id: Option<String>,
    pub farmer_id: Option<String>,
    pub rating: Option<f64>,
}

/// `PATCH /<entity>/{id}/status`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct StatusUpdate {
    pub status: Option<String>,
}
