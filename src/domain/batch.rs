use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use super::FarmerId;

pub type BatchId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchStatus {
    /// Harvested and registered by the farmer
    Created,
    /// Quality inspection recorded
    Inspected,
    InTransit,
    Delivered,
    Rejected,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Created => "Created",
            BatchStatus::Inspected => "Inspected",
            BatchStatus::InTransit => "InTransit",
            BatchStatus::Delivered => "Delivered",
            BatchStatus::Rejected => "Rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['_', ' ', '-'], "").as_str() {
            "created" => Some(BatchStatus::Created),
            "inspected" => Some(BatchStatus::Inspected),
            "intransit" => Some(BatchStatus::InTransit),
            "delivered" => Some(BatchStatus::Delivered),
            "rejected" => Some(BatchStatus::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A harvested lot of produce owned by one farmer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub batch_id: BatchId,
    #[serde(rename = "type")]
    pub batch_type: String,
    /// Free-form location string, usually "lat,lon"
    pub geotag: String,
    pub farmer_id: FarmerId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: BatchStatus,
}

impl Batch {
    /// Create a batch stamped with the given creation instant.
    pub fn new(
        batch_id: impl Into<String>,
        batch_type: impl Into<String>,
        geotag: impl Into<String>,
        farmer_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            batch_id: batch_id.into(),
            batch_type: batch_type.into(),
            geotag: geotag.into(),
            farmer_id: farmer_id.into(),
            date: created_at.date_naive(),
            time: created_at.time().with_nanosecond(0).unwrap_or(created_at.time()),
            status: BatchStatus::Created,
        }
    }
}

/// Quality inspection of a batch. Recorded by inspectors outside this service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inspection {
    pub inspection_id: String,
    pub batch_id: BatchId,
    pub inspector: String,
    pub grade: String,
    pub remarks: String,
    pub inspected_at: String,
}
