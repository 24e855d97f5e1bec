use serde::{Deserialize, Serialize};

use super::{BatchId, ConsumerId, FarmerId};

pub type OrderId = String;
pub type RatingId = String;

/// Inclusive bounds for a rating score.
pub const MIN_RATING: f64 = 0.0;
pub const MAX_RATING: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(OrderStatus::Pending),
            "confirmed" => Some(OrderStatus::Confirmed),
            "shipped" => Some(OrderStatus::Shipped),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" | "canceled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A movement of (part of) a batch between two parties.
///
/// `order_from` and `receiver` name the role of each party (`Farmer`,
/// `Aggregator`, ...) and are kept exactly as submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub order_from: String,
    pub from_id: String,
    pub receiver: String,
    pub receiver_id: String,
    pub batch_id: BatchId,
    pub quantity: f64,
    pub price: f64,
    pub status: OrderStatus,
}

/// A consumer's score for a farmer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub rating_id: RatingId,
    pub consumer_id: ConsumerId,
    pub farmer_id: FarmerId,
    pub rating: f64,
}

impl Rating {
    /// Returns true if `score` lies in the closed range [0, 5].
    /// NaN and infinities are never valid.
    pub fn is_valid_score(score: f64) -> bool {
        (MIN_RATING..=MAX_RATING).contains(&score)
    }
}
