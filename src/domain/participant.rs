use serde::{Deserialize, Serialize};

use super::KycId;

pub type FarmerId = String;
pub type ConsumerId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Farmer {
    pub farmer_id: FarmerId,
    pub name: String,
    pub location: String,
    pub contact_number: String,
    pub kyc_id: KycId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consumer {
    pub consumer_id: ConsumerId,
    pub consumer_name: String,
    /// Free text, `Pending` unless the creator supplied something else
    pub verification: String,
}

/// Collects produce from farmers. Provisioned outside this service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregator {
    pub aggregator_id: String,
    pub name: String,
    pub location: String,
    pub contact_number: String,
}

/// Processes aggregated produce. Provisioned outside this service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manufacturer {
    pub manufacturer_id: String,
    pub name: String,
    pub location: String,
    pub contact_number: String,
}
