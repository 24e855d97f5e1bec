use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type KycId = String;

/// Outcome of an identity check. Shared by KYC records and consumers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationStatus {
    #[default]
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "Pending",
            VerificationStatus::Verified => "Verified",
            VerificationStatus::Rejected => "Rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(VerificationStatus::Pending),
            "verified" => Some(VerificationStatus::Verified),
            "rejected" => Some(VerificationStatus::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An identity verification (KYC) record. Farmers reference one by `kyc_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub kyc_id: KycId,
    pub document_number: String,
    pub verification_status: VerificationStatus,
    /// Stamped on creation and again on every status change
    pub verified_at: Option<DateTime<Utc>>,
}

impl IdentityRecord {
    pub fn new(
        kyc_id: impl Into<String>,
        document_number: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kyc_id: kyc_id.into(),
            document_number: document_number.into(),
            verification_status: VerificationStatus::Pending,
            verified_at: Some(created_at),
        }
    }

    pub fn is_verified(&self) -> bool {
        self.verification_status == VerificationStatus::Verified
    }
}
