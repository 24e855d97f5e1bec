use ethers::types::H256;
use thiserror::Error;

/// Failures of the record store.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Rating must be between 0 and 5, got {0}")]
    InvalidRating(f64),

    #[error("Invalid {kind} status: {value}")]
    InvalidStatus { kind: &'static str, value: String },

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Database error: {0:#}")]
    Database(#[from] anyhow::Error),
}

/// Failures of the crop ledger gateway, one variant per pipeline gate.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Invalid {0} format")]
    InvalidAddress(&'static str),

    #[error("Invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: String },

    #[error("User already registered")]
    AlreadyRegistered,

    #[error("User must be registered first")]
    NotRegistered,

    #[error("Recipient must be registered")]
    RecipientNotRegistered,

    #[error("Only the owner can transfer this crop")]
    NotOwner,

    #[error("Private key not configured")]
    NoCredential,

    #[error("Failed to {action}: {source:#}")]
    Query {
        action: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to sign transaction: {0}")]
    Signing(String),

    #[error("Transaction submission failed: {0:#}")]
    SubmissionFailed(#[source] anyhow::Error),

    #[error("Transaction {tx_hash:?} not confirmed within {seconds}s")]
    ConfirmationTimeout { tx_hash: H256, seconds: u64 },

    #[error("Failed to confirm transaction {tx_hash:?}: {source:#}")]
    ConfirmationFailed {
        tx_hash: H256,
        #[source]
        source: anyhow::Error,
    },

    #[error("Transaction {tx_hash:?} reverted in block {block_number}")]
    Reverted { tx_hash: H256, block_number: u64 },
}

impl LedgerError {
    /// Wrap a failed read made while checking a precondition.
    pub fn query(action: &'static str) -> impl FnOnce(anyhow::Error) -> Self {
        move |source| LedgerError::Query { action, source }
    }

    /// True for rejections caused by the request rather than the ledger.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            LedgerError::MissingField(_)
                | LedgerError::InvalidBody(_)
                | LedgerError::InvalidAddress(_)
                | LedgerError::InvalidParameter { .. }
                | LedgerError::AlreadyRegistered
                | LedgerError::NotRegistered
                | LedgerError::RecipientNotRegistered
                | LedgerError::NotOwner
        )
    }
}
