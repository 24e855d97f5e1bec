use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use ethers::abi::AbiEncode;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, TransactionRequest, U256};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::chain::contract::{CreateCropCall, CropTokenCalls, RegisterUserCall, TransferCropCall};
use crate::chain::{LedgerClient, TxReceipt, checksummed, parse_address};
use crate::domain::CropId;

use super::LedgerError;

/// Gas limit attached to every submitted transaction.
pub const GAS_LIMIT: u64 = 3_000_000;

/// How long to wait for a receipt before giving up.
pub const CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Default and maximum number of crop ids scanned by owner enumeration.
pub const DEFAULT_SCAN_LIMIT: u64 = 100;
pub const MAX_SCAN_LIMIT: u64 = 1000;

// ========================
// Request bodies
// ========================

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RegisterUserRequest {
    pub user_address: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct CreateCropRequest {
    pub metadata: Option<String>,
    pub owner_address: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct AuthenticateRequest {
    pub owner_address: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct TransferCropRequest {
    pub to_address: Option<String>,
    pub from_address: Option<String>,
}

// ========================
// Responses
// ========================

/// A confirmed transaction.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionOutcome {
    pub success: bool,
    pub tx_hash: String,
    pub gas_used: u64,
    pub block_number: u64,
}

impl From<&TxReceipt> for TransactionOutcome {
    fn from(receipt: &TxReceipt) -> Self {
        Self {
            success: true,
            tx_hash: format!("{:?}", receipt.tx_hash),
            gas_used: receipt.gas_used,
            block_number: receipt.block_number,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserRegistered {
    #[serde(flatten)]
    pub outcome: TransactionOutcome,
    pub user_address: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CropCreated {
    #[serde(flatten)]
    pub outcome: TransactionOutcome,
    pub crop_id: CropId,
    pub metadata: String,
    pub owner: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CropTransferred {
    #[serde(flatten)]
    pub outcome: TransactionOutcome,
    pub crop_id: CropId,
    pub from_address: String,
    pub to_address: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserStatus {
    pub address: String,
    pub is_registered: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CropView {
    pub id: CropId,
    pub metadata: String,
    pub owner: String,
    pub exists: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Authenticity {
    pub crop_id: CropId,
    pub owner_address: String,
    pub is_authentic: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NextCropId {
    pub next_id: CropId,
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnedCrop {
    pub id: CropId,
    pub metadata: String,
    pub owner: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnerCrops {
    pub owner: String,
    pub crops: Vec<OwnedCrop>,
    pub total_found: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub api_version: &'static str,
    pub blockchain_connected: bool,
    pub latest_block: u64,
    pub contract_address: String,
    pub timestamp: String,
}

// ========================
// Service
// ========================

/// Gateway to the crop registry contract.
///
/// Reads go straight to the ledger. Writes run a fixed pipeline: validate
/// addresses, check preconditions with read calls, then build, sign and
/// broadcast a transaction and wait for its receipt.
pub struct CropService<L> {
    ledger: L,
    signer: Option<LocalWallet>,
    confirmation_timeout: Duration,
    /// Held from nonce lookup until the node accepts the transaction, so two
    /// requests never sign with the same nonce.
    submission: Mutex<()>,
}

impl<L: LedgerClient> CropService<L> {
    /// `signer` must already carry the ledger's chain id. Without one the
    /// service is read-only and writes fail with [`LedgerError::NoCredential`].
    pub fn new(ledger: L, signer: Option<LocalWallet>) -> Self {
        Self {
            ledger,
            signer,
            confirmation_timeout: CONFIRMATION_TIMEOUT,
            submission: Mutex::new(()),
        }
    }

    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Address of the configured credential, used when a request omits one.
    pub fn default_address(&self) -> Option<Address> {
        self.signer.as_ref().map(|signer| signer.address())
    }

    pub async fn health(&self) -> Result<Health, LedgerError> {
        let latest_block = self
            .ledger
            .block_number()
            .await
            .map_err(LedgerError::query("query latest block"))?;

        Ok(Health {
            status: "healthy",
            api_version: env!("CARGO_PKG_VERSION"),
            blockchain_connected: true,
            latest_block,
            contract_address: checksummed(&self.ledger.contract_address()),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        })
    }

    // ========================
    // Users
    // ========================

    pub async fn register_user(
        &self,
        req: RegisterUserRequest,
    ) -> Result<UserRegistered, LedgerError> {
        let user = self.resolve_address(req.user_address, "User address", "address")?;

        let registered = self
            .ledger
            .is_registered(user)
            .await
            .map_err(LedgerError::query("check registration status"))?;
        if registered {
            return Err(LedgerError::AlreadyRegistered);
        }

        let receipt = self
            .submit(CropTokenCalls::RegisterUser(RegisterUserCall))
            .await?;

        Ok(UserRegistered {
            outcome: TransactionOutcome::from(&receipt),
            user_address: checksummed(&user),
        })
    }

    pub async fn user_status(&self, address: &str) -> Result<UserStatus, LedgerError> {
        let user = parse_address(address).ok_or(LedgerError::InvalidAddress("address"))?;

        let is_registered = self
            .ledger
            .is_registered(user)
            .await
            .map_err(LedgerError::query("check registration"))?;

        Ok(UserStatus {
            address: checksummed(&user),
            is_registered,
        })
    }

    // ========================
    // Crops
    // ========================

    pub async fn create_crop(&self, req: CreateCropRequest) -> Result<CropCreated, LedgerError> {
        let metadata = req.metadata.ok_or(LedgerError::MissingField("Metadata"))?;
        let owner = self.resolve_address(req.owner_address, "Owner address", "owner address")?;

        let registered = self
            .ledger
            .is_registered(owner)
            .await
            .map_err(LedgerError::query("check registration"))?;
        if !registered {
            return Err(LedgerError::NotRegistered);
        }

        let crop_id = self
            .ledger
            .next_crop_id()
            .await
            .map_err(LedgerError::query("get next ID"))?;

        let receipt = self
            .submit(CropTokenCalls::CreateCrop(CreateCropCall {
                metadata: metadata.clone(),
            }))
            .await?;

        Ok(CropCreated {
            outcome: TransactionOutcome::from(&receipt),
            crop_id,
            metadata,
            owner: checksummed(&owner),
        })
    }

    pub async fn crop(&self, id: CropId) -> Result<CropView, LedgerError> {
        let token = self
            .ledger
            .crop(id)
            .await
            .map_err(LedgerError::query("get crop"))?;

        Ok(CropView {
            id: token.id,
            exists: token.exists(),
            owner: checksummed(&token.owner),
            metadata: token.metadata,
        })
    }

    pub async fn authenticate(
        &self,
        id: CropId,
        req: AuthenticateRequest,
    ) -> Result<Authenticity, LedgerError> {
        let raw = req
            .owner_address
            .ok_or(LedgerError::MissingField("Owner address"))?;
        let owner = parse_address(&raw).ok_or(LedgerError::InvalidAddress("owner address"))?;

        let is_authentic = self
            .ledger
            .authenticate(id, owner, self.default_address())
            .await
            .map_err(LedgerError::query("authenticate crop"))?;

        Ok(Authenticity {
            crop_id: id,
            owner_address: checksummed(&owner),
            is_authentic,
        })
    }

    pub async fn transfer_crop(
        &self,
        id: CropId,
        req: TransferCropRequest,
    ) -> Result<CropTransferred, LedgerError> {
        let raw_to = req
            .to_address
            .ok_or(LedgerError::MissingField("Recipient address"))?;
        let to = parse_address(&raw_to).ok_or(LedgerError::InvalidAddress("recipient address"))?;
        let from = self.resolve_address(req.from_address, "Sender address", "sender address")?;

        let recipient_registered = self
            .ledger
            .is_registered(to)
            .await
            .map_err(LedgerError::query("check recipient registration"))?;
        if !recipient_registered {
            return Err(LedgerError::RecipientNotRegistered);
        }

        let token = self
            .ledger
            .crop(id)
            .await
            .map_err(LedgerError::query("verify ownership"))?;
        if token.owner != from {
            warn!(crop_id = id, from = ?from, owner = ?token.owner, "Transfer rejected: not owner");
            return Err(LedgerError::NotOwner);
        }

        let receipt = self
            .submit(CropTokenCalls::TransferCrop(TransferCropCall {
                id: U256::from(id),
                to,
            }))
            .await?;

        Ok(CropTransferred {
            outcome: TransactionOutcome::from(&receipt),
            crop_id: id,
            from_address: checksummed(&from),
            to_address: checksummed(&to),
        })
    }

    pub async fn next_crop_id(&self) -> Result<NextCropId, LedgerError> {
        let next_id = self
            .ledger
            .next_crop_id()
            .await
            .map_err(LedgerError::query("get next ID"))?;
        Ok(NextCropId { next_id })
    }

    /// Scan crop ids `0..min(next_id, limit)` and keep those owned by `address`.
    ///
    /// One ledger read per id; ids whose lookup fails are skipped. `limit`
    /// defaults to [`DEFAULT_SCAN_LIMIT`] and is capped at [`MAX_SCAN_LIMIT`].
    pub async fn crops_by_owner(
        &self,
        address: &str,
        limit: Option<u64>,
    ) -> Result<OwnerCrops, LedgerError> {
        let owner = parse_address(address).ok_or(LedgerError::InvalidAddress("address"))?;
        let limit = limit.unwrap_or(DEFAULT_SCAN_LIMIT).min(MAX_SCAN_LIMIT);

        let mut crops = Vec::new();
        if limit > 0 {
            let next_id = self
                .ledger
                .next_crop_id()
                .await
                .map_err(LedgerError::query("get crops by owner"))?;

            for id in 0..next_id.min(limit) {
                match self.ledger.crop(id).await {
                    Ok(token) if token.is_owned_by(owner) => crops.push(OwnedCrop {
                        id: token.id,
                        owner: checksummed(&token.owner),
                        metadata: token.metadata,
                    }),
                    Ok(_) => {}
                    Err(e) => debug!(crop_id = id, error = %e, "Skipping unreadable crop"),
                }
            }
        }

        Ok(OwnerCrops {
            owner: checksummed(&owner),
            total_found: crops.len(),
            crops,
        })
    }

    // ========================
    // Transaction pipeline
    // ========================

    /// Parse an optional request address, falling back to the credential's address.
    fn resolve_address(
        &self,
        raw: Option<String>,
        missing: &'static str,
        label: &'static str,
    ) -> Result<Address, LedgerError> {
        match raw {
            Some(raw) => parse_address(&raw).ok_or(LedgerError::InvalidAddress(label)),
            None => self.default_address().ok_or(LedgerError::MissingField(missing)),
        }
    }

    /// Build, sign, broadcast and confirm a call to the registry contract.
    async fn submit(&self, call: CropTokenCalls) -> Result<TxReceipt, LedgerError> {
        let signer = self.signer.as_ref().ok_or(LedgerError::NoCredential)?;
        let from = signer.address();

        let tx_hash = {
            let _guard = self.submission.lock().await;

            let nonce = self
                .ledger
                .pending_nonce(from)
                .await
                .map_err(LedgerError::query("fetch account nonce"))?;
            let gas_price = self
                .ledger
                .gas_price()
                .await
                .map_err(LedgerError::query("fetch gas price"))?;

            let tx: TypedTransaction = TransactionRequest::new()
                .from(from)
                .to(self.ledger.contract_address())
                .data(call.encode())
                .gas(GAS_LIMIT)
                .gas_price(gas_price)
                .nonce(nonce)
                .chain_id(signer.chain_id())
                .into();
            debug!(?nonce, ?gas_price, "Transaction built");

            let signature = signer
                .sign_transaction(&tx)
                .await
                .map_err(|e| LedgerError::Signing(e.to_string()))?;
            let raw = tx.rlp_signed(&signature);

            self.ledger
                .send_raw_transaction(raw)
                .await
                .map_err(LedgerError::SubmissionFailed)?
        };
        info!(tx_hash = ?tx_hash, "Transaction sent");

        let receipt =
            match tokio::time::timeout(self.confirmation_timeout, self.ledger.wait_for_receipt(tx_hash))
                .await
            {
                Ok(Ok(receipt)) => receipt,
                Ok(Err(source)) => {
                    return Err(LedgerError::ConfirmationFailed { tx_hash, source });
                }
                Err(_) => {
                    return Err(LedgerError::ConfirmationTimeout {
                        tx_hash,
                        seconds: self.confirmation_timeout.as_secs(),
                    });
                }
            };

        if !receipt.succeeded {
            return Err(LedgerError::Reverted {
                tx_hash,
                block_number: receipt.block_number,
            });
        }

        info!(
            tx_hash = ?tx_hash,
            block_number = receipt.block_number,
            gas_used = receipt.gas_used,
            "Transaction confirmed"
        );
        Ok(receipt)
    }
}
