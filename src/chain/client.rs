use std::future::Future;

use anyhow::Result;
use ethers::types::{Address, Bytes, H256, U256};

use crate::domain::{CropId, CropToken};

/// What the ledger reports once a transaction is included in a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: H256,
    pub gas_used: u64,
    pub block_number: u64,
    /// False when the transaction was mined but its execution reverted
    pub succeeded: bool,
}

/// Primitives the crop gateway needs from the ledger: contract reads,
/// account state for signing, raw submission and receipt polling.
///
/// Implementations are shared across request handlers, so every returned
/// future must be `Send`.
pub trait LedgerClient: Send + Sync + 'static {
    /// Address of the deployed crop registry contract.
    fn contract_address(&self) -> Address;

    fn block_number(&self) -> impl Future<Output = Result<u64>> + Send;

    fn is_registered(&self, user: Address) -> impl Future<Output = Result<bool>> + Send;

    /// The id the next minted crop will receive.
    fn next_crop_id(&self) -> impl Future<Output = Result<CropId>> + Send;

    fn crop(&self, id: CropId) -> impl Future<Output = Result<CropToken>> + Send;

    /// Ask the contract whether `owner` currently owns crop `id`.
    /// `caller` is used as the `from` of the read call when given.
    fn authenticate(
        &self,
        id: CropId,
        owner: Address,
        caller: Option<Address>,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Next nonce for `account`, counting transactions still in the mempool.
    fn pending_nonce(&self, account: Address) -> impl Future<Output = Result<U256>> + Send;

    fn gas_price(&self) -> impl Future<Output = Result<U256>> + Send;

    /// Broadcast a signed, RLP-encoded transaction and return its hash.
    fn send_raw_transaction(&self, raw: Bytes) -> impl Future<Output = Result<H256>> + Send;

    /// Resolve once the transaction is mined. Callers impose their own deadline.
    fn wait_for_receipt(&self, tx_hash: H256) -> impl Future<Output = Result<TxReceipt>> + Send;
}

/// Narrow a ledger integer to `u64`, failing instead of truncating.
pub fn to_u64(value: U256, what: &str) -> Result<u64> {
    if value.bits() > 64 {
        anyhow::bail!("{} does not fit in 64 bits: {}", what, value);
    }
    Ok(value.as_u64())
}
