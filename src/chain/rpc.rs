use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use ethers::providers::{Http, Middleware, PendingTransaction, Provider};
use ethers::types::{Address, BlockNumber, Bytes, H256, U256};
use tracing::debug;

use crate::domain::{CropId, CropToken};

use super::contract::CropToken as CropTokenContract;
use super::{LedgerClient, TxReceipt, to_u64};

/// How often a pending transaction is polled for its receipt.
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// [`LedgerClient`] backed by an Ethereum JSON-RPC node over HTTP.
pub struct RpcLedger {
    provider: Arc<Provider<Http>>,
    contract: CropTokenContract<Provider<Http>>,
}

impl RpcLedger {
    /// Build a client for the registry deployed at `contract_address`.
    /// No request is made until the first call.
    pub fn connect(rpc_url: &str, contract_address: Address) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .with_context(|| format!("Invalid RPC URL: {}", rpc_url))?
            .interval(RECEIPT_POLL_INTERVAL);
        let provider = Arc::new(provider);
        let contract = CropTokenContract::new(contract_address, provider.clone());
        Ok(Self { provider, contract })
    }

    pub async fn chain_id(&self) -> Result<u64> {
        let chain_id = self
            .provider
            .get_chainid()
            .await
            .context("Failed to query chain id")?;
        to_u64(chain_id, "chain id")
    }
}

impl LedgerClient for RpcLedger {
    fn contract_address(&self) -> Address {
        self.contract.address()
    }

    async fn block_number(&self) -> Result<u64> {
        let number = self
            .provider
            .get_block_number()
            .await
            .context("Failed to query block number")?;
        Ok(number.as_u64())
    }

    async fn is_registered(&self, user: Address) -> Result<bool> {
        self.contract
            .registered_users(user)
            .call()
            .await
            .context("registeredUsers call failed")
    }

    async fn next_crop_id(&self) -> Result<CropId> {
        let next_id = self
            .contract
            .next_id()
            .call()
            .await
            .context("nextId call failed")?;
        to_u64(next_id, "next crop id")
    }

    async fn crop(&self, id: CropId) -> Result<CropToken> {
        let (crop_id, metadata, owner) = self
            .contract
            .get_crop(U256::from(id))
            .call()
            .await
            .with_context(|| format!("getCrop({}) call failed", id))?;
        Ok(CropToken {
            id: to_u64(crop_id, "crop id")?,
            metadata,
            owner,
        })
    }

    async fn authenticate(
        &self,
        id: CropId,
        owner: Address,
        caller: Option<Address>,
    ) -> Result<bool> {
        let mut call = self.contract.authenticate(U256::from(id), owner);
        if let Some(from) = caller {
            call = call.from(from);
        }
        call.call()
            .await
            .with_context(|| format!("authenticate({}) call failed", id))
    }

    async fn pending_nonce(&self, account: Address) -> Result<U256> {
        self.provider
            .get_transaction_count(account, Some(BlockNumber::Pending.into()))
            .await
            .context("Failed to query transaction count")
    }

    async fn gas_price(&self) -> Result<U256> {
        self.provider
            .get_gas_price()
            .await
            .context("Failed to query gas price")
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<H256> {
        let pending = self
            .provider
            .send_raw_transaction(raw)
            .await
            .context("eth_sendRawTransaction failed")?;
        Ok(pending.tx_hash())
    }

    async fn wait_for_receipt(&self, tx_hash: H256) -> Result<TxReceipt> {
        debug!(tx_hash = ?tx_hash, "Polling for receipt");
        let receipt = PendingTransaction::new(tx_hash, self.provider.as_ref())
            .await
            .context("Failed while waiting for receipt")?
            .ok_or_else(|| anyhow!("Transaction {:?} was dropped from the mempool", tx_hash))?;

        Ok(TxReceipt {
            tx_hash: receipt.transaction_hash,
            gas_used: receipt
                .gas_used
                .map(|gas| to_u64(gas, "gas used"))
                .transpose()?
                .unwrap_or_default(),
            block_number: receipt
                .block_number
                .map(|number| number.as_u64())
                .unwrap_or_default(),
            // Pre-Byzantium receipts carry no status
            succeeded: receipt.status.is_none_or(|status| status.as_u64() == 1),
        })
    }
}
