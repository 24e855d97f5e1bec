// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use cropchain::application::{CropService, RecordService};
use cropchain::chain::contract::CropTokenCalls;
use cropchain::chain::{LedgerClient, TxReceipt};
use cropchain::domain::{CropId, CropToken};
use ethers::abi::AbiDecode;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, H256, U256};
use ethers::utils::keccak256;
use ethers::utils::rlp::Rlp;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Row, SqlitePool};
use tempfile::TempDir;

/// First account of the local development chain.
pub const DEV_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const DEV_CHAIN_ID: u64 = 31337;
pub const CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

/// Other well-known development accounts, used as plain addresses.
pub const ALICE: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
pub const BOB: &str = "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC";

/// Helper to create a record service with a temporary database
pub async fn test_service() -> Result<(RecordService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = RecordService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Open a second pool on the test database, configured like the service's.
async fn database_pool(temp: &TempDir) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(temp.path().join("test.db"))
        .foreign_keys(false);
    Ok(SqlitePool::connect_with(options).await?)
}

/// Insert rows the service has no write path for.
pub async fn seed(temp: &TempDir, sql: &str) -> Result<()> {
    let pool = database_pool(temp).await?;
    sqlx::query(sql).execute(&pool).await?;
    pool.close().await;
    Ok(())
}

pub async fn count_rows(temp: &TempDir, table: &str) -> Result<i64> {
    let pool = database_pool(temp).await?;
    let row = sqlx::query(&format!("SELECT COUNT(*) AS count FROM {}", table))
        .fetch_one(&pool)
        .await?;
    pool.close().await;
    Ok(row.get("count"))
}

pub fn dev_wallet() -> LocalWallet {
    DEV_KEY
        .parse::<LocalWallet>()
        .unwrap()
        .with_chain_id(DEV_CHAIN_ID)
}

pub fn address(raw: &str) -> Address {
    raw.parse().unwrap()
}

/// Crop service over a fresh mock ledger, signing with the dev key.
pub fn crop_service() -> (CropService<MockLedger>, MockLedger) {
    let ledger = MockLedger::new();
    let service = CropService::new(ledger.clone(), Some(dev_wallet()))
        .with_confirmation_timeout(Duration::from_millis(200));
    (service, ledger)
}

/// Crop service with no signing credential.
pub fn read_only_crop_service() -> (CropService<MockLedger>, MockLedger) {
    let ledger = MockLedger::new();
    let service = CropService::new(ledger.clone(), None);
    (service, ledger)
}

/// A transaction accepted by [`MockLedger`].
#[derive(Debug, Clone)]
pub struct SubmittedTx {
    pub hash: H256,
    pub sender: Address,
    pub nonce: U256,
    pub gas: U256,
    pub chain_id: Option<u64>,
    pub call: CropTokenCalls,
}

#[derive(Default)]
struct State {
    registered: HashSet<Address>,
    crops: Vec<(String, Address)>,
    nonces: HashMap<Address, u64>,
    block: u64,
    receipts: HashMap<H256, TxReceipt>,
    submitted: Vec<SubmittedTx>,
    unreadable: HashSet<CropId>,
    fail_reads: bool,
    reject_submissions: bool,
    stall_receipts: bool,
    fail_receipts: bool,
}

/// In-memory crop registry that executes signed raw transactions the way
/// the deployed contract would.
#[derive(Clone, Default)]
pub struct MockLedger {
    state: Arc<Mutex<State>>,
}

impl MockLedger {
    pub fn new() -> Self {
        let ledger = Self::default();
        ledger.with_state(|s| s.block = 1);
        ledger
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    fn check_reads(&self) -> Result<()> {
        if self.with_state(|s| s.fail_reads) {
            bail!("connection refused");
        }
        Ok(())
    }

    /// Mark an address as registered without a transaction.
    pub fn register(&self, user: Address) {
        self.with_state(|s| s.registered.insert(user));
    }

    /// Mint a crop directly, returning its id.
    pub fn mint(&self, metadata: &str, owner: Address) -> CropId {
        self.with_state(|s| {
            s.crops.push((metadata.to_string(), owner));
            (s.crops.len() - 1) as CropId
        })
    }

    pub fn owner_of(&self, id: CropId) -> Option<Address> {
        self.with_state(|s| s.crops.get(id as usize).map(|(_, owner)| *owner))
    }

    pub fn submitted(&self) -> Vec<SubmittedTx> {
        self.with_state(|s| s.submitted.clone())
    }

    pub fn fail_reads(&self, fail: bool) {
        self.with_state(|s| s.fail_reads = fail);
    }

    pub fn make_unreadable(&self, id: CropId) {
        self.with_state(|s| s.unreadable.insert(id));
    }

    pub fn reject_submissions(&self, reject: bool) {
        self.with_state(|s| s.reject_submissions = reject);
    }

    pub fn stall_receipts(&self, stall: bool) {
        self.with_state(|s| s.stall_receipts = stall);
    }

    pub fn fail_receipts(&self, fail: bool) {
        self.with_state(|s| s.fail_receipts = fail);
    }
}

impl State {
    /// Execute a call on behalf of `sender`; false means the contract reverted.
    fn execute(&mut self, sender: Address, call: &CropTokenCalls) -> bool {
        match call {
            CropTokenCalls::RegisterUser(_) => self.registered.insert(sender),
            CropTokenCalls::CreateCrop(create) => {
                if !self.registered.contains(&sender) {
                    return false;
                }
                self.crops.push((create.metadata.clone(), sender));
                true
            }
            CropTokenCalls::TransferCrop(transfer) => {
                let id = transfer.id.as_usize();
                if !self.registered.contains(&transfer.to) {
                    return false;
                }
                match self.crops.get_mut(id) {
                    Some((_, owner)) if *owner == sender => {
                        *owner = transfer.to;
                        true
                    }
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

impl LedgerClient for MockLedger {
    fn contract_address(&self) -> Address {
        address(CONTRACT)
    }

    async fn block_number(&self) -> Result<u64> {
        self.check_reads()?;
        Ok(self.with_state(|s| s.block))
    }

    async fn is_registered(&self, user: Address) -> Result<bool> {
        self.check_reads()?;
        Ok(self.with_state(|s| s.registered.contains(&user)))
    }

    async fn next_crop_id(&self) -> Result<CropId> {
        self.check_reads()?;
        Ok(self.with_state(|s| s.crops.len() as CropId))
    }

    async fn crop(&self, id: CropId) -> Result<CropToken> {
        self.check_reads()?;
        self.with_state(|s| {
            if s.unreadable.contains(&id) {
                bail!("getCrop({}) reverted", id);
            }
            Ok(match s.crops.get(id as usize) {
                Some((metadata, owner)) => CropToken {
                    id,
                    metadata: metadata.clone(),
                    owner: *owner,
                },
                None => CropToken {
                    id: 0,
                    metadata: String::new(),
                    owner: Address::zero(),
                },
            })
        })
    }

    async fn authenticate(
        &self,
        id: CropId,
        owner: Address,
        _caller: Option<Address>,
    ) -> Result<bool> {
        self.check_reads()?;
        Ok(self.with_state(|s| {
            s.crops
                .get(id as usize)
                .is_some_and(|(_, current)| *current == owner)
        }))
    }

    async fn pending_nonce(&self, account: Address) -> Result<U256> {
        self.check_reads()?;
        Ok(self.with_state(|s| U256::from(s.nonces.get(&account).copied().unwrap_or(0))))
    }

    async fn gas_price(&self) -> Result<U256> {
        self.check_reads()?;
        Ok(U256::from(1_000_000_000u64))
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<H256> {
        // Let other submissions interleave here if they are not serialized
        tokio::task::yield_now().await;

        let (tx, signature) = TypedTransaction::decode_signed(&Rlp::new(&raw))
            .map_err(|e| anyhow!("undecodable transaction: {}", e))?;
        let sender = signature.recover(tx.sighash())?;
        let data = tx.data().cloned().unwrap_or_default();
        let call = CropTokenCalls::decode(&data)?;
        let nonce = tx.nonce().copied().unwrap_or_default();
        let hash = H256::from(keccak256(&raw));

        self.with_state(|s| {
            if s.reject_submissions {
                bail!("insufficient funds for gas * price + value");
            }
            let expected = s.nonces.get(&sender).copied().unwrap_or(0);
            if nonce != U256::from(expected) {
                bail!("nonce too low: expected {}, got {}", expected, nonce);
            }
            s.nonces.insert(sender, expected + 1);

            let succeeded = s.execute(sender, &call);
            s.block += 1;
            s.receipts.insert(
                hash,
                TxReceipt {
                    tx_hash: hash,
                    gas_used: 21_000,
                    block_number: s.block,
                    succeeded,
                },
            );
            s.submitted.push(SubmittedTx {
                hash,
                sender,
                nonce,
                gas: tx.gas().copied().unwrap_or_default(),
                chain_id: tx.chain_id().map(|id| id.as_u64()),
                call,
            });
            Ok(hash)
        })
    }

    async fn wait_for_receipt(&self, tx_hash: H256) -> Result<TxReceipt> {
        if self.with_state(|s| s.stall_receipts) {
            std::future::pending::<()>().await;
        }
        if self.with_state(|s| s.fail_receipts) {
            bail!("receipt lookup for {:?} failed: connection reset", tx_hash);
        }
        self.with_state(|s| s.receipts.get(&tx_hash).cloned())
            .ok_or_else(|| anyhow!("unknown transaction {:?}", tx_hash))
    }
}
