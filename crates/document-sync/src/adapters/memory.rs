//! In-Memory Ledger Adapter
//!
//! Implements both `LedgerService` and `IndexQueryService` over a local
//! transaction log for tests and offline development. Mining is either
//! automatic (every accepted submission lands in its own block) or manual via
//! [`InMemoryLedger::mine_pending`], which is how tests model the gap between
//! "submitted" and "mined". Only mined transactions are visible to the index.

use async_trait::async_trait;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

use crate::domain::{
    BlockInfo, ConfirmationInfo, IndexEdge, IndexPage, IndexQuery, LedgerError, SubmitReceipt,
    Tag, TransactionId, TransactionMetadata, TransactionStatus,
};
use crate::ports::outbound::{IndexQueryService, LedgerService};

/// Timestamp of block 1.
const GENESIS_TIMESTAMP: u64 = 1_700_000_000;

/// Seconds between simulated blocks.
const BLOCK_INTERVAL_SECS: u64 = 120;

struct StoredTransaction {
    id: TransactionId,
    owner: String,
    tags: Vec<Tag>,
    data: Vec<u8>,
    block_height: Option<u64>,
}

#[derive(Default)]
struct LedgerState {
    /// Submission order; the position doubles as the index cursor.
    transactions: Vec<StoredTransaction>,
    positions: HashMap<TransactionId, usize>,
    /// `blocks[h - 1]` is the block at height `h`.
    blocks: Vec<BlockInfo>,
    sequence: u64,
    auto_mine: bool,
    reject_status: Option<u16>,
    fail_status_checks: bool,
}

impl LedgerState {
    fn store(&mut self, owner: &str, payload: Vec<u8>, tags: Vec<Tag>) -> usize {
        self.sequence += 1;
        let mut seed = self.sequence.to_be_bytes().to_vec();
        seed.extend_from_slice(owner.as_bytes());
        seed.extend_from_slice(&payload);
        let id = derive_id(&seed);

        let position = self.transactions.len();
        self.positions.insert(id.clone(), position);
        self.transactions.push(StoredTransaction {
            id,
            owner: owner.to_string(),
            tags,
            data: payload,
            block_height: None,
        });
        position
    }

    fn mine(&mut self, positions: &[usize]) -> Option<BlockInfo> {
        if positions.is_empty() {
            return None;
        }
        let height = self.blocks.len() as u64 + 1;
        let block = BlockInfo {
            hash: derive_id(format!("block-{height}").as_bytes()),
            height,
            timestamp: GENESIS_TIMESTAMP + height * BLOCK_INTERVAL_SECS,
        };
        for &position in positions {
            self.transactions[position].block_height = Some(height);
        }
        self.blocks.push(block.clone());
        Some(block)
    }

    fn tip_height(&self) -> u64 {
        self.blocks.len() as u64
    }

    fn lookup(&self, transaction_id: &str) -> Option<&StoredTransaction> {
        self.positions
            .get(transaction_id)
            .map(|&position| &self.transactions[position])
    }
}

fn derive_id(seed: &[u8]) -> String {
    hex::encode(Sha256::digest(seed))
}

/// Local ledger + index for tests and development.
pub struct InMemoryLedger {
    owner: String,
    signing: bool,
    page_limit: usize,
    state: RwLock<LedgerState>,
    submissions: AtomicUsize,
    status_checks: AtomicUsize,
    index_queries: AtomicUsize,
    data_fetches: AtomicUsize,
}

impl InMemoryLedger {
    /// Ledger signing as `owner`, mining every submission immediately.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            signing: true,
            page_limit: 100,
            state: RwLock::new(LedgerState {
                auto_mine: true,
                ..LedgerState::default()
            }),
            submissions: AtomicUsize::new(0),
            status_checks: AtomicUsize::new(0),
            index_queries: AtomicUsize::new(0),
            data_fetches: AtomicUsize::new(0),
        }
    }

    /// Ledger without a signing key.
    pub fn read_only(owner: impl Into<String>) -> Self {
        Self {
            signing: false,
            ..Self::new(owner)
        }
    }

    /// Mine on submission (`true`) or only on [`Self::mine_pending`].
    pub fn with_auto_mine(mut self, auto_mine: bool) -> Self {
        self.state.get_mut().auto_mine = auto_mine;
        self
    }

    /// Cap on edges per index page.
    pub fn with_page_limit(mut self, page_limit: usize) -> Self {
        self.page_limit = page_limit.max(1);
        self
    }

    /// Address that signs submissions.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Answer subsequent submissions with `status` (None restores acceptance).
    pub fn reject_submissions(&self, status: Option<u16>) {
        self.state.write().reject_status = status;
    }

    /// Make status checks fail with a network error.
    pub fn fail_status_checks(&self, fail: bool) {
        self.state.write().fail_status_checks = fail;
    }

    /// Store a transaction directly, bypassing signing (e.g. foreign owners).
    pub fn inject_transaction(
        &self,
        owner: &str,
        payload: Vec<u8>,
        tags: Vec<Tag>,
        mined: bool,
    ) -> TransactionId {
        let mut state = self.state.write();
        let position = state.store(owner, payload, tags);
        if mined {
            state.mine(&[position]);
        }
        state.transactions[position].id.clone()
    }

    /// Mine every pending transaction into one new block.
    pub fn mine_pending(&self) -> Option<BlockInfo> {
        let mut state = self.state.write();
        let pending: Vec<usize> = state
            .transactions
            .iter()
            .enumerate()
            .filter(|(_, tx)| tx.block_height.is_none())
            .map(|(position, _)| position)
            .collect();
        let block = state.mine(&pending);
        if let Some(block) = &block {
            debug!(
                "[doc-sync] Mined {} transactions at height {}",
                pending.len(),
                block.height
            );
        }
        block
    }

    /// Current block height.
    pub fn tip_height(&self) -> u64 {
        self.state.read().tip_height()
    }

    /// Transactions stored, mined or not.
    pub fn transaction_count(&self) -> usize {
        self.state.read().transactions.len()
    }

    /// Calls to `submit_transaction`.
    pub fn submission_count(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    /// Calls to `get_transaction_status`.
    pub fn status_check_count(&self) -> usize {
        self.status_checks.load(Ordering::SeqCst)
    }

    /// Calls to `query`.
    pub fn index_query_count(&self) -> usize {
        self.index_queries.load(Ordering::SeqCst)
    }

    /// Calls to `get_transaction_data`.
    pub fn data_fetch_count(&self) -> usize {
        self.data_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerService for InMemoryLedger {
    fn has_signing_key(&self) -> bool {
        self.signing
    }

    async fn submit_transaction(
        &self,
        payload: Vec<u8>,
        tags: Vec<Tag>,
    ) -> Result<SubmitReceipt, LedgerError> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        if !self.signing {
            return Err(LedgerError::Unavailable("no signing key".to_string()));
        }

        let mut state = self.state.write();
        if let Some(status) = state.reject_status {
            return Ok(SubmitReceipt {
                transaction_id: derive_id(&payload),
                status,
            });
        }

        let position = state.store(&self.owner, payload, tags);
        if state.auto_mine {
            state.mine(&[position]);
        }
        Ok(SubmitReceipt {
            transaction_id: state.transactions[position].id.clone(),
            status: 200,
        })
    }

    async fn get_transaction_status(
        &self,
        transaction_id: &str,
    ) -> Result<TransactionStatus, LedgerError> {
        self.status_checks.fetch_add(1, Ordering::SeqCst);
        let state = self.state.read();
        if state.fail_status_checks {
            return Err(LedgerError::Network("connection reset".to_string()));
        }

        let Some(tx) = state.lookup(transaction_id) else {
            return Ok(TransactionStatus::not_found());
        };
        Ok(match tx.block_height {
            None => TransactionStatus::pending(),
            Some(height) => TransactionStatus::mined(ConfirmationInfo {
                block_hash: state.blocks[(height - 1) as usize].hash.clone(),
                height,
                confirmations: state.tip_height() - height + 1,
            }),
        })
    }

    async fn get_transaction_metadata(
        &self,
        transaction_id: &str,
    ) -> Result<TransactionMetadata, LedgerError> {
        let state = self.state.read();
        let tx = state
            .lookup(transaction_id)
            .ok_or_else(|| LedgerError::NotFound(transaction_id.to_string()))?;
        Ok(TransactionMetadata {
            owner: tx.owner.clone(),
            tags: tx.tags.clone(),
        })
    }

    async fn get_transaction_data(&self, transaction_id: &str) -> Result<Vec<u8>, LedgerError> {
        self.data_fetches.fetch_add(1, Ordering::SeqCst);
        let state = self.state.read();
        state
            .lookup(transaction_id)
            .map(|tx| tx.data.clone())
            .ok_or_else(|| LedgerError::NotFound(transaction_id.to_string()))
    }

    async fn get_block(&self, block_hash: &str) -> Result<BlockInfo, LedgerError> {
        let state = self.state.read();
        state
            .blocks
            .iter()
            .find(|block| block.hash == block_hash)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(block_hash.to_string()))
    }
}

#[async_trait]
impl IndexQueryService for InMemoryLedger {
    async fn query(&self, query: &IndexQuery) -> Result<IndexPage, LedgerError> {
        self.index_queries.fetch_add(1, Ordering::SeqCst);

        let start = match &query.cursor {
            None => usize::MAX,
            Some(cursor) => cursor
                .parse::<usize>()
                .map_err(|_| LedgerError::Unavailable(format!("malformed cursor '{cursor}'")))?,
        };
        let limit = query.first.min(self.page_limit);

        let state = self.state.read();
        // newest first: walk positions below the cursor in descending order
        let edges = state
            .transactions
            .iter()
            .enumerate()
            .rev()
            .filter(|(position, _)| *position < start)
            .filter(|(_, tx)| tx.block_height.is_some())
            .filter(|(_, tx)| {
                query
                    .owners
                    .as_ref()
                    .map_or(true, |owners| owners.iter().any(|o| *o == tx.owner))
            })
            .filter(|(_, tx)| query.filters.iter().all(|f| f.matches(&tx.tags)))
            .take(limit)
            .map(|(position, tx)| IndexEdge {
                transaction_id: tx.id.clone(),
                owner: tx.owner.clone(),
                tags: tx.tags.clone(),
                cursor: position.to_string(),
            })
            .collect();

        Ok(IndexPage { edges })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TagFilter;

    fn name_query(name: &str) -> IndexQuery {
        IndexQuery {
            filters: vec![TagFilter::exact("Document-Name", name)],
            owners: None,
            cursor: None,
            first: 100,
        }
    }

    #[tokio::test]
    async fn test_submit_auto_mines() {
        let ledger = InMemoryLedger::new("admin");
        let receipt = ledger
            .submit_transaction(b"payload".to_vec(), vec![Tag::new("Document-Name", "a")])
            .await
            .unwrap();

        assert!(receipt.is_accepted());
        assert_eq!(ledger.tip_height(), 1);
        let status = ledger.get_transaction_status(&receipt.transaction_id).await.unwrap();
        assert!(status.is_mined());
        let meta = ledger.get_transaction_metadata(&receipt.transaction_id).await.unwrap();
        assert_eq!(meta.owner, "admin");
    }

    #[tokio::test]
    async fn test_manual_mining_and_confirmations() {
        let ledger = InMemoryLedger::new("admin").with_auto_mine(false);
        let receipt = ledger.submit_transaction(vec![1], vec![]).await.unwrap();

        let status = ledger.get_transaction_status(&receipt.transaction_id).await.unwrap();
        assert_eq!(status, TransactionStatus::pending());

        let block = ledger.mine_pending().unwrap();
        ledger.inject_transaction("other", vec![2], vec![], true);

        let status = ledger.get_transaction_status(&receipt.transaction_id).await.unwrap();
        let info = status.confirmed.unwrap();
        assert_eq!(info.block_hash, block.hash);
        assert_eq!(info.confirmations, 2);
        assert_eq!(
            ledger.get_block(&block.hash).await.unwrap().timestamp,
            GENESIS_TIMESTAMP + BLOCK_INTERVAL_SECS
        );
        assert!(ledger.mine_pending().is_none());
    }

    #[tokio::test]
    async fn test_unknown_transaction() {
        let ledger = InMemoryLedger::new("admin");
        assert_eq!(
            ledger.get_transaction_status("nope").await.unwrap().status,
            404
        );
        assert!(matches!(
            ledger.get_transaction_data("nope").await,
            Err(LedgerError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_rejection_injection() {
        let ledger = InMemoryLedger::new("admin");
        ledger.reject_submissions(Some(400));
        let receipt = ledger.submit_transaction(vec![1], vec![]).await.unwrap();
        assert!(!receipt.is_accepted());
        assert_eq!(ledger.transaction_count(), 0);
    }

    #[tokio::test]
    async fn test_index_hides_pending_and_filters_owner() {
        let ledger = InMemoryLedger::new("admin");
        let tags = vec![Tag::new("Document-Name", "doc")];
        ledger.inject_transaction("admin", vec![], tags.clone(), true);
        ledger.inject_transaction("mallory", vec![], tags.clone(), true);
        ledger.inject_transaction("admin", vec![], tags, false);

        let page = ledger.query(&name_query("doc")).await.unwrap();
        assert_eq!(page.edges.len(), 2);

        let mut restricted = name_query("doc");
        restricted.owners = Some(vec!["admin".to_string()]);
        let page = ledger.query(&restricted).await.unwrap();
        assert_eq!(page.edges.len(), 1);
        assert_eq!(page.edges[0].owner, "admin");
    }

    #[tokio::test]
    async fn test_index_cursor_walks_newest_first() {
        let ledger = InMemoryLedger::new("admin").with_page_limit(2);
        let ids: Vec<TransactionId> = (0..3)
            .map(|_| {
                ledger.inject_transaction("admin", vec![], vec![Tag::new("Document-Name", "d")], true)
            })
            .collect();

        let first = ledger.query(&name_query("d")).await.unwrap();
        assert_eq!(first.edges[0].transaction_id, ids[2]);
        assert_eq!(first.edges[1].transaction_id, ids[1]);

        let mut next = name_query("d");
        next.cursor = Some(first.edges[1].cursor.clone());
        let second = ledger.query(&next).await.unwrap();
        assert_eq!(second.edges.len(), 1);
        assert_eq!(second.edges[0].transaction_id, ids[0]);
    }
}
