//! # Outbound Ports
//!
//! Traits for external dependencies: the ledger gateway, the tag index and
//! the payload codec.

use async_trait::async_trait;

use crate::domain::{
    BlockInfo, DocumentSyncError, IndexPage, IndexQuery, LedgerError, SubmitReceipt, Tag,
    TransactionMetadata, TransactionStatus, WireRecord,
};

/// Ledger gateway - outbound port.
///
/// Transaction construction, signing and fees live behind this trait; the
/// engine only sees payload bytes and tags going in and ids coming out.
#[async_trait]
pub trait LedgerService: Send + Sync {
    /// Is a signing credential available? Read-only deployments return false.
    fn has_signing_key(&self) -> bool;

    /// Sign and submit a transaction.
    async fn submit_transaction(
        &self,
        payload: Vec<u8>,
        tags: Vec<Tag>,
    ) -> Result<SubmitReceipt, LedgerError>;

    /// Current mining status of a transaction.
    async fn get_transaction_status(
        &self,
        transaction_id: &str,
    ) -> Result<TransactionStatus, LedgerError>;

    /// Owner and tags of a transaction.
    async fn get_transaction_metadata(
        &self,
        transaction_id: &str,
    ) -> Result<TransactionMetadata, LedgerError>;

    /// Raw payload of a transaction.
    async fn get_transaction_data(&self, transaction_id: &str) -> Result<Vec<u8>, LedgerError>;

    /// Block metadata.
    async fn get_block(&self, block_hash: &str) -> Result<BlockInfo, LedgerError>;
}

/// Tag index - outbound port.
///
/// Only mined transactions are visible to the index.
#[async_trait]
pub trait IndexQueryService: Send + Sync {
    /// Fetch one page of matching transactions.
    async fn query(&self, query: &IndexQuery) -> Result<IndexPage, LedgerError>;
}

/// Payload codec - outbound port.
pub trait DocumentCodec: Send + Sync {
    /// Value of the `Content-Type` tag written with each payload.
    fn content_type(&self) -> &str;

    /// Serialize a wire record into payload bytes.
    fn encode(&self, record: &WireRecord) -> Result<Vec<u8>, DocumentSyncError>;

    /// Parse payload bytes back into a wire record.
    fn decode(&self, payload: &[u8]) -> Result<WireRecord, DocumentSyncError>;
}
