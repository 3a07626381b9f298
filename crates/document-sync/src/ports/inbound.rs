//! # Inbound Ports
//!
//! API trait defining what the document client can do.

use async_trait::async_trait;

use crate::algorithms::PollOutcome;
use crate::domain::{Document, DocumentSyncError, DocumentTags, QueryOptions};

/// Document API - inbound port.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// Create a document at version 0 and submit it.
    ///
    /// # Errors
    /// - `ReadOnly` without a signing credential
    /// - `WriteRejected` if the ledger declines the submission
    async fn add_document(
        &self,
        name: &str,
        content: String,
        tags: DocumentTags,
    ) -> Result<Document, DocumentSyncError>;

    /// Submit the document's current version as a new transaction.
    ///
    /// Returns without submitting if the cache already trusts this version.
    async fn update_document(&self, document: &mut Document) -> Result<(), DocumentSyncError>;

    /// Resolve a single transaction into a document.
    async fn get_document_by_transaction_id(
        &self,
        transaction_id: &str,
        options: &QueryOptions,
    ) -> Result<Document, DocumentSyncError>;

    /// All documents named `name`, latest first unless `version` is given.
    async fn get_documents_by_name(
        &self,
        name: &str,
        version: Option<u64>,
        tags: &DocumentTags,
        options: &QueryOptions,
    ) -> Result<Vec<Document>, DocumentSyncError>;

    /// All documents carrying every tag in `tags`, latest first.
    async fn get_documents_by_tags(
        &self,
        tags: &DocumentTags,
        options: &QueryOptions,
    ) -> Result<Vec<Document>, DocumentSyncError>;

    /// A single document: the trusted cache entry or the latest match.
    async fn get_document(
        &self,
        name: &str,
        version: Option<u64>,
        options: &QueryOptions,
    ) -> Result<Document, DocumentSyncError>;

    /// Wait for a transaction to be mined (cache fast path allowed).
    async fn poll_for_confirmation(
        &self,
        transaction_id: Option<&str>,
        options: &QueryOptions,
    ) -> Result<PollOutcome, DocumentSyncError>;

    /// Wait until the document's transaction is mined and record its timestamp.
    async fn confirm_document(
        &self,
        document: &mut Document,
        options: &QueryOptions,
    ) -> Result<(), DocumentSyncError>;
}
