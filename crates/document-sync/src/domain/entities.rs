//! # Domain Entities
//!
//! The versioned document and its on-ledger record.

use super::errors::{DocumentSyncError, TransactionId};
use super::invariants::INITIAL_VERSION;
use crate::ports::DocumentApi;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// User-defined document tags (key → value).
pub type DocumentTags = BTreeMap<String, String>;

/// Exactly the fields persisted on the ledger.
///
/// `transaction_id`, `posted` and `timestamp` are local bookkeeping and never
/// part of the payload.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WireRecord {
    /// Document name.
    pub name: String,
    /// Opaque content payload.
    pub content: String,
    /// Document version.
    pub version: u64,
    /// User tags.
    #[serde(default)]
    pub tags: DocumentTags,
}

/// A named, versioned document stored as ledger transactions.
///
/// Lifecycle: created (unposted) → submitted (`posted`) → confirmed
/// (`timestamp` set) → superseded by a later version of the same name.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    /// Caller-chosen name, unique per logical document.
    pub name: String,
    /// Monotonic version, +1 per update.
    pub version: u64,
    /// Opaque content payload.
    pub content: String,
    /// User tags.
    pub tags: DocumentTags,
    /// Ledger transaction id, absent until submitted.
    pub transaction_id: Option<TransactionId>,
    /// Ledger accepted the submission (not necessarily mined).
    pub posted: bool,
    /// Unix timestamp of the mined block.
    pub timestamp: Option<u64>,
}

impl Document {
    /// Create an unposted document at version 0.
    pub fn new(name: impl Into<String>, content: impl Into<String>, tags: DocumentTags) -> Self {
        Self::with_version(name, content, tags, INITIAL_VERSION)
    }

    /// Create an unposted document at an explicit version.
    pub fn with_version(
        name: impl Into<String>,
        content: impl Into<String>,
        tags: DocumentTags,
        version: u64,
    ) -> Self {
        Self {
            name: name.into(),
            version,
            content: content.into(),
            tags,
            transaction_id: None,
            posted: false,
            timestamp: None,
        }
    }

    /// Create a document whose content is the JSON encoding of `value`.
    pub fn with_json<T: Serialize>(
        name: impl Into<String>,
        value: &T,
        tags: DocumentTags,
    ) -> Result<Self, DocumentSyncError> {
        let content =
            serde_json::to_string(value).map_err(|e| DocumentSyncError::Codec(e.to_string()))?;
        Ok(Self::new(name, content, tags))
    }

    /// Decode the content as JSON.
    pub fn json_content<T: DeserializeOwned>(&self) -> Result<T, DocumentSyncError> {
        serde_json::from_str(&self.content).map_err(|e| DocumentSyncError::Codec(e.to_string()))
    }

    /// Rebuild an unposted document from its persisted record.
    pub fn from_wire_record(record: WireRecord) -> Self {
        Self::with_version(record.name, record.content, record.tags, record.version)
    }

    /// The fields persisted on-ledger.
    pub fn to_wire_record(&self) -> WireRecord {
        WireRecord {
            name: self.name.clone(),
            content: self.content.clone(),
            version: self.version,
            tags: self.tags.clone(),
        }
    }

    /// Replace the content and move to the next version.
    ///
    /// The previous transaction is never edited: the document becomes
    /// unposted until a new transaction is accepted.
    pub fn stage_revision(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.version += 1;
        self.posted = false;
        self.transaction_id = None;
        self.timestamp = None;
    }

    /// Stage a revision and submit it through the orchestrator's write path.
    ///
    /// # Errors
    /// - `WriteRejected` if the ledger declines the submission. Version and
    ///   content stay mutated; the caller retries or discards.
    /// - `ReadOnly` if the client has no signing credential.
    pub async fn update<A>(
        &mut self,
        content: impl Into<String>,
        api: &A,
    ) -> Result<(), DocumentSyncError>
    where
        A: DocumentApi + ?Sized,
    {
        self.stage_revision(content);
        api.update_document(self).await
    }

    /// Record ledger acceptance.
    pub fn mark_posted(&mut self, transaction_id: TransactionId) {
        self.transaction_id = Some(transaction_id);
        self.posted = true;
    }

    /// Record the mined block timestamp.
    pub fn mark_confirmed(&mut self, timestamp: u64) {
        self.timestamp = Some(timestamp);
    }

    /// Posted and mined.
    pub fn is_confirmed(&self) -> bool {
        self.posted && self.timestamp.is_some()
    }
}
