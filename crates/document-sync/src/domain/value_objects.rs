//! # Domain Value Objects
//!
//! Immutable values exchanged with the ledger and index ports.

use super::errors::TransactionId;
use super::invariants::{DEFAULT_MAX_RESULTS, DEFAULT_MAX_RETRIES};
use serde::{Deserialize, Serialize};

/// Key/value attribute attached to a transaction.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Tag {
    /// Tag name.
    pub name: String,
    /// Tag value.
    pub value: String,
}

impl Tag {
    /// Create a new tag.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Ledger response to a submission.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmitReceipt {
    /// Id assigned to the submitted transaction.
    pub transaction_id: TransactionId,
    /// HTTP-style status reported by the gateway.
    pub status: u16,
}

impl SubmitReceipt {
    /// 2xx statuses mean the ledger accepted the transaction.
    pub fn is_accepted(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Where and how deep a transaction was mined.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfirmationInfo {
    /// Hash of the containing block.
    pub block_hash: String,
    /// Height of the containing block.
    pub height: u64,
    /// Blocks on top of (and including) the containing block.
    pub confirmations: u64,
}

/// Transaction status as reported by the ledger.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionStatus {
    /// HTTP-style status (200 mined, 202 pending, 404 unknown).
    pub status: u16,
    /// Present once the transaction is mined.
    pub confirmed: Option<ConfirmationInfo>,
}

impl TransactionStatus {
    /// Pending in the mempool.
    pub fn pending() -> Self {
        Self {
            status: 202,
            confirmed: None,
        }
    }

    /// Unknown to the gateway.
    pub fn not_found() -> Self {
        Self {
            status: 404,
            confirmed: None,
        }
    }

    /// Mined with the given confirmation data.
    pub fn mined(info: ConfirmationInfo) -> Self {
        Self {
            status: 200,
            confirmed: Some(info),
        }
    }

    /// Has the transaction been mined?
    pub fn is_mined(&self) -> bool {
        self.confirmed.is_some()
    }
}

/// Transaction header fields needed to identify a document.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionMetadata {
    /// Address of the signing identity.
    pub owner: String,
    /// Tags attached at submission.
    pub tags: Vec<Tag>,
}

/// Block metadata.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockInfo {
    /// Block hash.
    pub hash: String,
    /// Block height.
    pub height: u64,
    /// Unix timestamp.
    pub timestamp: u64,
}

/// Exact-match filter: the tag must carry one of `values`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagFilter {
    /// Tag name.
    pub name: String,
    /// Accepted values.
    pub values: Vec<String>,
}

impl TagFilter {
    /// Filter accepting a single value.
    pub fn exact(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: vec![value.into()],
        }
    }

    /// Does `tags` satisfy this filter?
    pub fn matches(&self, tags: &[Tag]) -> bool {
        tags.iter()
            .any(|t| t.name == self.name && self.values.iter().any(|v| *v == t.value))
    }
}

/// One page request against the index.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexQuery {
    /// Filters, ANDed together.
    pub filters: Vec<TagFilter>,
    /// Restrict to transactions signed by one of these owners.
    pub owners: Option<Vec<String>>,
    /// Opaque cursor of the last edge already seen.
    pub cursor: Option<String>,
    /// Edges requested for this page.
    pub first: usize,
}

/// A single index hit.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexEdge {
    /// Matching transaction.
    pub transaction_id: TransactionId,
    /// Transaction owner address.
    pub owner: String,
    /// Transaction tags.
    pub tags: Vec<Tag>,
    /// Cursor positioned after this edge.
    pub cursor: String,
}

/// A page of index hits.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexPage {
    /// Edges on this page; empty means the result set is exhausted.
    pub edges: Vec<IndexEdge>,
}

/// Per-query settings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QueryOptions {
    /// Status checks before `ConfirmationTimeout`.
    pub max_retries: u32,
    /// Only trust transactions owned by the admin identity.
    pub verified_only: bool,
    /// Upper bound on index results.
    pub max_results: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            verified_only: true,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl QueryOptions {
    /// Override the retry budget.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Accept transactions from any owner.
    pub fn unverified(mut self) -> Self {
        self.verified_only = false;
        self
    }

    /// Override the result bound.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }
}
