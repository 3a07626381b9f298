//! # Domain Errors
//!
//! Error types for Document Sync.
//!
//! Every failure is reported per call; nothing here is fatal to the process.

use thiserror::Error;

/// Ledger-assigned transaction identifier.
pub type TransactionId = String;

/// Errors raised by the outbound ledger and index ports.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// Transport-level failure talking to the ledger gateway.
    #[error("Network error: {0}")]
    Network(String),

    /// The request exceeded the transport timeout.
    #[error("Ledger request timed out after {0}ms")]
    Timeout(u64),

    /// The requested transaction or block is unknown to the ledger.
    #[error("Not found on ledger: {0}")]
    NotFound(String),

    /// The gateway is up but refused to serve the request.
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

/// Configuration validation errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    /// Protocol is neither `http` nor `https`.
    #[error("Unsupported protocol: {0}")]
    UnsupportedProtocol(String),

    /// A numeric setting that must be positive was zero.
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    /// Backoff multiplier below 1.0 would shrink the delay.
    #[error("Backoff multiplier must be >= 1.0, got {0}")]
    InvalidMultiplier(f64),
}

/// Document sync error types.
#[derive(Debug, Error)]
pub enum DocumentSyncError {
    /// The ledger declined or errored a submission.
    #[error("Write rejected for document '{name}': {reason}")]
    WriteRejected {
        /// Document name being written
        name: String,
        /// Status or transport failure reported by the ledger
        reason: String,
    },

    /// A write was attempted without a signing credential.
    #[error("Client is read-only: no signing credential configured")]
    ReadOnly,

    /// Retry budget exhausted while waiting for the transaction to be mined.
    #[error("Transaction {transaction_id} not confirmed after {attempts} attempts")]
    ConfirmationTimeout {
        /// Transaction being polled
        transaction_id: TransactionId,
        /// Status checks performed
        attempts: u32,
        /// Last error seen by the poller, if any
        last_error: Option<String>,
    },

    /// Transaction owner does not match the admin identity.
    #[error("Transaction {transaction_id} owned by {owner}, expected {expected}")]
    UnverifiedOwner {
        /// Transaction that failed verification
        transaction_id: TransactionId,
        /// Owner reported by the ledger
        owner: String,
        /// Admin identity this deployment vouches for
        expected: String,
    },

    /// Transaction lacks the system tags of a document.
    #[error("Transaction {transaction_id} is not a document: {reason}")]
    NotADocument {
        /// Offending transaction
        transaction_id: TransactionId,
        /// Which tag was missing or malformed
        reason: String,
    },

    /// No index match for a name/tag query.
    #[error("No document found: {0}")]
    NotFound(String),

    /// Malformed call.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Payload could not be encoded or decoded.
    #[error("Codec error: {0}")]
    Codec(String),

    /// Ledger or index transport failure.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DocumentSyncError {
    /// Whether the failure excludes a single candidate rather than a whole query.
    pub fn is_candidate_rejection(&self) -> bool {
        matches!(
            self,
            Self::UnverifiedOwner { .. } | Self::NotADocument { .. } | Self::Codec(_)
        )
    }
}
