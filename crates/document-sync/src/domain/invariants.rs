//! # Domain Invariants
//!
//! Rules that must always hold, plus the documented constants the engine
//! falls back to when no configuration overrides them.

use super::entities::Document;
use super::errors::DocumentSyncError;

/// System tag carrying the document name.
pub const DOCUMENT_NAME_TAG: &str = "Document-Name";

/// System tag carrying the decimal document version.
pub const DOCUMENT_VERSION_TAG: &str = "Document-Version";

/// Prefix of the user tag namespace (`Document-Tag-<key>`).
pub const USER_TAG_PREFIX: &str = "Document-Tag-";

/// Tag carrying the payload content type.
pub const CONTENT_TYPE_TAG: &str = "Content-Type";

/// Version assigned to a freshly created document.
pub const INITIAL_VERSION: u64 = 0;

/// Default status checks before giving up on confirmation.
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Default upper bound on index results per query.
pub const DEFAULT_MAX_RESULTS: usize = 100;

/// Default edges requested per index page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Default cache capacity (documents).
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Default delay before the second status check.
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 500;

/// Default cap on the delay between status checks.
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 30_000;

/// Default backoff growth factor.
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Invariant: a cache entry is trustworthy only when it exists, has been
/// posted, and matches the requested version exactly (if one was requested).
pub fn invariant_cache_trustworthy(entry: Option<&Document>, desired_version: Option<u64>) -> bool {
    match entry {
        Some(doc) if doc.posted => desired_version.map_or(true, |v| doc.version == v),
        _ => false,
    }
}

/// Invariant: document names are non-empty.
pub fn invariant_document_name(name: &str) -> Result<(), DocumentSyncError> {
    if name.trim().is_empty() {
        return Err(DocumentSyncError::InvalidRequest(
            "document name must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Invariant: under `verified_only`, the transaction owner is the admin identity.
pub fn invariant_owner_verified(
    transaction_id: &str,
    owner: &str,
    expected: &str,
) -> Result<(), DocumentSyncError> {
    if owner != expected {
        return Err(DocumentSyncError::UnverifiedOwner {
            transaction_id: transaction_id.to_string(),
            owner: owner.to_string(),
            expected: expected.to_string(),
        });
    }
    Ok(())
}
