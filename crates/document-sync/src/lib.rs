//! # Document Sync
//!
//! Named, versioned documents persisted as transactions on an append-only
//! ledger. Every write is a new transaction; "the document" is whichever
//! transaction carries the highest version tag for its name.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Give applications create / update / fetch-by-name / fetch-by-tag
//! semantics without exposing ledger mechanics, using:
//! - A name-keyed LRU cache of posted documents
//! - A bounded exponential-backoff confirmation poller
//! - Tag-filtered, cursor-paginated index queries resolved concurrently
//!
//! ## Trust Model
//!
//! | Check | Where |
//! |-------|-------|
//! | Owner is the admin identity (`verified_only`) | index owner filter + per-candidate metadata check |
//! | Transaction carries document tags | `parse_system_tags` |
//! | Payload agrees with its tags | document client resolution |
//! | Cached entry is posted at the requested version | `invariant_cache_trustworthy` |
//!
//! ## Module Structure
//!
//! ```text
//! document-sync/
//! ├── domain/          # Document, value objects, errors, invariants, cache
//! ├── algorithms/      # Tag codec, confirmation poller, query builder, paginator
//! ├── ports/           # DocumentApi (inbound) + ledger/index/codec traits (outbound)
//! ├── application/     # DocumentClient orchestrating everything
//! ├── adapters/        # JsonCodec, InMemoryLedger
//! └── config.rs        # DocumentSyncConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{InMemoryLedger, JsonCodec};
pub use algorithms::{
    build_index_query, paginate, sort_by_version_desc, ConfirmationPoller, DocumentQuery,
    PollOutcome, PollState, ResultOrdering,
};
pub use application::DocumentClient;
pub use config::{DocumentSyncConfig, NetworkConfig, PollConfig};
pub use domain::{
    BlockInfo, CacheStats, ConfigError, ConfirmationInfo, Document, DocumentCache,
    DocumentSyncError, DocumentTags, IndexEdge, IndexPage, IndexQuery, LedgerError,
    QueryOptions, SubmitReceipt, Tag, TagFilter, TransactionId, TransactionMetadata,
    TransactionStatus, WireRecord,
};
pub use ports::{DocumentApi, DocumentCodec, IndexQueryService, LedgerService};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
