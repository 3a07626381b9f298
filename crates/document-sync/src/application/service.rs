//! # Document Client
//!
//! Application service orchestrating the cache, the confirmation poller and
//! the query pipeline over the ledger and index ports.
//!
//! ## Read path
//!
//! ```text
//! name/tags ─► build_index_query ─► paginate ─► join_all(per candidate tx id)
//!                                                    │
//!   tx id ─► cache ─hit─► Document   ◄───────────────┘
//!              │miss
//!              └────────────────► wait_until_mined ─► metadata ─► owner check
//!                                 ─► system tags ─► try_join!(block, data)
//!                                 ─► decode ─► tag agreement
//!                                 ─► Document (posted, timestamp)
//! ```
//!
//! Failed candidates are logged and dropped, so a multi-document read can
//! succeed partially.

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::adapters::JsonCodec;
use crate::algorithms::{
    build_index_query, decode_user_tags, encode_tags, paginate, parse_system_tags,
    ConfirmationPoller, DocumentQuery, PollOutcome, ResultOrdering,
};
use crate::config::DocumentSyncConfig;
use crate::domain::{
    invariant_document_name, invariant_owner_verified, Document, DocumentCache,
    DocumentSyncError, DocumentTags, QueryOptions,
};
use crate::ports::{DocumentApi, DocumentCodec, IndexQueryService, LedgerService};

/// Document Client - orchestrates versioned documents on the ledger.
pub struct DocumentClient<L, I>
where
    L: LedgerService,
    I: IndexQueryService,
{
    /// Configuration.
    config: DocumentSyncConfig,
    /// Ledger gateway.
    ledger: Arc<L>,
    /// Tag index.
    index: Arc<I>,
    /// Payload codec.
    codec: Arc<dyn DocumentCodec>,
    /// Last known posted document per name.
    cache: DocumentCache,
    /// Status poller.
    poller: ConfirmationPoller,
}

impl<L, I> DocumentClient<L, I>
where
    L: LedgerService,
    I: IndexQueryService,
{
    /// Create a client over the given ledger and index.
    ///
    /// # Errors
    /// `Config` if the configuration does not validate.
    pub fn new(
        config: DocumentSyncConfig,
        ledger: Arc<L>,
        index: Arc<I>,
    ) -> Result<Self, DocumentSyncError> {
        config.validate()?;
        info!(
            "[doc-sync] Client for {} (admin {}, cache capacity {}, read-only {})",
            config.network.endpoint(),
            config.admin_address,
            config.cache_capacity,
            !ledger.has_signing_key()
        );

        Ok(Self {
            cache: DocumentCache::new(config.cache_capacity),
            poller: ConfirmationPoller::new(config.poll.clone()),
            codec: Arc::new(JsonCodec),
            config,
            ledger,
            index,
        })
    }

    /// Replace the payload codec.
    pub fn with_codec(mut self, codec: Arc<dyn DocumentCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// No signing credential: every write fails with `ReadOnly`.
    pub fn is_read_only(&self) -> bool {
        !self.ledger.has_signing_key()
    }

    /// Identity trusted under `verified_only`.
    pub fn admin_address(&self) -> &str {
        &self.config.admin_address
    }

    /// The document cache.
    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    /// Query options used when the caller has none of its own.
    pub fn default_options(&self) -> QueryOptions {
        self.config.query.clone()
    }

    /// Encode, tag and submit `document` at its current version.
    async fn submit(&self, document: &mut Document) -> Result<(), DocumentSyncError> {
        if self.is_read_only() {
            return Err(DocumentSyncError::ReadOnly);
        }

        let payload = self.codec.encode(&document.to_wire_record())?;
        let tags = encode_tags(document, self.codec.content_type());

        let receipt = self
            .ledger
            .submit_transaction(payload, tags)
            .await
            .map_err(|e| DocumentSyncError::WriteRejected {
                name: document.name.clone(),
                reason: e.to_string(),
            })?;
        if !receipt.is_accepted() {
            return Err(DocumentSyncError::WriteRejected {
                name: document.name.clone(),
                reason: format!("ledger returned status {}", receipt.status),
            });
        }

        info!(
            "[doc-sync] Submitted {} v{} as {}",
            document.name, document.version, receipt.transaction_id
        );
        document.mark_posted(receipt.transaction_id);
        self.cache.put(document);
        Ok(())
    }

    /// Cached document for `transaction_id`, resolving it on a miss.
    async fn lookup_transaction(
        &self,
        transaction_id: &str,
        options: &QueryOptions,
    ) -> Result<Document, DocumentSyncError> {
        if let Some(document) = self.cache.get_by_transaction_id(transaction_id) {
            if document.posted {
                debug!("[doc-sync] Cache hit for {}", transaction_id);
                return Ok(document);
            }
        }
        debug!("[doc-sync] Cache miss for {}", transaction_id);
        self.resolve_transaction(transaction_id, options).await
    }

    /// Turn one transaction into a document, bypassing the cache.
    async fn resolve_transaction(
        &self,
        transaction_id: &str,
        options: &QueryOptions,
    ) -> Result<Document, DocumentSyncError> {
        let info = self
            .poller
            .wait_until_mined(self.ledger.as_ref(), transaction_id, options.max_retries)
            .await?;

        let metadata = self.ledger.get_transaction_metadata(transaction_id).await?;
        if options.verified_only {
            invariant_owner_verified(transaction_id, &metadata.owner, &self.config.admin_address)?;
        }
        let system = parse_system_tags(transaction_id, &metadata.tags)?;

        let (block, payload) = tokio::try_join!(
            self.ledger.get_block(&info.block_hash),
            self.ledger.get_transaction_data(transaction_id),
        )?;

        let record = self.codec.decode(&payload)?;
        if record.name != system.name || record.version != system.version {
            return Err(DocumentSyncError::NotADocument {
                transaction_id: transaction_id.to_string(),
                reason: format!(
                    "payload {} v{} disagrees with tags {} v{}",
                    record.name, record.version, system.name, system.version
                ),
            });
        }

        if record.tags != decode_user_tags(&metadata.tags) {
            return Err(DocumentSyncError::NotADocument {
                transaction_id: transaction_id.to_string(),
                reason: "payload tags disagree with ledger tags".to_string(),
            });
        }

        let mut document = Document::from_wire_record(record);
        document.mark_posted(transaction_id.to_string());
        document.mark_confirmed(block.timestamp);

        // only documents this deployment vouches for become trusted entries
        if metadata.owner == self.config.admin_address {
            self.cache.put(&document);
        }
        Ok(document)
    }

    /// Run an index query and resolve every candidate concurrently.
    async fn query_documents(
        &self,
        query: DocumentQuery,
        options: &QueryOptions,
    ) -> Result<Vec<Document>, DocumentSyncError> {
        let first_page =
            build_index_query(&query, options, &self.config.admin_address, self.config.page_size)?;
        let ordering = if query.wants_latest_first() {
            ResultOrdering::LatestFirst
        } else {
            ResultOrdering::IndexOrder
        };

        let edges = paginate(self.index.as_ref(), first_page, options.max_results, ordering).await?;
        if edges.is_empty() {
            return Err(DocumentSyncError::NotFound(format!("{query:?}")));
        }

        let resolved = join_all(
            edges
                .iter()
                .map(|edge| self.lookup_transaction(&edge.transaction_id, options)),
        )
        .await;

        let candidates = edges.len();
        let documents: Vec<Document> = edges
            .iter()
            .zip(resolved)
            .filter_map(|(edge, result)| match result {
                Ok(document) => Some(document),
                Err(e) if e.is_candidate_rejection() => {
                    debug!(
                        "[doc-sync] Rejected candidate {}: {}",
                        edge.transaction_id, e
                    );
                    None
                }
                Err(e) => {
                    warn!(
                        "[doc-sync] Dropping candidate {}: {}",
                        edge.transaction_id, e
                    );
                    None
                }
            })
            .collect();

        debug!(
            "[doc-sync] Resolved {}/{} candidates",
            documents.len(),
            candidates
        );
        Ok(documents)
    }
}

#[async_trait]
impl<L, I> DocumentApi for DocumentClient<L, I>
where
    L: LedgerService + 'static,
    I: IndexQueryService + 'static,
{
    async fn add_document(
        &self,
        name: &str,
        content: String,
        tags: DocumentTags,
    ) -> Result<Document, DocumentSyncError> {
        if self.is_read_only() {
            return Err(DocumentSyncError::ReadOnly);
        }
        invariant_document_name(name)?;

        let mut document = Document::new(name, content, tags);
        self.submit(&mut document).await?;
        Ok(document)
    }

    async fn update_document(&self, document: &mut Document) -> Result<(), DocumentSyncError> {
        invariant_document_name(&document.name)?;

        if self.cache.is_valid(&document.name, Some(document.version)) {
            if let Some(cached) = self.cache.get(&document.name) {
                debug!(
                    "[doc-sync] {} v{} already posted as {:?}, skipping submission",
                    document.name, document.version, cached.transaction_id
                );
                document.transaction_id = cached.transaction_id;
                document.posted = true;
                if document.timestamp.is_none() {
                    document.timestamp = cached.timestamp;
                }
                return Ok(());
            }
        }

        self.submit(document).await
    }

    async fn get_document_by_transaction_id(
        &self,
        transaction_id: &str,
        options: &QueryOptions,
    ) -> Result<Document, DocumentSyncError> {
        self.lookup_transaction(transaction_id, options).await
    }

    async fn get_documents_by_name(
        &self,
        name: &str,
        version: Option<u64>,
        tags: &DocumentTags,
        options: &QueryOptions,
    ) -> Result<Vec<Document>, DocumentSyncError> {
        invariant_document_name(name)?;
        let query = DocumentQuery::by_name(name)
            .with_version(version)
            .with_tags(tags);
        self.query_documents(query, options).await
    }

    async fn get_documents_by_tags(
        &self,
        tags: &DocumentTags,
        options: &QueryOptions,
    ) -> Result<Vec<Document>, DocumentSyncError> {
        self.query_documents(DocumentQuery::by_tags(tags.clone()), options)
            .await
    }

    async fn get_document(
        &self,
        name: &str,
        version: Option<u64>,
        options: &QueryOptions,
    ) -> Result<Document, DocumentSyncError> {
        invariant_document_name(name)?;

        if self.cache.is_valid(name, version) {
            if let Some(document) = self.cache.get(name) {
                debug!("[doc-sync] Cache hit for {} v{}", name, document.version);
                return Ok(document);
            }
        }

        self.get_documents_by_name(name, version, &DocumentTags::new(), options)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DocumentSyncError::NotFound(format!("no resolvable document '{name}'")))
    }

    async fn poll_for_confirmation(
        &self,
        transaction_id: Option<&str>,
        options: &QueryOptions,
    ) -> Result<PollOutcome, DocumentSyncError> {
        self.poller
            .poll(
                self.ledger.as_ref(),
                &self.cache,
                transaction_id,
                options.max_retries,
            )
            .await
    }

    async fn confirm_document(
        &self,
        document: &mut Document,
        options: &QueryOptions,
    ) -> Result<(), DocumentSyncError> {
        let transaction_id = document.transaction_id.clone().ok_or_else(|| {
            DocumentSyncError::InvalidRequest(format!(
                "document '{}' v{} has not been submitted",
                document.name, document.version
            ))
        })?;

        let info = self
            .poller
            .wait_until_mined(self.ledger.as_ref(), &transaction_id, options.max_retries)
            .await?;
        let block = self.ledger.get_block(&info.block_hash).await?;

        document.mark_confirmed(block.timestamp);
        self.cache.put(document);
        info!(
            "[doc-sync] {} v{} confirmed at height {}",
            document.name, document.version, block.height
        );
        Ok(())
    }
}
