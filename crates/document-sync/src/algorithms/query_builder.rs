//! # Query Builder
//!
//! Translates a logical document lookup into an index query.

use crate::algorithms::tag_codec::user_tag_name;
use crate::domain::{
    DocumentSyncError, DocumentTags, IndexQuery, QueryOptions, TagFilter, DOCUMENT_NAME_TAG,
    DOCUMENT_VERSION_TAG,
};

/// Logical lookup: by name, by version, by tags, or any combination.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocumentQuery {
    /// Exact document name.
    pub name: Option<String>,
    /// Exact version.
    pub version: Option<u64>,
    /// User tags that must all match.
    pub tags: DocumentTags,
}

impl DocumentQuery {
    /// Lookup by name.
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Lookup by tags only.
    pub fn by_tags(tags: DocumentTags) -> Self {
        Self {
            tags,
            ..Self::default()
        }
    }

    /// Narrow to an exact version.
    pub fn with_version(mut self, version: Option<u64>) -> Self {
        self.version = version;
        self
    }

    /// Require an additional user tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Require every tag in `tags`.
    pub fn with_tags(mut self, tags: &DocumentTags) -> Self {
        self.tags
            .extend(tags.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// "Latest" lookups are ordered by descending version.
    pub fn wants_latest_first(&self) -> bool {
        self.version.is_none()
    }

    /// Exact-match filters, ANDed by the index.
    pub fn filters(&self) -> Vec<TagFilter> {
        let mut filters = Vec::with_capacity(self.tags.len() + 2);
        if let Some(name) = &self.name {
            filters.push(TagFilter::exact(DOCUMENT_NAME_TAG, name.as_str()));
        }
        if let Some(version) = self.version {
            filters.push(TagFilter::exact(DOCUMENT_VERSION_TAG, version.to_string()));
        }
        filters.extend(
            self.tags
                .iter()
                .map(|(key, value)| TagFilter::exact(user_tag_name(key), value.as_str())),
        );
        filters
    }
}

/// Build the first-page index query.
///
/// With `verified_only` the owner set is restricted to the admin identity,
/// which is the boundary between documents this deployment vouches for and
/// any matching transaction anyone submitted.
pub fn build_index_query(
    query: &DocumentQuery,
    options: &QueryOptions,
    admin_address: &str,
    page_size: usize,
) -> Result<IndexQuery, DocumentSyncError> {
    if query.name.is_none() && query.tags.is_empty() {
        return Err(DocumentSyncError::InvalidRequest(
            "query needs a document name or at least one tag".to_string(),
        ));
    }
    if options.max_results == 0 {
        return Err(DocumentSyncError::InvalidRequest(
            "max_results must be greater than zero".to_string(),
        ));
    }
    if query.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(DocumentSyncError::InvalidRequest(
            "document name must not be empty".to_string(),
        ));
    }

    Ok(IndexQuery {
        filters: query.filters(),
        owners: options
            .verified_only
            .then(|| vec![admin_address.to_string()]),
        cursor: None,
        first: page_size.min(options.max_results).max(1),
    })
}
