//! # Paginator
//!
//! Walks index pages with the opaque cursor of the last edge seen,
//! accumulating until a page comes back empty or the accumulated count passes
//! `max_results`. There is no page bound beyond `max_results`, so an index
//! full of stale matches costs extra round trips.

use std::collections::HashSet;
use tracing::debug;

use crate::algorithms::tag_codec::version_of;
use crate::domain::{DocumentSyncError, IndexEdge, IndexQuery};
use crate::ports::IndexQueryService;

/// Order applied to the collected edges before truncation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultOrdering {
    /// Descending numeric version (missing or malformed versions count as 0).
    LatestFirst,
    /// Whatever order the index returned.
    IndexOrder,
}

/// Sort edges by descending version tag. Stable: ties keep index order.
pub fn sort_by_version_desc(edges: &mut [IndexEdge]) {
    edges.sort_by_key(|edge| std::cmp::Reverse(version_of(&edge.tags)));
}

/// Fetch pages starting at `first_page` and return at most `max_results`
/// deduplicated edges.
pub async fn paginate<I>(
    index: &I,
    first_page: IndexQuery,
    max_results: usize,
    ordering: ResultOrdering,
) -> Result<Vec<IndexEdge>, DocumentSyncError>
where
    I: IndexQueryService + ?Sized,
{
    let mut query = first_page;
    let mut edges: Vec<IndexEdge> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut pages = 0usize;

    loop {
        let page = index.query(&query).await?;
        pages += 1;

        let Some(last) = page.edges.last() else {
            break;
        };
        query.cursor = Some(last.cursor.clone());

        let before = edges.len();
        edges.extend(
            page.edges
                .into_iter()
                .filter(|edge| seen.insert(edge.transaction_id.clone())),
        );
        debug!(
            "[doc-sync] Index page {} added {} edges ({} total)",
            pages,
            edges.len() - before,
            edges.len()
        );

        // a page of nothing but repeats means the cursor is not advancing
        if edges.len() == before || edges.len() > max_results {
            break;
        }
    }

    if ordering == ResultOrdering::LatestFirst {
        sort_by_version_desc(&mut edges);
    }
    edges.truncate(max_results);
    Ok(edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryLedger;
    use crate::domain::{Tag, TagFilter};

    fn edge(id: &str, version: Option<&str>) -> IndexEdge {
        IndexEdge {
            transaction_id: id.to_string(),
            owner: "admin".to_string(),
            tags: version
                .map(|v| vec![Tag::new("Document-Version", v)])
                .unwrap_or_default(),
            cursor: id.to_string(),
        }
    }

    fn query() -> IndexQuery {
        IndexQuery {
            filters: vec![TagFilter::exact("Document-Name", "doc")],
            owners: None,
            cursor: None,
            first: 100,
        }
    }

    #[test]
    fn test_sort_by_version_desc() {
        let mut edges = vec![
            edge("a", Some("2")),
            edge("b", Some("0")),
            edge("c", Some("5")),
            edge("d", None),
        ];
        sort_by_version_desc(&mut edges);
        let ids: Vec<&str> = edges.iter().map(|e| e.transaction_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b", "d"]);
    }

    #[test]
    fn test_sort_treats_garbage_as_zero() {
        let mut edges = vec![edge("x", Some("abc")), edge("y", Some("1"))];
        sort_by_version_desc(&mut edges);
        assert_eq!(edges[0].transaction_id, "y");
    }

    #[tokio::test]
    async fn test_paginate_stops_on_empty_page() {
        let ledger = InMemoryLedger::new("admin").with_page_limit(4);
        for i in 0..6 {
            ledger.inject_transaction(
                "admin",
                vec![],
                vec![Tag::new("Document-Name", "doc"), Tag::new("Document-Version", i.to_string())],
                true,
            );
        }

        let edges = paginate(&ledger, query(), 100, ResultOrdering::IndexOrder)
            .await
            .unwrap();
        assert_eq!(edges.len(), 6);
        // pages of 4, 2, then the empty page
        assert_eq!(ledger.index_query_count(), 3);
    }

    #[tokio::test]
    async fn test_paginate_orders_latest_first() {
        let ledger = InMemoryLedger::new("admin").with_page_limit(2);
        for v in ["1", "3", "2"] {
            ledger.inject_transaction(
                "admin",
                vec![],
                vec![Tag::new("Document-Name", "doc"), Tag::new("Document-Version", v)],
                true,
            );
        }

        let edges = paginate(&ledger, query(), 2, ResultOrdering::LatestFirst)
            .await
            .unwrap();
        let versions: Vec<u64> = edges.iter().map(|e| version_of(&e.tags)).collect();
        assert_eq!(versions, vec![3, 2]);
    }
}
