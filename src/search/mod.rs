// ABOUTME: Search orchestrator: concurrent provider fan-out with soft-error collection
// ABOUTME: Annotates merged results via the resolver, then filters and ranks them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campscout Authors

//! # Search orchestration
//!
//! [`run`] iterates the configured providers, launches each `list` call on
//! its own task, and joins them in configured order so the pre-sort result
//! order is deterministic regardless of completion order. Provider failures
//! become soft errors returned alongside partial results; no single provider
//! failure aborts the search.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{info, warn};

use crate::cache::Store;
use crate::errors::{AppError, AppResult};
use crate::metadata::Property;
use crate::models::{Query, SearchResult};
use crate::providers::create_provider;

pub mod annotate;
pub mod filter;

pub use annotate::{Resolver, Score};
pub use filter::{filter as apply_filters, rank};

/// Run a search across the named providers.
///
/// Returns annotated, filtered results sorted by rating descending, plus the
/// soft errors collected along the way. The combinations
/// `(results, errors)`, `(nothing, nothing)`, and `(nothing, errors)` are all
/// legitimate outcomes; callers render the error list independently of the
/// result count.
pub async fn run(
    provider_tags: &[String],
    query: &Query,
    store: Arc<dyn Store>,
    props: &BTreeMap<String, Property>,
) -> (Vec<SearchResult>, Vec<AppError>) {
    info!(
        target: "campscout::search",
        providers = ?provider_tags,
        dates = query.dates.len(),
        "searching"
    );

    let mut errors = Vec::new();
    let mut handles = Vec::new();
    for tag in provider_tags {
        match create_provider(tag, Arc::clone(&store)) {
            Ok(provider) => {
                let q = query.clone();
                handles.push(tokio::spawn(async move { provider.list(&q).await }));
            }
            Err(e) => errors.push(e),
        }
    }

    let mut results = Vec::new();
    for joined in join_all(handles).await {
        match flatten(joined) {
            Ok(rs) => results.extend(rs),
            Err(e) => {
                warn!(target: "campscout::search", error = %e, "provider failed");
                errors.push(e);
            }
        }
    }

    let resolver = Resolver::new(props);
    for r in &mut results {
        resolver.annotate(r);
    }

    let mut results = filter::filter(query, results);
    filter::rank(&mut results);

    info!(
        target: "campscout::search",
        results = results.len(),
        errors = errors.len(),
        "search complete"
    );
    (results, errors)
}

fn flatten(
    joined: Result<AppResult<Vec<SearchResult>>, tokio::task::JoinError>,
) -> AppResult<Vec<SearchResult>> {
    joined.map_err(|e| AppError::network(format!("provider task: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;

    #[tokio::test]
    async fn empty_provider_yields_empty_results() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let (results, errors) =
            run(&["empty".to_owned()], &Query::default(), store, &BTreeMap::new()).await;
        assert!(results.is_empty());
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn unknown_provider_is_a_soft_error() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let (results, errors) = run(
            &["empty".to_owned(), "bogus".to_owned()],
            &Query::default(),
            store,
            &BTreeMap::new(),
        )
        .await;

        assert!(results.is_empty());
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], AppError::Config(_)));
    }
}
