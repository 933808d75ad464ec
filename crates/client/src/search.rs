//! Debounced, time-boxed interactive search.
//!
//! Each keystroke calls [`SearchSession::search`]. A query runs only after
//! the debounce interval passes without a newer one, and its results are
//! delivered only if no newer query started in the meantime. A search that
//! fails or exceeds the timeout yields an empty result list.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use folio_core::search::{normalize_query, GlobalSearchResult, SearchResult};

use crate::config::SearchConfig;
use crate::error::ClientResult;
use crate::store::WikiStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome<T> {
    /// The query was blank; results should be cleared.
    Cleared,
    /// A newer query replaced this one.
    Superseded,
    /// Results of the latest query; empty when it failed or timed out.
    Results(Vec<T>),
}

impl<T> SearchOutcome<T> {
    pub fn results(&self) -> Option<&[T]> {
        match self {
            Self::Results(results) => Some(results),
            _ => None,
        }
    }
}

/// Debounced search on behalf of a search box.
///
/// Each call is a keystroke. Only the latest query reaches the remote once
/// the debounce window passes quietly, and only its results are returned.
pub struct SearchSession {
    store: Arc<WikiStore>,
    config: SearchConfig,
    generation: AtomicU64,
}

impl SearchSession {
    pub fn new(store: Arc<WikiStore>, config: SearchConfig) -> Self {
        Self {
            store,
            config,
            generation: AtomicU64::new(0),
        }
    }

    /// Search the open wiki.
    pub async fn search(&self, query: &str) -> SearchOutcome<SearchResult> {
        let generation = self.next_generation();
        let Some(query) = normalize_query(query) else {
            return SearchOutcome::Cleared;
        };
        self.run(generation, query, || self.store.search_pages(query))
            .await
    }

    /// Search every wiki the actor belongs to.
    pub async fn search_all(&self, query: &str) -> SearchOutcome<GlobalSearchResult> {
        let generation = self.next_generation();
        let Some(query) = normalize_query(query) else {
            return SearchOutcome::Cleared;
        };
        self.run(generation, query, || self.store.search_all_wikis(query))
            .await
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_latest(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    async fn run<T, F, Fut>(&self, generation: u64, query: &str, start: F) -> SearchOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ClientResult<Vec<T>>>,
    {
        tokio::time::sleep(self.config.debounce).await;
        if !self.is_latest(generation) {
            return SearchOutcome::Superseded;
        }

        let results = match tokio::time::timeout(self.config.timeout, start()).await {
            Ok(Ok(results)) => results,
            Ok(Err(err)) => {
                warn!(query, error = %err, "Search failed");
                Vec::new()
            }
            Err(_) => {
                warn!(query, timeout_ms = self.config.timeout.as_millis() as u64, "Search timed out");
                Vec::new()
            }
        };

        if !self.is_latest(generation) {
            debug!(query, "Discarding results of a superseded search");
            return SearchOutcome::Superseded;
        }
        SearchOutcome::Results(results)
    }
}
