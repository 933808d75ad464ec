//! Search result types and query handling.

use serde::{Deserialize, Serialize};

use crate::types::{NodeId, Timestamp};

/// Delay after the last keystroke before a search is sent.
pub const SEARCH_DEBOUNCE_MS: u64 = 300;

/// Client-side bound on a search round trip.
pub const SEARCH_TIMEOUT_MS: u64 = 5_000;

/// Where a search hit navigates to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchTarget {
    pub wiki_id: String,
    pub page_path: String,
}

/// A hit inside one wiki.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub path: String,
    #[serde(default)]
    pub updated_by: NodeId,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
    #[serde(default)]
    pub snippet: String,
}

impl SearchResult {
    pub fn target(&self, wiki_id: &str) -> SearchTarget {
        SearchTarget {
            wiki_id: wiki_id.to_string(),
            page_path: self.path.clone(),
        }
    }
}

/// A hit from a search across every wiki the actor can read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSearchResult {
    pub wiki_id: String,
    pub wiki_name: String,
    pub path: String,
    #[serde(default)]
    pub updated_by: NodeId,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
    #[serde(default)]
    pub snippet: String,
}

impl GlobalSearchResult {
    pub fn target(&self) -> SearchTarget {
        SearchTarget {
            wiki_id: self.wiki_id.clone(),
            page_path: self.path.clone(),
        }
    }
}

/// Trimmed query, or `None` when there is nothing to search for.
pub fn normalize_query(query: &str) -> Option<&str> {
    let trimmed = query.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
