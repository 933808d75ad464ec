use std::time::Duration;

use folio_core::search::{SEARCH_DEBOUNCE_MS, SEARCH_TIMEOUT_MS};
use folio_core::wiki::validate_node_id;

use crate::error::{ClientError, ClientResult};

/// API base used when `FOLIO_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// Time a page gets to render before its anchor is scrolled to.
pub const DEFAULT_ANCHOR_SCROLL_DELAY_MS: u64 = 100;

/// Debounce and timeout applied to interactive search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    pub debounce: Duration,
    pub timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(SEARCH_DEBOUNCE_MS),
            timeout: Duration::from_millis(SEARCH_TIMEOUT_MS),
        }
    }
}

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for a local development API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the remote wiki API.
    pub api_url: String,
    /// Acting node id. Role-gated operations fail until one is known.
    pub node_id: Option<String>,
    pub request_timeout_secs: u64,
    pub search: SearchConfig,
    /// Delay between loading a linked page and scrolling to its anchor.
    pub anchor_scroll_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            node_id: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            search: SearchConfig::default(),
            anchor_scroll_delay_ms: DEFAULT_ANCHOR_SCROLL_DELAY_MS,
        }
    }
}

impl ClientConfig {
    /// Load configuration from the environment (and `.env`, if present).
    ///
    /// | Env Var                        | Default                 |
    /// |--------------------------------|-------------------------|
    /// | `FOLIO_API_URL`                | `http://localhost:8080` |
    /// | `FOLIO_NODE_ID`                | unset                   |
    /// | `FOLIO_REQUEST_TIMEOUT_SECS`   | `30`                    |
    /// | `FOLIO_SEARCH_DEBOUNCE_MS`     | `300`                   |
    /// | `FOLIO_SEARCH_TIMEOUT_MS`      | `5000`                  |
    /// | `FOLIO_ANCHOR_SCROLL_DELAY_MS` | `100`                   |
    pub fn from_env() -> ClientResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ClientResult<Self> {
        let api_url = lookup("FOLIO_API_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.into());

        let node_id = lookup("FOLIO_NODE_ID")
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        if let Some(id) = &node_id {
            validate_node_id(id)?;
        }

        let request_timeout_secs = parse_u64(
            &lookup,
            "FOLIO_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;
        let debounce_ms = parse_u64(&lookup, "FOLIO_SEARCH_DEBOUNCE_MS", SEARCH_DEBOUNCE_MS)?;
        let search_timeout_ms = parse_u64(&lookup, "FOLIO_SEARCH_TIMEOUT_MS", SEARCH_TIMEOUT_MS)?;
        let anchor_scroll_delay_ms = parse_u64(
            &lookup,
            "FOLIO_ANCHOR_SCROLL_DELAY_MS",
            DEFAULT_ANCHOR_SCROLL_DELAY_MS,
        )?;

        Ok(Self {
            api_url,
            node_id,
            request_timeout_secs,
            search: SearchConfig {
                debounce: Duration::from_millis(debounce_ms),
                timeout: Duration::from_millis(search_timeout_ms),
            },
            anchor_scroll_delay_ms,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn anchor_scroll_delay(&self) -> Duration {
        Duration::from_millis(self.anchor_scroll_delay_ms)
    }
}

fn parse_u64(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> ClientResult<u64> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ClientError::Config(format!("{key} must be a non-negative integer, got '{raw}'"))),
    }
}
