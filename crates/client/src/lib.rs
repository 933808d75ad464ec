//! Asynchronous side of the folio wiki client.
//!
//! [`WikiStore`] owns the session state and talks to a [`WikiRemote`];
//! [`HttpRemote`] is the production remote. Link navigation, the revision
//! history panel and the debounced search session are built on the store.

pub mod config;
pub mod error;
pub mod events;
pub mod history_panel;
pub mod http;
pub mod navigation;
pub mod remote;
pub mod search;
pub mod store;
pub mod telemetry;

use std::sync::Arc;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, RemoteError, RemoteErrorKind};
pub use events::StoreEvent;
pub use history_panel::{DiffJob, HistoryPanel};
pub use http::HttpRemote;
pub use navigation::{LinkNavigator, Navigation, Viewport};
pub use remote::WikiRemote;
pub use search::{SearchOutcome, SearchSession};
pub use store::{SessionState, WikiStore};

/// Build a store backed by the HTTP remote described by `config`.
pub fn connect(config: &ClientConfig) -> ClientResult<WikiStore> {
    let remote: Arc<dyn WikiRemote> = Arc::new(HttpRemote::new(config)?);
    let store = match &config.node_id {
        Some(node_id) => WikiStore::with_actor(remote, node_id.clone())?,
        None => WikiStore::new(remote),
    };
    tracing::info!(api_url = %config.api_url, actor = ?config.node_id, "Wiki client ready");
    Ok(store)
}
