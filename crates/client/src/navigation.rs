//! Following links out of rendered pages.
//!
//! External links open in a fresh, isolated browsing context. Internal
//! links load the target page through the store and then, after a short
//! delay so the page can render, scroll to the anchor. Only the most
//! recent scheduled scroll is ever performed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use folio_core::markup::LinkTarget;
use folio_core::search::SearchTarget;

use crate::error::{ClientError, ClientResult};
use crate::store::WikiStore;

/// How an external link is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrowsingContext {
    /// Open in a new tab or window rather than the current one.
    pub new_context: bool,
    /// Whether the opened document may reach back to its opener.
    pub opener: bool,
    /// Whether the current page's address is sent as the referrer.
    pub referrer: bool,
}

impl BrowsingContext {
    /// New context, no opener handle, no referrer.
    pub const ISOLATED: BrowsingContext = BrowsingContext {
        new_context: true,
        opener: false,
        referrer: false,
    };
}

/// The surface that displays pages.
pub trait Viewport: Send + Sync {
    /// Open `url` outside the wiki in the given context.
    fn open_external(&self, url: &str, context: BrowsingContext);

    /// Scroll the element with this id into view. Returns `false` when no
    /// such element is shown.
    fn scroll_to_anchor(&self, anchor: &str) -> bool;
}

/// A pending anchor scroll after an internal navigation.
#[derive(Debug)]
pub struct ScheduledScroll {
    /// Element id the scroll targets.
    pub anchor: String,
    token: CancellationToken,
    handle: JoinHandle<bool>,
}

impl ScheduledScroll {
    /// Drop the scroll if it has not run yet.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Wait for the scroll. `true` if it ran and found its anchor.
    pub async fn wait(self) -> bool {
        self.handle.await.unwrap_or(false)
    }
}

/// Outcome of following a link.
#[derive(Debug)]
pub enum Navigation {
    /// An external URL was handed to the viewport.
    OpenedExternal {
        url: String,
    },
    /// A wiki page was loaded; `scroll` is set when the link named an anchor.
    LoadedPage {
        path: String,
        scroll: Option<ScheduledScroll>,
    },
    /// An anchor on the current page was scrolled to, if `found`.
    ScrolledInPage {
        anchor: String,
        found: bool,
    },
    /// Nothing navigable.
    Ignored,
}

/// Follows links clicked in rendered pages and search results.
///
/// Holds at most one pending anchor scroll; starting any new navigation
/// cancels it.
pub struct LinkNavigator {
    store: Arc<WikiStore>,
    viewport: Arc<dyn Viewport>,
    scroll_delay: Duration,
    pending: Mutex<Option<CancellationToken>>,
}

impl LinkNavigator {
    /// `scroll_delay` is how long after a page load the anchor scroll waits.
    pub fn new(store: Arc<WikiStore>, viewport: Arc<dyn Viewport>, scroll_delay: Duration) -> Self {
        Self {
            store,
            viewport,
            scroll_delay,
            pending: Mutex::new(None),
        }
    }

    /// Classify a raw link target and follow it.
    pub async fn follow_raw(&self, raw: &str) -> ClientResult<Navigation> {
        match LinkTarget::classify(raw) {
            Some(target) => self.follow(&target).await,
            None => Ok(Navigation::Ignored),
        }
    }

    /// Follow a classified link.
    ///
    /// Fails with [`ClientError::NoWikiOpen`] for a page link while no wiki
    /// is open, and with the store's error when the page cannot be loaded;
    /// the current page stays in place then.
    pub async fn follow(&self, target: &LinkTarget) -> ClientResult<Navigation> {
        match target {
            LinkTarget::External { url } => {
                self.viewport.open_external(url, BrowsingContext::ISOLATED);
                info!(url = %url, "Opened external link");
                Ok(Navigation::OpenedExternal { url: url.clone() })
            }
            LinkTarget::Internal {
                path: None,
                anchor: Some(anchor),
            } => {
                self.cancel_pending().await;
                let found = self.viewport.scroll_to_anchor(anchor);
                if !found {
                    debug!(anchor = %anchor, "Anchor not present on this page");
                }
                Ok(Navigation::ScrolledInPage {
                    anchor: anchor.clone(),
                    found,
                })
            }
            LinkTarget::Internal {
                path: Some(path),
                anchor,
            } => {
                let wiki = self
                    .store
                    .current_wiki()
                    .await
                    .ok_or(ClientError::NoWikiOpen)?;
                self.cancel_pending().await;
                self.store.load_page(&wiki.id, path).await?;

                let scroll = match anchor {
                    Some(anchor) => {
                        let known = self
                            .store
                            .compiled_page()
                            .await
                            .is_some_and(|page| page.has_anchor(anchor));
                        if !known {
                            debug!(path = %path, anchor = %anchor, "Linked anchor is not a heading of the page");
                        }
                        Some(self.schedule_scroll(anchor).await)
                    }
                    None => None,
                };
                Ok(Navigation::LoadedPage {
                    path: path.clone(),
                    scroll,
                })
            }
            LinkTarget::Internal {
                path: None,
                anchor: None,
            } => Ok(Navigation::Ignored),
        }
    }

    /// Open a search hit, switching wiki first when it lives elsewhere.
    pub async fn open_search_hit(&self, target: &SearchTarget) -> ClientResult<Navigation> {
        let open_id = self.store.current_wiki().await.map(|w| w.id);
        if open_id.as_deref() != Some(target.wiki_id.as_str()) {
            let wiki = self.store.find_wiki(&target.wiki_id).await?;
            self.store.select_wiki(wiki).await?;
        }
        self.cancel_pending().await;
        self.store
            .load_page(&target.wiki_id, &target.page_path)
            .await?;
        Ok(Navigation::LoadedPage {
            path: target.page_path.clone(),
            scroll: None,
        })
    }

    async fn cancel_pending(&self) {
        if let Some(token) = self.pending.lock().await.take() {
            token.cancel();
        }
    }

    async fn schedule_scroll(&self, anchor: &str) -> ScheduledScroll {
        let token = CancellationToken::new();
        if let Some(previous) = self.pending.lock().await.replace(token.clone()) {
            previous.cancel();
        }

        let viewport = Arc::clone(&self.viewport);
        let delay = self.scroll_delay;
        let cancelled = token.clone();
        let target = anchor.to_string();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {
                    debug!(anchor = %target, "Anchor scroll superseded");
                    false
                }
                _ = tokio::time::sleep(delay) => viewport.scroll_to_anchor(&target),
            }
        });

        ScheduledScroll {
            anchor: anchor.to_string(),
            token,
            handle,
        }
    }
}
