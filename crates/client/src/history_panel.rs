//! Revision history of one page: listing, viewing and comparing.

use std::sync::Arc;

use tracing::{debug, warn};

use folio_core::diff::{compute_line_diff, verify_diff, DiffLine};
use folio_core::history::{
    DiffRequest, DiffStatus, HistoryMode, HistoryView, PageHistory, Revision, RevisionSummary,
};

use crate::error::ClientResult;
use crate::store::WikiStore;

/// History of one page as shown in the side panel.
///
/// Clicks are handled synchronously. A click that completes a pair in Diff
/// mode leaves the diff pane in [`DiffStatus::Loading`] and hands back the
/// [`DiffRequest`]; the diff is then fetched with [`HistoryPanel::load_diff`]
/// or, when the panel must stay usable meanwhile, through a [`DiffJob`]
/// whose result is delivered with [`HistoryPanel::complete_diff`].
pub struct HistoryPanel {
    store: Arc<WikiStore>,
    history: PageHistory,
    view: HistoryView,
}

impl std::fmt::Debug for HistoryPanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryPanel")
            .field("history", &self.history)
            .field("view", &self.view)
            .finish_non_exhaustive()
    }
}

impl HistoryPanel {
    /// Fetch the history of `path` in the open wiki.
    pub async fn open(store: Arc<WikiStore>, path: &str) -> ClientResult<Self> {
        let history = store.page_history(path).await?;
        debug!(wiki_id = %history.wiki_id(), path, revisions = history.len(), "History opened");
        Ok(Self {
            store,
            history,
            view: HistoryView::new(),
        })
    }

    pub fn history(&self) -> &PageHistory {
        &self.history
    }

    pub fn mode(&self) -> HistoryMode {
        self.view.mode()
    }

    /// Selected version ids, in click order.
    pub fn selected(&self) -> &[String] {
        self.view.selected()
    }

    pub fn diff_status(&self) -> &DiffStatus {
        self.view.diff_status()
    }

    /// The revision open in View mode.
    pub fn viewed(&self) -> Option<&Revision> {
        self.view.viewed(&self.history)
    }

    /// List rows, newest first.
    pub fn summaries(&self) -> Vec<RevisionSummary> {
        self.history.summaries()
    }

    /// Switch between List, View and Diff. A pending diff is abandoned.
    pub fn set_mode(&mut self, mode: HistoryMode) {
        self.view.set_mode(mode);
    }

    /// Handle a click on a revision. Returns the diff that is now pending
    /// when the click completes a pair in Diff mode.
    pub fn select(&mut self, version_id: &str) -> ClientResult<Option<DiffRequest>> {
        Ok(self.view.select(&self.history, version_id)?)
    }

    /// Detach the computation of `request` from the panel.
    pub fn prepare_diff(&self, request: &DiffRequest) -> ClientResult<DiffJob> {
        let (old, new) = self.history.texts(request)?;
        Ok(DiffJob {
            store: self.store.clone(),
            wiki_id: self.history.wiki_id().to_string(),
            path: self.history.path().to_string(),
            request: request.clone(),
            old: old.to_string(),
            new: new.to_string(),
        })
    }

    /// Deliver a computed diff. Returns `false` and drops the lines when the
    /// pair is no longer the pending one.
    pub fn complete_diff(&mut self, request: &DiffRequest, lines: Vec<DiffLine>) -> bool {
        let applied = self.view.complete_diff(request, lines);
        if !applied {
            debug!(path = %self.history.path(), "Discarding diff of a pair no longer selected");
        }
        applied
    }

    /// Compute the pending diff for `request` and show it.
    pub async fn load_diff(&mut self, request: DiffRequest) -> ClientResult<bool> {
        let lines = self.prepare_diff(&request)?.run().await;
        Ok(self.complete_diff(&request, lines))
    }
}

/// A diff of two revisions, older first, that runs without borrowing the
/// panel.
pub struct DiffJob {
    store: Arc<WikiStore>,
    wiki_id: String,
    path: String,
    request: DiffRequest,
    old: String,
    new: String,
}

impl DiffJob {
    pub fn request(&self) -> &DiffRequest {
        &self.request
    }

    /// The remote's diff is used when it reproduces both revisions exactly;
    /// otherwise, or when the remote fails, the diff is computed locally.
    pub async fn run(self) -> Vec<DiffLine> {
        let remote = self
            .store
            .version_diff(&self.wiki_id, &self.path, &self.request)
            .await;

        match remote {
            Ok(lines) => match verify_diff(&self.old, &self.new, &lines) {
                Ok(()) => return lines,
                Err(err) => {
                    warn!(path = %self.path, error = %err, "Remote diff does not match the revisions, diffing locally");
                }
            },
            Err(err) => {
                warn!(path = %self.path, error = %err, "Remote diff failed, diffing locally");
            }
        }
        compute_line_diff(&self.old, &self.new)
    }
}
