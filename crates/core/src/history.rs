//! Revision history of a single page and the history view state machine.
//!
//! [`PageHistory`] owns the immutable revisions of one `(wiki_id, path)`
//! pair in oldest-to-newest order. [`HistoryView`] tracks what the history
//! panel is showing: the revision list, one revision, or a comparison of two.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::diff::{DiffLine, DiffStats};
use crate::error::CoreError;
use crate::types::{NodeId, Timestamp};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One immutable saved state of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub version_id: String,
    /// Decoded page text.
    pub content: String,
    pub updated_by: NodeId,
    pub updated_at: Timestamp,
    #[serde(default)]
    pub commit_message: Option<String>,
}

/// History as returned by the remote API, newest revision first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageHistoryResponse {
    pub versions: Vec<Revision>,
    #[serde(default)]
    pub current_version_id: Option<String>,
}

/// A diff between two revisions as returned by the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDiff {
    pub diff_lines: Vec<DiffLine>,
}

/// A row of the revision list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevisionSummary {
    /// 1 for the oldest revision, `len` for the newest.
    pub number: usize,
    pub version_id: String,
    pub updated_by: NodeId,
    pub updated_at: Timestamp,
    pub commit_message: Option<String>,
    pub is_current: bool,
}

// ---------------------------------------------------------------------------
// PageHistory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHistory {
    wiki_id: String,
    path: String,
    /// Oldest first.
    revisions: Vec<Revision>,
    current_version_id: Option<String>,
}

impl PageHistory {
    /// Build a history from the remote response.
    ///
    /// The response lists revisions newest first; they are stored oldest
    /// first, ordered by `updated_at` with the response order breaking ties.
    /// A non-empty history must name a current revision that it contains,
    /// and version ids must be unique.
    pub fn new(
        wiki_id: impl Into<String>,
        path: impl Into<String>,
        response: PageHistoryResponse,
    ) -> Result<Self, CoreError> {
        let mut revisions = response.versions;
        revisions.reverse();
        revisions.sort_by(|a, b| a.updated_at.cmp(&b.updated_at));

        let mut seen = HashSet::new();
        for revision in &revisions {
            if !seen.insert(revision.version_id.as_str()) {
                return Err(CoreError::Validation(format!(
                    "Duplicate version id in history: {}",
                    revision.version_id
                )));
            }
        }

        if !revisions.is_empty() {
            match &response.current_version_id {
                None => {
                    return Err(CoreError::Validation(
                        "History has revisions but no current version".into(),
                    ))
                }
                Some(current) if !seen.contains(current.as_str()) => {
                    return Err(CoreError::Validation(format!(
                        "Current version {current} is not part of the history"
                    )))
                }
                Some(_) => {}
            }
        }

        Ok(Self {
            wiki_id: wiki_id.into(),
            path: path.into(),
            revisions,
            current_version_id: response.current_version_id,
        })
    }

    pub fn wiki_id(&self) -> &str {
        &self.wiki_id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }

    /// Revisions, oldest first.
    pub fn revisions(&self) -> &[Revision] {
        &self.revisions
    }

    pub fn get(&self, version_id: &str) -> Option<&Revision> {
        self.revisions.iter().find(|r| r.version_id == version_id)
    }

    /// Display number of a revision: the newest is `len`, the oldest is 1.
    pub fn number(&self, version_id: &str) -> Option<usize> {
        self.position(version_id).map(|index| index + 1)
    }

    /// The revision the page currently shows.
    pub fn current(&self) -> Option<&Revision> {
        self.current_version_id
            .as_deref()
            .and_then(|id| self.get(id))
    }

    pub fn is_current(&self, version_id: &str) -> bool {
        self.current_version_id.as_deref() == Some(version_id)
    }

    /// List rows, newest first.
    pub fn summaries(&self) -> Vec<RevisionSummary> {
        self.revisions
            .iter()
            .enumerate()
            .rev()
            .map(|(index, r)| RevisionSummary {
                number: index + 1,
                version_id: r.version_id.clone(),
                updated_by: r.updated_by.clone(),
                updated_at: r.updated_at,
                commit_message: r.commit_message.clone(),
                is_current: self.is_current(&r.version_id),
            })
            .collect()
    }

    /// Order two distinct revisions as older → newer.
    pub fn diff_request(&self, first: &str, second: &str) -> Result<DiffRequest, CoreError> {
        if first == second {
            return Err(CoreError::Validation(
                "A diff needs two different revisions".into(),
            ));
        }
        let a = self.require_position(first)?;
        let b = self.require_position(second)?;
        let (old, new) = if a < b { (first, second) } else { (second, first) };
        Ok(DiffRequest {
            old_version_id: old.to_string(),
            new_version_id: new.to_string(),
        })
    }

    /// The old and new texts of a request.
    pub fn texts(&self, request: &DiffRequest) -> Result<(&str, &str), CoreError> {
        let old = self.require(&request.old_version_id)?;
        let new = self.require(&request.new_version_id)?;
        Ok((&old.content, &new.content))
    }

    fn position(&self, version_id: &str) -> Option<usize> {
        self.revisions.iter().position(|r| r.version_id == version_id)
    }

    fn require(&self, version_id: &str) -> Result<&Revision, CoreError> {
        self.get(version_id).ok_or_else(|| not_found(version_id))
    }

    fn require_position(&self, version_id: &str) -> Result<usize, CoreError> {
        self.position(version_id).ok_or_else(|| not_found(version_id))
    }
}

fn not_found(version_id: &str) -> CoreError {
    CoreError::NotFound {
        entity: "Revision",
        id: version_id.to_string(),
    }
}

// ---------------------------------------------------------------------------
// HistoryView
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryMode {
    #[default]
    List,
    View,
    Diff,
}

/// Two revisions to compare, older first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DiffRequest {
    pub old_version_id: String,
    pub new_version_id: String,
}

/// What the diff pane shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffStatus {
    NoSelection,
    AwaitingSecond,
    Loading(DiffRequest),
    Ready {
        request: DiffRequest,
        lines: Vec<DiffLine>,
    },
}

impl DiffStatus {
    pub fn stats(&self) -> Option<DiffStats> {
        match self {
            Self::Ready { lines, .. } => Some(DiffStats::of(lines)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryView {
    mode: HistoryMode,
    /// At most two version ids, in click order.
    selected: Vec<String>,
    diff: DiffStatus,
}

impl Default for HistoryView {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryView {
    pub fn new() -> Self {
        Self {
            mode: HistoryMode::List,
            selected: Vec::new(),
            diff: DiffStatus::NoSelection,
        }
    }

    pub fn mode(&self) -> HistoryMode {
        self.mode
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn is_selected(&self, version_id: &str) -> bool {
        self.selected.iter().any(|id| id == version_id)
    }

    pub fn diff_status(&self) -> &DiffStatus {
        &self.diff
    }

    /// The revision shown in View mode.
    pub fn viewed<'h>(&self, history: &'h PageHistory) -> Option<&'h Revision> {
        match (self.mode, self.selected.first()) {
            (HistoryMode::View, Some(id)) => history.get(id),
            _ => None,
        }
    }

    /// Switch modes. List clears the selection; View and Diff keep at most
    /// the first selected revision.
    pub fn set_mode(&mut self, mode: HistoryMode) {
        self.mode = mode;
        match mode {
            HistoryMode::List => self.selected.clear(),
            HistoryMode::View | HistoryMode::Diff => self.selected.truncate(1),
        }
        self.diff = self.idle_diff_status();
    }

    /// Handle a click on a revision.
    ///
    /// From List or View the revision is opened in View mode. In Diff mode
    /// the click follows the pair protocol, and the returned request is the
    /// diff that now has to be computed.
    pub fn select(
        &mut self,
        history: &PageHistory,
        version_id: &str,
    ) -> Result<Option<DiffRequest>, CoreError> {
        if history.get(version_id).is_none() {
            return Err(not_found(version_id));
        }

        match self.mode {
            HistoryMode::List | HistoryMode::View => {
                self.mode = HistoryMode::View;
                self.selected = vec![version_id.to_string()];
                self.diff = DiffStatus::NoSelection;
                Ok(None)
            }
            HistoryMode::Diff => self.select_for_diff(history, version_id),
        }
    }

    fn select_for_diff(
        &mut self,
        history: &PageHistory,
        version_id: &str,
    ) -> Result<Option<DiffRequest>, CoreError> {
        match self.selected.as_slice() {
            [] => {
                self.selected.push(version_id.to_string());
            }
            [first] if first == version_id => {
                self.selected.clear();
            }
            [first] => {
                let request = history.diff_request(first, version_id)?;
                self.selected.push(version_id.to_string());
                self.diff = DiffStatus::Loading(request.clone());
                return Ok(Some(request));
            }
            _ if self.is_selected(version_id) => {
                self.selected.clear();
            }
            _ => {
                self.selected = vec![version_id.to_string()];
            }
        }
        self.diff = self.idle_diff_status();
        Ok(None)
    }

    /// Deliver a computed diff. Returns `false` and discards the lines when
    /// the request is no longer the pending one.
    pub fn complete_diff(&mut self, request: &DiffRequest, lines: Vec<DiffLine>) -> bool {
        match &self.diff {
            DiffStatus::Loading(pending) if pending == request => {
                self.diff = DiffStatus::Ready {
                    request: request.clone(),
                    lines,
                };
                true
            }
            _ => false,
        }
    }

    fn idle_diff_status(&self) -> DiffStatus {
        if self.mode == HistoryMode::Diff && self.selected.len() == 1 {
            DiffStatus::AwaitingSecond
        } else {
            DiffStatus::NoSelection
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
