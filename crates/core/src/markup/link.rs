//! Link target classification.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Schemes that leave the wiki. Matched case-insensitively.
static EXTERNAL_SCHEME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:https?://|mailto:|tel:)").expect("valid regex")
});

/// Where a link points.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkTarget {
    /// Opens outside the application.
    External { url: String },
    /// A page of the current wiki, a heading on it, or both. At least one
    /// of the two parts is always present.
    Internal {
        path: Option<String>,
        anchor: Option<String>,
    },
}

impl LinkTarget {
    /// Classify a raw link target. Returns `None` when nothing navigable
    /// remains (empty target, or a bare `#`).
    pub fn classify(target: &str) -> Option<Self> {
        let target = target.trim();
        if target.is_empty() {
            return None;
        }
        if EXTERNAL_SCHEME.is_match(target) {
            return Some(Self::External {
                url: target.to_string(),
            });
        }

        let (path, anchor) = match target.split_once('#') {
            Some((path, anchor)) => (non_empty(path), non_empty(anchor)),
            None => (non_empty(target), None),
        };
        if path.is_none() && anchor.is_none() {
            return None;
        }
        Some(Self::Internal { path, anchor })
    }

    pub fn is_external(&self) -> bool {
        matches!(self, Self::External { .. })
    }

    /// The wiki page this link navigates to, if any.
    pub fn page_path(&self) -> Option<&str> {
        match self {
            Self::Internal { path, .. } => path.as_deref(),
            Self::External { .. } => None,
        }
    }

    pub fn anchor(&self) -> Option<&str> {
        match self {
            Self::Internal { anchor, .. } => anchor.as_deref(),
            Self::External { .. } => None,
        }
    }
}

fn non_empty(part: &str) -> Option<String> {
    (!part.is_empty()).then(|| part.to_string())
}
