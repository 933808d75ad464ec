//! Wiki data model and validation rules.
//!
//! Types mirror the remote API's JSON shapes. Validators return
//! `CoreError::Validation` with a message suitable for showing to the user.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::roles::{capabilities_for, Capabilities, WikiRole};
use crate::types::{NodeId, Timestamp};

pub use crate::roles::MemberAction;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Maximum wiki name length, in characters.
pub const MAX_WIKI_NAME_LEN: usize = 100;
/// Maximum wiki description length, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 1_000;
/// Maximum page path length, in characters.
pub const MAX_PAGE_PATH_LEN: usize = 200;
/// Maximum page content length, in characters.
pub const MAX_CONTENT_LEN: usize = 100_000;

// ---------------------------------------------------------------------------
// Wikis
// ---------------------------------------------------------------------------

/// A wiki as the remote API returns it, membership included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wiki {
    /// Stable identifier assigned by the remote.
    pub id: String,
    /// Display name, at most [`MAX_WIKI_NAME_LEN`] characters.
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Public wikis are readable by anyone and joinable without an invite.
    pub is_public: bool,
    /// Node id of the creator, who starts out as the super admin.
    pub created_by: NodeId,
    pub created_at: Timestamp,
    /// Keyed by member node id.
    #[serde(default)]
    pub members: HashMap<NodeId, WikiRole>,
}

impl Wiki {
    /// The role `actor` holds here, or `None` for non-members.
    pub fn role_of(&self, actor: &str) -> Option<WikiRole> {
        self.members.get(actor).copied()
    }

    /// What `actor` may do in this wiki.
    pub fn capabilities_for(&self, actor: &str) -> Capabilities {
        capabilities_for(&self.members, actor)
    }
}

/// A public wiki found through another user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub is_public: bool,
    #[serde(default)]
    pub member_count: usize,
    /// The looked-up user's role in the wiki.
    #[serde(default)]
    pub user_role: Option<WikiRole>,
    /// Node hosting the wiki, passed back to `join_wiki`.
    #[serde(default)]
    pub node_id: Option<NodeId>,
}

/// Reply to a wiki creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateWikiResponse {
    pub wiki_id: String,
    pub wiki: Wiki,
}

/// Partial update of a wiki's settings; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiSettingsUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
}

impl WikiSettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.is_public.is_none()
    }

    /// Reject empty updates and out-of-range values.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.is_empty() {
            return Err(CoreError::Validation("Nothing to update".into()));
        }
        if let Some(name) = &self.name {
            validate_wiki_name(name)?;
        }
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        Ok(())
    }

    /// Apply to a local copy of the wiki.
    pub fn apply(&self, wiki: &mut Wiki) {
        if let Some(name) = &self.name {
            wiki.name = name.clone();
        }
        if let Some(description) = &self.description {
            wiki.description = description.clone();
        }
        if let Some(is_public) = self.is_public {
            wiki.is_public = is_public;
        }
    }
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

/// A page's current source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContent {
    pub wiki_id: String,
    /// Page path within the wiki, unique among live pages.
    pub path: String,
    /// Markup source of the current revision.
    pub content: String,
    /// Author of the current revision.
    #[serde(default)]
    pub updated_by: NodeId,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

/// Sidebar entry for a live page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    pub path: String,
    /// Author of the latest revision.
    #[serde(default)]
    pub updated_by: NodeId,
    /// Time of the latest revision, when the remote reports it.
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

/// A soft-deleted page. One path can have several deletions; `deleted_key`
/// names this one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedPageSummary {
    pub path: String,
    pub deleted_key: String,
    pub deleted_by: NodeId,
    pub deleted_at: Timestamp,
}

/// Seed text for a newly created page.
pub fn default_page_content(path: &str) -> String {
    format!("# {path}\n\nStart writing your content here...")
}

// ---------------------------------------------------------------------------
// Invites
// ---------------------------------------------------------------------------

/// Where an invite stands, as reported after answering it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InviteStatus {
    Pending,
    Accepted,
    Rejected,
    Expired,
}

/// An open invitation for the actor to join a wiki.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invite {
    pub id: String,
    /// Wiki the invite grants access to.
    pub wiki_id: String,
    /// Name of that wiki at the time of the invite.
    pub wiki_name: String,
    /// Admin who sent the invite.
    pub inviter_id: NodeId,
    pub created_at: Timestamp,
    /// After this instant the invite can no longer be accepted.
    pub expires_at: Timestamp,
    /// Set by the remote once the invite has lapsed.
    #[serde(default)]
    pub is_expired: bool,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a wiki name (non-empty, <= 100 chars).
pub fn validate_wiki_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation("Wiki name must not be empty".into()));
    }
    if name.chars().count() > MAX_WIKI_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Wiki name must be at most {MAX_WIKI_NAME_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate a wiki description (may be empty, <= 1000 chars).
pub fn validate_description(description: &str) -> Result<(), CoreError> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(CoreError::Validation(format!(
            "Description must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate a page path.
///
/// Paths may be structured (`guides/setup`) but must not start or end with
/// `/`, contain empty segments, contain `#` (reserved for anchors) or
/// contain control characters.
pub fn validate_page_path(path: &str) -> Result<(), CoreError> {
    if path.trim().is_empty() {
        return Err(CoreError::Validation("Page path must not be empty".into()));
    }
    if path.chars().count() > MAX_PAGE_PATH_LEN {
        return Err(CoreError::Validation(format!(
            "Page path must be at most {MAX_PAGE_PATH_LEN} characters"
        )));
    }
    if path.starts_with('/') || path.ends_with('/') {
        return Err(CoreError::Validation(
            "Page path must not start or end with '/'".into(),
        ));
    }
    if path.split('/').any(|segment| segment.trim().is_empty()) {
        return Err(CoreError::Validation(
            "Page path must not contain empty segments".into(),
        ));
    }
    if path.contains('#') {
        return Err(CoreError::Validation(
            "Page path must not contain '#'".into(),
        ));
    }
    if path.chars().any(char::is_control) {
        return Err(CoreError::Validation(
            "Page path must not contain control characters".into(),
        ));
    }
    Ok(())
}

/// Validate page content (<= 100 000 chars).
pub fn validate_content(content: &str) -> Result<(), CoreError> {
    if content.chars().count() > MAX_CONTENT_LEN {
        return Err(CoreError::Validation(format!(
            "Page content must be at most {MAX_CONTENT_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate a node id (non-empty, no whitespace).
pub fn validate_node_id(node_id: &str) -> Result<(), CoreError> {
    if node_id.is_empty() {
        return Err(CoreError::Validation("Node id must not be empty".into()));
    }
    if node_id.chars().any(char::is_whitespace) {
        return Err(CoreError::Validation(
            "Node id must not contain whitespace".into(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
