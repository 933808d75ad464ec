//! Shared fixtures for the client integration tests.
//!
//! [`MemoryRemote`] is an in-memory wiki API: it keeps real revision
//! history, soft-deleted pages, invites and memberships, enforces the same
//! access rules as the server, records every call in order and can be told
//! to fail any operation.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use folio_client::error::{RemoteError, RemoteErrorKind};
use folio_client::remote::{RemoteResult, WikiRemote};
use folio_client::WikiStore;
use folio_core::diff::{compute_line_diff, DiffLine};
use folio_core::error::CoreError;
use folio_core::history::{PageHistoryResponse, Revision, VersionDiff};
use folio_core::roles::{check_member_change, MemberAction, WikiRole};
use folio_core::search::{GlobalSearchResult, SearchResult};
use folio_core::types::Timestamp;
use folio_core::wiki::{
    CreateWikiResponse, DeletedPageSummary, Invite, InviteStatus, PageContent,
    PageSummary, Wiki, WikiInfo, WikiSettingsUpdate,
};

pub const ALICE: &str = "alice.os";
pub const BOB: &str = "bob.os";
pub const CAROL: &str = "carol.os";

// ---------------------------------------------------------------------------
// Store builders
// ---------------------------------------------------------------------------

/// A store acting as `actor` over the given remote.
pub fn store_for(remote: &Arc<MemoryRemote>, actor: &str) -> Arc<WikiStore> {
    Arc::new(WikiStore::with_actor(remote.clone(), actor).expect("valid actor"))
}

/// Remote acting as `actor` with one wiki in which `actor` has `role`.
pub fn remote_with_wiki(actor: &str, role: WikiRole) -> (Arc<MemoryRemote>, Wiki) {
    let remote = MemoryRemote::shared(actor);
    let mut members = vec![(actor, role)];
    if actor != CAROL {
        members.push((CAROL, WikiRole::SuperAdmin));
    }
    let wiki = remote.seed_wiki("Team Notes", false, &members);
    (remote, wiki)
}

// ---------------------------------------------------------------------------
// Server rules
// ---------------------------------------------------------------------------

/// How long an invite stays open.
const INVITE_TTL_DAYS: i64 = 7;

/// Characters of context kept on each side of a match in a snippet.
const SNIPPET_CONTEXT_CHARS: usize = 50;

/// Characters shown when a page matched on its path only.
const SNIPPET_PREVIEW_CHARS: usize = 100;

fn invite_expiry(created_at: Timestamp) -> Timestamp {
    created_at + chrono::Duration::days(INVITE_TTL_DAYS)
}

/// Case-insensitive match on path or content.
fn page_matches(path: &str, content: &str, query: &str) -> bool {
    let query = query.to_lowercase();
    path.to_lowercase().contains(&query) || content.to_lowercase().contains(&query)
}

/// Excerpt around the first case-insensitive match, with `...` at cut ends.
/// Without a match in the content the start of the page is shown.
fn snippet(content: &str, query: &str) -> String {
    let chars: Vec<char> = content.chars().collect();
    let lower: Vec<char> = content.to_lowercase().chars().collect();
    let needle: Vec<char> = query.to_lowercase().chars().collect();

    // Lower-casing can change the char count; fall back to a preview then.
    let found = if lower.len() == chars.len() && !needle.is_empty() {
        lower
            .windows(needle.len())
            .position(|window| window == needle.as_slice())
    } else {
        None
    };

    let Some(pos) = found else {
        let preview: String = chars.iter().take(SNIPPET_PREVIEW_CHARS).collect();
        return format!("{preview}...");
    };

    let start = pos.saturating_sub(SNIPPET_CONTEXT_CHARS);
    let end = (pos + needle.len() + SNIPPET_CONTEXT_CHARS).min(chars.len());
    let mut out = String::new();
    if start > 0 {
        out.push_str("...");
    }
    out.extend(&chars[start..end]);
    if end < chars.len() {
        out.push_str("...");
    }
    out
}

// ---------------------------------------------------------------------------
// MemoryRemote
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct StoredPage {
    /// Oldest first.
    revisions: Vec<Revision>,
}

impl StoredPage {
    fn head(&self) -> &Revision {
        &self.revisions[self.revisions.len() - 1]
    }
}

#[derive(Debug, Clone)]
struct DeletedPage {
    summary: DeletedPageSummary,
    page: StoredPage,
}

#[derive(Debug)]
struct Inner {
    actor: String,
    wikis: BTreeMap<String, Wiki>,
    pages: HashMap<String, BTreeMap<String, StoredPage>>,
    deleted: HashMap<String, Vec<DeletedPage>>,
    /// `(invitee, invite)` pairs.
    invites: Vec<(String, Invite)>,
    calls: Vec<String>,
    failures: HashMap<String, RemoteError>,
    diff_override: Option<Vec<DiffLine>>,
    search_delay: Option<Duration>,
    page_delay: Option<Duration>,
    next_id: u64,
    clock: Timestamp,
}

impl Inner {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn tick(&mut self) -> Timestamp {
        self.clock += chrono::Duration::minutes(1);
        self.clock
    }

    fn wiki(&self, wiki_id: &str) -> RemoteResult<&Wiki> {
        self.wikis
            .get(wiki_id)
            .ok_or_else(|| RemoteError::not_found(format!("Wiki {wiki_id} not found")))
    }

    fn role(&self, wiki_id: &str) -> Option<WikiRole> {
        self.wikis.get(wiki_id).and_then(|w| w.role_of(&self.actor))
    }

    fn require_read(&self, wiki_id: &str) -> RemoteResult<()> {
        let wiki = self.wiki(wiki_id)?;
        if wiki.is_public || wiki.role_of(&self.actor).is_some() {
            Ok(())
        } else {
            Err(RemoteError::forbidden("Access denied").with_details("You are not a member of this wiki"))
        }
    }

    fn require_role(&self, wiki_id: &str, minimum: WikiRole) -> RemoteResult<()> {
        self.wiki(wiki_id)?;
        match self.role(wiki_id) {
            Some(role) if role >= minimum => Ok(()),
            _ => Err(RemoteError::forbidden("Access denied")
                .with_details(format!("{minimum} access required"))),
        }
    }

    fn page(&self, wiki_id: &str, path: &str) -> RemoteResult<&StoredPage> {
        self.pages
            .get(wiki_id)
            .and_then(|pages| pages.get(path))
            .ok_or_else(|| {
                RemoteError::not_found("Page not found").with_details(format!("Page '{path}' not found"))
            })
    }

    fn new_revision(&mut self, content: &str, author: &str, message: Option<&str>) -> Revision {
        Revision {
            version_id: self.next_id("v"),
            content: content.to_string(),
            updated_by: author.to_string(),
            updated_at: self.tick(),
            commit_message: message.map(str::to_string),
        }
    }
}

fn core_to_remote(err: CoreError) -> RemoteError {
    let kind = match &err {
        CoreError::NotFound { .. } => RemoteErrorKind::NotFound,
        CoreError::Validation(_) => RemoteErrorKind::Invalid,
        CoreError::Conflict(_) => RemoteErrorKind::Conflict,
        CoreError::Forbidden(_) => RemoteErrorKind::Forbidden,
        CoreError::Internal(_) => RemoteErrorKind::Server,
    };
    RemoteError::new(kind, err.to_string())
}

pub struct MemoryRemote {
    inner: Mutex<Inner>,
}

impl MemoryRemote {
    pub fn new(actor: &str) -> Self {
        Self {
            inner: Mutex::new(Inner {
                actor: actor.to_string(),
                wikis: BTreeMap::new(),
                pages: HashMap::new(),
                deleted: HashMap::new(),
                invites: Vec::new(),
                calls: Vec::new(),
                failures: HashMap::new(),
                diff_override: None,
                search_delay: None,
                page_delay: None,
                next_id: 0,
                clock: Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap(),
            }),
        }
    }

    pub fn shared(actor: &str) -> Arc<Self> {
        Arc::new(Self::new(actor))
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    /// Record the call and apply any injected failure.
    fn begin(&self, op: &str) -> RemoteResult<MutexGuard<'_, Inner>> {
        let mut inner = self.lock();
        inner.calls.push(op.to_string());
        match inner.failures.get(op) {
            Some(err) => Err(err.clone()),
            None => Ok(inner),
        }
    }

    // -- test controls --------------------------------------------------------

    /// Make every later call of `op` fail with `err`.
    pub fn fail(&self, op: &str, err: RemoteError) {
        self.lock().failures.insert(op.to_string(), err);
    }

    pub fn recover(&self, op: &str) {
        self.lock().failures.remove(op);
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn call_count(&self, op: &str) -> usize {
        self.lock().calls.iter().filter(|c| c.as_str() == op).count()
    }

    pub fn set_actor(&self, actor: &str) {
        self.lock().actor = actor.to_string();
    }

    /// Serve these lines for every version diff instead of computing one.
    pub fn override_diff(&self, lines: Vec<DiffLine>) {
        self.lock().diff_override = Some(lines);
    }

    pub fn set_search_delay(&self, delay: Duration) {
        self.lock().search_delay = Some(delay);
    }

    /// Hold replies to page and page list reads for `delay`.
    pub fn set_page_delay(&self, delay: Duration) {
        self.lock().page_delay = Some(delay);
    }

    // -- seeding -------------------------------------------------------------

    pub fn seed_wiki(&self, name: &str, is_public: bool, members: &[(&str, WikiRole)]) -> Wiki {
        let mut inner = self.lock();
        let id = inner.next_id("wiki");
        let created_at = inner.tick();
        let wiki = Wiki {
            id: id.clone(),
            name: name.to_string(),
            description: String::new(),
            is_public,
            created_by: members.first().map(|(m, _)| m.to_string()).unwrap_or_default(),
            created_at,
            members: members
                .iter()
                .map(|(member, role)| (member.to_string(), *role))
                .collect(),
        };
        inner.wikis.insert(id.clone(), wiki.clone());
        inner.pages.insert(id, BTreeMap::new());
        wiki
    }

    /// Add a revision to a page, creating the page if needed. Returns the
    /// new version id.
    pub fn seed_revision(&self, wiki_id: &str, path: &str, content: &str, author: &str) -> String {
        let mut inner = self.lock();
        let revision = inner.new_revision(content, author, None);
        let version_id = revision.version_id.clone();
        inner
            .pages
            .entry(wiki_id.to_string())
            .or_default()
            .entry(path.to_string())
            .or_insert_with(|| StoredPage { revisions: Vec::new() })
            .revisions
            .push(revision);
        version_id
    }

    /// Invite the remote's actor to a wiki. Returns the invite id.
    pub fn seed_invite(&self, wiki_id: &str, inviter: &str) -> String {
        let mut inner = self.lock();
        let id = inner.next_id("inv");
        let created_at = inner.tick();
        let wiki_name = inner.wikis[wiki_id].name.clone();
        let invitee = inner.actor.clone();
        inner.invites.push((
            invitee,
            Invite {
                id: id.clone(),
                wiki_id: wiki_id.to_string(),
                wiki_name,
                inviter_id: inviter.to_string(),
                created_at,
                expires_at: invite_expiry(created_at),
                is_expired: false,
            },
        ));
        id
    }

    // -- inspection -----------------------------------------------------------

    pub fn wiki(&self, wiki_id: &str) -> Option<Wiki> {
        self.lock().wikis.get(wiki_id).cloned()
    }

    pub fn content(&self, wiki_id: &str, path: &str) -> Option<String> {
        let inner = self.lock();
        inner
            .pages
            .get(wiki_id)
            .and_then(|pages| pages.get(path))
            .map(|page| page.head().content.clone())
    }

    pub fn revision_count(&self, wiki_id: &str, path: &str) -> usize {
        let inner = self.lock();
        inner
            .pages
            .get(wiki_id)
            .and_then(|pages| pages.get(path))
            .map_or(0, |page| page.revisions.len())
    }

    pub fn invites_for(&self, invitee: &str) -> Vec<Invite> {
        self.lock()
            .invites
            .iter()
            .filter(|(who, _)| who == invitee)
            .map(|(_, invite)| invite.clone())
            .collect()
    }
}

fn page_content(wiki_id: &str, path: &str, page: &StoredPage) -> PageContent {
    let head = page.head();
    PageContent {
        wiki_id: wiki_id.to_string(),
        path: path.to_string(),
        content: head.content.clone(),
        updated_by: head.updated_by.clone(),
        updated_at: Some(head.updated_at),
    }
}

#[async_trait]
impl WikiRemote for MemoryRemote {
    // -- wikis ---------------------------------------------------------------

    async fn list_wikis(&self) -> RemoteResult<Vec<Wiki>> {
        let inner = self.begin("list_wikis")?;
        let mut wikis: Vec<Wiki> = inner
            .wikis
            .values()
            .filter(|w| w.role_of(&inner.actor).is_some())
            .cloned()
            .collect();
        wikis.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(wikis)
    }

    async fn get_wiki(&self, wiki_id: &str) -> RemoteResult<Wiki> {
        let inner = self.begin("get_wiki")?;
        inner.require_read(wiki_id)?;
        Ok(inner.wiki(wiki_id)?.clone())
    }

    async fn create_wiki(
        &self,
        name: &str,
        description: &str,
        is_public: bool,
    ) -> RemoteResult<CreateWikiResponse> {
        let mut inner = self.begin("create_wiki")?;
        let id = inner.next_id("wiki");
        let created_at = inner.tick();
        let actor = inner.actor.clone();
        let wiki = Wiki {
            id: id.clone(),
            name: name.to_string(),
            description: description.to_string(),
            is_public,
            created_by: actor.clone(),
            created_at,
            members: HashMap::from([(actor, WikiRole::SuperAdmin)]),
        };
        inner.wikis.insert(id.clone(), wiki.clone());
        inner.pages.insert(id.clone(), BTreeMap::new());
        Ok(CreateWikiResponse { wiki_id: id, wiki })
    }

    async fn join_wiki(&self, wiki_id: &str, _node_id: Option<&str>) -> RemoteResult<()> {
        let mut inner = self.begin("join_wiki")?;
        if !inner.wiki(wiki_id)?.is_public {
            return Err(RemoteError::forbidden("Access denied").with_details("This wiki is private"));
        }
        let actor = inner.actor.clone();
        if let Some(wiki) = inner.wikis.get_mut(wiki_id) {
            wiki.members.entry(actor).or_insert(WikiRole::Reader);
        }
        Ok(())
    }

    async fn leave_wiki(&self, wiki_id: &str) -> RemoteResult<()> {
        let mut inner = self.begin("leave_wiki")?;
        inner.require_role(wiki_id, WikiRole::Reader)?;
        let actor = inner.actor.clone();
        if let Some(wiki) = inner.wikis.get_mut(wiki_id) {
            wiki.members.remove(&actor);
        }
        Ok(())
    }

    async fn update_wiki_settings(
        &self,
        wiki_id: &str,
        update: &WikiSettingsUpdate,
    ) -> RemoteResult<()> {
        let mut inner = self.begin("update_wiki_settings")?;
        inner.require_role(wiki_id, WikiRole::Admin)?;
        if let Some(wiki) = inner.wikis.get_mut(wiki_id) {
            update.apply(wiki);
        }
        Ok(())
    }

    async fn find_wikis_by_user(&self, username: &str) -> RemoteResult<Vec<WikiInfo>> {
        let inner = self.begin("find_wikis_by_user")?;
        Ok(inner
            .wikis
            .values()
            .filter(|w| w.is_public && w.role_of(username).is_some())
            .map(|w| WikiInfo {
                id: w.id.clone(),
                name: w.name.clone(),
                description: w.description.clone(),
                is_public: w.is_public,
                member_count: w.members.len(),
                user_role: w.role_of(&inner.actor),
                node_id: Some(username.to_string()),
            })
            .collect())
    }

    // -- pages ---------------------------------------------------------------

    async fn list_pages(&self, wiki_id: &str) -> RemoteResult<Vec<PageSummary>> {
        let (pages, delay) = {
            let inner = self.begin("list_pages")?;
            inner.require_read(wiki_id)?;
            let pages: Vec<PageSummary> = inner
                .pages
                .get(wiki_id)
                .map(|pages| {
                    pages
                        .iter()
                        .map(|(path, page)| PageSummary {
                            path: path.clone(),
                            updated_by: page.head().updated_by.clone(),
                            updated_at: Some(page.head().updated_at),
                        })
                        .collect()
                })
                .unwrap_or_default();
            (pages, inner.page_delay)
        };
        // The answer is fixed when the request arrives; only the reply lags.
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(pages)
    }

    async fn get_page(&self, wiki_id: &str, path: &str) -> RemoteResult<PageContent> {
        let (page, delay) = {
            let inner = self.begin("get_page")?;
            inner.require_read(wiki_id)?;
            let page = page_content(wiki_id, path, inner.page(wiki_id, path)?);
            (page, inner.page_delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(page)
    }

    async fn create_page(&self, wiki_id: &str, path: &str, content: &str) -> RemoteResult<()> {
        let mut inner = self.begin("create_page")?;
        inner.require_role(wiki_id, WikiRole::Writer)?;
        if inner.page(wiki_id, path).is_ok() {
            return Err(RemoteError::new(RemoteErrorKind::Conflict, "Page already exists")
                .with_details(format!("Page '{path}' already exists")));
        }
        let actor = inner.actor.clone();
        let revision = inner.new_revision(content, &actor, Some("Create page"));
        inner.pages.entry(wiki_id.to_string()).or_default().insert(
            path.to_string(),
            StoredPage {
                revisions: vec![revision],
            },
        );
        Ok(())
    }

    async fn update_page(&self, wiki_id: &str, path: &str, content: &str) -> RemoteResult<()> {
        let mut inner = self.begin("update_page")?;
        inner.require_role(wiki_id, WikiRole::Writer)?;
        inner.page(wiki_id, path)?;
        let actor = inner.actor.clone();
        let revision = inner.new_revision(content, &actor, None);
        if let Some(page) = inner.pages.get_mut(wiki_id).and_then(|p| p.get_mut(path)) {
            page.revisions.push(revision);
        }
        Ok(())
    }

    async fn delete_page(&self, wiki_id: &str, path: &str) -> RemoteResult<()> {
        let mut inner = self.begin("delete_page")?;
        inner.require_role(wiki_id, WikiRole::Writer)?;
        inner.page(wiki_id, path)?;
        let deleted_key = inner.next_id("del");
        let deleted_at = inner.tick();
        let deleted_by = inner.actor.clone();
        let Some(page) = inner.pages.get_mut(wiki_id).and_then(|p| p.remove(path)) else {
            return Err(RemoteError::not_found("Page not found"));
        };
        inner
            .deleted
            .entry(wiki_id.to_string())
            .or_default()
            .push(DeletedPage {
                summary: DeletedPageSummary {
                    path: path.to_string(),
                    deleted_key,
                    deleted_by,
                    deleted_at,
                },
                page,
            });
        Ok(())
    }

    async fn list_deleted_pages(&self, wiki_id: &str) -> RemoteResult<Vec<DeletedPageSummary>> {
        let inner = self.begin("list_deleted_pages")?;
        inner.require_read(wiki_id)?;
        Ok(inner
            .deleted
            .get(wiki_id)
            .map(|deleted| deleted.iter().map(|d| d.summary.clone()).collect())
            .unwrap_or_default())
    }

    async fn restore_deleted_page(
        &self,
        wiki_id: &str,
        path: &str,
        deleted_key: &str,
    ) -> RemoteResult<()> {
        let mut inner = self.begin("restore_deleted_page")?;
        inner.require_role(wiki_id, WikiRole::Writer)?;
        if inner.page(wiki_id, path).is_ok() {
            return Err(RemoteError::new(RemoteErrorKind::Conflict, "Page already exists"));
        }
        let deleted = inner.deleted.entry(wiki_id.to_string()).or_default();
        let Some(index) = deleted
            .iter()
            .position(|d| d.summary.path == path && d.summary.deleted_key == deleted_key)
        else {
            return Err(RemoteError::not_found("Deleted page not found"));
        };
        let restored = deleted.remove(index);
        inner
            .pages
            .entry(wiki_id.to_string())
            .or_default()
            .insert(path.to_string(), restored.page);
        Ok(())
    }

    // -- history -------------------------------------------------------------

    async fn get_page_history(
        &self,
        wiki_id: &str,
        path: &str,
    ) -> RemoteResult<PageHistoryResponse> {
        let inner = self.begin("get_page_history")?;
        inner.require_read(wiki_id)?;
        let page = inner.page(wiki_id, path)?;
        let mut versions = page.revisions.clone();
        versions.reverse();
        Ok(PageHistoryResponse {
            versions,
            current_version_id: Some(page.head().version_id.clone()),
        })
    }

    async fn get_version_diff(
        &self,
        wiki_id: &str,
        path: &str,
        version1_id: &str,
        version2_id: &str,
    ) -> RemoteResult<VersionDiff> {
        let inner = self.begin("get_version_diff")?;
        inner.require_read(wiki_id)?;
        if let Some(lines) = &inner.diff_override {
            return Ok(VersionDiff {
                diff_lines: lines.clone(),
            });
        }
        let page = inner.page(wiki_id, path)?;
        let text = |id: &str| {
            page.revisions
                .iter()
                .find(|r| r.version_id == id)
                .map(|r| r.content.clone())
                .ok_or_else(|| RemoteError::not_found(format!("Version {id} not found")))
        };
        let old = text(version1_id)?;
        let new = text(version2_id)?;
        Ok(VersionDiff {
            diff_lines: compute_line_diff(&old, &new),
        })
    }

    // -- search --------------------------------------------------------------

    async fn search_pages(&self, wiki_id: &str, query: &str) -> RemoteResult<Vec<SearchResult>> {
        let delay = self.begin("search_pages")?.search_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let inner = self.lock();
        inner.require_read(wiki_id)?;
        Ok(inner
            .pages
            .get(wiki_id)
            .into_iter()
            .flatten()
            .filter(|(path, page)| page_matches(path, &page.head().content, query))
            .map(|(path, page)| SearchResult {
                path: path.clone(),
                updated_by: page.head().updated_by.clone(),
                updated_at: Some(page.head().updated_at),
                snippet: snippet(&page.head().content, query),
            })
            .collect())
    }

    async fn search_all_wikis(&self, query: &str) -> RemoteResult<Vec<GlobalSearchResult>> {
        let delay = self.begin("search_all_wikis")?.search_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let inner = self.lock();
        let mut results = Vec::new();
        for wiki in inner.wikis.values().filter(|w| w.role_of(&inner.actor).is_some()) {
            for (path, page) in inner.pages.get(&wiki.id).into_iter().flatten() {
                if page_matches(path, &page.head().content, query) {
                    results.push(GlobalSearchResult {
                        wiki_id: wiki.id.clone(),
                        wiki_name: wiki.name.clone(),
                        path: path.clone(),
                        updated_by: page.head().updated_by.clone(),
                        updated_at: Some(page.head().updated_at),
                        snippet: snippet(&page.head().content, query),
                    });
                }
            }
        }
        Ok(results)
    }

    // -- invites and membership ----------------------------------------------

    async fn list_my_invites(&self) -> RemoteResult<Vec<Invite>> {
        let inner = self.begin("list_my_invites")?;
        Ok(inner
            .invites
            .iter()
            .filter(|(who, _)| *who == inner.actor)
            .map(|(_, invite)| invite.clone())
            .collect())
    }

    async fn respond_to_invite(&self, invite_id: &str, accept: bool) -> RemoteResult<InviteStatus> {
        let mut inner = self.begin("respond_to_invite")?;
        let actor = inner.actor.clone();
        let Some(index) = inner
            .invites
            .iter()
            .position(|(who, invite)| *who == actor && invite.id == invite_id)
        else {
            return Err(RemoteError::not_found("Invite not found"));
        };
        let (_, invite) = inner.invites.remove(index);
        if !accept {
            return Ok(InviteStatus::Rejected);
        }
        if let Some(wiki) = inner.wikis.get_mut(&invite.wiki_id) {
            wiki.members.entry(actor).or_insert(WikiRole::Reader);
        }
        Ok(InviteStatus::Accepted)
    }

    async fn invite_user(&self, wiki_id: &str, invitee_id: &str) -> RemoteResult<String> {
        let mut inner = self.begin("invite_user")?;
        inner.require_role(wiki_id, WikiRole::Admin)?;
        let id = inner.next_id("inv");
        let created_at = inner.tick();
        let wiki_name = inner.wiki(wiki_id)?.name.clone();
        let inviter_id = inner.actor.clone();
        inner.invites.push((
            invitee_id.to_string(),
            Invite {
                id: id.clone(),
                wiki_id: wiki_id.to_string(),
                wiki_name,
                inviter_id,
                created_at,
                expires_at: invite_expiry(created_at),
                is_expired: false,
            },
        ));
        Ok(id)
    }

    async fn manage_member(
        &self,
        wiki_id: &str,
        member_id: &str,
        action: MemberAction,
        role: Option<WikiRole>,
    ) -> RemoteResult<()> {
        let mut inner = self.begin("manage_member")?;
        let actor = inner.actor.clone();
        let wiki = inner.wiki(wiki_id)?;
        check_member_change(&wiki.members, &actor, member_id, action, role).map_err(core_to_remote)?;
        if let Some(wiki) = inner.wikis.get_mut(wiki_id) {
            match (action, role) {
                (MemberAction::Remove, _) => {
                    wiki.members.remove(member_id);
                }
                (MemberAction::Add | MemberAction::Update, Some(role)) => {
                    wiki.members.insert(member_id.to_string(), role);
                }
                (_, None) => {}
            }
        }
        Ok(())
    }
}
