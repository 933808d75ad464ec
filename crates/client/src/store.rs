//! The synchronization store.
//!
//! [`WikiStore`] is the single owner of session state: the open wiki and
//! page, the page list and the loading/error flags. Presentation code reads
//! snapshots and calls the named operations; nothing else mutates state.
//!
//! Every tracked operation clears `error`, sets `is_loading`, performs its
//! remote round trips and then either commits the new state slice or
//! records a user-facing message in `error`, leaving other state as it was.
//! The result is also returned to the caller, so operations compose without
//! reading the shared flags. The flags themselves are last-write-wins when
//! operations overlap; the returned results are authoritative.
//!
//! The state lock is never held across a remote call.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use folio_core::diff::DiffLine;
use folio_core::error::CoreError;
use folio_core::history::{DiffRequest, PageHistory};
use folio_core::markup::{self, StructuredContent};
use folio_core::roles::{check_member_change, Capabilities, MemberAction, WikiRole};
use folio_core::search::{normalize_query, GlobalSearchResult, SearchResult};
use folio_core::types::NodeId;
use folio_core::wiki::{
    validate_content, validate_description, validate_node_id, validate_page_path,
    validate_wiki_name, DeletedPageSummary, Invite, InviteStatus, PageContent, PageSummary, Wiki,
    WikiInfo, WikiSettingsUpdate,
};

use crate::error::{ClientError, ClientResult};
use crate::events::{EventBus, StoreEvent};
use crate::remote::WikiRemote;

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Everything the store knows about the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Acting node id, supplied by the environment.
    pub actor: Option<NodeId>,
    pub wikis: Vec<Wiki>,
    pub current_wiki: Option<Wiki>,
    pub current_page: Option<PageContent>,
    /// Sidebar entries of the open wiki.
    pub pages: Vec<PageSummary>,
    pub deleted_pages: Vec<DeletedPageSummary>,
    pub invites: Vec<Invite>,
    pub is_loading: bool,
    pub error: Option<String>,
    /// Bumped whenever the open wiki is replaced or closed.
    generation: u64,
}

impl SessionState {
    /// The actor's capabilities in the open wiki.
    pub fn capabilities(&self) -> Capabilities {
        match (&self.current_wiki, &self.actor) {
            (Some(wiki), Some(actor)) => wiki.capabilities_for(actor),
            _ => Capabilities::NONE,
        }
    }

    /// The actor's role in the open wiki.
    pub fn role(&self) -> Option<WikiRole> {
        match (&self.current_wiki, &self.actor) {
            (Some(wiki), Some(actor)) => wiki.role_of(actor),
            _ => None,
        }
    }

    /// Compile the open page for display.
    pub fn compiled_page(&self) -> Option<StructuredContent> {
        self.current_page
            .as_ref()
            .map(|page| markup::compile(&page.content))
    }

    fn is_current_wiki(&self, wiki_id: &str) -> bool {
        self.current_wiki.as_ref().is_some_and(|w| w.id == wiki_id)
    }

    /// Results for `wiki_id` may be applied: that wiki is open, or none is.
    fn accepts(&self, wiki_id: &str) -> bool {
        self.current_wiki.is_none() || self.is_current_wiki(wiki_id)
    }

    /// Taken before a round trip for `wiki_id`; `None` when its result could
    /// not be applied even now.
    fn session_for(&self, wiki_id: &str) -> Option<u64> {
        self.accepts(wiki_id).then_some(self.generation)
    }

    /// A result for `wiki_id` fetched under `session` may still be applied:
    /// the open wiki has not changed since.
    fn still_accepts(&self, wiki_id: &str, session: Option<u64>) -> bool {
        session == Some(self.generation) && self.accepts(wiki_id)
    }

    fn find_wiki(&self, wiki_id: &str) -> Option<&Wiki> {
        self.current_wiki
            .iter()
            .chain(self.wikis.iter())
            .find(|w| w.id == wiki_id)
    }

    /// Replace a wiki in the list and, when open, as the current wiki.
    fn replace_wiki(&mut self, wiki: Wiki) {
        if let Some(slot) = self.wikis.iter_mut().find(|w| w.id == wiki.id) {
            *slot = wiki.clone();
        }
        if self.is_current_wiki(&wiki.id) {
            self.current_wiki = Some(wiki);
        }
    }

    fn clear_open_wiki(&mut self) {
        self.generation += 1;
        self.current_wiki = None;
        self.current_page = None;
        self.pages.clear();
        self.deleted_pages.clear();
    }
}

#[derive(Debug, Clone, Copy)]
enum Access {
    Write,
    Admin,
}

fn ensure_access(wiki: &Wiki, actor: &str, access: Access) -> ClientResult<()> {
    let caps = wiki.capabilities_for(actor);
    let (allowed, what) = match access {
        Access::Write => (caps.can_write, "write"),
        Access::Admin => (caps.can_admin, "admin"),
    };
    if allowed {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!("You need {what} access to {}", wiki.name)).into())
    }
}

// ---------------------------------------------------------------------------
// WikiStore
// ---------------------------------------------------------------------------

/// The session's single source of truth.
///
/// Every tracked operation sets `is_loading` while it runs and leaves either
/// its result in the state or a user-facing message in `error`. Committed
/// changes are announced as [`StoreEvent`]s.
pub struct WikiStore {
    remote: Arc<dyn WikiRemote>,
    state: RwLock<SessionState>,
    events: EventBus,
}

impl WikiStore {
    /// A store with no actor yet; see [`WikiStore::set_actor`].
    pub fn new(remote: Arc<dyn WikiRemote>) -> Self {
        Self::with_state(remote, SessionState::default())
    }

    /// A store acting as `actor` from the start.
    pub fn with_actor(remote: Arc<dyn WikiRemote>, actor: impl Into<NodeId>) -> ClientResult<Self> {
        let actor = actor.into();
        validate_node_id(&actor)?;
        Ok(Self::with_state(
            remote,
            SessionState {
                actor: Some(actor),
                ..Default::default()
            },
        ))
    }

    fn with_state(remote: Arc<dyn WikiRemote>, state: SessionState) -> Self {
        Self {
            remote,
            state: RwLock::new(state),
            events: EventBus::default(),
        }
    }

    // ---- reads ----

    /// Receive every event committed from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// A copy of the whole session state.
    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn actor(&self) -> Option<NodeId> {
        self.state.read().await.actor.clone()
    }

    pub async fn current_wiki(&self) -> Option<Wiki> {
        self.state.read().await.current_wiki.clone()
    }

    pub async fn current_page(&self) -> Option<PageContent> {
        self.state.read().await.current_page.clone()
    }

    pub async fn compiled_page(&self) -> Option<StructuredContent> {
        self.state.read().await.compiled_page()
    }

    pub async fn capabilities(&self) -> Capabilities {
        self.state.read().await.capabilities()
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.is_loading
    }

    // ---- session ----

    /// Set the acting node id.
    pub async fn set_actor(&self, node_id: &str) -> ClientResult<()> {
        validate_node_id(node_id)?;
        self.state.write().await.actor = Some(node_id.to_string());
        debug!(node_id, "Actor set");
        Ok(())
    }

    pub async fn set_error(&self, message: impl Into<String>) {
        self.state.write().await.error = Some(message.into());
    }

    pub async fn clear_error(&self) {
        self.state.write().await.error = None;
    }

    // ---- wikis ----

    /// Reload the wikis the actor belongs to. On failure the previous list
    /// stays.
    pub async fn load_wikis(&self) -> ClientResult<Vec<Wiki>> {
        self.track("load_wikis", "Failed to load wikis", self.fetch_wikis())
            .await
    }

    /// Open a wiki.
    ///
    /// The given copy is shown immediately and the page list cleared. A fresh
    /// copy is then fetched for up-to-date membership; if that fails the
    /// cached copy stays. The page list is loaded either way.
    pub async fn select_wiki(&self, wiki: Wiki) -> ClientResult<Vec<PageSummary>> {
        let wiki_id = wiki.id.clone();
        {
            let mut state = self.state.write().await;
            state.clear_open_wiki();
            state.current_wiki = Some(wiki);
        }
        debug!(wiki_id = %wiki_id, "Wiki opened");
        self.events.publish(StoreEvent::WikiOpened {
            wiki_id: wiki_id.clone(),
        });

        if let Err(err) = self.refresh_wiki(&wiki_id).await {
            warn!(wiki_id = %wiki_id, error = %err, "Failed to refresh wiki, keeping cached copy");
        }
        self.load_pages(&wiki_id).await
    }

    /// Close the open wiki and page together.
    pub async fn close_wiki(&self) {
        self.state.write().await.clear_open_wiki();
        self.events.publish(StoreEvent::WikiClosed);
    }

    /// Re-fetch a wiki in the background. The result is applied only if the
    /// wiki has stayed open throughout; returns whether it was. Does not
    /// touch the loading or error flags.
    pub async fn refresh_wiki(&self, wiki_id: &str) -> ClientResult<bool> {
        let session = {
            let state = self.state.read().await;
            state.is_current_wiki(wiki_id).then_some(state.generation)
        };
        let fresh = self.remote.get_wiki(wiki_id).await?;
        let applied = {
            let mut state = self.state.write().await;
            if state.is_current_wiki(wiki_id) && session == Some(state.generation) {
                state.replace_wiki(fresh);
                true
            } else {
                false
            }
        };
        if applied {
            self.events.publish(StoreEvent::WikiRefreshed {
                wiki_id: wiki_id.to_string(),
            });
        } else {
            debug!(wiki_id, "Discarding refresh of a wiki that is no longer open");
        }
        Ok(applied)
    }

    /// Create a wiki, add it to the list and open it.
    pub async fn create_wiki(
        &self,
        name: &str,
        description: &str,
        is_public: bool,
    ) -> ClientResult<Wiki> {
        self.track("create_wiki", "Failed to create wiki", async {
            validate_wiki_name(name)?;
            validate_description(description)?;
            let created = self.remote.create_wiki(name, description, is_public).await?;
            let wiki = created.wiki;
            {
                let mut state = self.state.write().await;
                if !state.wikis.iter().any(|w| w.id == wiki.id) {
                    state.wikis.push(wiki.clone());
                }
                state.clear_open_wiki();
                state.current_wiki = Some(wiki.clone());
            }
            info!(wiki_id = %wiki.id, name = %wiki.name, "Wiki created");
            self.events.publish(StoreEvent::WikiCreated {
                wiki_id: wiki.id.clone(),
            });
            self.events.publish(StoreEvent::WikiOpened {
                wiki_id: wiki.id.clone(),
            });
            Ok(wiki)
        })
        .await
    }

    /// Join a wiki, then reload the wiki list.
    pub async fn join_wiki(&self, wiki_id: &str, node_id: Option<&str>) -> ClientResult<Vec<Wiki>> {
        self.track("join_wiki", "Failed to join wiki", async {
            self.remote.join_wiki(wiki_id, node_id).await?;
            info!(wiki_id, "Joined wiki");
            self.events.publish(StoreEvent::WikiJoined {
                wiki_id: wiki_id.to_string(),
            });
            self.fetch_wikis().await
        })
        .await
    }

    /// Leave a wiki; closes it if it is open.
    pub async fn leave_wiki(&self, wiki_id: &str) -> ClientResult<()> {
        self.track("leave_wiki", "Failed to leave wiki", async {
            self.remote.leave_wiki(wiki_id).await?;
            let was_open = {
                let mut state = self.state.write().await;
                state.wikis.retain(|w| w.id != wiki_id);
                let was_open = state.is_current_wiki(wiki_id);
                if was_open {
                    state.clear_open_wiki();
                }
                was_open
            };
            info!(wiki_id, "Left wiki");
            self.events.publish(StoreEvent::WikiLeft {
                wiki_id: wiki_id.to_string(),
            });
            if was_open {
                self.events.publish(StoreEvent::WikiClosed);
            }
            Ok(())
        })
        .await
    }

    /// Change a wiki's name, description or visibility (Admin and above).
    pub async fn update_wiki_settings(
        &self,
        wiki_id: &str,
        update: &WikiSettingsUpdate,
    ) -> ClientResult<Wiki> {
        self.track("update_wiki_settings", "Failed to update wiki settings", async {
            update.validate()?;
            let (wiki, actor) = self.known_wiki(wiki_id).await?;
            ensure_access(&wiki, &actor, Access::Admin)?;
            self.remote.update_wiki_settings(wiki_id, update).await?;

            let updated = match self.remote.get_wiki(wiki_id).await {
                Ok(fresh) => fresh,
                Err(err) => {
                    warn!(wiki_id, error = %err, "Failed to re-fetch wiki after update, applying locally");
                    let mut local = wiki;
                    update.apply(&mut local);
                    local
                }
            };
            self.state.write().await.replace_wiki(updated.clone());
            info!(wiki_id, "Wiki settings updated");
            self.events.publish(StoreEvent::WikiSettingsUpdated {
                wiki_id: wiki_id.to_string(),
            });
            Ok(updated)
        })
        .await
    }

    /// Public wikis that `username` belongs to.
    pub async fn find_wikis_by_user(&self, username: &str) -> ClientResult<Vec<WikiInfo>> {
        self.track("find_wikis_by_user", "Failed to find wikis", async {
            validate_node_id(username)?;
            Ok(self.remote.find_wikis_by_user(username).await?)
        })
        .await
    }

    // ---- pages ----

    /// Reload the sidebar page list of `wiki_id`.
    pub async fn load_pages(&self, wiki_id: &str) -> ClientResult<Vec<PageSummary>> {
        self.track("load_pages", "Failed to load pages", self.fetch_pages(wiki_id))
            .await
    }

    /// Load a page. On failure the previously open page stays in place.
    pub async fn load_page(&self, wiki_id: &str, path: &str) -> ClientResult<PageContent> {
        self.track("load_page", "Failed to load page", self.fetch_page(wiki_id, path))
            .await
    }

    /// Save new content for the open page, then re-fetch it so the page
    /// carries the new revision's metadata.
    pub async fn save_page(&self, content: &str) -> ClientResult<PageContent> {
        self.track("save_page", "Failed to save page", async {
            let (wiki, path) = {
                let state = self.state.read().await;
                let wiki = state.current_wiki.clone().ok_or(ClientError::NoWikiOpen)?;
                let page = state.current_page.as_ref().ok_or(ClientError::NoPageOpen)?;
                (wiki, page.path.clone())
            };
            let actor = self.require_actor().await?;
            ensure_access(&wiki, &actor, Access::Write)?;
            validate_content(content)?;

            self.remote.update_page(&wiki.id, &path, content).await?;
            info!(wiki_id = %wiki.id, path = %path, "Page saved");
            self.events.publish(StoreEvent::PageSaved {
                wiki_id: wiki.id.clone(),
                path: path.clone(),
            });
            self.fetch_page(&wiki.id, &path).await
        })
        .await
    }

    /// Create a page in the open wiki, reload the page list and then open
    /// the new page.
    pub async fn create_page(&self, path: &str, initial_content: &str) -> ClientResult<PageContent> {
        self.track("create_page", "Failed to create page", async {
            let wiki = self.gated_open_wiki(Access::Write).await?;
            validate_page_path(path)?;
            validate_content(initial_content)?;

            self.remote.create_page(&wiki.id, path, initial_content).await?;
            info!(wiki_id = %wiki.id, path, "Page created");
            self.events.publish(StoreEvent::PageCreated {
                wiki_id: wiki.id.clone(),
                path: path.to_string(),
            });
            self.fetch_pages(&wiki.id).await?;
            self.fetch_page(&wiki.id, path).await
        })
        .await
    }

    /// Soft-delete a page of the open wiki and reload the page list.
    pub async fn delete_page(&self, path: &str) -> ClientResult<()> {
        self.track("delete_page", "Failed to delete page", async {
            let wiki = self.gated_open_wiki(Access::Write).await?;
            self.remote.delete_page(&wiki.id, path).await?;
            {
                let mut state = self.state.write().await;
                let is_open = state
                    .current_page
                    .as_ref()
                    .is_some_and(|p| p.wiki_id == wiki.id && p.path == path);
                if is_open {
                    state.current_page = None;
                }
            }
            info!(wiki_id = %wiki.id, path, "Page deleted");
            self.events.publish(StoreEvent::PageDeleted {
                wiki_id: wiki.id.clone(),
                path: path.to_string(),
            });
            self.fetch_pages(&wiki.id).await?;
            Ok(())
        })
        .await
    }

    /// Soft-deleted pages of the open wiki (Writer and above).
    pub async fn list_deleted_pages(&self) -> ClientResult<Vec<DeletedPageSummary>> {
        self.track("list_deleted_pages", "Failed to load deleted pages", async {
            let wiki = self.open_wiki().await?;
            let deleted = self.remote.list_deleted_pages(&wiki.id).await?;
            {
                let mut state = self.state.write().await;
                if state.is_current_wiki(&wiki.id) {
                    state.deleted_pages = deleted.clone();
                }
            }
            self.events.publish(StoreEvent::DeletedPagesLoaded {
                wiki_id: wiki.id.clone(),
                count: deleted.len(),
            });
            Ok(deleted)
        })
        .await
    }

    /// Restore one deletion of `path`, reload the page list and open the
    /// restored page.
    pub async fn restore_page(&self, path: &str, deleted_key: &str) -> ClientResult<PageContent> {
        self.track("restore_page", "Failed to restore page", async {
            let wiki = self.gated_open_wiki(Access::Write).await?;
            self.remote
                .restore_deleted_page(&wiki.id, path, deleted_key)
                .await?;
            self.state
                .write()
                .await
                .deleted_pages
                .retain(|d| d.deleted_key != deleted_key);
            info!(wiki_id = %wiki.id, path, deleted_key, "Page restored");
            self.events.publish(StoreEvent::PageRestored {
                wiki_id: wiki.id.clone(),
                path: path.to_string(),
            });
            self.fetch_pages(&wiki.id).await?;
            self.fetch_page(&wiki.id, path).await
        })
        .await
    }

    // ---- invites and membership ----

    /// Invites waiting for the actor.
    pub async fn list_my_invites(&self) -> ClientResult<Vec<Invite>> {
        self.track("list_my_invites", "Failed to load invites", async {
            let invites = self.remote.list_my_invites().await?;
            self.state.write().await.invites = invites.clone();
            self.events.publish(StoreEvent::InvitesLoaded {
                count: invites.len(),
            });
            Ok(invites)
        })
        .await
    }

    /// Accept or decline an invite. Accepting reloads the wiki list.
    pub async fn respond_to_invite(&self, invite_id: &str, accept: bool) -> ClientResult<InviteStatus> {
        self.track("respond_to_invite", "Failed to respond to invite", async {
            let status = self.remote.respond_to_invite(invite_id, accept).await?;
            self.state
                .write()
                .await
                .invites
                .retain(|i| i.id != invite_id);
            info!(invite_id, ?status, "Invite answered");
            self.events.publish(StoreEvent::InviteAnswered {
                invite_id: invite_id.to_string(),
                status,
            });
            if accept {
                self.fetch_wikis().await?;
            }
            Ok(status)
        })
        .await
    }

    /// Invite a node to a wiki (Admin and above). Returns the invite id.
    pub async fn invite_user(&self, wiki_id: &str, invitee_id: &str) -> ClientResult<String> {
        self.track("invite_user", "Failed to invite user", async {
            validate_node_id(invitee_id)?;
            let (wiki, actor) = self.known_wiki(wiki_id).await?;
            ensure_access(&wiki, &actor, Access::Admin)?;
            if invitee_id == actor {
                return Err(CoreError::Validation("You cannot invite yourself".into()).into());
            }
            if wiki.members.contains_key(invitee_id) {
                return Err(
                    CoreError::Conflict(format!("{invitee_id} is already a member")).into(),
                );
            }

            let invite_id = self.remote.invite_user(wiki_id, invitee_id).await?;
            info!(wiki_id, invitee_id, invite_id = %invite_id, "Invite sent");
            self.events.publish(StoreEvent::InviteSent {
                wiki_id: wiki_id.to_string(),
                invitee_id: invitee_id.to_string(),
            });
            Ok(invite_id)
        })
        .await
    }

    /// Add, remove or re-role a member. The change is checked locally
    /// first; afterwards the open wiki is re-fetched if it was the one
    /// changed.
    pub async fn manage_member(
        &self,
        wiki_id: &str,
        member_id: &str,
        action: MemberAction,
        role: Option<WikiRole>,
    ) -> ClientResult<()> {
        self.track("manage_member", "Failed to manage member", async {
            let (wiki, actor) = self.known_wiki(wiki_id).await?;
            check_member_change(&wiki.members, &actor, member_id, action, role)?;

            self.remote
                .manage_member(wiki_id, member_id, action, role)
                .await?;
            info!(wiki_id, member_id, %action, ?role, "Member changed");
            self.events.publish(StoreEvent::MemberChanged {
                wiki_id: wiki_id.to_string(),
                member_id: member_id.to_string(),
                action,
            });

            let is_open = self.state.read().await.is_current_wiki(wiki_id);
            if is_open {
                if let Err(err) = self.refresh_wiki(wiki_id).await {
                    warn!(wiki_id, error = %err, "Failed to refresh wiki after member change");
                }
            }
            Ok(())
        })
        .await
    }

    // ---- history and search ----
    //
    // These do not touch the loading or error flags; their callers own the
    // presentation of failures.

    /// Revision history of a page in the open wiki.
    pub async fn page_history(&self, path: &str) -> ClientResult<PageHistory> {
        let wiki = self.open_wiki().await?;
        let response = self.remote.get_page_history(&wiki.id, path).await?;
        Ok(PageHistory::new(wiki.id, path, response)?)
    }

    /// The remote's diff between two revisions.
    pub async fn version_diff(
        &self,
        wiki_id: &str,
        path: &str,
        request: &DiffRequest,
    ) -> ClientResult<Vec<DiffLine>> {
        let diff = self
            .remote
            .get_version_diff(
                wiki_id,
                path,
                &request.old_version_id,
                &request.new_version_id,
            )
            .await?;
        Ok(diff.diff_lines)
    }

    /// Search the open wiki. A blank query returns no results without a
    /// round trip.
    pub async fn search_pages(&self, query: &str) -> ClientResult<Vec<SearchResult>> {
        let Some(query) = normalize_query(query) else {
            return Ok(Vec::new());
        };
        let wiki = self.open_wiki().await?;
        Ok(self.remote.search_pages(&wiki.id, query).await?)
    }

    /// Search every wiki the actor belongs to. A blank query returns no
    /// results without a round trip.
    pub async fn search_all_wikis(&self, query: &str) -> ClientResult<Vec<GlobalSearchResult>> {
        let Some(query) = normalize_query(query) else {
            return Ok(Vec::new());
        };
        Ok(self.remote.search_all_wikis(query).await?)
    }

    /// A wiki by id: from local state, otherwise fetched.
    pub async fn find_wiki(&self, wiki_id: &str) -> ClientResult<Wiki> {
        let cached = self.state.read().await.find_wiki(wiki_id).cloned();
        match cached {
            Some(wiki) => Ok(wiki),
            None => Ok(self.remote.get_wiki(wiki_id).await?),
        }
    }

    // ---- private helpers ----

    /// Run a tracked operation: clear the error, raise the loading flag,
    /// then record the outcome.
    async fn track<T, F>(&self, operation: &'static str, fallback: &str, work: F) -> ClientResult<T>
    where
        F: Future<Output = ClientResult<T>>,
    {
        {
            let mut state = self.state.write().await;
            state.is_loading = true;
            state.error = None;
        }

        let result = work.await;

        let mut state = self.state.write().await;
        state.is_loading = false;
        match result {
            Ok(value) => Ok(value),
            Err(err) => {
                let message = err.user_message(fallback);
                state.error = Some(message.clone());
                drop(state);
                warn!(operation, error = %message, "Store operation failed");
                self.events.publish(StoreEvent::Failed {
                    operation: operation.to_string(),
                    message,
                });
                Err(err)
            }
        }
    }

    async fn fetch_wikis(&self) -> ClientResult<Vec<Wiki>> {
        let wikis = self.remote.list_wikis().await?;
        self.state.write().await.wikis = wikis.clone();
        self.events.publish(StoreEvent::WikisLoaded { count: wikis.len() });
        Ok(wikis)
    }

    async fn fetch_pages(&self, wiki_id: &str) -> ClientResult<Vec<PageSummary>> {
        let session = self.state.read().await.session_for(wiki_id);
        let pages = self.remote.list_pages(wiki_id).await?;
        let applied = {
            let mut state = self.state.write().await;
            let accepts = state.still_accepts(wiki_id, session);
            if accepts {
                state.pages = pages.clone();
            }
            accepts
        };
        if applied {
            self.events.publish(StoreEvent::PagesLoaded {
                wiki_id: wiki_id.to_string(),
                count: pages.len(),
            });
        } else {
            debug!(wiki_id, "Discarding page list of a wiki that is no longer open");
        }
        Ok(pages)
    }

    async fn fetch_page(&self, wiki_id: &str, path: &str) -> ClientResult<PageContent> {
        let session = self.state.read().await.session_for(wiki_id);
        let page = self.remote.get_page(wiki_id, path).await?;
        let applied = {
            let mut state = self.state.write().await;
            let accepts = state.still_accepts(wiki_id, session);
            if accepts {
                state.current_page = Some(page.clone());
            }
            accepts
        };
        if applied {
            debug!(wiki_id, path, "Page loaded");
            self.events.publish(StoreEvent::PageLoaded {
                wiki_id: wiki_id.to_string(),
                path: path.to_string(),
            });
        } else {
            debug!(wiki_id, path, "Discarding page of a wiki that is no longer open");
        }
        Ok(page)
    }

    async fn require_actor(&self) -> ClientResult<NodeId> {
        self.actor().await.ok_or(ClientError::ActorUnknown)
    }

    async fn open_wiki(&self) -> ClientResult<Wiki> {
        self.current_wiki().await.ok_or(ClientError::NoWikiOpen)
    }

    async fn gated_open_wiki(&self, access: Access) -> ClientResult<Wiki> {
        let wiki = self.open_wiki().await?;
        let actor = self.require_actor().await?;
        ensure_access(&wiki, &actor, access)?;
        Ok(wiki)
    }

    async fn known_wiki(&self, wiki_id: &str) -> ClientResult<(Wiki, NodeId)> {
        let actor = self.require_actor().await?;
        let wiki = self.find_wiki(wiki_id).await?;
        Ok((wiki, actor))
    }
}
