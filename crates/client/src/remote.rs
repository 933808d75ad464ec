//! The remote wiki API as seen by the store.
//!
//! Every operation is a single round trip. Implementations report failures
//! as [`RemoteError`] and never panic on remote data.

use async_trait::async_trait;

use folio_core::history::{PageHistoryResponse, VersionDiff};
use folio_core::roles::{MemberAction, WikiRole};
use folio_core::search::{GlobalSearchResult, SearchResult};
use folio_core::wiki::{
    CreateWikiResponse, DeletedPageSummary, Invite, InviteStatus, PageContent, PageSummary, Wiki,
    WikiInfo, WikiSettingsUpdate,
};

use crate::error::RemoteError;

/// Result of one remote call.
pub type RemoteResult<T> = Result<T, RemoteError>;

#[async_trait]
pub trait WikiRemote: Send + Sync {
    // -- wikis ---------------------------------------------------------------

    async fn list_wikis(&self) -> RemoteResult<Vec<Wiki>>;

    async fn get_wiki(&self, wiki_id: &str) -> RemoteResult<Wiki>;

    async fn create_wiki(
        &self,
        name: &str,
        description: &str,
        is_public: bool,
    ) -> RemoteResult<CreateWikiResponse>;

    /// Join a wiki, optionally hosted on another node.
    async fn join_wiki(&self, wiki_id: &str, node_id: Option<&str>) -> RemoteResult<()>;

    async fn leave_wiki(&self, wiki_id: &str) -> RemoteResult<()>;

    async fn update_wiki_settings(
        &self,
        wiki_id: &str,
        update: &WikiSettingsUpdate,
    ) -> RemoteResult<()>;

    /// Public wikis that `username` belongs to.
    async fn find_wikis_by_user(&self, username: &str) -> RemoteResult<Vec<WikiInfo>>;

    // -- pages ---------------------------------------------------------------

    async fn list_pages(&self, wiki_id: &str) -> RemoteResult<Vec<PageSummary>>;

    async fn get_page(&self, wiki_id: &str, path: &str) -> RemoteResult<PageContent>;

    async fn create_page(&self, wiki_id: &str, path: &str, content: &str) -> RemoteResult<()>;

    async fn update_page(&self, wiki_id: &str, path: &str, content: &str) -> RemoteResult<()>;

    /// Soft delete.
    async fn delete_page(&self, wiki_id: &str, path: &str) -> RemoteResult<()>;

    async fn list_deleted_pages(&self, wiki_id: &str) -> RemoteResult<Vec<DeletedPageSummary>>;

    async fn restore_deleted_page(
        &self,
        wiki_id: &str,
        path: &str,
        deleted_key: &str,
    ) -> RemoteResult<()>;

    // -- history -------------------------------------------------------------

    /// Revisions newest first, plus the current revision id.
    async fn get_page_history(&self, wiki_id: &str, path: &str)
        -> RemoteResult<PageHistoryResponse>;

    async fn get_version_diff(
        &self,
        wiki_id: &str,
        path: &str,
        version1_id: &str,
        version2_id: &str,
    ) -> RemoteResult<VersionDiff>;

    // -- search --------------------------------------------------------------

    async fn search_pages(&self, wiki_id: &str, query: &str) -> RemoteResult<Vec<SearchResult>>;

    async fn search_all_wikis(&self, query: &str) -> RemoteResult<Vec<GlobalSearchResult>>;

    // -- invites and membership ----------------------------------------------

    async fn list_my_invites(&self) -> RemoteResult<Vec<Invite>>;

    async fn respond_to_invite(&self, invite_id: &str, accept: bool) -> RemoteResult<InviteStatus>;

    /// Returns the new invite's id.
    async fn invite_user(&self, wiki_id: &str, invitee_id: &str) -> RemoteResult<String>;

    async fn manage_member(
        &self,
        wiki_id: &str,
        member_id: &str,
        action: MemberAction,
        role: Option<WikiRole>,
    ) -> RemoteResult<()>;
}
