//! JSON-over-HTTP implementation of [`WikiRemote`].
//!
//! Every operation is a `POST {api_url}/api` whose body is a single-key
//! object naming the operation, e.g. `{"GetPage": {"wiki_id": "w1", "path": "Home"}}`.
//! Failures come back as a non-2xx status with an `{"error", "details"}` body.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use folio_core::history::{PageHistoryResponse, VersionDiff};
use folio_core::roles::{MemberAction, WikiRole};
use folio_core::search::{GlobalSearchResult, SearchResult};
use folio_core::wiki::{
    CreateWikiResponse, DeletedPageSummary, Invite, InviteStatus, PageContent, PageSummary, Wiki,
    WikiInfo, WikiSettingsUpdate,
};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult, RemoteError, RemoteErrorKind};
use crate::remote::{RemoteResult, WikiRemote};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// HTTP client for one wiki API endpoint.
pub struct HttpRemote {
    client: reqwest::Client,
    api_url: String,
}

/// Error body returned with a non-2xx status.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    details: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct InviteUserResponse {
    invite_id: String,
}

#[derive(Debug, Deserialize)]
struct RespondToInviteResponse {
    status: InviteStatus,
}

impl HttpRemote {
    /// Build a client with the configured request timeout.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, config.api_url.clone()))
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: String) -> Self {
        Self { client, api_url }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Send one operation and decode its JSON result.
    async fn call<T: DeserializeOwned>(&self, op: &'static str, params: Value) -> RemoteResult<T> {
        let response = self.send(op, params).await?;
        response.json::<T>().await.map_err(|e| {
            RemoteError::new(
                RemoteErrorKind::Server,
                format!("Invalid response to {op}: {e}"),
            )
        })
    }

    /// Send one operation, discarding the success body.
    async fn call_unit(&self, op: &'static str, params: Value) -> RemoteResult<()> {
        self.send(op, params).await?;
        Ok(())
    }

    async fn send(&self, op: &'static str, params: Value) -> RemoteResult<reqwest::Response> {
        let request_id = uuid::Uuid::new_v4().to_string();
        tracing::debug!(op, request_id = %request_id, "Sending wiki API request");

        let response = self
            .client
            .post(format!("{}/api", self.api_url))
            .header(REQUEST_ID_HEADER, &request_id)
            .json(&json!({ op: params }))
            .send()
            .await
            .map_err(|e| transport_error(op, &e))?;

        Self::ensure_success(op, response).await
    }

    /// Pass a 2xx response through; turn anything else into a
    /// [`RemoteError`] classified by status.
    async fn ensure_success(
        op: &'static str,
        response: reqwest::Response,
    ) -> RemoteResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = parse_error_body(status.as_u16(), &body);
        tracing::debug!(op, status = status.as_u16(), error = %error, "Wiki API request failed");
        Err(error)
    }
}

/// Map an HTTP status to an error kind.
pub fn status_kind(status: u16) -> RemoteErrorKind {
    match status {
        404 => RemoteErrorKind::NotFound,
        401 | 403 => RemoteErrorKind::Forbidden,
        409 => RemoteErrorKind::Conflict,
        400 | 422 => RemoteErrorKind::Invalid,
        _ => RemoteErrorKind::Server,
    }
}

fn parse_error_body(status: u16, body: &str) -> RemoteError {
    let kind = status_kind(status);
    let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) else {
        let message = if body.trim().is_empty() {
            format!("Request failed with status {status}")
        } else {
            body.trim().to_string()
        };
        return RemoteError::new(kind, message);
    };

    let message = parsed
        .error
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| format!("Request failed with status {status}"));
    let details = parsed.details.and_then(|details| match details {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    });

    RemoteError {
        kind,
        message,
        details,
    }
}

fn transport_error(op: &str, error: &reqwest::Error) -> RemoteError {
    let kind = if error.is_timeout() {
        RemoteErrorKind::Timeout
    } else {
        RemoteErrorKind::Network
    };
    RemoteError::new(kind, format!("{op} request failed: {error}"))
}

#[async_trait]
impl WikiRemote for HttpRemote {
    async fn list_wikis(&self) -> RemoteResult<Vec<Wiki>> {
        self.call("ListWikis", json!({})).await
    }

    async fn get_wiki(&self, wiki_id: &str) -> RemoteResult<Wiki> {
        self.call("GetWiki", json!({ "wiki_id": wiki_id })).await
    }

    async fn create_wiki(
        &self,
        name: &str,
        description: &str,
        is_public: bool,
    ) -> RemoteResult<CreateWikiResponse> {
        self.call(
            "CreateWiki",
            json!({ "name": name, "description": description, "is_public": is_public }),
        )
        .await
    }

    async fn join_wiki(&self, wiki_id: &str, node_id: Option<&str>) -> RemoteResult<()> {
        self.call_unit(
            "JoinWiki",
            json!({ "wiki_id": wiki_id, "join_code": null, "node_id": node_id }),
        )
        .await
    }

    async fn leave_wiki(&self, wiki_id: &str) -> RemoteResult<()> {
        self.call_unit("LeaveWiki", json!({ "wiki_id": wiki_id })).await
    }

    async fn update_wiki_settings(
        &self,
        wiki_id: &str,
        update: &WikiSettingsUpdate,
    ) -> RemoteResult<()> {
        self.call_unit(
            "UpdateWikiSettings",
            json!({
                "wiki_id": wiki_id,
                "name": update.name,
                "description": update.description,
                "is_public": update.is_public,
            }),
        )
        .await
    }

    async fn find_wikis_by_user(&self, username: &str) -> RemoteResult<Vec<WikiInfo>> {
        self.call("FindWikisByUser", json!({ "username": username }))
            .await
    }

    async fn list_pages(&self, wiki_id: &str) -> RemoteResult<Vec<PageSummary>> {
        self.call("ListPages", json!({ "wiki_id": wiki_id })).await
    }

    async fn get_page(&self, wiki_id: &str, path: &str) -> RemoteResult<PageContent> {
        self.call("GetPage", json!({ "wiki_id": wiki_id, "path": path }))
            .await
    }

    async fn create_page(&self, wiki_id: &str, path: &str, content: &str) -> RemoteResult<()> {
        self.call_unit(
            "CreatePage",
            json!({ "wiki_id": wiki_id, "path": path, "initial_content": content }),
        )
        .await
    }

    async fn update_page(&self, wiki_id: &str, path: &str, content: &str) -> RemoteResult<()> {
        self.call_unit(
            "UpdatePage",
            json!({ "wiki_id": wiki_id, "path": path, "content": content }),
        )
        .await
    }

    async fn delete_page(&self, wiki_id: &str, path: &str) -> RemoteResult<()> {
        self.call_unit("DeletePage", json!({ "wiki_id": wiki_id, "path": path }))
            .await
    }

    async fn list_deleted_pages(&self, wiki_id: &str) -> RemoteResult<Vec<DeletedPageSummary>> {
        self.call("ListDeletedPages", json!({ "wiki_id": wiki_id }))
            .await
    }

    async fn restore_deleted_page(
        &self,
        wiki_id: &str,
        path: &str,
        deleted_key: &str,
    ) -> RemoteResult<()> {
        self.call_unit(
            "RestoreDeletedPage",
            json!({ "wiki_id": wiki_id, "path": path, "deleted_key": deleted_key }),
        )
        .await
    }

    async fn get_page_history(
        &self,
        wiki_id: &str,
        path: &str,
    ) -> RemoteResult<PageHistoryResponse> {
        self.call("GetPageHistory", json!({ "wiki_id": wiki_id, "path": path }))
            .await
    }

    async fn get_version_diff(
        &self,
        wiki_id: &str,
        path: &str,
        version1_id: &str,
        version2_id: &str,
    ) -> RemoteResult<VersionDiff> {
        self.call(
            "GetVersionDiff",
            json!({
                "wiki_id": wiki_id,
                "path": path,
                "version1_id": version1_id,
                "version2_id": version2_id,
            }),
        )
        .await
    }

    async fn search_pages(&self, wiki_id: &str, query: &str) -> RemoteResult<Vec<SearchResult>> {
        self.call("SearchPages", json!({ "wiki_id": wiki_id, "query": query }))
            .await
    }

    async fn search_all_wikis(&self, query: &str) -> RemoteResult<Vec<GlobalSearchResult>> {
        self.call("SearchAllWikis", json!({ "query": query })).await
    }

    async fn list_my_invites(&self) -> RemoteResult<Vec<Invite>> {
        self.call("ListMyInvites", json!({})).await
    }

    async fn respond_to_invite(&self, invite_id: &str, accept: bool) -> RemoteResult<InviteStatus> {
        let response: RespondToInviteResponse = self
            .call(
                "RespondToInvite",
                json!({ "invite_id": invite_id, "accept": accept }),
            )
            .await?;
        Ok(response.status)
    }

    async fn invite_user(&self, wiki_id: &str, invitee_id: &str) -> RemoteResult<String> {
        let response: InviteUserResponse = self
            .call(
                "InviteUser",
                json!({ "wiki_id": wiki_id, "invitee_id": invitee_id }),
            )
            .await?;
        Ok(response.invite_id)
    }

    async fn manage_member(
        &self,
        wiki_id: &str,
        member_id: &str,
        action: MemberAction,
        role: Option<WikiRole>,
    ) -> RemoteResult<()> {
        self.call_unit(
            "ManageMember",
            json!({
                "wiki_id": wiki_id,
                "member_id": member_id,
                "action": action,
                "role": role,
            }),
        )
        .await
    }
}
