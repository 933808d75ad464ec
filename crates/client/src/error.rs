use folio_core::error::CoreError;

/// Category of a failed remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteErrorKind {
    NotFound,
    Forbidden,
    Conflict,
    /// The request was rejected as malformed.
    Invalid,
    Timeout,
    /// The remote could not be reached.
    Network,
    Server,
}

/// A failure reported by, or on the way to, the remote wiki API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
    /// Human-readable explanation supplied by the remote, if any.
    pub details: Option<String>,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::NotFound, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Forbidden, message)
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == RemoteErrorKind::Timeout
    }

    /// The text to show a user: `details` when present, otherwise `message`.
    pub fn user_message(&self) -> String {
        match self.details.as_deref().map(str::trim) {
            Some(details) if !details.is_empty() => details.to_string(),
            _ => self.message.clone(),
        }
    }
}

/// Errors surfaced by the store and its helpers.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("No wiki is open")]
    NoWikiOpen,

    #[error("No page is open")]
    NoPageOpen,

    #[error("The acting node id is not known")]
    ActorUnknown,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Message for the store's `error` slice, using `fallback` when the
    /// error carries no text of its own. Domain errors show their bare text
    /// without the category prefix.
    pub fn user_message(&self, fallback: &str) -> String {
        let message = match self {
            Self::Remote(remote) => remote.user_message(),
            Self::Core(CoreError::NotFound { entity, id }) => format!("{entity} {id} not found"),
            Self::Core(
                CoreError::Validation(message)
                | CoreError::Conflict(message)
                | CoreError::Forbidden(message)
                | CoreError::Internal(message),
            ) => message.clone(),
            other => other.to_string(),
        };
        if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message
        }
    }

    pub fn remote_kind(&self) -> Option<RemoteErrorKind> {
        match self {
            Self::Remote(remote) => Some(remote.kind),
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn details_win_over_message() {
        let err = RemoteError::not_found("Request failed").with_details("Page 'Home' not found");
        assert_eq!(err.user_message(), "Page 'Home' not found");

        let blank = RemoteError::not_found("Request failed").with_details("  ");
        assert_eq!(blank.user_message(), "Request failed");
    }

    #[test]
    fn fallback_used_for_empty_text() {
        let err = ClientError::from(RemoteError::new(RemoteErrorKind::Server, ""));
        assert_eq!(err.user_message("Failed to load page"), "Failed to load page");
        assert_eq!(err.remote_kind(), Some(RemoteErrorKind::Server));
    }

    #[test]
    fn core_errors_show_bare_text() {
        let err = ClientError::from(CoreError::Forbidden("Only admins can manage members".into()));
        assert_eq!(
            err.user_message("Failed to manage member"),
            "Only admins can manage members"
        );
        assert_eq!(err.remote_kind(), None);

        let err = ClientError::from(CoreError::Validation("Wiki name is required".into()));
        assert_eq!(err.user_message("Failed to create wiki"), "Wiki name is required");

        let err = ClientError::from(CoreError::NotFound {
            entity: "Member",
            id: "bob.os".into(),
        });
        assert_eq!(err.user_message("Failed to manage member"), "Member bob.os not found");
    }

    #[test]
    fn session_errors_use_display_text() {
        assert_eq!(ClientError::NoWikiOpen.user_message("Failed"), "No wiki is open");
    }
}
