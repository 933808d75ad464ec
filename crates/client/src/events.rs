//! In-process event bus announcing committed store changes.
//!
//! The store publishes a [`StoreEvent`] after each state change it commits,
//! so presentation code can re-render from a fresh snapshot without polling.

use serde::Serialize;
use tokio::sync::broadcast;

use folio_core::roles::MemberAction;
use folio_core::wiki::InviteStatus;

/// A state change committed by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StoreEvent {
    WikisLoaded { count: usize },
    WikiOpened { wiki_id: String },
    /// A fresher copy of the open wiki replaced the cached one.
    WikiRefreshed { wiki_id: String },
    WikiClosed,
    WikiCreated { wiki_id: String },
    WikiJoined { wiki_id: String },
    WikiLeft { wiki_id: String },
    WikiSettingsUpdated { wiki_id: String },
    PagesLoaded { wiki_id: String, count: usize },
    PageLoaded { wiki_id: String, path: String },
    PageSaved { wiki_id: String, path: String },
    PageCreated { wiki_id: String, path: String },
    PageDeleted { wiki_id: String, path: String },
    PageRestored { wiki_id: String, path: String },
    DeletedPagesLoaded { wiki_id: String, count: usize },
    InvitesLoaded { count: usize },
    InviteSent { wiki_id: String, invitee_id: String },
    InviteAnswered { invite_id: String, status: InviteStatus },
    MemberChanged {
        wiki_id: String,
        member_id: String,
        action: MemberAction,
    },
    /// An operation failed and set the `error` slice.
    Failed { operation: String, message: String },
}

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out bus for [`StoreEvent`]s.
///
/// When the buffer is full the oldest events are dropped and slow receivers
/// observe `RecvError::Lagged`.
pub struct EventBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers. Dropped silently when nobody
    /// is listening.
    pub fn publish(&self, event: StoreEvent) {
        let _ = self.sender.send(event);
    }

    /// A receiver for events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
