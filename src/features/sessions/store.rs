//! Admin session store
//!
//! Keyed by admin user id. Entries are cleared explicitly when the flow
//! completes or is cancelled, and a background sweep drops entries that sat
//! idle past the timeout so an abandoned flow cannot capture a later,
//! unrelated message.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use log::debug;
use std::sync::Arc;

/// How long an abandoned session may linger before the sweep removes it
const MAX_IDLE_MINUTES: i64 = 15;

/// How often the background sweep runs
const SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(300);

/// What the admin's next message is expected to carry
#[derive(Debug, Clone, PartialEq)]
pub enum PendingAction {
    /// Waiting for an image attachment for this event
    AttachImage { event_id: i64 },
}

#[derive(Debug, Clone)]
struct AdminSession {
    action: PendingAction,
    started_at: DateTime<Utc>,
}

/// Shared store of in-flight admin conversations
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<DashMap<u64, AdminSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the attach-image flow for an admin
    pub fn begin_attach_image(&self, user_id: u64, event_id: i64) {
        self.sessions.insert(
            user_id,
            AdminSession {
                action: PendingAction::AttachImage { event_id },
                started_at: Utc::now(),
            },
        );
        debug!("Awaiting image for event {event_id} from admin {user_id}");
    }

    /// The event an admin's next message should attach an image to, if any
    pub fn pending_image_event(&self, user_id: u64) -> Option<i64> {
        self.sessions.get(&user_id).map(|session| match &session.action {
            PendingAction::AttachImage { event_id } => *event_id,
        })
    }

    /// Clear an admin's session; returns whether one existed
    pub fn clear(&self, user_id: u64) -> bool {
        self.sessions.remove(&user_id).is_some()
    }

    /// Drop sessions idle for at least `max_idle`; returns how many were removed
    pub fn sweep(&self, max_idle: Duration) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| now - session.started_at < max_idle);
        let removed = before - self.sessions.len();
        if removed > 0 {
            debug!("Swept {removed} expired admin sessions");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Background loop that expires abandoned sessions
pub async fn session_sweep_loop(store: SessionStore) {
    let mut interval = tokio::time::interval(SWEEP_INTERVAL);
    loop {
        interval.tick().await;
        store.sweep(Duration::minutes(MAX_IDLE_MINUTES));
    }
}
