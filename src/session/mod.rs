//! Session management
//!
//! In-memory registry mapping session ids to live transport bindings,
//! plus the background reaper that evicts idle sessions. All interior
//! state sits behind `tokio::sync::RwLock` on an explicit struct so
//! multiple server instances stay independently testable.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::tools::ToolContext;

pub mod reaper;
pub mod transport;

pub use transport::McpSession;

/// One registered session
struct SessionEntry {
    binding: Arc<McpSession>,
    last_activity: Instant,
}

/// Registry of active sessions
///
/// Invariant: at most one live binding per session id. Ids are uuid v4,
/// never reused after destruction.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    /// Bindings created but not yet indexed by id (handshake in flight)
    pending: RwLock<Vec<Arc<McpSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            pending: RwLock::new(Vec::new()),
        }
    }

    /// Generate a fresh session id
    pub fn new_session_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Allocate a new transport binding, not yet indexed by id
    pub async fn create_pending(&self, tools: Arc<ToolContext>) -> Arc<McpSession> {
        let binding = Arc::new(McpSession::new(tools));
        self.pending.write().await.push(binding.clone());
        binding
    }

    /// Index a binding under `id`, recording current time as last activity
    ///
    /// Called only once the transport signals successful handshake
    /// completion.
    pub async fn activate(&self, id: &str, binding: Arc<McpSession>) {
        self.pending
            .write()
            .await
            .retain(|p| !Arc::ptr_eq(p, &binding));
        self.sessions.write().await.insert(
            id.to_string(),
            SessionEntry {
                binding,
                last_activity: Instant::now(),
            },
        );
        info!(session_id = %id, "session activated");
    }

    /// Look up the binding for a session id
    pub async fn lookup(&self, id: &str) -> Option<Arc<McpSession>> {
        self.sessions
            .read()
            .await
            .get(id)
            .map(|entry| entry.binding.clone())
    }

    /// Refresh the last-activity timestamp; no-op when the id is unknown
    pub async fn touch(&self, id: &str) {
        if let Some(entry) = self.sessions.write().await.get_mut(id) {
            entry.last_activity = Instant::now();
        }
    }

    /// Unconditional delete; idempotent
    pub async fn remove(&self, id: &str) {
        if self.sessions.write().await.remove(id).is_some() {
            info!(session_id = %id, "session removed");
        }
    }

    /// Remove a binding by identity, wherever it lives
    ///
    /// Rollback path for a binding whose id was never learned because the
    /// handshake failed before activation.
    pub async fn remove_binding(&self, binding: &Arc<McpSession>) {
        self.pending
            .write()
            .await
            .retain(|p| !Arc::ptr_eq(p, binding));
        self.sessions
            .write()
            .await
            .retain(|_, entry| !Arc::ptr_eq(&entry.binding, binding));
        debug!("binding rolled back");
    }

    /// Number of indexed sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Ids of sessions idle longer than `timeout`
    pub async fn idle_ids(&self, timeout: Duration) -> Vec<String> {
        self.sessions
            .read()
            .await
            .iter()
            .filter(|(_, entry)| entry.last_activity.elapsed() > timeout)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Remove `id` if it is still idle beyond `timeout`
    ///
    /// Re-checked under the write lock: a request routed between the sweep's
    /// read pass and this call keeps its session alive.
    pub async fn remove_if_idle(&self, id: &str, timeout: Duration) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get(id) {
            Some(entry) if entry.last_activity.elapsed() > timeout => {
                sessions.remove(id);
                true
            }
            _ => false,
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
