//! Session reaper
//!
//! Periodic background sweep that evicts sessions idle longer than the
//! configured timeout. Never runs in the request path; each removal takes
//! its own short write lock so routing is not blocked for longer than a
//! single removal step.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::session::SessionRegistry;

/// Spawn the reaper task
///
/// The returned handle is detached by callers in normal operation; the
/// task is best-effort and does not keep the process alive on its own.
pub fn spawn_reaper(
    registry: Arc<SessionRegistry>,
    interval: Duration,
    session_timeout: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            sweep(&registry, session_timeout).await;
        }
    })
}

/// One sweep over the registry
pub async fn sweep(registry: &SessionRegistry, session_timeout: Duration) {
    let idle = registry.idle_ids(session_timeout).await;
    if idle.is_empty() {
        debug!("reaper sweep found no idle sessions");
        return;
    }
    let mut evicted = 0usize;
    for id in idle {
        // Re-checked under the write lock; a concurrently routed request
        // keeps its session
        if registry.remove_if_idle(&id, session_timeout).await {
            info!(session_id = %id, "evicted idle session");
            evicted += 1;
        }
    }
    debug!(evicted, "reaper sweep completed");
}
