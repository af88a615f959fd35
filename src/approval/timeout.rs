use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;

use crate::approval::PendingTable;
use crate::decision::Decision;

/// Arms a deny-by-timeout timer per pending request.
///
/// Correctness does not depend on cancellation: a timer that fires after an
/// explicit decision loses the race inside the entry's decision slot and
/// becomes a no-op. `cancel` just frees the sleeper promptly.
pub struct TimeoutScheduler {
    table: Arc<PendingTable>,
    timers: DashMap<String, JoinHandle<()>>,
}

impl TimeoutScheduler {
    pub fn new(table: Arc<PendingTable>) -> Self {
        Self {
            table,
            timers: DashMap::new(),
        }
    }

    /// Schedule denial of `request_id` after `duration` with a message the
    /// caller can recognize as a timeout.
    pub fn arm(&self, request_id: &str, duration: Duration) {
        let table = self.table.clone();
        let id = request_id.to_string();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some(entry) = table.get(&id) {
                let won = entry.resolve(Decision::Deny {
                    message: format!("Request timed out after {duration:?}"),
                });
                if won {
                    tracing::info!(request_id = %id, timeout = ?duration, "approval request timed out");
                }
            }
        });
        if let Some(stale) = self.timers.insert(request_id.to_string(), handle) {
            stale.abort();
        }
    }

    /// Best-effort: aborts the sleeper if it has not fired yet.
    pub fn cancel(&self, request_id: &str) {
        if let Some((_, handle)) = self.timers.remove(request_id) {
            handle.abort();
        }
    }
}
