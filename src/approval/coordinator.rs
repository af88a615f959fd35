use std::sync::Arc;
use std::time::Duration;

use crate::approval::timeout::TimeoutScheduler;
use crate::approval::{ApprovalRequest, PendingSummary, PendingTable};
use crate::decision::{ApprovalOutcome, Decision};
use crate::error::{GatehookError, Result};
use crate::notify::{self, NotificationSink};

/// Default window before an undecided request is denied.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// The approval façade: registers a request, arms its timeout, suspends the
/// calling tool flow, and hands back whichever decision arrives first.
///
/// Per request the lifecycle is
/// `CREATED -> PENDING -> resolved (allow | deny | deny-by-timeout) -> removed`;
/// removal runs on every exit path, including cancellation of the waiting
/// caller, so resolved entries never linger in the table.
pub struct ApprovalCoordinator {
    table: Arc<PendingTable>,
    timeouts: TimeoutScheduler,
    sink: Arc<dyn NotificationSink>,
    timeout: Duration,
}

impl ApprovalCoordinator {
    pub fn new(sink: Arc<dyn NotificationSink>, timeout: Duration) -> Self {
        let table = Arc::new(PendingTable::new());
        Self {
            timeouts: TimeoutScheduler::new(table.clone()),
            table,
            sink,
            timeout,
        }
    }

    pub fn with_default_timeout(sink: Arc<dyn NotificationSink>) -> Self {
        Self::new(sink, DEFAULT_TIMEOUT)
    }

    /// Register `request` and suspend until it is resolved by an explicit
    /// approve/deny or by timeout. This is the only suspension point in the
    /// approval core; other requests register and resolve freely while this
    /// one waits.
    pub async fn create_and_await(&self, mut request: ApprovalRequest) -> Result<Decision> {
        if request.tool_name.trim().is_empty() {
            return Err(GatehookError::InvalidRequest {
                reason: "missing tool_name".into(),
            });
        }
        if request.request_id.is_empty() {
            request.request_id = uuid::Uuid::new_v4().to_string();
        }

        let (entry, rx) = self.table.register(request)?;
        let request = entry.request.clone();
        let request_id = request.request_id.clone();

        self.timeouts.arm(&request_id, self.timeout);

        // Removes the entry and frees the timer on every exit path,
        // including this future being dropped mid-await.
        let _cleanup = Cleanup {
            table: &self.table,
            timeouts: &self.timeouts,
            request_id: request_id.clone(),
        };

        tracing::info!(
            request_id = %request_id,
            tool_name = %request.tool_name,
            timeout = ?self.timeout,
            "approval request pending"
        );
        notify::spawn_request_created(self.sink.clone(), request.clone());

        let decision = match rx.await {
            Ok(decision) => decision,
            // The sender vanished without resolving. Fail closed.
            Err(_) => Decision::Deny {
                message: "Approval channel closed unexpectedly".into(),
            },
        };

        tracing::info!(
            request_id = %request_id,
            decision = %decision,
            "approval request resolved"
        );
        notify::spawn_request_resolved(self.sink.clone(), request, decision.clone());

        Ok(decision)
    }

    /// Approve a pending request, running it with `updated_input` if given,
    /// or its original arguments otherwise.
    pub fn approve(
        &self,
        request_id: &str,
        updated_input: Option<serde_json::Value>,
    ) -> Result<ApprovalOutcome> {
        let entry = self
            .table
            .get(request_id)
            .ok_or_else(|| GatehookError::NotFound {
                request_id: request_id.to_string(),
            })?;

        let input = updated_input.unwrap_or_else(|| entry.request.input.clone());
        let won = entry.resolve(Decision::Allow {
            updated_input: input,
        });
        self.timeouts.cancel(request_id);

        Ok(if won {
            ApprovalOutcome::Approved
        } else {
            ApprovalOutcome::AlreadyResolved
        })
    }

    /// Deny a pending request with an explanatory message.
    pub fn deny(&self, request_id: &str, message: Option<String>) -> Result<ApprovalOutcome> {
        let entry = self
            .table
            .get(request_id)
            .ok_or_else(|| GatehookError::NotFound {
                request_id: request_id.to_string(),
            })?;

        let won = entry.resolve(Decision::Deny {
            message: message.unwrap_or_else(|| "Request denied by user".into()),
        });
        self.timeouts.cancel(request_id);

        Ok(if won {
            ApprovalOutcome::Denied
        } else {
            ApprovalOutcome::AlreadyResolved
        })
    }

    pub fn list_pending(&self) -> Vec<PendingSummary> {
        self.table.list()
    }

    pub fn pending_count(&self) -> usize {
        self.table.len()
    }

    /// Best-effort deny-all: resolves every outstanding request so suspended
    /// callers resume with a fail-closed decision instead of a dropped
    /// channel. Called when the hosting process is shutting down.
    pub fn shutdown(&self) {
        let drained = self.table.drain();
        if drained.is_empty() {
            return;
        }
        tracing::warn!(count = drained.len(), "denying outstanding requests on shutdown");
        for entry in drained {
            self.timeouts.cancel(&entry.request.request_id);
            entry.resolve(Decision::Deny {
                message: "Server shutting down".into(),
            });
        }
    }
}

/// Scoped cleanup for one request: detaches the timer and removes the table
/// entry when dropped, which happens on normal return and when the waiting
/// caller is cancelled.
struct Cleanup<'a> {
    table: &'a PendingTable,
    timeouts: &'a TimeoutScheduler,
    request_id: String,
}

impl Drop for Cleanup<'_> {
    fn drop(&mut self) {
        self.timeouts.cancel(&self.request_id);
        self.table.remove(&self.request_id);
    }
}
