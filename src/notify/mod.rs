pub mod slack;

pub use slack::SlackNotifier;

use std::sync::Arc;

use async_trait::async_trait;

use crate::approval::ApprovalRequest;
use crate::decision::Decision;
use crate::error::Result;

/// Outbound channel for surfacing request lifecycle events to a human.
///
/// Never authoritative for the decision itself: every call is best-effort,
/// and delivery failures are logged by the caller, not propagated.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// A new approval request exists and is waiting for a decision.
    async fn request_created(&self, request: &ApprovalRequest) -> Result<()>;

    /// A request reached a terminal state.
    async fn request_resolved(&self, request: &ApprovalRequest, decision: &Decision)
        -> Result<()>;
}

/// Sink used when no notifier is configured (and in tests).
pub struct NullSink;

#[async_trait]
impl NotificationSink for NullSink {
    async fn request_created(&self, _request: &ApprovalRequest) -> Result<()> {
        Ok(())
    }

    async fn request_resolved(
        &self,
        _request: &ApprovalRequest,
        _decision: &Decision,
    ) -> Result<()> {
        Ok(())
    }
}

/// Fire-and-forget a `request_created` notification. Failures are logged
/// and swallowed; the approval flow never waits on delivery.
pub fn spawn_request_created(sink: Arc<dyn NotificationSink>, request: ApprovalRequest) {
    tokio::spawn(async move {
        if let Err(e) = sink.request_created(&request).await {
            tracing::warn!(
                request_id = %request.request_id,
                error = %e,
                "notification sink failed for request_created"
            );
        }
    });
}

/// Fire-and-forget a `request_resolved` notification.
pub fn spawn_request_resolved(
    sink: Arc<dyn NotificationSink>,
    request: ApprovalRequest,
    decision: Decision,
) {
    tokio::spawn(async move {
        if let Err(e) = sink.request_resolved(&request, &decision).await {
            tracing::warn!(
                request_id = %request.request_id,
                error = %e,
                "notification sink failed for request_resolved"
            );
        }
    });
}
