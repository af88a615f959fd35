pub mod coordinator;
pub mod slot;
pub mod table;
pub mod timeout;

pub use coordinator::ApprovalCoordinator;
pub use table::{PendingEntry, PendingTable};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tool call waiting for an out-of-band decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequest {
    /// Unique id, generated at creation time. Primary key into the pending
    /// table and the handle approvers pass to `/approve` and `/deny`.
    pub request_id: String,

    /// The gated tool (Bash, Write, Edit, etc.).
    pub tool_name: String,

    /// The tool's arguments, passed through untouched to the eventual
    /// allow response.
    pub input: serde_json::Value,

    /// The assistant's tool-use id, if it supplied one. Display only.
    pub tool_use_id: Option<String>,

    /// Session id used to route human-facing notifications into the right
    /// conversation thread. Not consulted for resolution.
    pub session_id: Option<String>,

    /// When the request was created. Display only; expiry runs off the
    /// timer armed at registration, not this timestamp.
    pub created_at: DateTime<Utc>,
}

impl ApprovalRequest {
    pub fn new(
        tool_name: impl Into<String>,
        input: serde_json::Value,
        tool_use_id: Option<String>,
        session_id: Option<String>,
    ) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            tool_name: tool_name.into(),
            input,
            tool_use_id,
            session_id,
            created_at: Utc::now(),
        }
    }
}

/// What `/pending` shows for each outstanding request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingSummary {
    pub request_id: String,
    pub tool_name: String,
    pub input: serde_json::Value,
    pub tool_use_id: Option<String>,
}
