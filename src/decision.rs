use serde::{Deserialize, Serialize};

/// The final decision for a gated tool call, in the wire shape the
/// assistant's permission hook expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "behavior", rename_all = "lowercase")]
pub enum Decision {
    Allow {
        /// The tool arguments to run with. Echoes the original arguments
        /// unless the approver supplied an override.
        #[serde(rename = "updatedInput")]
        updated_input: serde_json::Value,
    },
    Deny {
        /// Human-readable reason shown to the assistant.
        message: String,
    },
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow { .. })
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Allow { .. } => write!(f, "allow"),
            Decision::Deny { .. } => write!(f, "deny"),
        }
    }
}

/// Result of an explicit approve/deny call against a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalOutcome {
    Approved,
    Denied,
    /// The request had already been resolved (by the other endpoint or by
    /// timeout). Benign; the stored decision is unchanged.
    AlreadyResolved,
}

impl std::fmt::Display for ApprovalOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApprovalOutcome::Approved => write!(f, "approved"),
            ApprovalOutcome::Denied => write!(f, "denied"),
            ApprovalOutcome::AlreadyResolved => write!(f, "already_resolved"),
        }
    }
}
