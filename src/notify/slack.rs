use async_trait::async_trait;
use serde_json::json;

use crate::approval::ApprovalRequest;
use crate::config::Config;
use crate::decision::Decision;
use crate::error::{GatehookError, Result};
use crate::notify::NotificationSink;
use crate::session::SessionThreadStore;

const SLACK_POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

/// Posts approval lifecycle messages to a Slack channel via the Web API.
///
/// Messages for a known session are threaded under that session's first
/// message using the session-thread store.
pub struct SlackNotifier {
    client: reqwest::Client,
    bot_token: String,
    channel_id: String,
    /// Base URL of the HTTP control surface, for the curl hints.
    control_url: String,
    threads: SessionThreadStore,
}

impl SlackNotifier {
    pub fn new(
        bot_token: String,
        channel_id: String,
        control_url: String,
        threads: SessionThreadStore,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            bot_token,
            channel_id,
            control_url,
            threads,
        }
    }

    /// Build from config; `None` when Slack is not configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        let bot_token = config.slack_bot_token.clone()?;
        let channel_id = config.slack_channel_id.clone()?;
        Some(Self::new(
            bot_token,
            channel_id,
            format!("http://localhost:{}", config.http_port),
            SessionThreadStore::default_store(),
        ))
    }

    /// Post `text`, threading under the session's thread when one exists.
    /// Returns the message timestamp Slack assigned.
    async fn post(&self, text: &str, session_id: Option<&str>) -> Result<String> {
        let thread_ts = match session_id {
            Some(session) => self.threads.thread_for(session).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "session thread lookup failed");
                None
            }),
            None => None,
        };

        let mut body = json!({
            "channel": self.channel_id,
            "text": text,
            "mrkdwn": true,
        });
        if let Some(ts) = &thread_ts {
            body["thread_ts"] = json!(ts);
        }

        let response = self
            .client
            .post(SLACK_POST_MESSAGE_URL)
            .bearer_auth(&self.bot_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatehookError::Notification {
                reason: format!("slack request failed: {e}"),
            })?;

        let status = response.status().as_u16();
        let payload: serde_json::Value =
            response
                .json()
                .await
                .map_err(|e| GatehookError::Notification {
                    reason: format!("slack response unreadable: {e}"),
                })?;

        if !payload["ok"].as_bool().unwrap_or(false) {
            return Err(GatehookError::Api {
                status,
                body: payload.to_string(),
            });
        }

        let ts = payload["ts"].as_str().unwrap_or_default().to_string();

        // First message of a session starts its thread.
        if let (Some(session), None) = (session_id, thread_ts) {
            if let Err(e) = self.threads.record_thread(session, &ts) {
                tracing::warn!(error = %e, "failed to record session thread");
            }
        }

        Ok(ts)
    }
}

#[async_trait]
impl NotificationSink for SlackNotifier {
    async fn request_created(&self, request: &ApprovalRequest) -> Result<()> {
        let text = format_request_message(request, &self.control_url);
        self.post(&text, request.session_id.as_deref()).await?;
        Ok(())
    }

    async fn request_resolved(
        &self,
        request: &ApprovalRequest,
        decision: &Decision,
    ) -> Result<()> {
        let text = format_resolved_message(&request.request_id, decision);
        self.post(&text, request.session_id.as_deref()).await?;
        Ok(())
    }
}

/// The "new approval request" message, with ready-to-paste approve/deny
/// commands.
pub fn format_request_message(request: &ApprovalRequest, control_url: &str) -> String {
    let approve_cmd = format!(
        "curl -X POST {control_url}/approve -H \"Content-Type: application/json\" -d '{{\"request_id\": \"{}\"}}'",
        request.request_id
    );
    let deny_cmd = format!(
        "curl -X POST {control_url}/deny -H \"Content-Type: application/json\" -d '{{\"request_id\": \"{}\"}}'",
        request.request_id
    );

    let input = serde_json::to_string_pretty(&request.input).unwrap_or_default();
    let input = truncate(&input, 500);

    format!(
        ":bell: Approval requested\n\n\
         *Tool:* `{}`\n\
         *Request ID:* `{}`\n\
         *Input:*\n```{}```\n\n\
         Approve:\n```{}```\n\n\
         Deny:\n```{}```",
        request.tool_name, request.request_id, input, approve_cmd, deny_cmd
    )
}

/// The terminal-state message.
pub fn format_resolved_message(request_id: &str, decision: &Decision) -> String {
    match decision {
        Decision::Allow { .. } => {
            format!(":white_check_mark: Request `{request_id}` was approved")
        }
        Decision::Deny { message } => {
            format!(":x: Request `{request_id}` was denied: {message}")
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_message_carries_curl_hints() {
        let request = ApprovalRequest::new(
            "Bash",
            json!({"command": "rm -rf build"}),
            Some("toolu_123".into()),
            None,
        );
        let text = format_request_message(&request, "http://localhost:8080");

        assert!(text.contains("`Bash`"));
        assert!(text.contains(&request.request_id));
        assert!(text.contains("http://localhost:8080/approve"));
        assert!(text.contains("http://localhost:8080/deny"));
        assert!(text.contains("rm -rf build"));
    }

    #[test]
    fn resolved_message_names_the_outcome() {
        let approved = format_resolved_message(
            "req-1",
            &Decision::Allow {
                updated_input: json!({}),
            },
        );
        assert!(approved.contains("approved"));

        let denied = format_resolved_message(
            "req-1",
            &Decision::Deny {
                message: "Request timed out after 300s".into(),
            },
        );
        assert!(denied.contains("denied"));
        assert!(denied.contains("timed out"));
    }

    #[test]
    fn long_input_is_truncated() {
        let request = ApprovalRequest::new(
            "Write",
            json!({"content": "x".repeat(2000)}),
            None,
            None,
        );
        let text = format_request_message(&request, "http://localhost:8080");
        assert!(text.contains("..."));
    }
}
