use std::sync::Arc;
use std::time::Duration;

use crate::approval::ApprovalCoordinator;
use crate::config::Config;
use crate::error::Result;
use crate::mcp::{self, ApprovalService};
use crate::notify::{NotificationSink, NullSink, SlackNotifier};

/// Run the MCP approval server on stdio plus the HTTP control surface.
///
/// Exits when the MCP client disconnects or on ctrl-c; either way every
/// still-pending request is denied before returning, so no caller is left
/// waiting on a dead channel.
pub async fn run_serve(port: Option<u16>, timeout_secs: Option<u64>) -> Result<()> {
    let mut config = Config::from_env();
    if let Some(port) = port {
        config.http_port = port;
    }
    if let Some(secs) = timeout_secs {
        config.approval_timeout = Duration::from_secs(secs);
    }

    // Prune session-thread entries from long-dead sessions.
    if let Err(e) = crate::session::SessionThreadStore::default_store().cleanup_stale() {
        tracing::warn!(error = %e, "session thread cleanup failed");
    }

    let sink: Arc<dyn NotificationSink> = match SlackNotifier::from_config(&config) {
        Some(notifier) => Arc::new(notifier),
        None => {
            eprintln!("gatehook: slack not configured, notifications disabled");
            Arc::new(NullSink)
        }
    };

    let coordinator = Arc::new(ApprovalCoordinator::new(sink, config.approval_timeout));

    let http = tokio::spawn(crate::http::serve(coordinator.clone(), config.http_port));

    let service = ApprovalService::new(coordinator.clone(), config.session_id.clone());

    tokio::select! {
        result = mcp::serve_stdio(service) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "mcp server exited with error");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            eprintln!("gatehook: shutting down");
        }
    }

    coordinator.shutdown();
    http.abort();
    Ok(())
}
