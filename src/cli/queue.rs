use serde_json::json;

use crate::error::{GatehookError, Result};

/// List pending approval requests via the control surface.
pub async fn run_pending(port: u16) -> Result<()> {
    let response = reqwest::get(format!("http://localhost:{port}/pending"))
        .await
        .map_err(request_failed)?;
    let body: serde_json::Value = response.json().await.map_err(request_failed)?;

    let pending = body["pending"].as_array().cloned().unwrap_or_default();
    if pending.is_empty() {
        println!("No pending requests.");
        return Ok(());
    }

    for item in &pending {
        let input = serde_json::to_string(&item["input"]).unwrap_or_default();
        println!(
            "ID: {}\n  Tool: {}\n  Input: {}\n",
            item["request_id"].as_str().unwrap_or("-"),
            item["tool_name"].as_str().unwrap_or("-"),
            truncate(&input, 80),
        );
    }

    println!("{} pending request(s)", pending.len());
    Ok(())
}

/// Approve a pending request.
pub async fn run_approve(port: u16, request_id: &str) -> Result<()> {
    let status = post_decision(port, "approve", request_id, None).await?;
    if status == "already_resolved" {
        eprintln!("gatehook: {} was already resolved", request_id);
    } else {
        eprintln!("gatehook: approved {}", request_id);
    }
    Ok(())
}

/// Deny a pending request, optionally with a reason.
pub async fn run_deny(port: u16, request_id: &str, message: Option<String>) -> Result<()> {
    let status = post_decision(port, "deny", request_id, message).await?;
    if status == "already_resolved" {
        eprintln!("gatehook: {} was already resolved", request_id);
    } else {
        eprintln!("gatehook: denied {}", request_id);
    }
    Ok(())
}

async fn post_decision(
    port: u16,
    endpoint: &str,
    request_id: &str,
    message: Option<String>,
) -> Result<String> {
    let mut body = json!({"request_id": request_id});
    if let Some(message) = message {
        body["message"] = json!(message);
    }

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://localhost:{port}/{endpoint}"))
        .json(&body)
        .send()
        .await
        .map_err(request_failed)?;

    let status = response.status().as_u16();
    match status {
        200 => {
            let payload: serde_json::Value = response.json().await.map_err(request_failed)?;
            Ok(payload["status"].as_str().unwrap_or_default().to_string())
        }
        404 => Err(GatehookError::NotFound {
            request_id: request_id.to_string(),
        }),
        _ => {
            let body = response.text().await.unwrap_or_default();
            Err(GatehookError::Api { status, body })
        }
    }
}

fn request_failed(e: reqwest::Error) -> GatehookError {
    GatehookError::Http {
        reason: format!("is `gatehook serve` running? {e}"),
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
