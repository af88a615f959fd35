use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration, resolved once from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the HTTP control surface. `GATEHOOK_HTTP_PORT`, default 8080.
    pub http_port: u16,

    /// Window before an undecided request is denied.
    /// `GATEHOOK_APPROVAL_TIMEOUT_SECS`, default 300.
    pub approval_timeout: Duration,

    /// Slack bot token (`GATEHOOK_SLACK_BOT_TOKEN`). Notifications are
    /// disabled unless both token and channel are set.
    pub slack_bot_token: Option<String>,

    /// Slack channel id (`GATEHOOK_SLACK_CHANNEL_ID`).
    pub slack_channel_id: Option<String>,

    /// Session id for notification threading when the tool input does not
    /// carry one. `GATEHOOK_SESSION_ID`.
    pub session_id: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            http_port: env_parse("GATEHOOK_HTTP_PORT").unwrap_or(8080),
            approval_timeout: Duration::from_secs(
                env_parse("GATEHOOK_APPROVAL_TIMEOUT_SECS").unwrap_or(300),
            ),
            slack_bot_token: env_nonempty("GATEHOOK_SLACK_BOT_TOKEN"),
            slack_channel_id: env_nonempty("GATEHOOK_SLACK_CHANNEL_ID"),
            session_id: env_nonempty("GATEHOOK_SESSION_ID"),
        }
    }

    pub fn slack_configured(&self) -> bool {
        self.slack_bot_token.is_some() && self.slack_channel_id.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 8080,
            approval_timeout: Duration::from_secs(300),
            slack_bot_token: None,
            slack_channel_id: None,
            session_id: None,
        }
    }
}

/// Returns the home directory path: `~/.gatehook/`
pub fn dirs_home() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(home).join(".gatehook")
}

/// Directory for session-to-thread bookkeeping files.
pub fn sessions_dir() -> PathBuf {
    dirs_home().join("sessions")
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
