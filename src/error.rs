#[derive(Debug, thiserror::Error)]
pub enum GatehookError {
    #[error("invalid approval request: {reason}")]
    InvalidRequest { reason: String },

    #[error("duplicate request id: {request_id}")]
    DuplicateRequest { request_id: String },

    #[error("request not found: {request_id}")]
    NotFound { request_id: String },

    #[error("http error: {reason}")]
    Http { reason: String },

    #[error("notification error: {reason}")]
    Notification { reason: String },

    #[error("session store error: {reason}")]
    SessionStore { reason: String },

    #[error("mcp transport error: {reason}")]
    Mcp { reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("api error: status={status}, body={body}")]
    Api { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, GatehookError>;
