use serde_json::Value;
use thiserror::Error;

use crate::view::ViewId;

/// Failures surfaced by [`crate::client::DataClient`].
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// No response was received.
    #[error("network error: {cause}")]
    Network { cause: String },
    /// Non-2xx status. `body` is the parsed JSON, or the raw text as a JSON string.
    #[error("HTTP {status}: {}", body_summary(.body))]
    Http { status: u16, body: Value },
    /// A 2xx response whose body is not valid JSON (or not the expected shape).
    #[error("decode error: {cause}")]
    Decode { cause: String },
}

impl ClientError {
    /// The server's own explanation, when the error body carries one.
    pub fn server_message(&self) -> Option<String> {
        match self {
            ClientError::Http { body, .. } => message_from_body(body),
            _ => None,
        }
    }

    /// Text suitable for an error banner.
    pub fn display_message(&self) -> String {
        match self {
            ClientError::Network { .. } => "Network error. Check that the backend is reachable.".to_string(),
            ClientError::Http { status, body } => match message_from_body(body) {
                Some(msg) => msg,
                None => format!("Server responded with HTTP {}", status),
            },
            ClientError::Decode { .. } => "Server returned an unreadable response.".to_string(),
        }
    }
}

fn message_from_body(body: &Value) -> Option<String> {
    match body {
        Value::Object(map) => ["message", "error", "detail"]
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str))
            .map(str::to_string),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn body_summary(body: &Value) -> String {
    match body {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Coordinator-level failures.
#[derive(Debug, Clone, Error)]
pub enum CoordError {
    #[error("unknown view: {0}")]
    UnknownView(ViewId),
    #[error("load of view {view_id} failed: {cause}")]
    Load { view_id: ViewId, cause: ClientError },
    /// An action was routed to a view whose handlers are detached.
    #[error("view {0} is not active")]
    ViewInactive(ViewId),
    /// The backend answered but refused the mutation.
    #[error("{0}")]
    Rejected(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Request(#[from] ClientError),
}

impl CoordError {
    pub fn display_message(&self) -> String {
        match self {
            CoordError::Load { cause, .. } | CoordError::Request(cause) => cause.display_message(),
            CoordError::Rejected(msg) | CoordError::InvalidInput(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}
