use serde::Deserialize;
use thiserror::Error;

/// Failure of a single round trip to the practice service.
///
/// Every remote read and write reports this one kind so screens and the
/// session controller share an error vocabulary. The service contract is only
/// success versus failure plus an optional human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("service unreachable: {0}")]
    Transport(String),
    #[error("service did not answer within {after_ms}ms")]
    Timeout { after_ms: u64 },
    #[error("service returned status {status}: {}", .message.as_deref().unwrap_or("no detail"))]
    Status {
        status: u16,
        message: Option<String>,
    },
    #[error("malformed service payload: {0}")]
    Malformed(String),
}

impl ServiceError {
    pub fn status(status: u16, message: Option<String>) -> Self {
        Self::Status { status, message }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Message meant for the person at the keyboard, when the service sent one.
    pub fn message(&self) -> Option<&str> {
        match self {
            ServiceError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Transient failures where sending the same request again can succeed.
    /// Client errors and undecodable payloads are not expected to change.
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Transport(_) | ServiceError::Timeout { .. } => true,
            ServiceError::Status { status, .. } => *status >= 500 || matches!(status, 408 | 429),
            ServiceError::Malformed(_) => false,
        }
    }
}

/// Failure body sent by the service, `{"detail": ...}`.
///
/// `detail` is either a plain string or, for request validation failures, a
/// list of `{loc, msg, type}` objects.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        match self.detail {
            Some(serde_json::Value::String(detail)) => Some(detail),
            Some(serde_json::Value::Array(items)) => {
                let parts: Vec<String> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(|msg| msg.as_str()))
                    .map(str::to_string)
                    .collect();
                if parts.is_empty() {
                    self.message
                } else {
                    Some(parts.join("; "))
                }
            }
            _ => self.message,
        }
    }

    /// Extracts the message from a raw failure body; non-JSON bodies are used
    /// verbatim when they are short enough to show.
    pub fn message_from_body(body: &str) -> Option<String> {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return None;
        }
        match serde_json::from_str::<ErrorBody>(trimmed) {
            Ok(parsed) => parsed.into_message(),
            Err(_) if trimmed.len() <= 200 && !trimmed.starts_with('<') => {
                Some(trimmed.to_string())
            }
            Err(_) => None,
        }
    }
}
