//! Typed upstream failure raised by gateway backends.

use thiserror::Error;

/// Failure of an external capability (embedding, completion).
///
/// Backends return this wrapped in `anyhow::Error`; callers that need to
/// tell an upstream outage apart from other failures downcast to it.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The service answered with a non-success status.
    #[error("{service} API error {status}: {body}")]
    Status {
        service: String,
        status: u16,
        body: String,
    },

    /// The request never got a response (connection refused, timeout, ...).
    #[error("{service} request failed: {message}")]
    Transport { service: String, message: String },

    /// The response arrived but did not have the expected shape.
    #[error("invalid {service} response: {message}")]
    Malformed { service: String, message: String },

    /// The backend is configured off.
    #[error("{service} provider is disabled")]
    Disabled { service: String },
}

impl GatewayError {
    pub fn malformed(service: &str, message: impl Into<String>) -> Self {
        GatewayError::Malformed {
            service: service.to_string(),
            message: message.into(),
        }
    }

    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::Status { status, .. } => *status == 429 || *status >= 500,
            GatewayError::Transport { .. } => true,
            GatewayError::Malformed { .. } | GatewayError::Disabled { .. } => false,
        }
    }
}
