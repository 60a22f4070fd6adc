use thiserror::Error;

pub type Result<T> = std::result::Result<T, HhError>;

/// Errors returned by the HeadHunter client.
///
/// Expected API-level outcomes (any non-2xx status) come back as
/// [`HhError::Api`] with the raw body. Connection, DNS and timeout faults
/// come back as [`HhError::Transport`].
#[derive(Debug, Error)]
pub enum HhError {
    /// Request never produced an HTTP response
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Remote answered with a non-success status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Success status but the body did not match the expected shape
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Query descriptor violates the API bounds
    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },

    /// Endpoint could not be parsed as a base URL
    #[error("invalid endpoint: {endpoint}")]
    InvalidEndpoint { endpoint: String },
}

impl HhError {
    /// True for connection-level faults (DNS, timeout, reset).
    pub fn is_transport(&self) -> bool {
        matches!(self, HhError::Transport(_))
    }

    /// True when the remote answered with a non-2xx status.
    pub fn is_rejection(&self) -> bool {
        matches!(self, HhError::Api { .. })
    }

    /// HTTP status carried by a rejection.
    pub fn status(&self) -> Option<u16> {
        match self {
            HhError::Api { status, .. } => Some(*status),
            HhError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
