/// Terminal stream failure sent through `StreamEvent::Failed`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, serde::Serialize, serde::Deserialize)]
pub enum StreamFailure {
    /// The completions endpoint rejected the request (HTTP status, auth, etc.).
    #[error("api failure: {message}")]
    Api {
        status_code: Option<u16>,
        message: String,
    },
    /// Network or stream I/O failed.
    #[error("transport failure: {message}")]
    Transport { message: String },
}

impl StreamFailure {
    /// Creates an endpoint-level failure.
    pub fn api(status_code: Option<u16>, message: impl Into<String>) -> Self {
        Self::Api {
            status_code,
            message: message.into(),
        }
    }

    /// Creates a transport-level failure.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Returns the human-readable message for this failure.
    pub fn message(&self) -> &str {
        match self {
            Self::Api { message, .. } | Self::Transport { message } => message,
        }
    }
}

/// Top-level error type for the public client API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// Invalid client configuration.
    #[error("config error: {0}")]
    Config(String),
    /// The stream ended with a terminal failure.
    #[error(transparent)]
    StreamFailed(#[from] StreamFailure),
    /// Internal protocol misuse or invariant violation.
    #[error("protocol error: {0}")]
    Protocol(String),
}
