use std::fmt;

/// Failure of a single inference session call.
///
/// The coordinator never inspects the variant; it only forwards the
/// `Display` text to the client as `inference_error`.
#[derive(Debug)]
pub enum InferError {
    Transport(com::ComError),
    Config(String),
    Protocol(String),
    Remote(String),
    Json(serde_json::Error),
    Panicked,
    Cancelled,
}

impl fmt::Display for InferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferError::Transport(err) => write!(f, "transport error: {err}"),
            InferError::Config(msg) => write!(f, "configuration error: {msg}"),
            InferError::Protocol(msg) => write!(f, "protocol error: {msg}"),
            InferError::Remote(msg) => write!(f, "remote inference failed: {msg}"),
            InferError::Json(err) => write!(f, "json error: {err}"),
            InferError::Panicked => write!(f, "inference task panicked"),
            InferError::Cancelled => write!(f, "inference cancelled"),
        }
    }
}

impl std::error::Error for InferError {}

impl From<com::ComError> for InferError {
    fn from(err: com::ComError) -> Self {
        InferError::Transport(err)
    }
}

impl From<serde_json::Error> for InferError {
    fn from(err: serde_json::Error) -> Self {
        InferError::Json(err)
    }
}

impl From<url::ParseError> for InferError {
    fn from(err: url::ParseError) -> Self {
        InferError::Config(format!("invalid endpoint: {err}"))
    }
}

impl From<tokio::task::JoinError> for InferError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_cancelled() {
            InferError::Cancelled
        } else {
            InferError::Panicked
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidNumber { name: String, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidNumber { name, value } => {
                write!(f, "invalid number for {name}: '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
