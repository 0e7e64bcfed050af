use reqwest::StatusCode;
use thiserror::Error;

pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Failure of a single call made by the HTTP client facade.
///
/// None of these are fatal to a load run: the driver counts them as failed
/// outcomes and moves on.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("request timed out: {0}")]
    Timeout(#[source] reqwest::Error),
    #[error("HTTP error: status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("response deserialization failed: {0}")]
    Deserialization(#[from] serde_json::Error),
    #[error("unknown target: {0}")]
    UnknownTarget(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout(e)
        } else {
            ClientError::Transport(e)
        }
    }
}
