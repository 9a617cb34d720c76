use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlaywatchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid server url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Server {server} did not answer within {after:?}")]
    Timeout { server: String, after: Duration },

    #[error("Server {server} returned status {status}")]
    UnexpectedStatus { server: String, status: u16 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session store error: {0}")]
    Store(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, PlaywatchError>;
