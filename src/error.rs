use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Token store delegate not configured: {0}")]
    MissingDelegate(&'static str),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("No token stored for scope {0}")]
    TokenNotFound(String),

    #[error("Stored access token for scope {0} has expired")]
    TokenExpired(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
