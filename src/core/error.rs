use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Curl error: {0}")]
    Curl(#[from] curl::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("No credentials available")]
    NoCredentials,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl ScanError {
    /// True for errors caused by the upstream API throttling us, including an
    /// exhausted credential pool.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ScanError::RateLimited(_) | ScanError::NoCredentials)
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
