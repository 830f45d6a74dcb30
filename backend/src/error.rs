use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("TAAPI key not configured")]
    ConfigurationError,

    #[error("Invalid TAAPI key")]
    Unauthorized,

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("{0}")]
    UpstreamUnavailable(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;
