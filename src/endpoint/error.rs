//! Error types for SPARQL endpoint access

use thiserror::Error;

/// Errors that can occur while executing a query against the endpoint
#[derive(Error, Debug)]
pub enum EndpointError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Too many requests (429); repeated hits can lead to an IP ban
    #[error("Rate limit exceeded (HTTP 429)")]
    RateLimited,

    /// Client banned by the endpoint (403)
    #[error("Access forbidden (HTTP 403), the client IP may be banned: {0}")]
    Banned(String),

    /// Query too long for a GET request (414); reduce the batch size
    #[error("Request-URI too long (HTTP 414), reduce the batch size")]
    UriTooLong,

    /// Other non-success status
    #[error("Endpoint returned status {code}: {body}")]
    Status { code: u16, body: String },

    /// Response body is not a valid SPARQL JSON result
    #[error("Decoding error: {0}")]
    Decode(String),
}

impl EndpointError {
    /// Check if waiting and retrying could succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout | Self::RateLimited => true,
            Self::Status { code, .. } => matches!(code, 500 | 502 | 503 | 504),
            Self::Banned(_) | Self::UriTooLong | Self::Decode(_) => false,
        }
    }

    /// Map a non-success status to an error
    pub fn from_status(code: u16, body: &str) -> Self {
        match code {
            429 => Self::RateLimited,
            403 => Self::Banned(excerpt(body)),
            414 => Self::UriTooLong,
            _ => Self::Status {
                code,
                body: excerpt(body),
            },
        }
    }
}

const BODY_EXCERPT_LEN: usize = 300;

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
