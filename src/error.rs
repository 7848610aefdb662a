//! Unified error handling for the wikilabel crate
//!
//! Errors fall into three families that callers handle differently:
//!
//! - [`Error::InvalidInput`] - empty or malformed caller arguments, raised
//!   before any request is sent
//! - [`Error::Config`] - inconsistent configuration, such as an auxiliary
//!   ontology without a mapped property
//! - [`Error::Endpoint`] - the SPARQL endpoint failed; carries the query that
//!   was attempted
//!
//! Endpoint failures are never retried here. Resilience policy belongs to
//! the caller.
//!
//! # Usage
//!
//! ```rust,ignore
//! use wikilabel::error::{Error, ErrorCategory};
//!
//! fn report(err: &Error) {
//!     if err.is_recoverable() {
//!         eprintln!("retry later: {err}");
//!     } else if err.category() == ErrorCategory::Input {
//!         eprintln!("fix the arguments: {err}");
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

pub use crate::endpoint::error::EndpointError;

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Caller-supplied arguments
    Input,
    /// Configuration and mapping errors
    Config,
    /// Network-related errors (HTTP, timeout, rate limit)
    Network,
    /// Response or file decoding errors
    Parsing,
    /// File I/O errors
    Storage,
}

impl ErrorCategory {
    /// Short human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Input => "invalid input",
            Self::Config => "configuration error",
            Self::Network => "network error",
            Self::Parsing => "parsing error",
            Self::Storage => "storage error",
        }
    }
}

/// Unified error type for the wikilabel crate
#[derive(Error, Debug)]
pub enum Error {
    /// Empty or malformed argument, detected before any network call
    #[error("Invalid input for '{argument}': {reason}")]
    InvalidInput { argument: String, reason: String },

    /// Inconsistent configuration
    #[error("Config error for '{name}': {reason}")]
    Config { name: String, reason: String },

    /// Endpoint failure while running `query`
    #[error("Endpoint error: {source}")]
    Endpoint {
        query: String,
        #[source]
        source: EndpointError,
    },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Create an invalid input error naming the offending argument
    pub fn invalid_input(argument: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            argument: argument.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an endpoint failure with the query that triggered it
    pub fn endpoint(query: impl Into<String>, source: EndpointError) -> Self {
        Self::Endpoint {
            query: query.into(),
            source,
        }
    }

    /// Check if this error is transient
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Endpoint { source, .. } => source.is_recoverable(),
            Self::Io(_) => true,
            Self::InvalidInput { .. } | Self::Config { .. } | Self::Json(_) | Self::Toml(_) => {
                false
            }
        }
    }

    /// Get the error category for handling strategies
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput { .. } => ErrorCategory::Input,
            Self::Config { .. } | Self::Toml(_) => ErrorCategory::Config,
            Self::Endpoint { source, .. } => match source {
                EndpointError::Decode(_) => ErrorCategory::Parsing,
                _ => ErrorCategory::Network,
            },
            Self::Json(_) => ErrorCategory::Parsing,
            Self::Io(_) => ErrorCategory::Storage,
        }
    }

    /// Query attached to an endpoint failure
    pub fn query(&self) -> Option<&str> {
        match self {
            Self::Endpoint { query, .. } => Some(query),
            _ => None,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
