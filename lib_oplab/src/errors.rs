//! # Error Taxonomy
//!
//! Two layers of errors are exposed by this crate:
//!
//! - [`ConfigError`]: raised while building a client. Nothing here is ever retried.
//! - [`OpLabError`]: raised by a fetch. Transport faults carry the original fault
//!   object as their source so callers can downcast to the transport's own error type.

use thiserror::Error;

/// Boxed error used to carry transport faults verbatim.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Convenience alias used throughout the crate.
pub type Result<T, E = OpLabError> = std::result::Result<T, E>;

/// Errors raised while resolving settings or building the HTTP session.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("OpLab access token not found; pass one explicitly or set {0}")]
    MissingCredential(&'static str),

    #[error("access token contains characters not allowed in an HTTP header")]
    InvalidCredential,

    #[error("invalid base URL {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("base URL {0:?} must use http or https")]
    UnsupportedScheme(String),

    #[error("timeout must be at least one second, got {0}")]
    InvalidTimeout(u64),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Errors raised by the accessor and the resource operations.
#[derive(Debug, Error)]
pub enum OpLabError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid symbol {0:?}")]
    InvalidSymbol(String),

    #[error("unknown pricing parameter {0:?}")]
    UnknownParameter(String),

    #[error("transport fault on {url} (attempt {attempts})")]
    Transport {
        url: String,
        attempts: u32,
        /// Whether the fault was classified as transient, and so retried.
        transient: bool,
        #[source]
        source: BoxError,
    },

    #[error("rate limited on {url} after {attempts} attempts")]
    RateLimited { url: String, attempts: u32 },

    #[error("HTTP {status} on {url}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("malformed JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected payload shape: {0}")]
    UnexpectedShape(String),
}

impl OpLabError {
    /// HTTP status behind this failure, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            OpLabError::Status { status, .. } => Some(*status),
            OpLabError::RateLimited { .. } => Some(429),
            _ => None,
        }
    }

    /// The original transport fault, exactly as the transport raised it.
    pub fn transport_fault(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            OpLabError::Transport { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }

    /// True for failures the retry loop treats as transient.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OpLabError::RateLimited { .. } | OpLabError::Transport { transient: true, .. }
        )
    }
}
