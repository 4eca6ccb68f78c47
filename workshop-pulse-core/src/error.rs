//! Error types for workshop-pulse-core

use thiserror::Error;

/// Category of a transport-level failure.
///
/// The first five kinds are transient and worth retrying; `Other` covers
/// everything reqwest reports that does not fit them (TLS, body decode, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    /// Host or network unreachable
    Unreachable,
    /// Remote refused the connection
    ConnectionRefused,
    /// Request or connect timed out
    Timeout,
    /// Connection reset mid-request
    ConnectionReset,
    /// Name resolution failed
    DnsResolution,
    /// Any other transport failure
    Other,
}

impl NetworkErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkErrorKind::Unreachable => "unreachable",
            NetworkErrorKind::ConnectionRefused => "connection refused",
            NetworkErrorKind::Timeout => "timeout",
            NetworkErrorKind::ConnectionReset => "connection reset",
            NetworkErrorKind::DnsResolution => "dns resolution failed",
            NetworkErrorKind::Other => "network failure",
        }
    }
}

impl std::fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for the workshop-pulse-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or missing input fields
    #[error("validation error: {0}")]
    Validation(String),

    /// Transport failure talking to an external service
    #[error("network error ({kind}): {message}")]
    Network {
        kind: NetworkErrorKind,
        message: String,
    },

    /// External service answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Access token rejected or missing
    #[error("authorization error: {0}")]
    Auth(String),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand for a [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Whether a failed external call is worth another attempt.
    ///
    /// Transient network kinds and 5xx responses are retryable. Auth, 4xx,
    /// validation and everything else is terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network { kind, .. } => !matches!(kind, NetworkErrorKind::Other),
            Error::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            let status = status.as_u16();
            if status == 401 || status == 403 {
                return Error::Auth(err.to_string());
            }
            return Error::Http {
                status,
                message: err.to_string(),
            };
        }

        let kind = if err.is_timeout() {
            NetworkErrorKind::Timeout
        } else if err.is_connect() {
            classify_connect_error(&err)
        } else if err.is_request() && source_chain_contains(&err, "reset") {
            NetworkErrorKind::ConnectionReset
        } else {
            NetworkErrorKind::Other
        };

        Error::Network {
            kind,
            message: err.to_string(),
        }
    }
}

fn classify_connect_error(err: &reqwest::Error) -> NetworkErrorKind {
    if source_chain_contains(err, "dns") || source_chain_contains(err, "resolve") {
        NetworkErrorKind::DnsResolution
    } else if source_chain_contains(err, "refused") {
        NetworkErrorKind::ConnectionRefused
    } else if source_chain_contains(err, "reset") {
        NetworkErrorKind::ConnectionReset
    } else {
        NetworkErrorKind::Unreachable
    }
}

// reqwest only exposes coarse predicates, so the hyper/io cause is matched by text.
fn source_chain_contains(err: &(dyn std::error::Error + 'static), needle: &str) -> bool {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = current {
        if e.to_string().to_ascii_lowercase().contains(needle) {
            return true;
        }
        current = e.source();
    }
    false
}

/// Result type alias for workshop-pulse-core
pub type Result<T> = std::result::Result<T, Error>;
