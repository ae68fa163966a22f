use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the `unigate-api` crate.
///
/// Every failure an API call can produce maps to exactly one of these
/// seven kinds -- HTTP status classification, transport failures, and
/// input validation alike. Callers branch on the kind; the kinds carrying
/// `status`/`body` keep the raw response around for diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    /// Rejected credentials (HTTP 401) or insufficient key permissions
    /// (HTTP 403).
    #[error("authentication failed: {message}")]
    Authentication { message: String },

    /// The requested resource does not exist (HTTP 404).
    #[error("resource not found (HTTP {status})")]
    NotFound { status: u16, body: String },

    /// Rate limited by the API (HTTP 429). `retry_after_secs` is taken
    /// from the `Retry-After` response header when present and parsable.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        retry_after_secs: u64,
        status: u16,
        body: String,
    },

    /// Any other error status; the response body is carried verbatim.
    #[error("request rejected (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    /// Connection-level failure: DNS, refused connection, TLS handshake,
    /// broken stream.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Total or connect deadline exceeded.
    #[error("request timed out: {message}")]
    Timeout { message: String },

    /// Invalid input before any network I/O: a misconfigured connection
    /// context, unusable key material, or a response payload that does
    /// not match the expected record shape.
    #[error("validation failed: {message}")]
    Validation { message: String },
}

impl Error {
    /// Classify a `reqwest` failure into the taxonomy.
    ///
    /// Deadline errors become [`Error::Timeout`]; everything else --
    /// connector, DNS, protocol -- is a connection failure.
    pub(crate) fn from_transport(url: &url::Url, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                message: format!("request to {url} timed out"),
            }
        } else if err.is_connect() {
            Self::Connection {
                message: format!("failed to connect to {url}: {err}"),
            }
        } else {
            Self::Connection {
                message: format!("request to {url} failed: {err}"),
            }
        }
    }

    /// Returns `true` for authentication/authorization failures.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if the resource was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` for failures worth retrying after a pause.
    ///
    /// The library never retries on its own; this is a hint for callers
    /// implementing their own backoff.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Timeout { .. } | Self::RateLimited { .. }
        )
    }

    /// How long the API asked us to wait, for rate-limit errors.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited {
                retry_after_secs, ..
            } => Some(Duration::from_secs(*retry_after_secs)),
            _ => None,
        }
    }
}
