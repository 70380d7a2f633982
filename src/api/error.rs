use thiserror::Error;

/// Failure modes of a single backend call. Nothing here is fatal to the
/// process; every error is scoped to the operation that raised it.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level failure: connection refused, DNS, TLS, timeout.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Missing, expired or rejected credential (HTTP 401/403).
    #[error("authentication rejected (HTTP {0})")]
    Auth(u16),

    /// Any other non-success status from the backend.
    #[error("HTTP {0}")]
    Status(u16),

    /// The response body did not have a shape we know how to read.
    #[error("unexpected response shape: {0}")]
    Decode(String),

    /// A required field failed client-side validation before dispatch.
    #[error("validation: {0}")]
    Validation(&'static str),
}

impl Error {
    /// Map a non-success status code onto the taxonomy.
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        match status.as_u16() {
            401 | 403 => Self::Auth(status.as_u16()),
            other => Self::Status(other),
        }
    }
}
