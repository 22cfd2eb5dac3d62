//! Error taxonomy for repository host operations.

use thiserror::Error;

/// Failures reported by a [`RepoHost`](super::RepoHost) implementation.
///
/// Variants are coarse on purpose: the engine only needs to tell a merge
/// conflict or a validation rejection apart from everything else.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The addressed repository, ref, or workflow does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The host refused the operation because of conflicting content (HTTP 409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The host rejected the request payload (HTTP 422).
    #[error("validation failed: {message}")]
    Validation {
        /// Top-level message from the error body.
        message: String,
        /// Per-field messages, in the order the host reported them.
        errors: Vec<String>,
    },

    /// Credentials missing, expired, or lacking permission (HTTP 401/403).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Any other non-success HTTP status.
    #[error("host API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response could not be decoded.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl HostError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, HostError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, HostError::Conflict(_))
    }

    /// First per-field validation message, falling back to the top-level
    /// message. `None` for non-validation errors.
    pub fn validation_message(&self) -> Option<&str> {
        match self {
            HostError::Validation { message, errors } => Some(
                errors
                    .iter()
                    .map(String::as_str)
                    .find(|m| !m.is_empty())
                    .unwrap_or(message.as_str()),
            ),
            _ => None,
        }
    }
}

/// Result alias for host operations.
pub type HostResult<T> = std::result::Result<T, HostError>;
