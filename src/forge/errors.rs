//! forge::errors
//!
//! Error taxonomy shared by every remote backend.
//!
//! # Classification
//!
//! | Variant        | Source                               | Retry?            |
//! |----------------|--------------------------------------|-------------------|
//! | `NotFound`     | 404                                  | no (often benign) |
//! | `Conflict`     | 409, stale content hash              | no, surfaced      |
//! | `AuthRequired` | no token configured                  | no                |
//! | `AuthFailed`   | 401, 403                             | no                |
//! | `RateLimited`  | 429                                  | after backoff     |
//! | `Transient`    | 5xx, connect/timeout failures        | yes               |
//! | `Permanent`    | other 4xx, malformed response bodies | no                |

use thiserror::Error;

/// Errors from remote backend operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ForgeError {
    /// The requested path, version or secret does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The supplied content hash no longer matches the stored state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Authentication is required but no token is available.
    #[error("authentication required")]
    AuthRequired,

    /// Authentication failed (invalid token, expired, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// Network failure or server-side error. Safe to retry.
    #[error("transient error: {0}")]
    Transient(String),

    /// Request rejected for a reason retrying will not fix.
    #[error("API error: {status} - {message}")]
    Permanent {
        /// HTTP status code (the success status when the body was malformed)
        status: u16,
        /// Error message from the API
        message: String,
    },
}

impl ForgeError {
    /// Whether the caller may retry the same request.
    pub fn is_transient(&self) -> bool {
        matches!(self, ForgeError::Transient(_) | ForgeError::RateLimited)
    }

    /// Whether the error reports a missing resource.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ForgeError::NotFound(_))
    }

    /// Build a `Permanent` error.
    pub fn permanent(status: u16, message: impl Into<String>) -> Self {
        ForgeError::Permanent {
            status,
            message: message.into(),
        }
    }
}
