//! Error taxonomy for storefront API operations.
//!
//! The transport layer normalizes every failure into [`ApiError`] before it
//! reaches a coordinator; coordinators never surface anything rawer than
//! this to the UI.

use thiserror::Error;

/// Normalized failure for any storefront API call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// No response received: connection refused, DNS failure, or timeout.
    #[error("Network error. Please check your connection.")]
    Network,

    /// Response received with a non-2xx status that carries no
    /// user-actionable meaning beyond the status itself.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// 4xx with a server-supplied, user-actionable message (bad input,
    /// missing entity).
    #[error("{message}")]
    Validation { status: u16, message: String },

    /// 409 - the operation conflicts with existing state (e.g. a duplicate
    /// review).
    #[error("{message}")]
    Conflict { message: String },

    /// 401 outside the auth endpoints: the persisted token is no longer
    /// accepted.
    #[error("Your session has expired. Please log in again.")]
    SessionExpired,

    /// A 2xx response whose body did not match the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status, when a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } | ApiError::Validation { status, .. } => Some(*status),
            ApiError::Conflict { .. } => Some(409),
            ApiError::SessionExpired => Some(401),
            ApiError::Network | ApiError::Decode(_) => None,
        }
    }

    /// The server-supplied message, when one exists.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Http { message, .. }
            | ApiError::Validation { message, .. }
            | ApiError::Conflict { message } => Some(message),
            _ => None,
        }
    }

    /// Whether this is the duplicate-state conflict kind.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ApiError::Conflict { .. })
    }

    /// Message safe to show an end user. Known backend strings are mapped
    /// to friendly text; anything unrecognized becomes the generic fallback.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network => crate::friendly::to_user_friendly(Some(
                "Network error. Please check your connection.",
            ))
            .to_string(),
            ApiError::SessionExpired => {
                crate::friendly::to_user_friendly(Some("Invalid or expired token")).to_string()
            }
            other => crate::friendly::to_user_friendly(other.server_message()).to_string(),
        }
    }
}

/// Result alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_display() {
        let msg = format!("{}", ApiError::Network);
        assert!(msg.contains("Network error"));
    }

    #[test]
    fn test_http_error_display_includes_status() {
        let err = ApiError::Http {
            status: 503,
            message: "upstream unavailable".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("503"));
        assert!(msg.contains("upstream unavailable"));
    }

    #[test]
    fn test_status_accessor() {
        assert_eq!(ApiError::Network.status(), None);
        assert_eq!(ApiError::SessionExpired.status(), Some(401));
        assert_eq!(
            ApiError::Conflict {
                message: "dup".to_string()
            }
            .status(),
            Some(409)
        );
        assert_eq!(
            ApiError::Validation {
                status: 422,
                message: "bad".to_string()
            }
            .status(),
            Some(422)
        );
    }

    #[test]
    fn test_conflict_predicate() {
        assert!(ApiError::Conflict {
            message: "dup".to_string()
        }
        .is_conflict());
        assert!(!ApiError::Network.is_conflict());
    }

    #[test]
    fn test_user_message_never_leaks_unknown_backend_text() {
        let err = ApiError::Http {
            status: 500,
            message: "pq: relation \"carts\" does not exist".to_string(),
        };
        let msg = err.user_message();
        assert!(!msg.contains("pq:"));
        assert_eq!(msg, "Something went wrong. Please try again.");
    }

    #[test]
    fn test_user_message_maps_known_backend_text() {
        let err = ApiError::Http {
            status: 500,
            message: "Internal server error".to_string(),
        };
        assert_eq!(
            err.user_message(),
            "Something went wrong. Please try again later."
        );
    }

    #[test]
    fn test_session_expired_user_message() {
        let msg = ApiError::SessionExpired.user_message();
        assert!(msg.contains("session has expired"));
    }
}
