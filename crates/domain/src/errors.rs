//! Error types used throughout the client

use thiserror::Error;

/// Categories of client errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Invalid or missing configuration - non-retryable
    Config,
    /// Network/connection failures - retryable at the transport layer
    Connection,
    /// Credential rejected by the service (401) - non-retryable
    Authentication,
    /// Any other HTTP error status or an unreadable body
    Response,
    /// Client used before `init` or after `close`
    Lifecycle,
}

/// Main error type for the Kachy client
#[derive(Error, Debug)]
pub enum KachyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("API error {status}: {body}")]
    Response { status: u16, body: String },

    #[error("Kachy client not initialized. Call kachy::init() first.")]
    NotInitialized,

    #[error("Kachy client is closed")]
    Closed,
}

impl KachyError {
    /// Get the error category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) => ErrorCategory::Config,
            Self::Connection(_) => ErrorCategory::Connection,
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::Response { .. } => ErrorCategory::Response,
            Self::NotInitialized | Self::Closed => ErrorCategory::Lifecycle,
        }
    }

    /// Whether the transport treats this error as transient.
    ///
    /// Only connection failures and the throttling / gateway statuses
    /// (429, 500, 502, 503, 504) qualify.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::Response { status, .. } => {
                crate::constants::RETRYABLE_STATUSES.contains(status)
            }
            _ => false,
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Response { status, .. } => Some(*status),
            Self::Authentication(_) => Some(401),
            _ => None,
        }
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, KachyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(KachyError::Config("x".into()).category(), ErrorCategory::Config);
        assert_eq!(KachyError::Connection("x".into()).category(), ErrorCategory::Connection);
        assert_eq!(
            KachyError::Authentication("x".into()).category(),
            ErrorCategory::Authentication
        );
        assert_eq!(
            KachyError::Response { status: 404, body: String::new() }.category(),
            ErrorCategory::Response
        );
        assert_eq!(KachyError::NotInitialized.category(), ErrorCategory::Lifecycle);
        assert_eq!(KachyError::Closed.category(), ErrorCategory::Lifecycle);
    }

    #[test]
    fn test_is_retryable() {
        assert!(KachyError::Connection("reset".into()).is_retryable());
        assert!(KachyError::Response { status: 503, body: String::new() }.is_retryable());
        assert!(KachyError::Response { status: 429, body: String::new() }.is_retryable());
        assert!(!KachyError::Response { status: 400, body: String::new() }.is_retryable());
        assert!(!KachyError::Response { status: 501, body: String::new() }.is_retryable());
        assert!(!KachyError::Authentication("nope".into()).is_retryable());
        assert!(!KachyError::Config("missing".into()).is_retryable());
    }

    #[test]
    fn test_display_messages() {
        let err = KachyError::Response { status: 418, body: "teapot".into() };
        assert_eq!(err.to_string(), "API error 418: teapot");
        assert_eq!(err.status(), Some(418));

        let err = KachyError::NotInitialized;
        assert!(err.to_string().contains("not initialized"));
        assert_eq!(err.status(), None);
    }
}
