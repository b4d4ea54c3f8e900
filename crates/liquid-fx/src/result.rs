//! Result and error types for liquid-fx.
//!
//! None of these errors ever reach the page: constructors turn them into
//! inert instances and frame callbacks log them and stop their own loop.

use thiserror::Error;

/// Result type for effect operations
pub type FxResult<T> = Result<T, FxError>;

/// Errors that can occur while mounting or driving an effect
#[derive(Debug, Error)]
pub enum FxError {
    /// Container selector matched nothing
    #[error("No element matches selector {selector}")]
    ContainerNotFound {
        /// Selector that was resolved
        selector: String,
    },

    /// A DOM call was rejected by the host
    #[error("DOM operation {operation} failed: {message}")]
    Dom {
        /// Operation name (e.g. `append_child`)
        operation: &'static str,
        /// Error message
        message: String,
    },

    /// A node handle no longer refers to a live node
    #[error("Node is detached from the document")]
    Detached,

    /// Options failed validation
    #[error("Invalid {family} options: {message}")]
    InvalidOptions {
        /// Effect family (e.g. `blob`)
        family: &'static str,
        /// Error message
        message: String,
    },

    /// The host environment is missing something (window, document, ...)
    #[error("Host unavailable: {message}")]
    HostUnavailable {
        /// Error message
        message: String,
    },

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FxError {
    /// Create a DOM error
    #[must_use]
    pub fn dom(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Dom {
            operation,
            message: message.into(),
        }
    }

    /// Create an invalid options error
    #[must_use]
    pub fn invalid_options(family: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidOptions {
            family,
            message: message.into(),
        }
    }

    /// Create a host unavailable error
    #[must_use]
    pub fn host_unavailable(message: impl Into<String>) -> Self {
        Self::HostUnavailable {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FxError::ContainerNotFound {
            selector: "#hero".to_string(),
        };
        assert_eq!(err.to_string(), "No element matches selector #hero");

        let err = FxError::dom("append_child", "parent removed");
        assert!(err.to_string().contains("append_child"));
        assert!(err.to_string().contains("parent removed"));
    }

    #[test]
    fn test_invalid_options_display() {
        let err = FxError::invalid_options("blob", "minSize exceeds maxSize");
        assert_eq!(
            err.to_string(),
            "Invalid blob options: minSize exceeds maxSize"
        );
    }

    #[test]
    fn test_json_error_from() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: FxError = parse.unwrap_err().into();
        assert!(matches!(err, FxError::Json(_)));
    }
}
