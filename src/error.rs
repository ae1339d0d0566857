// Error handling module
// Defines the client-side error taxonomy

use serde_json::Value;
use thiserror::Error;

/// Errors surfaced to callers of the portal client
#[derive(Error, Debug)]
pub enum ApiError {
    /// Network or connection failure, no response was produced
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP response, carries the original status and payload
    #[error("Request failed: {status} - {payload}")]
    Request { status: u16, payload: Value },

    /// Refresh credential missing or the refresh call failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Response payload did not match the expected shape
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_messages() {
        let err = ApiError::Auth("no refresh credential".to_string());
        assert_eq!(
            err.to_string(),
            "Authentication failed: no refresh credential"
        );

        let err = ApiError::Request {
            status: 404,
            payload: json!({"message": "not found"}),
        };
        assert_eq!(
            err.to_string(),
            r#"Request failed: 404 - {"message":"not found"}"#
        );

        let err = ApiError::Config("base_url is required".to_string());
        assert_eq!(err.to_string(), "Configuration error: base_url is required");
    }

    #[test]
    fn test_status_accessor() {
        let err = ApiError::Request {
            status: 503,
            payload: Value::Null,
        };
        assert_eq!(err.status(), Some(503));

        let err = ApiError::Auth("refresh rejected".to_string());
        assert_eq!(err.status(), None);
    }
}
