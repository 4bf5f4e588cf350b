//! Error types for the gateway.
//!
//! This module defines `GatewayError`, the error type used by the upstream
//! clients (legacy SOAP service and ServiceDesk Plus). The HTTP layer turns
//! these into responses in [`crate::api`].
//!
//! # Security
//!
//! OAuth secrets (client secret, refresh token, access tokens) must never
//! reach logs or responses. Use `sanitize_message()` on anything built from
//! upstream text before logging it.

use std::time::Duration;
use thiserror::Error;

/// Unified error type for upstream operations.
///
/// Expected non-2xx answers from the helpdesk API are *not* errors; they are
/// returned as [`ApiResponse`](crate::models::ApiResponse) values. This enum
/// covers configuration problems and genuine transport failures.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration error - missing or invalid environment variables.
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP request failed during transmission.
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),

    /// HTTP client initialization failed.
    #[error("HTTP client error: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// Request timed out.
    #[error("request timed out after {duration:?} - the upstream may be slow or unreachable")]
    Timeout {
        /// How long we waited before timing out.
        duration: Duration,
        /// The operation that timed out.
        operation: String,
    },

    /// The OAuth refresh-token exchange did not produce an access token.
    #[error("access token exchange failed: {message}")]
    TokenExchange {
        /// HTTP status of the token endpoint, if it answered at all.
        status: Option<reqwest::StatusCode>,
        /// What went wrong.
        message: String,
    },

    /// JSON serialization or deserialization failed.
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A SOAP call was described with mismatched parameter names and values.
    ///
    /// Callers always pass literal lists, so this is a programming error.
    #[error("invalid SOAP call {method}: {names} parameter names but {values} values")]
    InvalidSoapCall {
        /// The SOAP method name.
        method: String,
        /// Number of parameter names.
        names: usize,
        /// Number of parameter values.
        values: usize,
    },

    /// Input validation failed.
    #[error("validation error: {0}")]
    Validation(String),

    /// Staging an attachment on disk failed.
    #[error("attachment staging failed: {0}")]
    Staging(#[source] std::io::Error),
}

impl GatewayError {
    /// Creates a configuration error for a missing environment variable.
    pub fn missing_env(var_name: &str) -> Self {
        GatewayError::Config(format!(
            "missing required environment variable: {}",
            var_name
        ))
    }

    /// Creates a configuration error for an invalid value.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        GatewayError::Config(message.into())
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        GatewayError::Validation(message.into())
    }

    /// Creates a timeout error.
    pub fn timeout(duration: Duration, operation: impl Into<String>) -> Self {
        GatewayError::Timeout {
            duration,
            operation: operation.into(),
        }
    }

    /// Creates a token exchange error.
    pub fn token_exchange(
        status: Option<reqwest::StatusCode>,
        message: impl Into<String>,
    ) -> Self {
        GatewayError::TokenExchange {
            status,
            message: message.into(),
        }
    }

    /// Maps a reqwest send error, keeping timeouts distinguishable.
    pub(crate) fn from_send(
        err: reqwest::Error,
        timeout: Option<Duration>,
        operation: impl Into<String>,
    ) -> Self {
        match timeout {
            Some(duration) if err.is_timeout() => GatewayError::timeout(duration, operation),
            _ => GatewayError::Http(err),
        }
    }

    /// Replaces every occurrence of each secret in `message` with `[REDACTED]`.
    ///
    /// Empty secrets are skipped.
    #[must_use]
    pub fn sanitize_message(message: &str, secrets: &[&str]) -> String {
        secrets
            .iter()
            .filter(|s| !s.is_empty())
            .fold(message.to_string(), |acc, secret| {
                acc.replace(secret, "[REDACTED]")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_env_error() {
        let err = GatewayError::missing_env("ZOHO_REFRESH_TOKEN");
        assert!(err.to_string().contains("ZOHO_REFRESH_TOKEN"));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_validation_error() {
        let err = GatewayError::validation("request_id must be a numeric string");
        assert_eq!(
            err.to_string(),
            "validation error: request_id must be a numeric string"
        );
    }

    #[test]
    fn test_timeout_error() {
        let err = GatewayError::timeout(Duration::from_secs(30), "POST /requests");
        let msg = err.to_string();
        assert!(msg.contains("timed out"));
        assert!(msg.contains("30s"));
    }

    #[test]
    fn test_invalid_soap_call_error() {
        let err = GatewayError::InvalidSoapCall {
            method: "DajWebQRScanKorisnik".to_string(),
            names: 2,
            values: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("DajWebQRScanKorisnik"));
        assert!(msg.contains("2 parameter names but 1 values"));
    }

    #[test]
    fn test_token_exchange_error() {
        let err = GatewayError::token_exchange(
            Some(reqwest::StatusCode::BAD_REQUEST),
            "invalid_client",
        );
        assert_eq!(
            err.to_string(),
            "access token exchange failed: invalid_client"
        );
    }

    #[test]
    fn test_sanitize_message_removes_all_secrets() {
        let message = "refresh=1000.abc secret=shh token=1000.abc";
        let sanitized = GatewayError::sanitize_message(message, &["1000.abc", "shh"]);
        assert!(!sanitized.contains("1000.abc"));
        assert!(!sanitized.contains("shh"));
        assert_eq!(sanitized.matches("[REDACTED]").count(), 3);
    }

    #[test]
    fn test_sanitize_message_empty_secret() {
        let message = "Some error message";
        let sanitized = GatewayError::sanitize_message(message, &[""]);
        assert_eq!(sanitized, message);
    }

    #[test]
    fn test_sanitize_message_no_match() {
        let message = "Some error message";
        let sanitized = GatewayError::sanitize_message(message, &["not_present"]);
        assert_eq!(sanitized, message);
    }
}
