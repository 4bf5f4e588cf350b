//! Handler-level errors and their JSON rendering.
//!
//! Every error response has an `"error"` message. Some variants add more
//! keys next to it (missing fields, upstream status and body).

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::error::GatewayError;

/// Error returned by request handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// A plain failure with a status and message.
    #[error("{message}")]
    Status {
        /// Response status.
        status: StatusCode,
        /// Message for the `error` key.
        message: String,
    },

    /// Required fields were absent.
    #[error("{message}")]
    MissingFields {
        /// Message for the `error` key.
        message: String,
        /// Names of the missing fields.
        missing: Vec<&'static str>,
        /// The values that were received for the required fields.
        received: Value,
    },

    /// A failure that carries extra diagnostic keys.
    #[error("{message}")]
    Detailed {
        /// Response status.
        status: StatusCode,
        /// Message for the `error` key.
        message: String,
        /// Extra keys merged into the body.
        details: Map<String, Value>,
    },

    /// An unexpected upstream failure; logged, reported with a generic message.
    #[error("{message}: {source}")]
    Internal {
        /// Endpoint-specific message for the client.
        message: &'static str,
        /// What actually went wrong.
        #[source]
        source: GatewayError,
    },
}

impl ApiError {
    /// Creates an error with an arbitrary status.
    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError::Status {
            status,
            message: message.into(),
        }
    }

    /// 400 Bad Request.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::status(StatusCode::BAD_REQUEST, message)
    }

    /// 403 Forbidden.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::status(StatusCode::FORBIDDEN, message)
    }

    /// 404 Not Found.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::status(StatusCode::NOT_FOUND, message)
    }

    /// Error with extra keys; `details` must be a JSON object to be merged.
    pub fn detailed(status: StatusCode, message: impl Into<String>, details: Value) -> Self {
        let details = match details {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("details".to_string(), other);
                map
            }
        };
        ApiError::Detailed {
            status,
            message: message.into(),
            details,
        }
    }

    /// 500 with a generic message; the cause is logged, not returned.
    pub fn internal(message: &'static str, source: GatewayError) -> Self {
        ApiError::Internal { message, source }
    }

    /// Status code of the response this error renders to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Status { status, .. } | ApiError::Detailed { status, .. } => *status,
            ApiError::MissingFields { .. } => StatusCode::BAD_REQUEST,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            ApiError::Status { message, .. } => json!({ "error": message }),
            ApiError::MissingFields {
                message,
                missing,
                received,
            } => json!({
                "error": message,
                "missing": missing,
                "received": received,
            }),
            ApiError::Detailed {
                message,
                mut details,
                ..
            } => {
                details.insert("error".to_string(), Value::String(message));
                Value::Object(details)
            }
            ApiError::Internal { message, source } => {
                tracing::error!(error = %source, "{}", message);
                json!({ "error": message })
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::detailed(
            err.status(),
            "Upload rejected",
            json!({ "message": err.body_text() }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn render(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_status_error_body() {
        let (status, body) = render(ApiError::forbidden("not allowed")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({"error": "not allowed"}));
    }

    #[tokio::test]
    async fn test_missing_fields_body() {
        let err = ApiError::MissingFields {
            message: "subject is required".to_string(),
            missing: vec!["subject"],
            received: json!({"subject": null}),
        };
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["missing"], json!(["subject"]));
        assert_eq!(body["received"], json!({"subject": null}));
    }

    #[tokio::test]
    async fn test_detailed_merges_keys() {
        let err = ApiError::detailed(
            StatusCode::BAD_GATEWAY,
            "create failed",
            json!({"zoho_http_status": 400}),
        );
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(
            body,
            json!({"error": "create failed", "zoho_http_status": 400})
        );
    }

    #[tokio::test]
    async fn test_internal_hides_source() {
        let err = ApiError::internal(
            "Failed to log in user",
            GatewayError::invalid_config("secret detail"),
        );
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Failed to log in user"}));
    }
}
