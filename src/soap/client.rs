//! HTTP transport for the legacy SOAP web service.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::tls::Version;
use reqwest::Client;
use serde_json::Value;

use super::envelope::{build_envelope, extract_result, parse_document};
use super::sentinel::LegacyError;
use crate::config::Config;
use crate::error::GatewayError;

/// Content type the service expects for SOAP 1.1 requests.
const SOAP_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

/// Builds the quoted `SOAPAction` header value for a method.
pub fn soap_action(method: &str) -> String {
    format!("\"http://tempuri.org/{}\"", method)
}

/// What a SOAP call produced, after sentinel classification.
#[derive(Debug, Clone, PartialEq)]
pub enum LegacyResult {
    /// The result field was missing or empty; the service is treated as down.
    Unavailable,

    /// The result was one of the known error strings.
    Failed(LegacyError),

    /// A regular result.
    Value(Value),
}

impl LegacyResult {
    /// Classifies an extracted result field.
    pub fn from_result(result: Option<&Value>) -> Self {
        match result {
            None | Some(Value::Null) => LegacyResult::Unavailable,
            Some(Value::String(text)) if text.is_empty() => LegacyResult::Unavailable,
            Some(Value::String(text)) => match LegacyError::classify(text) {
                Some(kind) => LegacyResult::Failed(kind),
                None => LegacyResult::Value(Value::String(text.clone())),
            },
            Some(other) => LegacyResult::Value(other.clone()),
        }
    }

    /// Text form of the result. A failure yields its upstream sentinel text.
    pub fn into_text(self) -> String {
        match self {
            LegacyResult::Unavailable => String::new(),
            LegacyResult::Failed(kind) => kind.sentinel().to_string(),
            LegacyResult::Value(value) => value_to_text(&value),
        }
    }
}

/// Renders a result value as text: strings as-is, anything else as JSON.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Client for the legacy QR-scan web service.
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Clone)]
pub struct SoapClient {
    http: Client,
    endpoint: String,
    timeout: Option<Duration>,
}

impl SoapClient {
    /// Creates a client for the configured SOAP endpoint.
    ///
    /// The connection is pinned to TLS 1.2, which is what the service accepts.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::HttpClient` if the HTTP client fails to initialize.
    pub fn new(config: &Config) -> Result<Self, GatewayError> {
        let mut builder = Client::builder()
            .min_tls_version(Version::TLS_1_2)
            .max_tls_version(Version::TLS_1_2);
        if let Some(timeout) = config.upstream_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(GatewayError::HttpClient)?;

        Ok(Self {
            http,
            endpoint: config.soap_url.clone(),
            timeout: config.upstream_timeout,
        })
    }

    /// Invokes `method` with the given parameters.
    ///
    /// The HTTP status of the answer is not inspected: the body is parsed
    /// whatever the status, and a body without a result (including one that
    /// is not XML at all) yields [`LegacyResult::Unavailable`].
    ///
    /// # Errors
    ///
    /// - `GatewayError::InvalidSoapCall` if `names` and `values` differ in length
    /// - `GatewayError::Http` / `GatewayError::Timeout` on transport failure
    pub async fn call(
        &self,
        method: &str,
        names: &[&str],
        values: &[&str],
    ) -> Result<LegacyResult, GatewayError> {
        let envelope =
            build_envelope(method, names, values).ok_or_else(|| GatewayError::InvalidSoapCall {
                method: method.to_string(),
                names: names.len(),
                values: values.len(),
            })?;

        tracing::debug!(method = %method, "Calling legacy web service");

        let response = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, SOAP_CONTENT_TYPE)
            .header("SOAPAction", soap_action(method))
            .header(ACCEPT, "text/xml")
            .header(USER_AGENT, concat!("qrscan-gateway/", env!("CARGO_PKG_VERSION")))
            .body(envelope)
            .send()
            .await
            .map_err(|e| GatewayError::from_send(e, self.timeout, method))?;

        let status = response.status();
        let body = response.text().await.map_err(GatewayError::Http)?;

        tracing::trace!(
            method = %method,
            status = %status,
            body = %body,
            "Legacy web service response"
        );

        let Some(document) = parse_document(&body) else {
            tracing::warn!(
                method = %method,
                status = %status,
                "Legacy web service answered with a body that is not XML"
            );
            return Ok(LegacyResult::Unavailable);
        };

        let result = LegacyResult::from_result(extract_result(&document, method));
        if let LegacyResult::Failed(kind) = &result {
            tracing::debug!(
                method = %method,
                error = ?kind,
                "Legacy web service reported an error"
            );
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_soap_action_is_quoted() {
        assert_eq!(
            soap_action("DatumVremeDBServera"),
            "\"http://tempuri.org/DatumVremeDBServera\""
        );
    }

    #[test]
    fn test_from_result_missing_or_empty_is_unavailable() {
        assert_eq!(LegacyResult::from_result(None), LegacyResult::Unavailable);
        assert_eq!(
            LegacyResult::from_result(Some(&json!(""))),
            LegacyResult::Unavailable
        );
        assert_eq!(
            LegacyResult::from_result(Some(&Value::Null)),
            LegacyResult::Unavailable
        );
    }

    #[test]
    fn test_from_result_recognises_sentinel() {
        let text = json!(LegacyError::Rejected.sentinel());
        assert_eq!(
            LegacyResult::from_result(Some(&text)),
            LegacyResult::Failed(LegacyError::Rejected)
        );
    }

    #[test]
    fn test_into_text() {
        assert_eq!(LegacyResult::Value(json!("77")).into_text(), "77");
        assert_eq!(LegacyResult::Value(json!(77)).into_text(), "77");
        assert_eq!(
            LegacyResult::Failed(LegacyError::DuplicateEmail).into_text(),
            LegacyError::DuplicateEmail.sentinel()
        );
        assert_eq!(LegacyResult::Unavailable.into_text(), "");
    }
}
