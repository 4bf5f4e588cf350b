//! Shared fixtures: a router wired to two mock upstreams.

#![allow(dead_code)]

use std::collections::HashMap;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use qrscan_gateway::api::{router, AppState};
use qrscan_gateway::config::Config;
use qrscan_gateway::sdp_client::SdpClient;
use qrscan_gateway::soap::SoapClient;

pub const SOAP_PATH: &str = "/CWSFiskaliQR/CalculusWebService.asmx";
pub const TOKEN_PATH: &str = "/oauth/v2/token";
pub const CLIENT_SECRET: &str = "s3cret-client-value";
pub const REFRESH_TOKEN: &str = "1000.refresh.abcdef";
pub const ACCESS_TOKEN: &str = "1000.access.123456";
/// Path of the helpdesk API under the mock server, as put in `ZOHO_BASE_URL`.
pub const ZOHO_API_PATH: &str = "/api/v3";

pub struct Gateway {
    pub app: Router,
    pub soap: MockServer,
    pub zoho: MockServer,
    pub uploads: TempDir,
}

impl Gateway {
    pub async fn start() -> Self {
        Self::with_prefix("/api").await
    }

    pub async fn with_prefix(prefix: &str) -> Self {
        Self::build(prefix, ZOHO_API_PATH).await
    }

    /// Gateway whose `ZOHO_BASE_URL` is the mock server plus `base_path`.
    pub async fn with_zoho_base(base_path: &str) -> Self {
        Self::build("/api", base_path).await
    }

    async fn build(prefix: &str, zoho_base_path: &str) -> Self {
        let soap = MockServer::start().await;
        let zoho = MockServer::start().await;
        let uploads = tempfile::tempdir().unwrap();

        let vars: HashMap<&str, String> = HashMap::from([
            ("API_PREFIX", prefix.to_string()),
            ("SOAP_URL", format!("{}{}", soap.uri(), SOAP_PATH)),
            ("ZOHO_BASE_URL", format!("{}{}", zoho.uri(), zoho_base_path)),
            ("ZOHO_TOKEN_URL", format!("{}{}", zoho.uri(), TOKEN_PATH)),
            ("ZOHO_CLIENT_ID", "1000.CLIENT".to_string()),
            ("ZOHO_CLIENT_SECRET", CLIENT_SECRET.to_string()),
            ("ZOHO_REFRESH_TOKEN", REFRESH_TOKEN.to_string()),
            ("UPLOADS_DIR", uploads.path().display().to_string()),
        ]);
        let config = Config::from_lookup(|name| vars.get(name).cloned()).unwrap();

        let state = AppState::new(
            SoapClient::new(&config).unwrap(),
            SdpClient::new(&config).unwrap(),
        );
        let app = router(state, &config.api_prefix);

        Self {
            app,
            soap,
            zoho,
            uploads,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    /// Number of files left in the uploads directory.
    pub fn staged_files(&self) -> usize {
        std::fs::read_dir(self.uploads.path()).unwrap().count()
    }

    /// Mounts a token endpoint that always issues [`ACCESS_TOKEN`].
    pub async fn mock_token(&self, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "access_token": ACCESS_TOKEN })),
            )
            .expect(expected_calls)
            .mount(&self.zoho)
            .await;
    }
}

pub fn json_request(http_method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(http_method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(http_method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(http_method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// A SOAP 1.1 response whose result element holds `result` verbatim.
pub fn soap_response(soap_method: &str, result: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:xsd="http://www.w3.org/2001/XMLSchema">
  <soap:Body>
    <{m}Response xmlns="http://tempuri.org/">
      <{m}Result>{result}</{m}Result>
    </{m}Response>
  </soap:Body>
</soap:Envelope>"#,
        m = soap_method,
        result = result
    )
}

pub fn soap_ok(soap_method: &str, result: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/xml; charset=utf-8")
        .set_body_string(soap_response(soap_method, result))
}
