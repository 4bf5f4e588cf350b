//! HTTP client for the ServiceDesk Plus API.
//!
//! This module provides the `SdpClient` struct for making authenticated
//! requests to the ServiceDesk Plus (Zoho) REST API.
//!
//! # Status Handling
//!
//! Calls never fail because of the HTTP status: every answer comes back as an
//! [`ApiResponse`] and callers check the status range themselves. Only
//! transport failures (DNS, refused connection, timeout) are errors.
//! Nothing is retried.
//!
//! # Security
//!
//! The client secret, refresh token and access tokens are never logged.
//! Messages built from upstream text are sanitized before logging.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method};
use serde::Deserialize;
use tempfile::NamedTempFile;

use crate::config::Config;
use crate::error::GatewayError;
use crate::models::{ApiResponse, ListInfo, NewRequest, NewRequester};

/// The Accept header value for SDP API v3.
const SDP_ACCEPT_HEADER: &str = "application/vnd.manageengine.sdp.v3+json";

/// Multipart field carrying the file in an upload.
const UPLOAD_FIELD: &str = "input_file";

/// Maximum length for error bodies quoted in messages.
const MAX_ERROR_BODY_LEN: usize = 500;

/// Body of an SDP API call.
#[derive(Debug)]
pub enum RequestBody {
    /// JSON sent as the `input_data` parameter: a query parameter for GET,
    /// a form-urlencoded body otherwise.
    InputData(serde_json::Value),

    /// A multipart form (file uploads).
    Multipart(Form),
}

/// Answer of the OAuth token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for the ServiceDesk Plus API.
///
/// Handles OAuth token exchange, request formatting and attachment uploads.
///
/// # Example
///
/// ```ignore
/// let config = Config::from_env()?;
/// let client = SdpClient::new(&config)?;
///
/// let token = client.get_access_token().await?;
/// let response = client.list_requests(&token).await?;
/// if response.is_success() {
///     println!("{}", response.body);
/// }
/// ```
#[derive(Clone)]
pub struct SdpClient {
    /// The underlying HTTP client (cloning is cheap).
    http: Client,

    /// Base URL for the SDP API, used as configured
    /// (e.g., `https://sdp.example.com/app/itdesk/api/v3`).
    base_url: String,

    /// OAuth token endpoint.
    token_url: String,

    /// OAuth client id.
    client_id: String,

    /// OAuth client secret.
    /// SECURITY: Never log this value!
    client_secret: String,

    /// OAuth refresh token.
    /// SECURITY: Never log this value!
    refresh_token: String,

    /// Directory where attachments are staged before upload.
    uploads_dir: PathBuf,

    /// Timeout configured on `http`, used to label timeout errors.
    timeout: Option<Duration>,
}

impl SdpClient {
    /// Creates a new SDP client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::HttpClient` if the HTTP client fails to initialize.
    pub fn new(config: &Config) -> Result<Self, GatewayError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.upstream_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(GatewayError::HttpClient)?;

        let helpdesk = &config.helpdesk;
        Ok(Self {
            http,
            base_url: helpdesk.base_url.clone(),
            token_url: helpdesk.token_url.clone(),
            client_id: helpdesk.client_id.clone(),
            client_secret: helpdesk.client_secret.clone(),
            refresh_token: helpdesk.refresh_token.clone(),
            uploads_dir: config.uploads_dir.clone(),
            timeout: config.upstream_timeout,
        })
    }

    /// Strips configured secrets from `message`.
    ///
    /// Access tokens are not known to the client; callers that hold one
    /// should sanitize it themselves with [`GatewayError::sanitize_message`].
    pub fn sanitize(&self, message: &str) -> String {
        GatewayError::sanitize_message(message, &[&self.client_secret, &self.refresh_token])
    }

    /// Validates that an ID is a numeric string, as expected by the SDP API.
    ///
    /// SDP uses strictly numeric IDs for all entities. This prevents
    /// path traversal or injection via malformed IDs interpolated into URLs.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Validation` if the ID is empty or contains non-digit characters.
    fn validate_id(id: &str, field_name: &str) -> Result<(), GatewayError> {
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(GatewayError::validation(format!(
                "{} must be a numeric string, got: {:?}",
                field_name,
                id.chars().take(50).collect::<String>()
            )));
        }
        Ok(())
    }

    /// Exchanges the refresh token for a short-lived access token.
    ///
    /// # Errors
    ///
    /// - `GatewayError::TokenExchange` if the endpoint answers non-2xx or
    ///   without an `access_token`
    /// - `GatewayError::Http` / `GatewayError::Timeout` on transport failure
    pub async fn get_access_token(&self) -> Result<String, GatewayError> {
        tracing::debug!("Exchanging refresh token for access token");

        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", self.refresh_token.as_str()),
        ];

        let response = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| GatewayError::from_send(e, self.timeout, "token exchange"))?;

        let status = response.status();
        let text = response.text().await.map_err(GatewayError::Http)?;

        if !status.is_success() {
            let body = truncate(&self.sanitize(&text));
            tracing::warn!(status = %status, "Token endpoint rejected the refresh token");
            return Err(GatewayError::token_exchange(Some(status), body));
        }

        let parsed: TokenResponse = serde_json::from_str(&text).map_err(|_| {
            GatewayError::token_exchange(Some(status), "token endpoint returned a non-JSON body")
        })?;

        match parsed.access_token.filter(|t| !t.is_empty()) {
            Some(token) => {
                tracing::debug!("Access token obtained");
                Ok(token)
            }
            None => {
                let reason = parsed
                    .error
                    .unwrap_or_else(|| "no access_token in response".to_string());
                tracing::warn!(reason = %reason, "Token endpoint did not issue an access token");
                Err(GatewayError::token_exchange(Some(status), reason))
            }
        }
    }

    /// Makes an authenticated request to the SDP API.
    ///
    /// # Arguments
    ///
    /// * `method` - HTTP method
    /// * `endpoint` - API path relative to the base URL (e.g. "/requests")
    /// * `token` - Access token from [`get_access_token`](Self::get_access_token)
    /// * `body` - Optional `input_data` or multipart body
    ///
    /// # Errors
    ///
    /// Only transport failures are errors; a non-2xx status is returned as
    /// a regular [`ApiResponse`].
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        token: &str,
        body: Option<RequestBody>,
    ) -> Result<ApiResponse, GatewayError> {
        let url = format!("{}{}", self.base_url, endpoint);

        tracing::debug!(
            method = %method,
            endpoint = %endpoint,
            "Making SDP API request"
        );

        let mut req = self
            .http
            .request(method.clone(), &url)
            .header(AUTHORIZATION, format!("Zoho-oauthtoken {}", token))
            .header(ACCEPT, SDP_ACCEPT_HEADER);

        match body {
            Some(RequestBody::InputData(data)) => {
                let input_json = serde_json::to_string(&data)?;

                if method == Method::GET {
                    req = req.query(&[("input_data", &input_json)]);
                } else {
                    req = req
                        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                        .body(format!("input_data={}", urlencoding::encode(&input_json)));
                }
            }
            Some(RequestBody::Multipart(form)) => {
                req = req.multipart(form);
            }
            None => {}
        }

        let operation = format!("{} {}", method, endpoint);
        let response = req
            .send()
            .await
            .map_err(|e| GatewayError::from_send(e, self.timeout, operation))?;
        let status = response.status();
        let text = response.text().await.map_err(GatewayError::Http)?;

        if status.is_success() {
            tracing::trace!(status = %status, body = %text, "SDP API response");
        } else {
            tracing::warn!(
                method = %method,
                endpoint = %endpoint,
                status = %status,
                body = %truncate(&GatewayError::sanitize_message(&self.sanitize(&text), &[token])),
                "SDP API returned a non-success status"
            );
        }

        Ok(ApiResponse::from_text(status, &text))
    }

    /// Lists requests (tickets) with the API's default pagination.
    pub async fn list_requests(&self, token: &str) -> Result<ApiResponse, GatewayError> {
        self.request(Method::GET, "/requests", token, None).await
    }

    /// Creates a request (ticket).
    pub async fn create_request(
        &self,
        token: &str,
        request: &NewRequest,
    ) -> Result<ApiResponse, GatewayError> {
        self.request(
            Method::POST,
            "/requests",
            token,
            Some(RequestBody::InputData(request.to_input_data())),
        )
        .await
    }

    /// Looks up at most one requester whose e-mail matches exactly.
    pub async fn find_requester_by_email(
        &self,
        token: &str,
        email: &str,
    ) -> Result<ApiResponse, GatewayError> {
        let input_data = ListInfo::new()
            .with_row_count(1)
            .with_start_index(1)
            .with_search_field("email_id", email)
            .to_input_data();

        self.request(
            Method::GET,
            "/requesters",
            token,
            Some(RequestBody::InputData(input_data)),
        )
        .await
    }

    /// Creates a requester (contact).
    pub async fn create_requester(
        &self,
        token: &str,
        requester: &NewRequester,
    ) -> Result<ApiResponse, GatewayError> {
        self.request(
            Method::POST,
            "/requesters",
            token,
            Some(RequestBody::InputData(requester.to_input_data())),
        )
        .await
    }

    /// Uploads one file and attaches it to a request.
    ///
    /// The bytes are first staged in a uniquely named temporary file inside
    /// the uploads directory. The file is removed once the upload attempt is
    /// over, whether it succeeded or not.
    ///
    /// # Errors
    ///
    /// - `GatewayError::Validation` if `request_id` is not numeric
    /// - `GatewayError::Staging` if the temporary file cannot be written or read
    /// - `GatewayError::Http` for an unusable content type or a transport failure
    pub async fn upload_attachment(
        &self,
        token: &str,
        request_id: &str,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<ApiResponse, GatewayError> {
        Self::validate_id(request_id, "request_id")?;

        let staged = self.stage(filename, bytes).await?;
        let outcome = self
            .post_staged(token, request_id, filename, content_type, staged.path())
            .await;

        let path = staged.path().to_path_buf();
        if let Err(e) = staged.close() {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to remove staged attachment"
            );
        }

        outcome
    }

    /// Writes `bytes` to a fresh temporary file in the uploads directory.
    async fn stage(&self, filename: &str, bytes: Vec<u8>) -> Result<NamedTempFile, GatewayError> {
        let dir = self.uploads_dir.clone();
        let prefix = format!("{}-", unix_millis());
        let suffix = format!("-{}", safe_file_name(filename));

        tokio::task::spawn_blocking(move || -> std::io::Result<NamedTempFile> {
            std::fs::create_dir_all(&dir)?;
            let mut file = tempfile::Builder::new()
                .prefix(&prefix)
                .suffix(&suffix)
                .tempfile_in(&dir)?;
            file.write_all(&bytes)?;
            file.flush()?;
            Ok(file)
        })
        .await
        .map_err(|e| GatewayError::Staging(std::io::Error::other(e)))?
        .map_err(GatewayError::Staging)
    }

    async fn post_staged(
        &self,
        token: &str,
        request_id: &str,
        filename: &str,
        content_type: &str,
        path: &Path,
    ) -> Result<ApiResponse, GatewayError> {
        let bytes = tokio::fs::read(path).await.map_err(GatewayError::Staging)?;

        tracing::debug!(
            request_id = %request_id,
            filename = %filename,
            size = bytes.len(),
            "Uploading attachment"
        );

        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(GatewayError::Http)?;
        let form = Form::new()
            .part(UPLOAD_FIELD, part)
            .text("addtoattachment", "true");

        let endpoint = format!("/requests/{}/_uploads", request_id);
        self.request(Method::POST, &endpoint, token, Some(RequestBody::Multipart(form)))
            .await
    }
}

/// Replaces characters that are unsafe in file names with `_`.
///
/// An empty name becomes `file`.
pub fn safe_file_name(name: &str) -> String {
    if name.is_empty() {
        return "file".to_string();
    }
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if (c as u32) < 0x20 => '_',
            c => c,
        })
        .collect()
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

fn truncate(body: &str) -> String {
    if body.chars().count() > MAX_ERROR_BODY_LEN {
        let head: String = body.chars().take(MAX_ERROR_BODY_LEN).collect();
        format!("{}...[truncated]", head)
    } else {
        body.to_string()
    }
}
