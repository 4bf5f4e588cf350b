//! Configuration management for the gateway.
//!
//! This module handles loading configuration from environment variables,
//! with validation to ensure all required values are present. The resulting
//! [`Config`] is built once at startup and handed to the client constructors;
//! nothing downstream reads the environment.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::GatewayError;

/// Default listening port.
const DEFAULT_PORT: u16 = 8000;

/// Default route prefix for every endpoint.
const DEFAULT_API_PREFIX: &str = "/api";

/// Endpoint of the legacy QR-scan web service.
const DEFAULT_SOAP_URL: &str =
    "https://skenirajfiskal.calculus.rs/CWSFiskaliQR/CalculusWebService.asmx";

/// Zoho accounts endpoint used for the refresh-token grant.
const DEFAULT_TOKEN_URL: &str = "https://accounts.zoho.com/oauth/v2/token";

/// Directory where attachments are staged before upload.
const DEFAULT_UPLOADS_DIR: &str = "uploads";

/// Top-level gateway configuration.
#[derive(Clone)]
pub struct Config {
    /// TCP port the HTTP server listens on.
    pub port: u16,

    /// Prefix under which all routes are mounted (e.g. `/api`).
    /// Empty means the routes are mounted at the root.
    pub api_prefix: String,

    /// Endpoint of the legacy SOAP service.
    pub soap_url: String,

    /// Directory for temporary attachment files.
    pub uploads_dir: PathBuf,

    /// Optional timeout applied to every upstream call. `None` leaves the
    /// transport default in place.
    pub upstream_timeout: Option<Duration>,

    /// ServiceDesk Plus settings.
    pub helpdesk: HelpdeskConfig,
}

/// Connection settings for the ServiceDesk Plus API.
#[derive(Clone)]
pub struct HelpdeskConfig {
    /// Base URL of the SDP API (e.g. `https://sdpondemand.manageengine.com/app/itdesk/api/v3`).
    pub base_url: String,

    /// OAuth token endpoint.
    pub token_url: String,

    /// OAuth client id.
    pub client_id: String,

    /// OAuth client secret. Never log this value.
    pub client_secret: String,

    /// Long-lived OAuth refresh token. Never log this value.
    pub refresh_token: String,
}

impl fmt::Debug for HelpdeskConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HelpdeskConfig")
            .field("base_url", &self.base_url)
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("api_prefix", &self.api_prefix)
            .field("soap_url", &self.soap_url)
            .field("uploads_dir", &self.uploads_dir)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("helpdesk", &self.helpdesk)
            .finish()
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Required Environment Variables
    ///
    /// - `ZOHO_BASE_URL`: Base URL of the ServiceDesk Plus API
    /// - `ZOHO_CLIENT_ID`, `ZOHO_CLIENT_SECRET`, `ZOHO_REFRESH_TOKEN`: OAuth credentials
    ///
    /// # Optional Environment Variables
    ///
    /// - `PORT` (default `8000`)
    /// - `API_PREFIX` (default `/api`)
    /// - `SOAP_URL` (default: the production QR-scan web service)
    /// - `ZOHO_TOKEN_URL` (default: Zoho accounts token endpoint)
    /// - `UPLOADS_DIR` (default `uploads`)
    /// - `UPSTREAM_TIMEOUT_SECS` (default: no explicit timeout)
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Config` if any required variable is missing
    /// or if values fail validation.
    pub fn from_env() -> Result<Self, GatewayError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GatewayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get_optional = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let get_required =
            |name: &str| get_optional(name).ok_or_else(|| GatewayError::missing_env(name));

        let port = match get_optional("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| GatewayError::invalid_config("PORT must be a valid port number"))?,
            None => DEFAULT_PORT,
        };

        let api_prefix = Self::normalize_prefix(
            &get_optional("API_PREFIX").unwrap_or_else(|| DEFAULT_API_PREFIX.to_string()),
        );

        let soap_url = Self::validate_url(
            "SOAP_URL",
            get_optional("SOAP_URL").unwrap_or_else(|| DEFAULT_SOAP_URL.to_string()),
        )?;

        let upstream_timeout = match get_optional("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|_| {
                    GatewayError::invalid_config(
                        "UPSTREAM_TIMEOUT_SECS must be a whole number of seconds",
                    )
                })?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => None,
        };

        let helpdesk = HelpdeskConfig {
            base_url: Self::validate_url("ZOHO_BASE_URL", get_required("ZOHO_BASE_URL")?)?,
            token_url: Self::validate_url(
                "ZOHO_TOKEN_URL",
                get_optional("ZOHO_TOKEN_URL").unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            )?,
            client_id: get_required("ZOHO_CLIENT_ID")?,
            client_secret: get_required("ZOHO_CLIENT_SECRET")?,
            refresh_token: get_required("ZOHO_REFRESH_TOKEN")?,
        };

        Self::validate_secret("ZOHO_CLIENT_SECRET", &helpdesk.client_secret)?;
        Self::validate_secret("ZOHO_REFRESH_TOKEN", &helpdesk.refresh_token)?;

        Ok(Config {
            port,
            api_prefix,
            soap_url,
            uploads_dir: PathBuf::from(
                get_optional("UPLOADS_DIR").unwrap_or_else(|| DEFAULT_UPLOADS_DIR.to_string()),
            ),
            upstream_timeout,
            helpdesk,
        })
    }

    /// Validates and normalizes an http(s) URL.
    fn validate_url(name: &str, url: String) -> Result<String, GatewayError> {
        // Remove trailing slash for consistency
        let url = url.trim().trim_end_matches('/').to_string();

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(GatewayError::invalid_config(format!(
                "{} must start with http:// or https://",
                name
            )));
        }

        Url::parse(&url).map_err(|e| {
            GatewayError::invalid_config(format!("{} is not a valid URL: {}", name, e))
        })?;

        Ok(url)
    }

    /// Normalizes a route prefix to `/segment` form, or empty for the root.
    fn normalize_prefix(prefix: &str) -> String {
        let trimmed = prefix.trim().trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{}", trimmed)
        }
    }

    /// Rejects obvious placeholder values copied from an example `.env`.
    fn validate_secret(name: &str, value: &str) -> Result<(), GatewayError> {
        let lower = value.to_lowercase();
        let placeholder_patterns = ["your_", "placeholder", "changeme"];

        if placeholder_patterns.iter().any(|p| lower.contains(p)) {
            return Err(GatewayError::invalid_config(format!(
                "{} appears to be a placeholder value",
                name
            )));
        }

        Ok(())
    }
}
