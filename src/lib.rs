//! # qrscan-gateway
//!
//! REST/JSON gateway in front of two upstream services:
//!
//! - the legacy QR-scan SOAP web service (user accounts, scanned receipts,
//!   server clocks), and
//! - the ServiceDesk Plus (Zoho) REST API (tickets with attachments,
//!   requester lookup and creation).
//!
//! ## Architecture
//!
//! - [`config`] - Configuration loading from environment variables
//! - [`error`] - Upstream error types with secret sanitization
//! - [`soap`] - SOAP envelope codec, error sentinels and client
//! - [`sdp_client`] - HTTP client for the ServiceDesk Plus API
//! - [`requester`] - Find-or-create for helpdesk requesters
//! - [`models`] - Data models for SDP API requests and responses
//! - [`api`] - axum router, handlers and request extractors
//!
//! ## Configuration
//!
//! Required:
//!
//! - `ZOHO_BASE_URL`: Base URL of the ServiceDesk Plus API, used as is
//! - `ZOHO_CLIENT_ID`, `ZOHO_CLIENT_SECRET`, `ZOHO_REFRESH_TOKEN`: OAuth credentials
//!
//! Optional: `PORT`, `API_PREFIX`, `SOAP_URL`, `ZOHO_TOKEN_URL`,
//! `UPLOADS_DIR`, `UPSTREAM_TIMEOUT_SECS`, and `RUST_LOG`
//! (e.g. `qrscan_gateway=debug`). See [`config::Config::from_env`].
//!
//! ## Security Considerations
//!
//! The OAuth client secret and refresh token are stored only in memory and are:
//! - Never logged at any log level
//! - Sanitized from error messages built from upstream text
//! - Redacted from the `Debug` output of the configuration
//!
//! ## Example
//!
//! Building the router for an embedding server or a test:
//!
//! ```ignore
//! use qrscan_gateway::api::{router, AppState};
//! use qrscan_gateway::config::Config;
//! use qrscan_gateway::sdp_client::SdpClient;
//! use qrscan_gateway::soap::SoapClient;
//!
//! let config = Config::from_env()?;
//! let state = AppState::new(SoapClient::new(&config)?, SdpClient::new(&config)?);
//! let app = router(state, &config.api_prefix);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod requester;
pub mod sdp_client;
pub mod soap;
