//! Adapter for the legacy QR-scan SOAP web service.
//!
//! - [`envelope`] builds request documents and reads results back
//! - [`sentinel`] maps the service's literal error strings to [`LegacyError`]
//! - [`client`] sends envelopes and classifies what comes back
//! - [`operations`] gives each service method a typed call

pub mod client;
pub mod envelope;
pub mod operations;
pub mod sentinel;

pub use client::{soap_action, value_to_text, LegacyResult, SoapClient};
pub use envelope::{build_envelope, extract_result, parse_document};
pub use operations::{AccountUpdate, Registration, UpdateKind};
pub use sentinel::LegacyError;
