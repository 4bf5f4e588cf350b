//! Data models for the ServiceDesk Plus API.
//!
//! This module contains the payloads sent to SDP (new requests and
//! requesters), the minimal response views the gateway needs to read ids
//! back, and the raw [`ApiResponse`] wrapper.

mod common;
mod request;
mod requester;

pub use common::*;
pub use request::*;
pub use requester::*;
