//! Requester (contact) models for the ServiceDesk Plus API.

use serde::{Deserialize, Serialize};

use super::RecordRef;

/// Payload for `POST /requesters`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewRequester {
    /// Given name.
    pub first_name: String,

    /// Family name, possibly empty.
    pub last_name: String,

    /// Display name.
    pub name: String,

    /// E-mail address; the lookup key for later searches.
    pub email_id: String,

    /// Phone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Free-text description (carries the company name).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewRequester {
    /// Wraps the payload in the `input_data` shape.
    pub fn to_input_data(&self) -> serde_json::Value {
        serde_json::json!({ "requester": self })
    }
}

/// Response body of requester list and create operations.
///
/// List responses carry `requesters`, create responses carry `requester`
/// (some versions answer a create with a one-element `requesters` array).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RequesterResponse {
    /// Requesters returned by a list call.
    #[serde(default)]
    pub requesters: Vec<RecordRef>,

    /// Requester returned by a create call.
    #[serde(default)]
    pub requester: Option<RecordRef>,
}

impl RequesterResponse {
    /// Id of the first requester in a list response.
    pub fn first_listed_id(&self) -> Option<String> {
        self.requesters
            .first()
            .and_then(RecordRef::non_empty_id)
            .map(str::to_string)
    }

    /// Id of the requester in a create response.
    pub fn created_id(&self) -> Option<String> {
        self.requester
            .as_ref()
            .or_else(|| self.requesters.first())
            .and_then(RecordRef::non_empty_id)
            .map(str::to_string)
    }
}
