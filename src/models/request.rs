//! Request (ticket) models for the ServiceDesk Plus API.

use serde::{Deserialize, Serialize};

use super::{NamedEntity, RecordRef};

/// Description used when the caller did not supply one.
const EMPTY_DESCRIPTION: &str = "<p>No description</p>";

/// Payload for `POST /requests`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewRequest {
    /// Ticket subject.
    pub subject: String,

    /// HTML description.
    pub description: String,

    /// Requester, referenced by id.
    pub requester: NamedEntity,

    /// Priority, referenced by name.
    pub priority: NamedEntity,
}

impl NewRequest {
    /// Builds a ticket payload. Plain-text descriptions are wrapped in a paragraph.
    pub fn new(
        subject: impl Into<String>,
        description: &str,
        requester_id: impl Into<String>,
        priority: impl Into<String>,
    ) -> Self {
        let description = if description.is_empty() {
            EMPTY_DESCRIPTION.to_string()
        } else {
            format!("<p>{}</p>", description)
        };

        Self {
            subject: subject.into(),
            description,
            requester: NamedEntity::by_id(requester_id),
            priority: NamedEntity::by_name(priority),
        }
    }

    /// Wraps the payload in the `input_data` shape.
    pub fn to_input_data(&self) -> serde_json::Value {
        serde_json::json!({ "request": self })
    }
}

/// Response body of a single-request operation.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestEnvelope {
    /// The request, reduced to its id.
    pub request: RecordRef,
}
