//! Common types shared across SDP API models.
//!
//! This module defines pagination, the raw response wrapper, and the
//! reference types used by multiple API endpoints.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Pagination and search parameters for list operations.
///
/// Sent inside `input_data` to control the number of results returned
/// and how they are filtered.
#[derive(Debug, Clone, Serialize, Default)]
pub struct ListInfo {
    /// Maximum number of rows to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count: Option<u32>,

    /// Starting index (1-based) for pagination.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_index: Option<u32>,

    /// Exact-match field filters (e.g. `{"email_id": "a@b.com"}`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_fields: Option<serde_json::Map<String, Value>>,
}

impl ListInfo {
    /// Creates a new ListInfo with default pagination.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of rows to return.
    pub fn with_row_count(mut self, count: u32) -> Self {
        self.row_count = Some(count);
        self
    }

    /// Sets the starting index for pagination.
    pub fn with_start_index(mut self, index: u32) -> Self {
        self.start_index = Some(index);
        self
    }

    /// Adds an exact-match filter on `field`.
    pub fn with_search_field(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.search_fields
            .get_or_insert_with(serde_json::Map::new)
            .insert(field.into(), Value::String(value.into()));
        self
    }

    /// Wraps this list info in the `input_data` shape the API expects.
    pub fn to_input_data(&self) -> Value {
        serde_json::json!({ "list_info": self })
    }
}

/// A reference to another entity, by id or by name.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NamedEntity {
    /// Unique identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl NamedEntity {
    /// References an entity by id.
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: None,
        }
    }

    /// References an entity by name.
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
        }
    }
}

/// Minimal view of a returned record: just its identifier.
///
/// SDP returns ids as strings, but some deployments send bare integers.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RecordRef {
    /// The record identifier, if present and non-empty.
    #[serde(default, deserialize_with = "deserialize_optional_string_or_int")]
    pub id: Option<String>,
}

impl RecordRef {
    /// Returns the id when it is present and not blank.
    pub fn non_empty_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.trim().is_empty())
    }
}

/// Raw answer from the SDP API.
///
/// The client never turns a non-2xx status into an error: callers inspect
/// `status` themselves and decide what a failure means for them.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status returned by the API.
    pub status: StatusCode,

    /// Response body, as JSON when it parses, otherwise as a JSON string.
    pub body: Value,
}

impl ApiResponse {
    /// Builds a response from a status and raw body text.
    pub fn from_text(status: StatusCode, text: &str) -> Self {
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
        };
        Self { status, body }
    }

    /// Returns true for any 2xx status.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Deserializes the body into `T`, if it has that shape.
    pub fn parse<T>(&self) -> Option<T>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_json::from_value(self.body.clone()).ok()
    }
}

/// Deserializes an optional value that can be either a string or an integer into Option<String>.
fn deserialize_optional_string_or_int<'de, D>(
    deserializer: D,
) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct OptionalStringOrIntVisitor;

    impl<'de> Visitor<'de> for OptionalStringOrIntVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("null, a string, or an integer")
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            deserializer.deserialize_any(self)
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }
    }

    deserializer.deserialize_any(OptionalStringOrIntVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_info_builder() {
        let info = ListInfo::new().with_row_count(1).with_start_index(1);
        assert_eq!(info.row_count, Some(1));
        assert_eq!(info.start_index, Some(1));
    }

    #[test]
    fn test_list_info_requester_search_shape() {
        let input = ListInfo::new()
            .with_row_count(1)
            .with_start_index(1)
            .with_search_field("email_id", "ana@example.com")
            .to_input_data();

        assert_eq!(
            input,
            json!({
                "list_info": {
                    "row_count": 1,
                    "start_index": 1,
                    "search_fields": {"email_id": "ana@example.com"}
                }
            })
        );
    }

    #[test]
    fn test_named_entity_skips_missing_fields() {
        let value = serde_json::to_value(NamedEntity::by_name("High")).unwrap();
        assert_eq!(value, json!({"name": "High"}));
    }

    #[test]
    fn test_record_ref_accepts_string_and_int_ids() {
        let from_str: RecordRef = serde_json::from_value(json!({"id": "123"})).unwrap();
        let from_int: RecordRef = serde_json::from_value(json!({"id": 123})).unwrap();
        let missing: RecordRef = serde_json::from_value(json!({})).unwrap();
        let null: RecordRef = serde_json::from_value(json!({"id": null})).unwrap();

        assert_eq!(from_str.non_empty_id(), Some("123"));
        assert_eq!(from_int.non_empty_id(), Some("123"));
        assert_eq!(missing.non_empty_id(), None);
        assert_eq!(null.non_empty_id(), None);
    }

    #[test]
    fn test_api_response_from_text() {
        let json_body = ApiResponse::from_text(StatusCode::OK, r#"{"a":1}"#);
        assert_eq!(json_body.body, json!({"a": 1}));
        assert!(json_body.is_success());

        let text_body = ApiResponse::from_text(StatusCode::BAD_GATEWAY, "<html>oops</html>");
        assert_eq!(text_body.body, json!("<html>oops</html>"));
        assert!(!text_body.is_success());

        let empty = ApiResponse::from_text(StatusCode::NO_CONTENT, "");
        assert_eq!(empty.body, Value::Null);
    }
}
