//! Request body structs for the HTTP endpoints.
//!
//! # Input Sanitization
//!
//! Every input struct implements `sanitize()`, which trims identifiers and
//! turns empty strings into `None`. Passwords and free text are kept as sent
//! apart from the empty check. Call it before checking required fields.
//!
//! Text fields accept any JSON scalar: numbers and booleans are turned
//! into their text form, so `"phone": 381641234` reads as `"381641234"`.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// Helper function to trim an optional string.
fn trim_option(s: &Option<String>) -> Option<String> {
    s.as_ref()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Keeps a value as sent, dropping it only when empty.
fn non_empty(s: &Option<String>) -> Option<String> {
    s.clone().filter(|s| !s.is_empty())
}

/// Reads a string, number or boolean as text. `null` is `None`.
fn deserialize_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(Value::Bool(flag)) => Ok(Some(flag.to_string())),
        Some(_) => Err(de::Error::invalid_type(
            de::Unexpected::Other("array or object"),
            &"a string, number or boolean",
        )),
    }
}

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    /// E-mail address (required).
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub email: Option<String>,

    /// Password (required).
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub password: Option<String>,

    /// Company tax id (required).
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub company_id: Option<String>,

    /// Company name (required).
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub company_name: Option<String>,

    /// Contact details.
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub contact: Option<String>,
}

impl RegisterInput {
    /// Sanitizes input by trimming whitespace from identifier fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            email: trim_option(&self.email),
            password: non_empty(&self.password),
            company_id: trim_option(&self.company_id),
            company_name: trim_option(&self.company_name),
            contact: non_empty(&self.contact),
        }
    }
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    /// E-mail address.
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub email: Option<String>,

    /// Password.
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub password: Option<String>,
}

impl LoginInput {
    /// Sanitizes input by trimming whitespace from the e-mail.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            email: trim_option(&self.email),
            password: non_empty(&self.password),
        }
    }
}

/// Body of `POST /auth/logout`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogoutInput {
    /// User id.
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub uid: Option<String>,

    /// Session token.
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub token: Option<String>,
}

impl LogoutInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            uid: trim_option(&self.uid),
            token: trim_option(&self.token),
        }
    }
}

/// Body of `PUT /users/{id}/password`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChangeInput {
    /// Session token.
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub token: Option<String>,

    /// Current password.
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub password: Option<String>,

    /// Replacement password.
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub new_password: Option<String>,
}

impl PasswordChangeInput {
    /// Sanitizes input by trimming whitespace from the token.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            token: trim_option(&self.token),
            password: non_empty(&self.password),
            new_password: non_empty(&self.new_password),
        }
    }
}

/// Body of `PUT /users/{id}/profile`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdateInput {
    /// Session token.
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub token: Option<String>,

    /// New contact details.
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub contact: Option<String>,
}

impl ProfileUpdateInput {
    /// Sanitizes input by trimming whitespace from the token.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            token: trim_option(&self.token),
            contact: non_empty(&self.contact),
        }
    }
}

/// Body of `DELETE /users/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteAccountInput {
    /// Session token.
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub token: Option<String>,

    /// Current password, required to confirm the deletion.
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub password: Option<String>,
}

impl DeleteAccountInput {
    /// Sanitizes input by trimming whitespace from the token.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            token: trim_option(&self.token),
            password: non_empty(&self.password),
        }
    }
}

/// Body of `POST /receipts`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptsInput {
    /// Serial number of the target database.
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub db_serial_number: Option<String>,

    /// Receipt URLs, comma separated.
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub receipts: Option<String>,

    /// User id.
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub uid: Option<String>,

    /// Session token.
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub token: Option<String>,
}

impl ReceiptsInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            db_serial_number: trim_option(&self.db_serial_number),
            receipts: trim_option(&self.receipts),
            uid: trim_option(&self.uid),
            token: trim_option(&self.token),
        }
    }
}

/// Requester block of a ticket submission.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RequesterInput {
    /// E-mail address (required).
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub email: Option<String>,

    /// Full name.
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub name: Option<String>,

    /// Phone number.
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub phone: Option<String>,

    /// Company name.
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub company: Option<String>,
}

/// A base64-encoded attachment inside a JSON ticket submission.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct InlineAttachment {
    /// Original file name.
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub filename: Option<String>,

    /// MIME type; `application/octet-stream` when absent.
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub content_type: Option<String>,

    /// File content, standard base64.
    #[serde(default)]
    pub content: String,
}

/// Text part of `POST /zoho/requests`, from JSON or multipart fields.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TicketInput {
    /// Ticket subject (required).
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub subject: Option<String>,

    /// Plain-text description.
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub description: Option<String>,

    /// Priority name (required).
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub priority: Option<String>,

    /// Who the ticket is for.
    #[serde(default)]
    pub requester: RequesterInput,

    /// Inline attachments (JSON bodies only).
    #[serde(default)]
    pub attachments: Vec<InlineAttachment>,
}

impl TicketInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    ///
    /// The description is kept as sent. A missing requester name falls back
    /// to the e-mail address.
    #[must_use]
    pub fn sanitize(self) -> Self {
        let email = trim_option(&self.requester.email);
        let name = trim_option(&self.requester.name).or_else(|| email.clone());
        Self {
            subject: trim_option(&self.subject),
            description: non_empty(&self.description),
            priority: trim_option(&self.priority),
            requester: RequesterInput {
                email,
                name,
                phone: trim_option(&self.requester.phone),
                company: trim_option(&self.requester.company),
            },
            attachments: self.attachments,
        }
    }

    /// Names of the required fields that are missing.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.subject.is_none() {
            missing.push("subject");
        }
        if self.requester.email.is_none() {
            missing.push("requester.email");
        }
        if self.priority.is_none() {
            missing.push("priority");
        }
        missing
    }

    /// Sets a text field from a multipart form.
    ///
    /// Requester fields are accepted as `requester[email]` or
    /// `requester.email`. Returns false for an unknown field name.
    pub fn set_form_field(&mut self, name: &str, value: String) -> bool {
        let requester_field = name
            .strip_prefix("requester[")
            .and_then(|rest| rest.strip_suffix(']'))
            .or_else(|| name.strip_prefix("requester."));

        let slot = match (name, requester_field) {
            (_, Some("email")) => &mut self.requester.email,
            (_, Some("name")) => &mut self.requester.name,
            (_, Some("phone")) => &mut self.requester.phone,
            (_, Some("company")) => &mut self.requester.company,
            ("subject", None) => &mut self.subject,
            ("description", None) => &mut self.description,
            ("priority", None) => &mut self.priority,
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trim_option_trims_whitespace() {
        let s = Some("  hello  ".to_string());
        assert_eq!(trim_option(&s), Some("hello".to_string()));
    }

    #[test]
    fn test_trim_option_filters_empty() {
        assert_eq!(trim_option(&Some("   ".to_string())), None);
        assert_eq!(trim_option(&None), None);
    }

    #[test]
    fn test_register_input_keeps_password_spaces() {
        let input: RegisterInput = serde_json::from_value(json!({
            "email": "  ana@example.com ",
            "password": " tajna ",
            "companyId": 101234567,
            "companyName": "Calculus",
            "contact": ""
        }))
        .unwrap();
        let input = input.sanitize();
        assert_eq!(input.email.as_deref(), Some("ana@example.com"));
        assert_eq!(input.password.as_deref(), Some(" tajna "));
        assert_eq!(input.company_id.as_deref(), Some("101234567"));
        assert_eq!(input.contact, None);
    }

    #[test]
    fn test_receipts_input_accepts_numeric_ids() {
        let input: ReceiptsInput = serde_json::from_value(json!({
            "dbSerialNumber": "SB-1",
            "receipts": "https://suf.purs.gov.rs/v/?vl=A1",
            "uid": 15,
            "token": "tok"
        }))
        .unwrap();
        let input = input.sanitize();
        assert_eq!(input.uid.as_deref(), Some("15"));
        assert_eq!(input.db_serial_number.as_deref(), Some("SB-1"));
    }

    #[test]
    fn test_scalar_fields_are_read_as_text() {
        let input: TicketInput = serde_json::from_value(json!({
            "subject": 404,
            "priority": "High",
            "requester": {
                "email": "a@b.com",
                "name": null,
                "phone": 381641234,
                "company": true
            }
        }))
        .unwrap();
        let input = input.sanitize();
        assert_eq!(input.subject.as_deref(), Some("404"));
        assert_eq!(input.requester.phone.as_deref(), Some("381641234"));
        assert_eq!(input.requester.company.as_deref(), Some("true"));
        assert_eq!(input.requester.name.as_deref(), Some("a@b.com"));

        let login: LoginInput =
            serde_json::from_value(json!({"email": "a@b.com", "password": 1234.5})).unwrap();
        assert_eq!(login.password.as_deref(), Some("1234.5"));
    }

    #[test]
    fn test_structured_value_in_text_field_is_rejected() {
        let result: Result<LogoutInput, _> =
            serde_json::from_value(json!({"uid": 15, "token": ["a", "b"]}));
        assert!(result.is_err());
    }

    #[test]
    fn test_ticket_input_missing_fields() {
        let input = TicketInput {
            description: Some("text".to_string()),
            ..Default::default()
        }
        .sanitize();
        assert_eq!(
            input.missing_fields(),
            vec!["subject", "requester.email", "priority"]
        );
    }

    #[test]
    fn test_ticket_input_name_falls_back_to_email() {
        let input: TicketInput = serde_json::from_value(json!({
            "subject": " Printer ",
            "priority": "High",
            "requester": {"email": "a@b.com", "name": "  "}
        }))
        .unwrap();
        let input = input.sanitize();
        assert_eq!(input.subject.as_deref(), Some("Printer"));
        assert_eq!(input.requester.name.as_deref(), Some("a@b.com"));
        assert!(input.missing_fields().is_empty());
    }

    #[test]
    fn test_set_form_field_accepts_both_requester_notations() {
        let mut input = TicketInput::default();
        assert!(input.set_form_field("requester[email]", "a@b.com".to_string()));
        assert!(input.set_form_field("requester.company", "Calculus".to_string()));
        assert!(input.set_form_field("subject", "Printer".to_string()));
        assert!(!input.set_form_field("requester[fax]", "1".to_string()));
        assert!(!input.set_form_field("unknown", "1".to_string()));

        assert_eq!(input.requester.email.as_deref(), Some("a@b.com"));
        assert_eq!(input.requester.company.as_deref(), Some("Calculus"));
        assert_eq!(input.subject.as_deref(), Some("Printer"));
    }
}
