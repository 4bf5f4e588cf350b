//! Request body extractors.
//!
//! [`Payload`] reads JSON or url-encoded form bodies and treats an empty body
//! as an empty input, so that missing fields surface as a regular 400 from
//! the handler. [`TicketSubmission`] additionally understands multipart
//! uploads, base64 attachments, and bracketed requester keys
//! (`requester[email]`) in url-encoded bodies.

use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::Form;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde_json::json;

use super::error::ApiError;
use super::inputs::{InlineAttachment, TicketInput};

/// Multipart field name that carries attachment files.
pub const ATTACHMENT_FIELD: &str = "attachments";

/// Maximum number of attachments per ticket.
pub const MAX_ATTACHMENTS: usize = 10;

/// Maximum size of a single attachment.
pub const MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

/// Body limit for ticket submissions: every attachment at full size, base64
/// encoded, plus room for the text fields.
pub const MAX_TICKET_BODY_BYTES: usize =
    MAX_ATTACHMENTS * MAX_ATTACHMENT_BYTES / 3 * 4 + 1024 * 1024;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

fn content_type_is(req: &Request, expected: &str) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.trim_start().to_ascii_lowercase().starts_with(expected))
}

/// A JSON or url-encoded request body.
#[derive(Debug, Clone, Default)]
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if content_type_is(&req, "application/x-www-form-urlencoded") {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| ApiError::status(e.status(), e.body_text()))?;
            return Ok(Payload(value));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::status(e.status(), e.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Payload(T::default()));
        }

        serde_json::from_slice(&bytes)
            .map(Payload)
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))
    }
}

/// One file to attach to a ticket.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    /// Original file name.
    pub filename: String,
    /// MIME type.
    pub content_type: String,
    /// File content.
    pub bytes: Vec<u8>,
}

/// A ticket submission: text fields plus attachments.
#[derive(Debug, Clone, Default)]
pub struct TicketSubmission {
    /// Text fields. `attachments` is always empty here; see `files`.
    pub input: TicketInput,
    /// Decoded attachments, in submission order.
    pub files: Vec<Attachment>,
}

impl<S> FromRequest<S> for TicketSubmission
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if content_type_is(&req, "multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::status(e.status(), e.body_text()))?;
            return read_multipart(multipart).await;
        }

        if content_type_is(&req, "application/x-www-form-urlencoded") {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|e| ApiError::status(e.status(), e.body_text()))?;
            return Ok(read_form(pairs));
        }

        let Payload(mut input) = Payload::<TicketInput>::from_request(req, state).await?;
        let files = decode_inline(&std::mem::take(&mut input.attachments))?;
        Ok(TicketSubmission { input, files })
    }
}

fn upload_rejected(code: &str, message: impl Into<String>) -> ApiError {
    ApiError::detailed(
        StatusCode::BAD_REQUEST,
        "Upload rejected",
        json!({ "code": code, "message": message.into() }),
    )
}

/// Fills a ticket from url-encoded pairs, with the multipart field names.
fn read_form(pairs: Vec<(String, String)>) -> TicketSubmission {
    let mut submission = TicketSubmission::default();
    for (name, value) in pairs {
        if !submission.input.set_form_field(&name, value) {
            tracing::debug!(field = %name, "Ignoring unknown form field");
        }
    }
    submission
}

async fn read_multipart(mut multipart: Multipart) -> Result<TicketSubmission, ApiError> {
    let mut submission = TicketSubmission::default();

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        let Some(filename) = field.file_name().map(str::to_string) else {
            let value = field.text().await?;
            if !submission.input.set_form_field(&name, value) {
                tracing::debug!(field = %name, "Ignoring unknown form field");
            }
            continue;
        };

        if name != ATTACHMENT_FIELD {
            return Err(upload_rejected(
                "LIMIT_UNEXPECTED_FILE",
                format!("Unexpected file field: {}", name),
            ));
        }
        if submission.files.len() == MAX_ATTACHMENTS {
            return Err(upload_rejected(
                "LIMIT_FILE_COUNT",
                format!("At most {} files are accepted", MAX_ATTACHMENTS),
            ));
        }

        let content_type = field
            .content_type()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await? {
            if bytes.len() + chunk.len() > MAX_ATTACHMENT_BYTES {
                return Err(upload_rejected(
                    "LIMIT_FILE_SIZE",
                    format!("{} exceeds {} bytes", filename, MAX_ATTACHMENT_BYTES),
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        submission.files.push(Attachment {
            filename,
            content_type,
            bytes,
        });
    }

    Ok(submission)
}

fn decode_inline(attachments: &[InlineAttachment]) -> Result<Vec<Attachment>, ApiError> {
    if attachments.len() > MAX_ATTACHMENTS {
        return Err(upload_rejected(
            "LIMIT_FILE_COUNT",
            format!("At most {} files are accepted", MAX_ATTACHMENTS),
        ));
    }

    attachments
        .iter()
        .enumerate()
        .map(|(index, attachment)| {
            let filename = attachment
                .filename
                .as_deref()
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("attachment-{}", index + 1));

            let bytes = STANDARD.decode(attachment.content.trim()).map_err(|e| {
                ApiError::bad_request(format!(
                    "attachments[{}].content is not valid base64: {}",
                    index, e
                ))
            })?;

            if bytes.len() > MAX_ATTACHMENT_BYTES {
                return Err(upload_rejected(
                    "LIMIT_FILE_SIZE",
                    format!("{} exceeds {} bytes", filename, MAX_ATTACHMENT_BYTES),
                ));
            }

            let content_type = attachment
                .content_type
                .as_deref()
                .map(str::trim)
                .filter(|ct| !ct.is_empty())
                .unwrap_or(DEFAULT_CONTENT_TYPE)
                .to_string();

            Ok(Attachment {
                filename,
                content_type,
                bytes,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http;

    fn inline(filename: Option<&str>, content: &str) -> InlineAttachment {
        InlineAttachment {
            filename: filename.map(str::to_string),
            content_type: None,
            content: content.to_string(),
        }
    }

    #[test]
    fn test_decode_inline() {
        let files = decode_inline(&[inline(Some("a.txt"), "aGVsbG8="), inline(None, "")]).unwrap();
        assert_eq!(files[0].filename, "a.txt");
        assert_eq!(files[0].bytes, b"hello");
        assert_eq!(files[0].content_type, DEFAULT_CONTENT_TYPE);
        assert_eq!(files[1].filename, "attachment-2");
        assert!(files[1].bytes.is_empty());
    }

    #[test]
    fn test_decode_inline_rejects_bad_base64() {
        let err = decode_inline(&[inline(Some("a.txt"), "not base64!")]).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("attachments[0]"));
    }

    #[test]
    fn test_decode_inline_rejects_too_many_files() {
        let files: Vec<_> = (0..=MAX_ATTACHMENTS).map(|_| inline(None, "")).collect();
        assert!(decode_inline(&files).is_err());
    }

    #[tokio::test]
    async fn test_payload_empty_body_is_default() {
        let req = http::Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::empty())
            .unwrap();
        let Payload(input) = Payload::<TicketInput>::from_request(req, &())
            .await
            .unwrap();
        assert_eq!(input, TicketInput::default());
    }

    #[tokio::test]
    async fn test_payload_reads_form_body() {
        let req = http::Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("subject=Printer&priority=High"))
            .unwrap();
        let Payload(input) = Payload::<TicketInput>::from_request(req, &())
            .await
            .unwrap();
        assert_eq!(input.subject.as_deref(), Some("Printer"));
        assert_eq!(input.priority.as_deref(), Some("High"));
    }

    #[tokio::test]
    async fn test_form_submission_reads_requester_keys() {
        let req = http::Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(
                "subject=Printer&priority=High&requester%5Bemail%5D=a%40b.com&requester.phone=011",
            ))
            .unwrap();

        let submission = TicketSubmission::from_request(req, &()).await.unwrap();
        assert_eq!(submission.input.subject.as_deref(), Some("Printer"));
        assert_eq!(submission.input.requester.email.as_deref(), Some("a@b.com"));
        assert_eq!(submission.input.requester.phone.as_deref(), Some("011"));
        assert!(submission.files.is_empty());
    }

    #[tokio::test]
    async fn test_payload_rejects_malformed_json() {
        let req = http::Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{\"subject\":"))
            .unwrap();
        let err = Payload::<TicketInput>::from_request(req, &())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_multipart_submission() {
        let boundary = "XBOUNDARY";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"subject\"\r\n\r\nPrinter\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"requester[email]\"\r\n\r\na@b.com\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"attachments\"; filename=\"scan.png\"\r\n\
             Content-Type: image/png\r\n\r\nPNGDATA\r\n\
             --{b}--\r\n",
            b = boundary
        );
        let req = http::Request::builder()
            .method("POST")
            .uri("/")
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap();

        let submission = TicketSubmission::from_request(req, &()).await.unwrap();
        assert_eq!(submission.input.subject.as_deref(), Some("Printer"));
        assert_eq!(submission.input.requester.email.as_deref(), Some("a@b.com"));
        assert_eq!(
            submission.files,
            vec![Attachment {
                filename: "scan.png".to_string(),
                content_type: "image/png".to_string(),
                bytes: b"PNGDATA".to_vec(),
            }]
        );
    }

    #[tokio::test]
    async fn test_multipart_rejects_unexpected_file_field() {
        let boundary = "XBOUNDARY";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"avatar\"; filename=\"me.png\"\r\n\
             Content-Type: image/png\r\n\r\nPNG\r\n--{b}--\r\n",
            b = boundary
        );
        let req = http::Request::builder()
            .method("POST")
            .uri("/")
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap();

        let err = TicketSubmission::from_request(req, &()).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
