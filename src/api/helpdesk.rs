//! ServiceDesk Plus endpoints: access token, ticket listing, ticket creation.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Map, Value};

use super::extract::{Attachment, TicketSubmission};
use super::{ApiError, AppState};
use crate::error::GatewayError;
use crate::models::{NewRequest, RequestEnvelope};
use crate::requester::{ensure_requester, RequesterContact};

/// 500 carrying the sanitized cause under `message`, plus the token
/// endpoint's status under `zoho_http_status` when it answered.
fn upstream_failure(state: &AppState, message: &'static str, err: GatewayError) -> ApiError {
    let cause = state.sdp.sanitize(&err.to_string());
    tracing::error!(error = %cause, "{}", message);

    let mut details = Map::new();
    details.insert("message".to_string(), Value::String(cause));
    if let GatewayError::TokenExchange {
        status: Some(status),
        ..
    } = &err
    {
        details.insert("zoho_http_status".to_string(), json!(status.as_u16()));
    }

    ApiError::detailed(
        StatusCode::INTERNAL_SERVER_ERROR,
        message,
        Value::Object(details),
    )
}

/// `GET /zoho/access-token`
pub async fn access_token(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let token = state
        .sdp
        .get_access_token()
        .await
        .map_err(|e| upstream_failure(&state, "Token generation failed", e))?;

    Ok(Json(json!({ "access_token": token })))
}

/// `GET /zoho/requests`
///
/// Returns the upstream body as is on success, 502 otherwise.
pub async fn list_requests(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    const FAILURE: &str = "Fetching requests failed";

    let token = state
        .sdp
        .get_access_token()
        .await
        .map_err(|e| upstream_failure(&state, FAILURE, e))?;

    let response = state
        .sdp
        .list_requests(&token)
        .await
        .map_err(|e| upstream_failure(&state, FAILURE, e))?;

    if !response.is_success() {
        return Err(ApiError::detailed(
            StatusCode::BAD_GATEWAY,
            FAILURE,
            json!({
                "zoho_http_status": response.status.as_u16(),
                "zoho_response": response.body,
            }),
        ));
    }

    Ok(Json(response.body))
}

/// `POST /zoho/requests`
///
/// Makes sure the requester exists, creates the ticket, then uploads each
/// attachment on its own. A failed upload is reported in
/// `attachments.errors` and does not affect the others or the ticket.
pub async fn create_request(
    State(state): State<AppState>,
    submission: TicketSubmission,
) -> Result<Json<Value>, ApiError> {
    const FAILURE: &str = "Create request failed";

    let TicketSubmission { input, files } = submission;
    let input = input.sanitize();

    let (Some(subject), Some(email), Some(priority)) = (
        input.subject.clone(),
        input.requester.email.clone(),
        input.priority.clone(),
    ) else {
        return Err(ApiError::MissingFields {
            message: "subject, requester.email and priority are required".to_string(),
            missing: input.missing_fields(),
            received: json!({
                "subject": input.subject,
                "email": input.requester.email,
                "priority": input.priority,
            }),
        });
    };

    let token = state
        .sdp
        .get_access_token()
        .await
        .map_err(|e| upstream_failure(&state, FAILURE, e))?;

    let contact = RequesterContact {
        name: input.requester.name.clone().unwrap_or_default(),
        email,
        phone: input.requester.phone.clone().unwrap_or_default(),
        company: input.requester.company.clone().unwrap_or_default(),
    };

    let ensured = ensure_requester(&state.sdp, &token, &contact)
        .await
        .map_err(|e| upstream_failure(&state, FAILURE, e))?;

    let Some(requester_id) = ensured.id.clone() else {
        return Err(ApiError::detailed(
            StatusCode::CONFLICT,
            "Requester does not exist and could not be created",
            json!({ "debug": ensured.diagnostic }),
        ));
    };

    let payload = NewRequest::new(
        subject,
        input.description.as_deref().unwrap_or_default(),
        requester_id.clone(),
        priority,
    );

    let created = state
        .sdp
        .create_request(&token, &payload)
        .await
        .map_err(|e| upstream_failure(&state, FAILURE, e))?;

    if !created.is_success() {
        return Err(ApiError::detailed(
            StatusCode::BAD_GATEWAY,
            "Zoho create request failed",
            json!({
                "zoho_http_status": created.status.as_u16(),
                "zoho_response": created.body,
                "sent_requestPayload": payload.to_input_data(),
            }),
        ));
    }

    let request_id = created
        .parse::<RequestEnvelope>()
        .and_then(|envelope| envelope.request.non_empty_id().map(str::to_string));

    tracing::info!(
        request_id = ?request_id,
        requester_id = %requester_id,
        attachments = files.len(),
        "Request created"
    );

    let (uploaded, errors) = upload_all(&state, &token, request_id.as_deref(), files).await;

    Ok(Json(json!({
        "status": "success",
        "requester_created": !ensured.existing,
        "requester_id": requester_id,
        "request": created.body.get("request").cloned().unwrap_or(Value::Null),
        "attachments": {
            "uploaded": uploaded,
            "errors": errors,
        },
    })))
}

/// Uploads every file, collecting successes and failures separately.
async fn upload_all(
    state: &AppState,
    token: &str,
    request_id: Option<&str>,
    files: Vec<Attachment>,
) -> (Vec<Value>, Vec<Value>) {
    let mut uploaded = Vec::new();
    let mut errors = Vec::new();

    for file in files {
        let Attachment {
            filename,
            content_type,
            bytes,
        } = file;
        let size = bytes.len();

        let Some(request_id) = request_id else {
            errors.push(json!({
                "filename": filename,
                "error": "The created request has no id",
            }));
            continue;
        };

        match state
            .sdp
            .upload_attachment(token, request_id, &filename, &content_type, bytes)
            .await
        {
            Ok(response) if response.is_success() => uploaded.push(json!({
                "filename": filename,
                "size": size,
                "status": response.status.as_u16(),
                "response": response.body,
            })),
            Ok(response) => {
                tracing::warn!(
                    filename = %filename,
                    status = %response.status,
                    "Attachment rejected by the helpdesk"
                );
                errors.push(json!({
                    "filename": filename,
                    "error": "Upload rejected by the helpdesk",
                    "status": response.status.as_u16(),
                    "response": response.body,
                }));
            }
            Err(e) => {
                let cause =
                    GatewayError::sanitize_message(&state.sdp.sanitize(&e.to_string()), &[token]);
                tracing::warn!(filename = %filename, error = %cause, "Attachment upload failed");
                errors.push(json!({
                    "filename": filename,
                    "error": cause,
                }));
            }
        }
    }

    (uploaded, errors)
}
