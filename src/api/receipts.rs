//! Receipt ingestion.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use super::extract::Payload;
use super::inputs::ReceiptsInput;
use super::{ApiError, AppState, WEB_SERVICE_DOWN};
use crate::soap::{LegacyError, LegacyResult};

/// `POST /receipts`
///
/// Missing receipt data is a 400; a missing user id or token is a 403.
pub async fn create_receipts(
    State(state): State<AppState>,
    Payload(input): Payload<ReceiptsInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let input = input.sanitize();
    let (Some(db_serial), Some(receipts)) =
        (input.db_serial_number.as_deref(), input.receipts.as_deref())
    else {
        return Err(ApiError::bad_request(
            "dbSerialNumber and receipts are required",
        ));
    };
    let (Some(uid), Some(token)) = (input.uid.as_deref(), input.token.as_deref()) else {
        return Err(ApiError::forbidden("User identifier and token are required"));
    };

    let result = state
        .soap
        .store_receipts(db_serial, receipts, uid, token)
        .await
        .map_err(|e| ApiError::internal("Failed to store receipts", e))?;

    match result {
        LegacyResult::Unavailable => Err(ApiError::bad_request(WEB_SERVICE_DOWN)),
        LegacyResult::Failed(LegacyError::Rejected) => Err(ApiError::bad_request(
            "Failed to store receipts. Check the database serial number.",
        )),
        result => {
            tracing::info!(user_id = %uid, "Receipts stored");
            Ok((
                StatusCode::CREATED,
                Json(json!({ "receipts": result.into_text() })),
            ))
        }
    }
}
