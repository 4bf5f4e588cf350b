//! Server clocks of the legacy service.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use super::{ApiError, AppState, WEB_SERVICE_DOWN};
use crate::soap::operations::{DB_SERVER_TIME, WEB_SERVER_TIME};
use crate::soap::LegacyResult;

async fn server_time(
    state: &AppState,
    method: &str,
    unavailable: &str,
    failure: &'static str,
) -> Result<Json<Value>, ApiError> {
    let result = state
        .soap
        .server_time(method)
        .await
        .map_err(|e| ApiError::internal(failure, e))?;

    match result {
        LegacyResult::Unavailable => Err(ApiError::not_found(unavailable)),
        result => Ok(Json(json!({ "dateTime": result.into_text() }))),
    }
}

/// `GET /info/ws`
pub async fn web_server_time(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    server_time(
        &state,
        WEB_SERVER_TIME,
        WEB_SERVICE_DOWN,
        "Failed to fetch web service date and time",
    )
    .await
}

/// `GET /info/db`
pub async fn db_server_time(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    server_time(
        &state,
        DB_SERVER_TIME,
        "Database server is not available",
        "Failed to fetch database server date and time",
    )
    .await
}
