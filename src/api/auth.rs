//! Registration, login and logout.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use super::extract::Payload;
use super::inputs::{LoginInput, LogoutInput, RegisterInput};
use super::{ApiError, AppState, WEB_SERVICE_DOWN};
use crate::soap::{AccountUpdate, LegacyError, LegacyResult, Registration, UpdateKind};

/// `POST /auth/register`
pub async fn register(
    State(state): State<AppState>,
    Payload(input): Payload<RegisterInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let input = input.sanitize();
    let (Some(email), Some(password), Some(company_id), Some(company_name)) = (
        input.email.as_deref(),
        input.password.as_deref(),
        input.company_id.as_deref(),
        input.company_name.as_deref(),
    ) else {
        return Err(ApiError::bad_request(
            "email, password, companyId and companyName are required",
        ));
    };

    let registration = Registration {
        email,
        password,
        company_id,
        company_name,
        contact: input.contact.as_deref().unwrap_or_default(),
    };

    let result = state
        .soap
        .register_user(&registration)
        .await
        .map_err(|e| ApiError::internal("Failed to register user", e))?;

    match result {
        LegacyResult::Unavailable => Err(ApiError::bad_request(WEB_SERVICE_DOWN)),
        LegacyResult::Failed(LegacyError::DuplicateEmail) => Err(ApiError::bad_request(
            "A user with this email address already exists",
        )),
        result => {
            tracing::info!("User registered");
            Ok((StatusCode::CREATED, Json(json!({ "user": result.into_text() }))))
        }
    }
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<AppState>,
    Payload(input): Payload<LoginInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let input = input.sanitize();
    let (Some(email), Some(password)) = (input.email.as_deref(), input.password.as_deref())
    else {
        return Err(ApiError::bad_request("email and password are required"));
    };

    let result = state
        .soap
        .update_account(&AccountUpdate::login(email, password))
        .await
        .map_err(|e| ApiError::internal("Failed to log in user", e))?;

    match result {
        LegacyResult::Unavailable => Err(ApiError::bad_request(WEB_SERVICE_DOWN)),
        LegacyResult::Failed(LegacyError::Rejected) => {
            Err(ApiError::bad_request("Invalid credentials"))
        }
        result => Ok((StatusCode::OK, Json(json!({ "user": result.into_text() })))),
    }
}

/// `POST /auth/logout`
pub async fn logout(
    State(state): State<AppState>,
    Payload(input): Payload<LogoutInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let input = input.sanitize();
    let (Some(uid), Some(token)) = (input.uid.as_deref(), input.token.as_deref()) else {
        return Err(ApiError::bad_request("uid and token are required"));
    };

    let update = AccountUpdate {
        user_id: uid,
        token,
        kind: UpdateKind::Logout,
        ..Default::default()
    };

    let result = state
        .soap
        .update_account(&update)
        .await
        .map_err(|e| ApiError::internal("Failed to log out user", e))?;

    match result {
        LegacyResult::Unavailable => Err(ApiError::bad_request(WEB_SERVICE_DOWN)),
        LegacyResult::Failed(LegacyError::Rejected) => Err(ApiError::bad_request(
            "You are not authorized for this operation",
        )),
        result => Ok((StatusCode::OK, Json(json!({ "user": result.into_text() })))),
    }
}
