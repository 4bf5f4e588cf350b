//! User record, password, profile and account removal.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use super::extract::Payload;
use super::inputs::{DeleteAccountInput, PasswordChangeInput, ProfileUpdateInput};
use super::{ApiError, AppState, WEB_SERVICE_DOWN};
use crate::soap::{value_to_text, AccountUpdate, LegacyError, LegacyResult, UpdateKind};

/// Column the legacy service uses for the user's database serial numbers.
const SERIAL_NUMBERS_COLUMN: &str = "list_x0028_WebQRScanBaza.SerijskiBroj_x0020__x007C__x007C__x0020__x0027_-_x0027__x0020__x007C__x007C__x0020_WebQRScanBaza.Naziv_x0029_";

const USER_NOT_FOUND: &str = "User not found";

/// Reads the user row out of a `DajWebQRScanKorisnik` result.
///
/// The row sits at `diffgram/NewDataSet/Table`. When several rows come back
/// the first one is used. Returns `None` when there is no row.
///
/// Row attributes such as `diffgr:id` are not part of the record, and column
/// values stay strings.
pub fn user_record(result: &Value) -> Option<Value> {
    let table = result.get("diffgram")?.get("NewDataSet")?.get("Table")?;
    let row = match table {
        Value::Array(rows) => rows.first()?,
        row => row,
    };

    let Value::Object(row) = row else {
        return None;
    };

    let mut row = row.clone();
    if let Some(serials) = row.remove(SERIAL_NUMBERS_COLUMN) {
        row.insert("SerijskiBrojevi".to_string(), serials);
    }
    if let Some(id) = row.get_mut("QRScanKorisnikSK") {
        *id = Value::String(value_to_text(id));
    }
    Some(Value::Object(row))
}

/// `GET /users/{id}`
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ApiError::bad_request("User id is required"));
    }

    let result = state
        .soap
        .fetch_user(id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch user data", e))?;

    let record = match result {
        LegacyResult::Unavailable => return Err(ApiError::bad_request(WEB_SERVICE_DOWN)),
        LegacyResult::Failed(_) => None,
        LegacyResult::Value(value) => user_record(&value),
    };

    match record {
        Some(user) => Ok((StatusCode::OK, Json(json!({ "user": user })))),
        None => Err(ApiError::not_found(USER_NOT_FOUND)),
    }
}

/// `PUT /users/{id}/password`
pub async fn change_password(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Payload(input): Payload<PasswordChangeInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let input = input.sanitize();
    let id = id.trim();
    let Some(token) = input.token.as_deref().filter(|_| !id.is_empty()) else {
        return Err(ApiError::bad_request("User id and token are required"));
    };
    let (Some(password), Some(new_password)) =
        (input.password.as_deref(), input.new_password.as_deref())
    else {
        return Err(ApiError::bad_request(
            "Current and new password are required",
        ));
    };

    let update = AccountUpdate {
        user_id: id,
        password,
        new_password,
        token,
        kind: UpdateKind::Password,
        ..Default::default()
    };

    let result = state
        .soap
        .update_account(&update)
        .await
        .map_err(|e| ApiError::internal("Failed to change password", e))?;

    match result {
        LegacyResult::Unavailable => Err(ApiError::bad_request(WEB_SERVICE_DOWN)),
        LegacyResult::Failed(LegacyError::Rejected) => Err(ApiError::forbidden(
            "Password change failed. Check that the current password is correct",
        )),
        result => Ok((StatusCode::ACCEPTED, Json(json!({ "user": result.into_text() })))),
    }
}

/// `PUT /users/{id}/profile`
pub async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Payload(input): Payload<ProfileUpdateInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let input = input.sanitize();
    let id = id.trim();
    let Some(token) = input.token.as_deref().filter(|_| !id.is_empty()) else {
        return Err(ApiError::bad_request("User id and token are required"));
    };
    let Some(contact) = input.contact.as_deref() else {
        return Err(ApiError::bad_request("New contact information is required"));
    };

    let update = AccountUpdate {
        user_id: id,
        contact,
        token,
        kind: UpdateKind::Profile,
        ..Default::default()
    };

    let result = state
        .soap
        .update_account(&update)
        .await
        .map_err(|e| ApiError::internal("Failed to update profile", e))?;

    match result {
        LegacyResult::Unavailable => Err(ApiError::bad_request(WEB_SERVICE_DOWN)),
        LegacyResult::Failed(LegacyError::Rejected) => Err(ApiError::forbidden(
            "You are not authorized to update this profile",
        )),
        result => Ok((StatusCode::ACCEPTED, Json(json!({ "user": result.into_text() })))),
    }
}

/// `DELETE /users/{id}`
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Payload(input): Payload<DeleteAccountInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let input = input.sanitize();
    let id = id.trim();
    let Some(token) = input.token.as_deref().filter(|_| !id.is_empty()) else {
        return Err(ApiError::bad_request("User id and token are required"));
    };
    let Some(password) = input.password.as_deref() else {
        return Err(ApiError::bad_request("Current password is required"));
    };

    let update = AccountUpdate {
        user_id: id,
        password,
        token,
        kind: UpdateKind::Delete,
        ..Default::default()
    };

    let result = state
        .soap
        .update_account(&update)
        .await
        .map_err(|e| ApiError::internal("Failed to delete account", e))?;

    match result {
        LegacyResult::Unavailable => Err(ApiError::bad_request(WEB_SERVICE_DOWN)),
        LegacyResult::Failed(LegacyError::Rejected) => Err(ApiError::forbidden(
            "You are not authorized to delete this account",
        )),
        result => {
            tracing::info!(user_id = %id, "Account deleted");
            Ok((StatusCode::OK, Json(json!({ "user": result.into_text() }))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_record_renames_serial_column() {
        let result = json!({
            "schema": "",
            "diffgram": {
                "NewDataSet": {
                    "Table": {
                        "QRScanKorisnikSK": "15",
                        "Email": "ana@example.com",
                        SERIAL_NUMBERS_COLUMN: "SB-1 - Glavna"
                    }
                }
            }
        });

        let user = user_record(&result).unwrap();
        assert_eq!(user["SerijskiBrojevi"], "SB-1 - Glavna");
        assert!(user.get(SERIAL_NUMBERS_COLUMN).is_none());
        assert_eq!(user["QRScanKorisnikSK"], "15");
    }

    #[test]
    fn test_user_record_first_of_many_rows() {
        let result = json!({
            "diffgram": {"NewDataSet": {"Table": [
                {"QRScanKorisnikSK": "1"},
                {"QRScanKorisnikSK": "2"}
            ]}}
        });
        assert_eq!(user_record(&result).unwrap()["QRScanKorisnikSK"], "1");
    }

    #[test]
    fn test_user_record_without_table() {
        assert_eq!(user_record(&json!({"diffgram": ""})), None);
        assert_eq!(
            user_record(&json!({"diffgram": {"NewDataSet": {"Table": ""}}})),
            None
        );
        assert_eq!(user_record(&json!("plain text")), None);
    }
}
