//! HTTP surface of the gateway.
//!
//! Routes are grouped by upstream: [`auth`], [`users`], [`receipts`] and
//! [`info`] call the legacy SOAP service, [`helpdesk`] calls ServiceDesk
//! Plus. Handlers validate their input, call one client, and map the result
//! (or the legacy error sentinels) to a status code and a JSON body.

pub mod auth;
pub mod error;
pub mod extract;
pub mod helpdesk;
pub mod info;
pub mod inputs;
pub mod receipts;
pub mod users;

use axum::extract::{DefaultBodyLimit, OriginalUri};
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use crate::sdp_client::SdpClient;
use crate::soap::SoapClient;

pub use error::ApiError;

/// Message returned when the legacy service gives no usable answer.
pub(crate) const WEB_SERVICE_DOWN: &str = "Web service is not available";

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Client for the legacy QR-scan service.
    pub soap: SoapClient,
    /// Client for ServiceDesk Plus.
    pub sdp: SdpClient,
}

impl AppState {
    /// Bundles the two upstream clients.
    pub fn new(soap: SoapClient, sdp: SdpClient) -> Self {
        Self { soap, sdp }
    }
}

/// Builds the application router with every route mounted under `prefix`.
///
/// `prefix` is either empty or of the form `/segment`. CORS is open to any
/// origin. Unknown routes, and known routes called with the wrong method,
/// answer with a JSON 404.
pub fn router(state: AppState, prefix: &str) -> Router {
    let routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route(
            "/users/{id}",
            get(users::get_user).delete(users::delete_user),
        )
        .route("/users/{id}/password", put(users::change_password))
        .route("/users/{id}/profile", put(users::update_profile))
        .route("/receipts", post(receipts::create_receipts))
        .route("/info/ws", get(info::web_server_time))
        .route("/info/db", get(info::db_server_time))
        .route("/zoho/access-token", get(helpdesk::access_token))
        .route(
            "/zoho/requests",
            get(helpdesk::list_requests)
                .post(helpdesk::create_request)
                .layer(DefaultBodyLimit::max(extract::MAX_TICKET_BODY_BYTES)),
        )
        .method_not_allowed_fallback(not_found);

    let app = if prefix.is_empty() {
        routes
    } else {
        Router::new().nest(prefix, routes)
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    app.fallback(not_found).layer(cors).with_state(state)
}

async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> impl IntoResponse {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Not Found",
            "path": path,
            "method": method.as_str(),
        })),
    )
}
