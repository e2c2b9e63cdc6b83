//! Session introspection for the frontend.

use crate::sso::state::AppState;
use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub email: String,
}

#[utoipa::path(
    get,
    path = "/sso/v1/session",
    responses(
        (status = 200, description = "Session is active", body = SessionResponse),
        (status = 204, description = "No active session")
    ),
    tag = "sso"
)]
pub async fn session(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    // Missing cookies are treated as "no session" to avoid leaking auth state.
    match state.sessions.lookup(&headers).await {
        Some(email) => (StatusCode::OK, Json(SessionResponse { email })).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
