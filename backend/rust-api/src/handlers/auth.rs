use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use std::sync::Arc;
use validator::Validate;

use crate::{
    error::QuizError,
    extractors::AppJson,
    middlewares::session::SessionId,
    models::user::{AuthStatusResponse, LoginRequest},
    services::{auth_service::AuthService, AppState},
};

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionId>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if let Err(e) = req.validate() {
        return Err((StatusCode::BAD_REQUEST, format!("Validation error: {}", e)));
    }

    let service = AuthService::new(state.config.credentials.clone());
    if !service.authenticate(&req.username, &req.password) {
        return Err(QuizError::InvalidCredentials.into_http());
    }

    state
        .sessions
        .set_authenticated(session.as_str(), true)
        .await;
    tracing::info!("Session authenticated: {}", session.as_str());

    Ok(Json(AuthStatusResponse {
        authenticated: true,
    }))
}

/// POST /api/v1/auth/logout - clears the flag and the active quiz
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionId>,
) -> impl IntoResponse {
    state.sessions.logout(session.as_str()).await;
    Json(AuthStatusResponse {
        authenticated: false,
    })
}

/// GET /api/v1/auth/status
pub async fn status(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionId>,
) -> impl IntoResponse {
    let authenticated =
        !state.config.is_gated() || state.sessions.is_authenticated(session.as_str()).await;
    Json(AuthStatusResponse { authenticated })
}
