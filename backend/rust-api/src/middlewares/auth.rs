use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Extension,
};
use std::sync::Arc;

use super::session::SessionId;
use crate::error::QuizError;
use crate::services::AppState;

/// Password gate. Ungated deployments pass straight through; otherwise an
/// unauthenticated session is sent to the login page (HTML) or gets a 401
/// (API).
pub async fn gate_middleware(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionId>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.is_gated() || state.sessions.is_authenticated(session.as_str()).await {
        return next.run(request).await;
    }

    tracing::debug!(
        "Unauthenticated request to {} from session {}",
        request.uri().path(),
        session.as_str()
    );

    if request.uri().path().starts_with("/api/") {
        QuizError::Unauthenticated.into_http().into_response()
    } else {
        Redirect::to("/login").into_response()
    }
}
