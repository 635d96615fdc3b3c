use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;

use crate::services::AppState;

pub const SESSION_COOKIE: &str = "quiz_session";

/// Session id of the current request, inserted by [`session_middleware`].
#[derive(Clone, Debug)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Attaches a [`SessionId`] to every request, issuing the session cookie on
/// first contact.
pub async fn session_middleware(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let existing = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty());

    // Only ids this process issued and that are still live are honoured;
    // anything else is replaced with a fresh session.
    let known = match existing {
        Some(id) if state.sessions.touch(&id).await => Some(id),
        Some(id) => {
            tracing::debug!("Replacing unknown or expired session id: {}", id);
            None
        }
        None => None,
    };

    let (session_id, issued) = match known {
        Some(id) => (id, false),
        None => (state.sessions.create().await, true),
    };

    request
        .extensions_mut()
        .insert(SessionId(session_id.clone()));

    let response = next.run(request).await;

    if !issued {
        return response;
    }

    let cookie = Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .secure(state.config.cookie_secure)
        .same_site(SameSite::Lax)
        .build();

    (jar.add(cookie), response).into_response()
}
