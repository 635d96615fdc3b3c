use axum::{
    extract::Request,
    http::{header, HeaderValue},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod views;

pub use config::Config;
pub use services::AppState;

/// CSP middleware adds Content-Security-Policy header to all responses
async fn csp_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response.headers_mut().insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(
            "default-src 'self'; \
             style-src 'self' 'unsafe-inline'; \
             form-action 'self'",
        ),
    );
    response
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Everything behind the password gate
    let protected_routes = Router::new()
        .route("/", get(handlers::pages::quiz_page))
        .route("/refresh", post(handlers::pages::refresh))
        .route("/submit", post(handlers::pages::submit))
        .nest("/api/v1/quiz", quiz_routes())
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            middlewares::auth::gate_middleware,
        ));

    let public_routes = Router::new()
        .route(
            "/login",
            get(handlers::pages::login_page).post(handlers::pages::login_submit),
        )
        .route("/logout", post(handlers::pages::logout_submit))
        .nest("/api/v1/auth", auth_routes());

    // Session cookie wraps both; the gate reads the session it attaches
    let session_routes = protected_routes
        .merge(public_routes)
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            middlewares::session::session_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health_check))
        // Metrics endpoint with Basic Auth protection
        .route(
            "/metrics",
            get(handlers::metrics_handler).layer(middleware::from_fn_with_state(
                app_state.clone(),
                handlers::metrics_auth_middleware,
            )),
        )
        .merge(session_routes)
        .with_state(app_state)
        .layer(middleware::from_fn(csp_middleware))
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(middleware::from_fn(
            middlewares::trace::trace_context_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

fn quiz_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(handlers::quiz::start_quiz))
        .route("/filters", get(handlers::quiz::get_filters))
        .route("/refresh", post(handlers::quiz::refresh_quiz))
        .route(
            "/questions/{index}/hint",
            get(handlers::quiz::get_hint),
        )
        .route("/submit", post(handlers::quiz::submit_answers))
}

fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout))
        .route("/status", get(handlers::auth::status))
}
