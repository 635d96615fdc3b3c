use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use quiz_trainer_api::{
    config::Config,
    create_router,
    services::{session_service::spawn_session_sweeper, AppState},
};

/// How often idle sessions are swept.
const SESSION_SWEEP_PERIOD: std::time::Duration = std::time::Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first: it decides whether spans are exported
    let config = Config::load()?;

    let provider = match config.otlp_endpoint.as_deref() {
        Some(endpoint) => Some(init_telemetry(endpoint)?),
        None => None,
    };
    init_tracing(provider.as_ref());

    tracing::info!("Starting quiz trainer");
    tracing::info!(
        "Configuration loaded for environment: {:?} (gated: {}, invalidation: {:?})",
        std::env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string()),
        config.is_gated(),
        config.invalidation
    );

    let bind_addr = config.bind_addr.clone();
    let app_state = Arc::new(AppState::new(config).await?);
    let sweeper = spawn_session_sweeper(app_state.sessions.clone(), SESSION_SWEEP_PERIOD);

    // Build router
    let app = create_router(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    sweeper.abort();

    if let Some(provider) = provider {
        tracing::info!("Shutting down OpenTelemetry");
        if let Err(e) = provider.shutdown() {
            tracing::warn!("OpenTelemetry shutdown failed: {}", e);
        }
    }

    Ok(())
}

fn init_tracing(provider: Option<&opentelemetry_sdk::trace::SdkTracerProvider>) {
    use opentelemetry::trace::TracerProvider as _;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "quiz_trainer_api=debug,tower_http=debug".into());

    // LOG_FORMAT=json switches to structured output
    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    let otel_layer = provider.map(|provider| {
        tracing_opentelemetry::layer().with_tracer(provider.tracer("quiz-trainer-api"))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(otel_layer)
        .init();
}

fn init_telemetry(endpoint: &str) -> anyhow::Result<opentelemetry_sdk::trace::SdkTracerProvider> {
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::trace::SdkTracerProvider;
    use opentelemetry_sdk::Resource;

    // Configure OTLP exporter
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()?;

    // Create resource with service information
    let resource = Resource::builder_empty()
        .with_service_name("quiz-trainer-api")
        .with_attributes(vec![KeyValue::new(
            "service.version",
            env!("CARGO_PKG_VERSION"),
        )])
        .build();

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build();

    opentelemetry::global::set_tracer_provider(provider.clone());

    Ok(provider)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
