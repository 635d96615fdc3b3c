use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Question source
    pub static ref QUESTION_BANK_LOADS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "question_bank_loads_total",
        "Question source load attempts",
        &["status"]
    )
    .unwrap();

    // Business Metrics
    pub static ref SESSIONS_ACTIVE: IntGauge = register_int_gauge!(
        "sessions_active",
        "Number of quiz sessions held in memory"
    )
    .unwrap();

    pub static ref QUIZZES_SAMPLED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "quizzes_sampled_total",
        "Question sets sampled, by trigger",
        &["reason"]
    )
    .unwrap();

    pub static ref ANSWERS_GRADED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "answers_graded_total",
        "Total number of graded answers",
        &["correct"]
    )
    .unwrap();

    pub static ref HINTS_REVEALED_TOTAL: IntCounter = register_int_counter!(
        "hints_revealed_total",
        "Total number of hints revealed through the API"
    )
    .unwrap();

    pub static ref LOGIN_ATTEMPTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "login_attempts_total",
        "Login attempts against the password gate",
        &["result"]
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}
