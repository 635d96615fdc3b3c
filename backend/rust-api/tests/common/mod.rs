#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use quiz_trainer_api::{
    config::{Config, Credentials},
    create_router,
    services::AppState,
};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

pub const USERNAME: &str = "trainer";
pub const PASSWORD: &str = "s3cret";

const HEADER: &str = "大分類,中分類,topic,question,option_1,option_2,option_3,option_4,correct_answer,faq,answer,q-id";

/// (chapter, sub_topic, topic, question, options, correct_answer)
pub const FIXTURE: [(&str, &str, &str, &str, [&str; 4], &str); 5] = [
    ("C1", "S1", "T1", "Q1", ["A1", "B1", "C1x", ""], "A1"),
    ("C1", "S1", "T2", "Q2", ["A2", "B2", "C2x", "D2"], "B2"),
    ("C1", "S2", "T3", "Q3", ["A3", "B3", "C3x", "D3"], "C3x"),
    ("C2", "S3", "T4", "Q4", ["A4", "B4", "C4x", "D4"], "D4"),
    ("C2", "S3", "T4", "Q5", ["A5", "B5", "C5x", ""], "A5"),
];

pub fn correct_answer(question: &str) -> &'static str {
    FIXTURE
        .iter()
        .find(|row| row.3 == question)
        .map(|row| row.5)
        .unwrap()
}

/// Writes the fixture questions, plus one row without question text, as CSV.
pub fn write_fixture(dir: &Path) -> std::path::PathBuf {
    let mut csv = String::from(HEADER);
    csv.push('\n');
    for (chapter, sub_topic, topic, question, options, correct) in FIXTURE {
        csv.push_str(&format!(
            "{},{},{},{},{},{},FAQ for {},Answer for {},P-{}\n",
            chapter,
            sub_topic,
            topic,
            question,
            options.join(","),
            correct,
            question,
            question,
            question
        ));
    }
    csv.push_str("C2,S3,T4,,A,B,C,,A,,,\n");

    let path = dir.join("questions.csv");
    std::fs::write(&path, csv).unwrap();
    path
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

async fn build_app(config: Config) -> Router {
    init_tracing();
    let app_state = Arc::new(
        AppState::new(config)
            .await
            .expect("Failed to initialize test app state"),
    );
    create_router(app_state)
}

/// Ungated app over the fixture. Keep the `TempDir` alive for the test.
pub async fn create_test_app() -> (Router, TempDir) {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path());
    (build_app(Config::with_questions(path)).await, dir)
}

/// Ungated app over `n` questions that all share chapter C1, sub topic S1
/// and topic T1.
pub async fn create_app_with_question_count(n: usize) -> (Router, TempDir) {
    let dir = TempDir::new().unwrap();
    let mut csv = String::from(HEADER);
    csv.push('\n');
    for i in 1..=n {
        csv.push_str(&format!("C1,S1,T1,Bulk{0},A,B,C,D,A,,,B-{0}\n", i));
    }
    let path = dir.path().join("questions.csv");
    std::fs::write(&path, csv).unwrap();
    (build_app(Config::with_questions(path)).await, dir)
}

/// Ungated app over the fixture with `configure` applied to its config.
pub async fn create_app_with(configure: impl FnOnce(&mut Config)) -> (Router, TempDir) {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path());
    let mut config = Config::with_questions(path);
    configure(&mut config);
    (build_app(config).await, dir)
}

/// App behind the password gate.
pub async fn create_gated_app() -> (Router, TempDir) {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path());
    let mut config = Config::with_questions(path);
    config.credentials = Some(Credentials {
        username: USERNAME.to_string(),
        password: PASSWORD.to_string(),
    });
    (build_app(config).await, dir)
}

/// App whose question source does not exist.
pub async fn create_app_without_source() -> Router {
    build_app(Config::with_questions("does-not-exist.xlsx")).await
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }

    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// `name=value` of the session cookie, if one was issued.
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("quiz_session="))
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    TestResponse {
        status,
        headers,
        body: String::from_utf8_lossy(&bytes).to_string(),
    }
}

pub async fn get(app: &Router, uri: &str, cookie: &str) -> TestResponse {
    let request = Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(
    app: &Router,
    uri: &str,
    cookie: &str,
    body: serde_json::Value,
) -> TestResponse {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, cookie)
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_form(app: &Router, uri: &str, cookie: &str, body: &str) -> TestResponse {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::COOKIE, cookie)
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// Number of sessions the app currently holds, as reported by `/health`.
pub async fn session_count(app: &Router) -> u64 {
    get(app, "/health", "").await.json()["sessions"]
        .as_u64()
        .unwrap()
}

/// Opens a browser session and returns its cookie.
pub async fn open_session(app: &Router) -> String {
    let response = send(
        app,
        Request::builder()
            .uri("/api/v1/auth/status")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    response.session_cookie().unwrap()
}
