use serde::Deserialize;
use std::env;
use std::path::PathBuf;

use crate::models::filter::InvalidationPolicy;
use crate::models::question::{DEFAULT_QUESTION_COUNT, QUESTION_COUNT_CHOICES};
use crate::services::session_service::{DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_TTL_SECS};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub questions: QuestionsConfig,
    pub bind_addr: String,
    pub cookie_secure: bool,
    /// Idle time after which a browser session is dropped.
    pub session_ttl_secs: u64,
    pub max_sessions: usize,
    /// `None` runs the ungated variant.
    pub credentials: Option<Credentials>,
    pub invalidation: InvalidationPolicy,
    pub default_count: usize,
    pub metrics_basic_auth: String,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionsConfig {
    pub path: PathBuf,
    pub lowercase_headers: bool,
    pub session_column: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Default for QuestionsConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("PII_QA2.xlsx"),
            lowercase_headers: true,
            session_column: None,
        }
    }
}

impl Config {
    /// Ungated configuration reading questions from `path`.
    pub fn with_questions(path: impl Into<PathBuf>) -> Self {
        Self {
            questions: QuestionsConfig {
                path: path.into(),
                ..QuestionsConfig::default()
            },
            bind_addr: "0.0.0.0:8081".to_string(),
            cookie_secure: false,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            max_sessions: DEFAULT_MAX_SESSIONS,
            credentials: None,
            invalidation: InvalidationPolicy::AllFilters,
            default_count: DEFAULT_QUESTION_COUNT,
            metrics_basic_auth: "admin:changeme".to_string(),
            otlp_endpoint: None,
        }
    }

    pub fn is_gated(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // config/*.toml, then the secrets file, then ENV overrides
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::File::with_name("config/secrets").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let defaults = QuestionsConfig::default();
        let questions = QuestionsConfig {
            path: settings
                .get_string("questions.path")
                .map(PathBuf::from)
                .unwrap_or(defaults.path),
            lowercase_headers: settings
                .get_bool("questions.lowercase_headers")
                .unwrap_or(defaults.lowercase_headers),
            session_column: settings
                .get_string("questions.session_column")
                .ok()
                .filter(|column| !column.trim().is_empty()),
        };

        let bind_addr = settings
            .get_string("server.bind_addr")
            .unwrap_or_else(|_| "0.0.0.0:8081".to_string());

        let cookie_secure = settings
            .get_bool("server.cookie_secure")
            .unwrap_or(env == "prod");

        let session_ttl_secs = settings
            .get_int("server.session_ttl_secs")
            .ok()
            .and_then(|secs| u64::try_from(secs).ok())
            .unwrap_or(DEFAULT_SESSION_TTL_SECS);

        let max_sessions = settings
            .get_int("server.max_sessions")
            .ok()
            .and_then(|max| usize::try_from(max).ok())
            .filter(|max| *max > 0)
            .unwrap_or(DEFAULT_MAX_SESSIONS);

        let credentials = match (
            settings.get_string("credentials.username"),
            settings.get_string("credentials.password"),
        ) {
            (Ok(username), Ok(password)) => Some(Credentials { username, password }),
            (Ok(_), Err(_)) | (Err(_), Ok(_)) => {
                return Err(config::ConfigError::Message(
                    "credentials.username and credentials.password must be set together"
                        .to_string(),
                ))
            }
            _ => None,
        };

        let invalidation = match settings.get_string("quiz.invalidation") {
            Ok(value) => value.parse().map_err(config::ConfigError::Message)?,
            Err(_) => InvalidationPolicy::AllFilters,
        };

        let default_count = match settings.get_int("quiz.default_count") {
            Ok(value) => {
                let count = usize::try_from(value).unwrap_or(0);
                if !QUESTION_COUNT_CHOICES.contains(&count) {
                    return Err(config::ConfigError::Message(format!(
                        "quiz.default_count must be one of {:?}, got {}",
                        QUESTION_COUNT_CHOICES, value
                    )));
                }
                count
            }
            Err(_) => DEFAULT_QUESTION_COUNT,
        };

        let metrics_basic_auth = settings
            .get_string("metrics.basic_auth")
            .or_else(|_| env::var("METRICS_AUTH"))
            .unwrap_or_else(|_| {
                if env == "prod" {
                    tracing::warn!("metrics.basic_auth not set; using default credentials");
                }
                "admin:changeme".to_string()
            });

        let otlp_endpoint = settings
            .get_string("telemetry.otlp_endpoint")
            .or_else(|_| env::var("OTEL_EXPORTER_OTLP_ENDPOINT"))
            .ok();

        Ok(Config {
            questions,
            bind_addr,
            cookie_secure,
            session_ttl_secs,
            max_sessions,
            credentials,
            invalidation,
            default_count,
            metrics_basic_auth,
            otlp_endpoint,
        })
    }
}
