use axum::http::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuizError {
    #[error("question source '{}' not found", .0.display())]
    SourceNotFound(PathBuf),

    #[error("unsupported question source format: .{0}")]
    UnsupportedFormat(String),

    #[error("required column '{0}' is missing from the question source")]
    MissingColumn(String),

    #[error("failed to read question source: {0}")]
    Spreadsheet(String),

    #[error("no questions match the selected filters")]
    NoMatchingQuestions,

    #[error("question count {0} is not one of 5, 10, 15, 20, 30, 50")]
    InvalidQuestionCount(usize),

    #[error("no active quiz for this session")]
    NoActiveQuiz,

    #[error("question {0} does not exist in the active quiz")]
    QuestionNotFound(usize),

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("authentication required")]
    Unauthenticated,
}

impl QuizError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            QuizError::SourceNotFound(_) => StatusCode::SERVICE_UNAVAILABLE,
            QuizError::UnsupportedFormat(_)
            | QuizError::MissingColumn(_)
            | QuizError::Spreadsheet(_) => StatusCode::INTERNAL_SERVER_ERROR,
            QuizError::NoMatchingQuestions => StatusCode::UNPROCESSABLE_ENTITY,
            QuizError::InvalidQuestionCount(_) => StatusCode::BAD_REQUEST,
            QuizError::NoActiveQuiz => StatusCode::CONFLICT,
            QuizError::QuestionNotFound(_) => StatusCode::NOT_FOUND,
            QuizError::InvalidCredentials | QuizError::Unauthenticated => StatusCode::UNAUTHORIZED,
        }
    }

    /// Handler-facing form of the error.
    pub fn into_http(self) -> (StatusCode, String) {
        (self.status_code(), self.to_string())
    }
}

pub type QuizResult<T> = Result<T, QuizError>;
