use serde::{Deserialize, Serialize};

pub mod answer;
pub mod filter;
pub mod hint;
pub mod question;
pub mod session;
pub mod user;

use filter::{FilterOptions, FilterSelection};
use question::QuestionView;
use session::ResampleReason;

#[derive(Debug, Default, Deserialize)]
pub struct StartQuizRequest {
    #[serde(flatten)]
    pub filters: FilterSelection,
    pub count: Option<usize>,
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuizResponse {
    pub filters: FilterOptions,
    pub count: usize,
    pub candidate_count: usize,
    pub questions: Vec<QuestionView>,
    /// Set when this request produced a new question set.
    pub resampled: Option<ResampleReason>,
}
