use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::question::Category;

#[derive(Debug, Deserialize)]
pub struct SubmitAnswersRequest {
    /// Selected option text per displayed question, by position.
    /// Missing or `null` entries count as unanswered.
    #[serde(default)]
    pub answers: Vec<Option<String>>,
}

/// A question's selected option next to its correct answer, assembled only
/// when grading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAnswer {
    pub category: Category,
    pub question: String,
    pub selected: Option<String>,
    pub correct_answer: String,
}

impl UserAnswer {
    /// Exact string equality: no trimming, no case folding.
    pub fn is_correct(&self) -> bool {
        self.selected.as_deref() == Some(self.correct_answer.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mark {
    #[serde(rename = "〇")]
    Correct,
    #[serde(rename = "×")]
    Incorrect,
}

impl Mark {
    pub fn symbol(self) -> &'static str {
        match self {
            Mark::Correct => "〇",
            Mark::Incorrect => "×",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResult {
    pub index: usize,
    pub category: String,
    pub question: String,
    pub selected: Option<String>,
    pub correct_answer: String,
    pub mark: Mark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryLevel {
    Chapter,
    SubTopic,
    Topic,
}

impl SummaryLevel {
    /// Number of grouping key columns at this level.
    pub fn depth(self) -> usize {
        match self {
            SummaryLevel::Chapter => 1,
            SummaryLevel::SubTopic => 2,
            SummaryLevel::Topic => 3,
        }
    }

    pub fn key_of(self, category: &Category) -> Vec<String> {
        let all = [&category.chapter, &category.sub_topic, &category.topic];
        all.iter().take(self.depth()).map(|s| s.to_string()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    /// Grouping keys, outermost first. On the total row every column but the
    /// last is blank and the last holds the total label.
    pub keys: Vec<String>,
    pub asked: u32,
    pub correct: u32,
    /// Percentage rounded to one decimal, e.g. `"66.7%"`.
    pub accuracy: String,
    #[serde(default)]
    pub is_total: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySummary {
    pub level: SummaryLevel,
    /// Grouped rows sorted by key, followed by the total row.
    pub rows: Vec<SummaryRow>,
}

impl CategorySummary {
    pub fn total(&self) -> Option<&SummaryRow> {
        self.rows.last().filter(|row| row.is_total)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeReport {
    pub results: Vec<QuestionResult>,
    pub correct_count: u32,
    pub total: u32,
    pub chapter_summary: CategorySummary,
    pub sub_topic_summary: CategorySummary,
    pub topic_summary: CategorySummary,
    pub graded_at: DateTime<Utc>,
}
