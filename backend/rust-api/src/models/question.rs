use serde::{Deserialize, Serialize};

/// Question counts offered by the quiz form.
pub const QUESTION_COUNT_CHOICES: [usize; 6] = [5, 10, 15, 20, 30, 50];
pub const DEFAULT_QUESTION_COUNT: usize = 10;

/// One row of the question spreadsheet. Never mutated after loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub chapter: String,
    pub sub_topic: String,
    pub topic: String,
    /// Value of the optional session column, `None` when the source has none.
    pub session: Option<String>,
    pub question: String,
    /// Raw option cells in column order; empty cells are kept here and
    /// dropped when the record is turned into a [`SampledQuestion`].
    pub options: Vec<String>,
    pub correct_answer: String,
    pub faq: String,
    pub answer_text: String,
    pub reference_id: String,
}

impl QuestionRecord {
    /// Options with empty cells removed. Whitespace-only text is a real
    /// option and stays.
    pub fn non_blank_options(&self) -> Vec<String> {
        self.options
            .iter()
            .filter(|option| !option.is_empty())
            .cloned()
            .collect()
    }
}

/// The three classification fields of a question.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Category {
    pub chapter: String,
    pub sub_topic: String,
    pub topic: String,
}

impl Category {
    /// Display label, e.g. `[Chapter/Sub-topic/Topic]`.
    pub fn label(&self) -> String {
        format!("[{}/{}/{}]", self.chapter, self.sub_topic, self.topic)
    }
}

/// Supplementary text revealed on request. Does not affect scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hint {
    pub faq: String,
    pub answer_text: String,
    pub reference_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampledQuestion {
    pub category: Category,
    pub question: String,
    /// Non-blank options in display (shuffled) order.
    pub options: Vec<String>,
    pub correct_answer: String,
    pub hint: Hint,
}

/// What clients see of a sampled question: no correct answer, no hint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionView {
    pub index: usize,
    pub category: String,
    pub chapter: String,
    pub sub_topic: String,
    pub topic: String,
    pub question: String,
    pub options: Vec<String>,
}

impl QuestionView {
    pub fn from_sampled(index: usize, question: &SampledQuestion) -> Self {
        Self {
            index,
            category: question.category.label(),
            chapter: question.category.chapter.clone(),
            sub_topic: question.category.sub_topic.clone(),
            topic: question.category.topic.clone(),
            question: question.question.clone(),
            options: question.options.clone(),
        }
    }
}
