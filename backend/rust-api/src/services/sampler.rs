use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::question::{Category, Hint, QuestionRecord, SampledQuestion};

/// Builds a quiz question from a record, with blank options dropped and the
/// remaining ones uniformly shuffled.
pub fn build_question<R: Rng + ?Sized>(record: &QuestionRecord, rng: &mut R) -> SampledQuestion {
    let mut options = record.non_blank_options();
    options.shuffle(rng);

    SampledQuestion {
        category: Category {
            chapter: record.chapter.clone(),
            sub_topic: record.sub_topic.clone(),
            topic: record.topic.clone(),
        },
        question: record.question.clone(),
        options,
        correct_answer: record.correct_answer.clone(),
        hint: Hint {
            faq: record.faq.clone(),
            answer_text: record.answer_text.clone(),
            reference_id: record.reference_id.clone(),
        },
    }
}

/// Draws `count` questions uniformly without replacement, or all of them
/// when there are not more than `count` candidates.
pub fn sample_questions<R: Rng + ?Sized>(
    records: &[&QuestionRecord],
    count: usize,
    rng: &mut R,
) -> Vec<SampledQuestion> {
    let mut questions: Vec<SampledQuestion> = records
        .iter()
        .map(|record| build_question(record, rng))
        .collect();

    if questions.len() > count {
        questions.shuffle(rng);
        questions.truncate(count);
    }

    questions
}
