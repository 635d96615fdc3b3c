use chrono::Utc;
use std::collections::BTreeMap;

use crate::metrics::ANSWERS_GRADED_TOTAL;
use crate::models::answer::{
    CategorySummary, GradeReport, Mark, QuestionResult, SummaryLevel, SummaryRow, UserAnswer,
};
use crate::models::question::SampledQuestion;

pub const TOTAL_LABEL: &str = "合計";

/// `correct / asked * 100` rounded to one decimal, half to even on the
/// scaled value.
pub fn accuracy(correct: u32, asked: u32) -> f64 {
    if asked == 0 {
        return 0.0;
    }
    let percent = f64::from(correct) / f64::from(asked) * 100.0;
    (percent * 10.0).round_ties_even() / 10.0
}

pub fn format_accuracy(correct: u32, asked: u32) -> String {
    format!("{:.1}%", accuracy(correct, asked))
}

/// Pairs each displayed question with the answer given for it.
pub fn collect_answers(questions: &[SampledQuestion], answers: &[Option<String>]) -> Vec<UserAnswer> {
    questions
        .iter()
        .enumerate()
        .map(|(i, question)| UserAnswer {
            category: question.category.clone(),
            question: question.question.clone(),
            selected: answers.get(i).cloned().flatten(),
            correct_answer: question.correct_answer.clone(),
        })
        .collect()
}

fn summarize(answers: &[UserAnswer], level: SummaryLevel) -> CategorySummary {
    let mut groups: BTreeMap<Vec<String>, (u32, u32)> = BTreeMap::new();
    for answer in answers {
        let entry = groups.entry(level.key_of(&answer.category)).or_default();
        entry.0 += 1;
        if answer.is_correct() {
            entry.1 += 1;
        }
    }

    let mut rows: Vec<SummaryRow> = groups
        .into_iter()
        .map(|(keys, (asked, correct))| SummaryRow {
            keys,
            asked,
            correct,
            accuracy: format_accuracy(correct, asked),
            is_total: false,
        })
        .collect();

    let asked: u32 = rows.iter().map(|row| row.asked).sum();
    let correct: u32 = rows.iter().map(|row| row.correct).sum();
    let mut keys = vec![String::new(); level.depth() - 1];
    keys.push(TOTAL_LABEL.to_string());
    rows.push(SummaryRow {
        keys,
        asked,
        correct,
        accuracy: format_accuracy(correct, asked),
        is_total: true,
    });

    CategorySummary { level, rows }
}

/// Scores a submission against the displayed questions.
pub fn grade(questions: &[SampledQuestion], answers: &[Option<String>]) -> GradeReport {
    let user_answers = collect_answers(questions, answers);

    let results: Vec<QuestionResult> = user_answers
        .iter()
        .enumerate()
        .map(|(index, answer)| QuestionResult {
            index,
            category: answer.category.label(),
            question: answer.question.clone(),
            selected: answer.selected.clone(),
            correct_answer: answer.correct_answer.clone(),
            mark: if answer.is_correct() {
                Mark::Correct
            } else {
                Mark::Incorrect
            },
        })
        .collect();

    let correct_count = results
        .iter()
        .filter(|result| result.mark == Mark::Correct)
        .count() as u32;
    let total = results.len() as u32;

    ANSWERS_GRADED_TOTAL
        .with_label_values(&["true"])
        .inc_by(u64::from(correct_count));
    ANSWERS_GRADED_TOTAL
        .with_label_values(&["false"])
        .inc_by(u64::from(total - correct_count));

    GradeReport {
        results,
        correct_count,
        total,
        chapter_summary: summarize(&user_answers, SummaryLevel::Chapter),
        sub_topic_summary: summarize(&user_answers, SummaryLevel::SubTopic),
        topic_summary: summarize(&user_answers, SummaryLevel::Topic),
        graded_at: Utc::now(),
    }
}
