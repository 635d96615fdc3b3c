use std::sync::Arc;

use super::filter_service::{apply_filters, filter_options};
use super::grading_service::grade;
use super::question_store::{QuestionBank, QuestionStore};
use super::sampler::sample_questions;
use super::session_service::SessionStore;
use super::AppState;
use crate::error::{QuizError, QuizResult};
use crate::metrics::{HINTS_REVEALED_TOTAL, QUIZZES_SAMPLED_TOTAL};
use crate::models::answer::GradeReport;
use crate::models::filter::{FilterOptions, FilterSelection, InvalidationPolicy};
use crate::models::hint::HintResponse;
use crate::models::question::{QuestionView, SampledQuestion, QUESTION_COUNT_CHOICES};
use crate::models::session::ResampleReason;
use crate::models::{QuizResponse, StartQuizRequest};

/// Questions shown for one render.
#[derive(Debug, Clone)]
pub struct QuizRender {
    pub questions: Vec<SampledQuestion>,
    pub candidate_count: usize,
    pub resampled: Option<ResampleReason>,
}

/// One render of the quiz: filter, sample (or reuse), grade.
pub struct QuizService {
    questions: Arc<QuestionStore>,
    sessions: Arc<SessionStore>,
    policy: InvalidationPolicy,
    default_count: usize,
}

impl QuizService {
    pub fn new(state: &AppState) -> Self {
        Self {
            questions: state.questions.clone(),
            sessions: state.sessions.clone(),
            policy: state.config.invalidation,
            default_count: state.config.default_count,
        }
    }

    pub fn resolve_count(&self, requested: Option<usize>) -> QuizResult<usize> {
        let count = requested.unwrap_or(self.default_count);
        if QUESTION_COUNT_CHOICES.contains(&count) {
            Ok(count)
        } else {
            Err(QuizError::InvalidQuestionCount(count))
        }
    }

    /// Loads the bank and cascades the filter selection over it.
    pub async fn filters(
        &self,
        selection: &FilterSelection,
    ) -> QuizResult<(Arc<QuestionBank>, FilterOptions)> {
        let bank = self.questions.bank().await?;
        let options = filter_options(bank.records(), selection);
        Ok((bank, options))
    }

    /// Returns the session's question set for `options`, sampling a new one
    /// only when there is none, the filters changed, or `refresh` is set.
    pub async fn current_questions(
        &self,
        session_id: &str,
        bank: &QuestionBank,
        options: &FilterOptions,
        count: usize,
        refresh: bool,
    ) -> QuizResult<QuizRender> {
        let filtered = apply_filters(bank.records(), options);
        if filtered.is_empty() {
            tracing::warn!("No questions match filters for session: {}", session_id);
            return Err(QuizError::NoMatchingQuestions);
        }

        let candidate_count = filtered.len();
        let signature = options.signature();
        let policy = self.policy;

        let (questions, resampled) = self
            .sessions
            .with_session(session_id, |session| {
                let (questions, reason) =
                    session.get_or_resample(signature, refresh, policy, || {
                        let mut rng = rand::rng();
                        sample_questions(&filtered, count, &mut rng)
                    });
                (questions.clone(), reason)
            })
            .await;

        if let Some(reason) = resampled {
            QUIZZES_SAMPLED_TOTAL
                .with_label_values(&[reason.as_str()])
                .inc();
            tracing::info!(
                "Sampled {} of {} questions for session {} ({})",
                questions.len(),
                candidate_count,
                session_id,
                reason.as_str()
            );
        }

        Ok(QuizRender {
            questions,
            candidate_count,
            resampled,
        })
    }

    /// JSON flow: filter and return the current questions without answers.
    pub async fn start_quiz(
        &self,
        session_id: &str,
        req: &StartQuizRequest,
    ) -> QuizResult<QuizResponse> {
        let count = self.resolve_count(req.count)?;
        let (bank, options) = self.filters(&req.filters).await?;
        let render = self
            .current_questions(session_id, &bank, &options, count, req.refresh)
            .await?;

        Ok(QuizResponse {
            filters: options,
            count,
            candidate_count: render.candidate_count,
            questions: render
                .questions
                .iter()
                .enumerate()
                .map(|(i, q)| QuestionView::from_sampled(i, q))
                .collect(),
            resampled: render.resampled,
        })
    }

    pub async fn active_questions(&self, session_id: &str) -> QuizResult<Vec<SampledQuestion>> {
        self.sessions
            .with_session(session_id, |session| {
                session.active_quiz().map(|quiz| quiz.questions.clone())
            })
            .await
            .ok_or(QuizError::NoActiveQuiz)
    }

    pub async fn hint(&self, session_id: &str, index: usize) -> QuizResult<HintResponse> {
        let questions = self.active_questions(session_id).await?;
        let question = questions
            .get(index)
            .ok_or(QuizError::QuestionNotFound(index))?;

        HINTS_REVEALED_TOTAL.inc();

        Ok(HintResponse {
            index,
            faq: question.hint.faq.clone(),
            answer_text: question.hint.answer_text.clone(),
            reference_id: question.hint.reference_id.clone(),
        })
    }

    /// Grades `answers` against the session's active questions. The question
    /// set stays active afterwards.
    pub async fn submit(
        &self,
        session_id: &str,
        answers: &[Option<String>],
    ) -> QuizResult<GradeReport> {
        let questions = self.active_questions(session_id).await?;
        let report = grade(&questions, answers);
        tracing::info!(
            "Graded quiz for session {}: {}/{}",
            session_id,
            report.correct_count,
            report.total
        );
        Ok(report)
    }

    pub async fn refresh(&self, session_id: &str) {
        self.sessions.refresh(session_id).await;
    }
}
