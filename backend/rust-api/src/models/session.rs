use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::filter::{FilterSignature, InvalidationPolicy};
use super::question::SampledQuestion;

pub type QuestionSet = Vec<SampledQuestion>;

/// The sampled questions shown to a user and the filters that produced them.
#[derive(Debug, Clone)]
pub struct ActiveQuiz {
    pub signature: FilterSignature,
    pub questions: QuestionSet,
    pub sampled_at: DateTime<Utc>,
}

/// Why a question set was (re)generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleReason {
    Initial,
    FiltersChanged,
    Refresh,
}

impl ResampleReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ResampleReason::Initial => "initial",
            ResampleReason::FiltersChanged => "filters_changed",
            ResampleReason::Refresh => "refresh",
        }
    }
}

/// Per-browser state kept between renders.
#[derive(Debug, Clone)]
pub struct QuizSession {
    pub authenticated: bool,
    quiz: Option<ActiveQuiz>,
    /// Set when the quiz was dropped on request; the next sample is a refresh.
    refresh_pending: bool,
    last_seen: DateTime<Utc>,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self {
            authenticated: false,
            quiz: None,
            refresh_pending: false,
            last_seen: Utc::now(),
        }
    }
}

impl QuizSession {
    pub fn active_quiz(&self) -> Option<&ActiveQuiz> {
        self.quiz.as_ref()
    }

    pub fn last_seen(&self) -> DateTime<Utc> {
        self.last_seen
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_seen = now;
    }

    /// Whether the session has been idle for longer than `ttl` at `now`.
    pub fn is_idle(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.last_seen) > ttl
    }

    /// Returns the current question set, regenerating it with `resample` when
    /// there is none yet, when `signature` differs from the stored one under
    /// `policy`, or when a refresh was asked for (`regenerate` or an earlier
    /// [`QuizSession::clear_quiz`]). Otherwise the stored set and its option
    /// order are returned untouched.
    pub fn get_or_resample<F>(
        &mut self,
        signature: FilterSignature,
        regenerate: bool,
        policy: InvalidationPolicy,
        resample: F,
    ) -> (&QuestionSet, Option<ResampleReason>)
    where
        F: FnOnce() -> QuestionSet,
    {
        let regenerate = regenerate || std::mem::take(&mut self.refresh_pending);

        let (active, reason) = match self.quiz.take() {
            Some(active) if !regenerate && !active.signature.differs_from(&signature, policy) => {
                (active, None)
            }
            previous => {
                let reason = if regenerate {
                    ResampleReason::Refresh
                } else if previous.is_none() {
                    ResampleReason::Initial
                } else {
                    ResampleReason::FiltersChanged
                };
                let active = ActiveQuiz {
                    signature,
                    questions: resample(),
                    sampled_at: Utc::now(),
                };
                (active, Some(reason))
            }
        };

        let active = self.quiz.insert(active);
        (&active.questions, reason)
    }

    /// Drops the active quiz so the next render samples afresh.
    pub fn clear_quiz(&mut self) {
        self.quiz = None;
        self.refresh_pending = true;
    }

    pub fn logout(&mut self) {
        self.authenticated = false;
        self.clear_quiz();
    }
}
