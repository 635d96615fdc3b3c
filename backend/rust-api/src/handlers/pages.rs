use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Extension,
};
use axum_extra::extract::{Form, Query};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::{
    error::QuizError,
    middlewares::session::SessionId,
    models::filter::FilterSelection,
    services::{auth_service::AuthService, quiz_service::QuizService, AppState},
    views::{
        login_page::{LoginPage, LOGGED_OUT, LOGIN_FAILED},
        quiz_page::{source_missing_message, QuizPage, NO_MATCH_WARNING},
    },
};

/// Filter and answer fields posted by the quiz page forms.
///
/// `basis_*` carry the chapter/sub-topic selection the page was rendered
/// with. When the chapter selection changed since then, the sub-topic and
/// topic lists are new and reset to "all"; likewise topics reset when the
/// sub-topic selection changed.
#[derive(Debug, Default)]
pub struct QuizForm {
    pub applied: bool,
    pub chapter: Vec<String>,
    pub sub_topic: Vec<String>,
    pub topic: Vec<String>,
    pub session: Vec<String>,
    pub basis_chapter: Vec<String>,
    pub basis_sub_topic: Vec<String>,
    pub count: Option<usize>,
    /// `(question index, selected option)` pairs from `q{index}` fields.
    pub answers: Vec<(usize, String)>,
}

impl QuizForm {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut form = QuizForm::default();
        for (key, value) in pairs {
            match key.as_str() {
                "applied" => form.applied = true,
                "chapter" => form.chapter.push(value.clone()),
                "sub_topic" => form.sub_topic.push(value.clone()),
                "topic" => form.topic.push(value.clone()),
                "session" => form.session.push(value.clone()),
                "basis_chapter" => form.basis_chapter.push(value.clone()),
                "basis_sub_topic" => form.basis_sub_topic.push(value.clone()),
                // Unparseable counts fall through to the count check.
                "count" => form.count = Some(value.parse().unwrap_or(0)),
                other => {
                    if let Some(index) = other.strip_prefix('q').and_then(|i| i.parse().ok()) {
                        form.answers.push((index, value.clone()));
                    }
                }
            }
        }
        form
    }

    pub fn selection(&self) -> FilterSelection {
        if !self.applied {
            return FilterSelection::default();
        }

        let as_set = |values: &[String]| values.iter().cloned().collect::<BTreeSet<_>>();
        let chapters_changed = as_set(&self.chapter) != as_set(&self.basis_chapter);
        let sub_topics_changed =
            chapters_changed || as_set(&self.sub_topic) != as_set(&self.basis_sub_topic);

        FilterSelection {
            chapters: Some(self.chapter.clone()),
            sub_topics: (!chapters_changed).then(|| self.sub_topic.clone()),
            topics: (!sub_topics_changed).then(|| self.topic.clone()),
            sessions: Some(self.session.clone()),
        }
    }

    /// Answers by position for `question_count` questions.
    pub fn answers_by_position(&self, question_count: usize) -> Vec<Option<String>> {
        let mut answers = vec![None; question_count];
        for (index, value) in &self.answers {
            if let Some(slot) = answers.get_mut(*index) {
                *slot = Some(value.clone());
            }
        }
        answers
    }
}

/// What a render should do beyond showing the questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenderAction {
    Show,
    Refresh,
    Submit,
}

async fn render_quiz(
    state: &AppState,
    session: &SessionId,
    form: &QuizForm,
    action: RenderAction,
) -> Response {
    let service = QuizService::new(state);
    let mut page = QuizPage {
        gated: state.config.is_gated(),
        count: state.config.default_count,
        ..QuizPage::default()
    };

    page.count = match service.resolve_count(form.count) {
        Ok(count) => count,
        Err(e) => {
            page.error = Some(e.to_string());
            return (e.status_code(), Html(page.render())).into_response();
        }
    };

    let (bank, options) = match service.filters(&form.selection()).await {
        Ok(loaded) => loaded,
        Err(e) => {
            page.error = Some(match &e {
                QuizError::SourceNotFound(path) => {
                    source_missing_message(&path.display().to_string())
                }
                other => other.to_string(),
            });
            return (e.status_code(), Html(page.render())).into_response();
        }
    };
    let current = service
        .current_questions(
            session.as_str(),
            &bank,
            &options,
            page.count,
            action == RenderAction::Refresh,
        )
        .await;
    page.options = Some(options);

    let render = match current {
        Ok(render) => render,
        Err(QuizError::NoMatchingQuestions) => {
            page.warning = Some(NO_MATCH_WARNING.to_string());
            return Html(page.render()).into_response();
        }
        Err(e) => {
            page.error = Some(e.to_string());
            return (e.status_code(), Html(page.render())).into_response();
        }
    };
    page.questions = render.questions;

    if action == RenderAction::Submit {
        let answers = form.answers_by_position(page.questions.len());
        match service.submit(session.as_str(), &answers).await {
            Ok(report) => page.report = Some(report),
            Err(e) => page.error = Some(e.to_string()),
        }
        page.selected = answers;
    }

    Html(page.render()).into_response()
}

/// GET / - the quiz page
pub async fn quiz_page(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionId>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let form = QuizForm::from_pairs(&pairs);
    render_quiz(&state, &session, &form, RenderAction::Show).await
}

/// POST /refresh - resample with the posted filters
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionId>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let form = QuizForm::from_pairs(&pairs);
    render_quiz(&state, &session, &form, RenderAction::Refresh).await
}

/// POST /submit - grade and show the results under the quiz
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionId>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let form = QuizForm::from_pairs(&pairs);
    render_quiz(&state, &session, &form, RenderAction::Submit).await
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginPageQuery {
    pub logged_out: Option<String>,
}

/// GET /login
pub async fn login_page(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionId>,
    Query(query): Query<LoginPageQuery>,
) -> Response {
    if !state.config.is_gated() || state.sessions.is_authenticated(session.as_str()).await {
        return Redirect::to("/").into_response();
    }

    let page = LoginPage {
        notice: query.logged_out.map(|_| LOGGED_OUT.to_string()),
        error: None,
    };
    Html(page.render()).into_response()
}

/// POST /login
pub async fn login_submit(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionId>,
    Form(form): Form<LoginForm>,
) -> Response {
    let service = AuthService::new(state.config.credentials.clone());
    if service.authenticate(&form.username, &form.password) {
        state
            .sessions
            .set_authenticated(session.as_str(), true)
            .await;
        tracing::info!("Session authenticated: {}", session.as_str());
        return Redirect::to("/").into_response();
    }

    let page = LoginPage {
        error: Some(LOGIN_FAILED.to_string()),
        notice: None,
    };
    (StatusCode::UNAUTHORIZED, Html(page.render())).into_response()
}

/// POST /logout
pub async fn logout_submit(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionId>,
) -> Response {
    state.sessions.logout(session.as_str()).await;
    if state.config.is_gated() {
        Redirect::to("/login?logged_out=1").into_response()
    } else {
        Redirect::to("/").into_response()
    }
}
