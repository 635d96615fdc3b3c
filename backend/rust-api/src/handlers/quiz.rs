use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use axum_extra::extract::Query;
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    extractors::AppJson,
    middlewares::session::SessionId,
    models::{answer::SubmitAnswersRequest, filter::FilterSelection, StartQuizRequest},
    services::{quiz_service::QuizService, AppState},
};

/// Repeated query parameters; an absent dimension selects everything.
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    #[serde(default)]
    pub chapter: Vec<String>,
    #[serde(default)]
    pub sub_topic: Vec<String>,
    #[serde(default)]
    pub topic: Vec<String>,
    #[serde(default)]
    pub session: Vec<String>,
}

impl FilterQuery {
    pub fn selection(self) -> FilterSelection {
        let non_empty = |values: Vec<String>| (!values.is_empty()).then_some(values);
        FilterSelection {
            chapters: non_empty(self.chapter),
            sub_topics: non_empty(self.sub_topic),
            topics: non_empty(self.topic),
            sessions: non_empty(self.session),
        }
    }
}

/// GET /api/v1/quiz/filters - cascaded filter candidates
pub async fn get_filters(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let service = QuizService::new(&state);
    let (_, options) = service
        .filters(&query.selection())
        .await
        .map_err(|e| e.into_http())?;
    Ok(Json(options))
}

/// POST /api/v1/quiz - current question set for the given filters
pub async fn start_quiz(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionId>,
    AppJson(req): AppJson<StartQuizRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    tracing::info!(
        "Quiz requested: session={}, count={:?}, refresh={}",
        session.as_str(),
        req.count,
        req.refresh
    );

    let service = QuizService::new(&state);
    match service.start_quiz(session.as_str(), &req).await {
        Ok(response) => Ok((StatusCode::OK, Json(response))),
        Err(e) => {
            tracing::warn!("Failed to build quiz: {}", e);
            Err(e.into_http())
        }
    }
}

/// POST /api/v1/quiz/refresh - drop the active question set
pub async fn refresh_quiz(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionId>,
) -> impl IntoResponse {
    QuizService::new(&state).refresh(session.as_str()).await;
    StatusCode::NO_CONTENT
}

/// GET /api/v1/quiz/questions/{index}/hint
pub async fn get_hint(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionId>,
    Path(index): Path<usize>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let service = QuizService::new(&state);
    let hint = service
        .hint(session.as_str(), index)
        .await
        .map_err(|e| e.into_http())?;
    Ok(Json(hint))
}

/// POST /api/v1/quiz/submit - grade the active question set
pub async fn submit_answers(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionId>,
    AppJson(req): AppJson<SubmitAnswersRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    tracing::info!("Submitting answers for session: {}", session.as_str());

    let service = QuizService::new(&state);
    match service.submit(session.as_str(), &req.answers).await {
        Ok(report) => Ok((StatusCode::OK, Json(report))),
        Err(e) => {
            tracing::warn!("Failed to grade answers: {}", e);
            Err(e.into_http())
        }
    }
}
