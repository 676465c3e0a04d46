// src/handlers/attempt.rs

//! Endpoints that drive a running attempt.
//!
//! Every call reads the wall clock once and hands it to the engine, which decides
//! whether the attempt is still within its time limit.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    engine::{self, AttemptSession, SessionStatus},
    error::AppError,
    models::{attempt::SubmitAnswerRequest, question::PublicQuestion},
    sessions::SessionRegistry,
    storage::SharedStore,
    utils::jwt::Claims,
};

/// Client-facing snapshot of a live attempt.
#[derive(Debug, Serialize)]
pub struct AttemptView {
    pub attempt_token: Uuid,
    pub quiz_id: i64,
    pub status: SessionStatus,
    pub cursor: usize,
    pub answered: usize,
    pub total_questions: usize,
    pub remaining_seconds: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl AttemptView {
    pub fn of(session: &AttemptSession, now: DateTime<Utc>) -> Self {
        Self {
            attempt_token: session.token(),
            quiz_id: session.quiz_id(),
            status: session.status(),
            cursor: session.cursor(),
            answered: session.answered_count(),
            total_questions: session.questions().len(),
            remaining_seconds: session.remaining_seconds(now),
            started_at: session.started_at(),
            ended_at: session.ended_at(),
        }
    }
}

/// Returns the attempt status. Also applies the deadline, so a stale attempt
/// reports `timed_out` here.
pub async fn get_attempt(
    State(sessions): State<Arc<SessionRegistry>>,
    Extension(claims): Extension<Claims>,
    Path(token): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let now = Utc::now();

    let view = sessions.with_session(token, user_id, |s| {
        s.expire_if_due(now);
        Ok(AttemptView::of(s, now))
    })?;

    Ok(Json(view))
}

/// Returns the question under the cursor, without its answer key.
pub async fn current_question(
    State(sessions): State<Arc<SessionRegistry>>,
    Extension(claims): Extension<Claims>,
    Path(token): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let now = Utc::now();

    let body = sessions.with_session(token, user_id, |s| {
        let position = s.cursor() + 1;
        let total = s.questions().len();
        let remaining = s.remaining_seconds(now);
        let question = PublicQuestion::from(s.current_question(now)?);
        Ok(json!({
            "position": position,
            "total_questions": total,
            "remaining_seconds": remaining,
            "question": question,
        }))
    })?;

    Ok(Json(body))
}

/// Records an answer. The first answer to a question is final.
pub async fn submit_answer(
    State(sessions): State<Arc<SessionRegistry>>,
    Extension(claims): Extension<Claims>,
    Path(token): Path<Uuid>,
    Json(req): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let now = Utc::now();

    let view = sessions.with_session(token, user_id, |s| {
        s.submit_answer(req.question_id, &req.option, now)?;
        Ok(AttemptView::of(s, now))
    })?;

    Ok(Json(view))
}

/// Ends the attempt early; unanswered questions score zero.
pub async fn end_attempt(
    State(sessions): State<Arc<SessionRegistry>>,
    Extension(claims): Extension<Claims>,
    Path(token): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let now = Utc::now();

    let view = sessions.with_session(token, user_id, |s| {
        s.end_now(now)?;
        Ok(AttemptView::of(s, now))
    })?;

    Ok(Json(view))
}

/// Scores and stores a finished attempt.
///
/// * Times the attempt out first if its deadline has passed.
/// * Fails with 409 while the attempt is still running.
/// * The live session is dropped only once the record is stored; a retry after a
///   storage failure reuses the same attempt token and cannot duplicate it.
pub async fn submit_attempt(
    State(store): State<SharedStore>,
    State(sessions): State<Arc<SessionRegistry>>,
    Extension(claims): Extension<Claims>,
    Path(token): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let now = Utc::now();

    let mut session = sessions.snapshot(token, user_id)?;
    let (attempt_id, result) = engine::finish_attempt(store.as_ref(), &mut session, now).await?;
    sessions.remove(token)?;

    Ok(Json(json!({
        "attempt_id": attempt_id,
        "status": session.status(),
        "correct_count": result.correct_count(),
        "result": result,
    })))
}
