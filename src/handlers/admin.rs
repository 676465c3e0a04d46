// src/handlers/admin.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        question::{CreateQuestionRequest, NewQuestion, OptionLabel},
        quiz::{CreateQuizRequest, NewQuiz},
    },
    report,
    sessions::SessionRegistry,
    storage::SharedStore,
    utils::html::clean_html,
};

/// Creates a quiz.
/// Admin only.
pub async fn create_quiz(
    State(store): State<SharedStore>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut new_quiz = NewQuiz::from(payload);
    new_quiz.title = clean_html(&new_quiz.title);

    let quiz = store.create_quiz(&new_quiz).await.map_err(|e| {
        tracing::error!("Failed to create quiz: {:?}", e);
        AppError::from(e)
    })?;

    tracing::info!("Created quiz #{} '{}'", quiz.id, quiz.title);
    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Deletes a quiz together with its questions and every stored attempt on it.
/// Live attempts on the quiz are dropped as well.
/// Admin only.
pub async fn delete_quiz(
    State(store): State<SharedStore>,
    State(sessions): State<Arc<SessionRegistry>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !store.delete_quiz(id).await? {
        return Err(AppError::NotFound(format!("Quiz {} not found", id)));
    }

    let dropped = sessions.discard_quiz(id)?;
    tracing::info!("Deleted quiz #{} ({} live attempts dropped)", id, dropped);
    Ok(StatusCode::NO_CONTENT)
}

/// Adds a question to a quiz's pool.
/// Admin only.
pub async fn add_question(
    State(store): State<SharedStore>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if store.find_quiz(quiz_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Quiz {} not found", quiz_id)));
    }

    let correct_option: OptionLabel = payload.correct_option.parse()?;
    let options: [String; 4] = payload
        .options
        .iter()
        .map(|o| clean_html(o))
        .collect::<Vec<_>>()
        .try_into()
        .map_err(|_| AppError::BadRequest("Exactly four options are required".to_string()))?;

    let question = store
        .create_question(&NewQuestion {
            quiz_id,
            text: clean_html(&payload.text),
            options,
            correct_option,
            points: payload.points.unwrap_or(1),
        })
        .await
        .map_err(|e| {
            tracing::error!("Failed to add question to quiz {}: {:?}", quiz_id, e);
            AppError::from(e)
        })?;

    Ok((StatusCode::CREATED, Json(question)))
}

/// All stored attempts of a quiz, best score first.
/// Admin only.
pub async fn quiz_results(
    State(store): State<SharedStore>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let rows = store.list_attempts_for_quiz(quiz_id).await?;
    Ok(Json(rows))
}

/// CSV export of a quiz's stored attempts.
/// Admin only.
pub async fn quiz_report_csv(
    State(store): State<SharedStore>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if store.find_quiz(quiz_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Quiz {} not found", quiz_id)));
    }

    let rows = store.list_attempts_for_quiz(quiz_id).await?;
    let body = report::attempts_to_csv(&rows)?;
    tracing::info!("Exported {} attempts of quiz #{}", rows.len(), quiz_id);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"quiz-{}-results.csv\"", quiz_id),
            ),
        ],
        body,
    ))
}
