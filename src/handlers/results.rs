// src/handlers/results.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::attempt::StoredAttempt,
    report,
    storage::SharedStore,
    utils::jwt::Claims,
};

/// Fetches a stored attempt visible to the caller: their own, or any for admins.
async fn visible_attempt(
    store: &SharedStore,
    claims: &Claims,
    id: i64,
) -> Result<StoredAttempt, AppError> {
    let user_id = claims.user_id()?;
    store
        .find_attempt(id)
        .await?
        .filter(|a| a.result.user_id == user_id || claims.is_admin())
        .ok_or_else(|| AppError::NotFound(format!("Result {} not found", id)))
}

/// Lists the caller's stored attempts, newest first.
pub async fn my_results(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let rows = store.list_attempts_for_user(user_id).await.map_err(|e| {
        tracing::error!("Failed to list results for user {}: {:?}", user_id, e);
        AppError::from(e)
    })?;

    Ok(Json(rows))
}

/// One stored attempt with its per-question answers.
pub async fn get_result(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = visible_attempt(&store, &claims, id).await?;
    Ok(Json(attempt))
}

/// Per-question CSV of one stored attempt.
pub async fn result_csv(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = visible_attempt(&store, &claims, id).await?;
    let body = report::answers_to_csv(&attempt)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"attempt-{}.csv\"", id),
            ),
        ],
        body,
    ))
}
