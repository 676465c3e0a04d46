// src/engine/recorder.rs

use crate::{error::QuizError, models::attempt::AttemptResult, storage::AttemptStore};

/// Writes scored attempts to the storage backend.
///
/// No retries happen here; the backend deduplicates by attempt token, so a caller
/// that does retry cannot create a second record.
pub struct AttemptRecorder<'a, S: AttemptStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: AttemptStore + ?Sized> AttemptRecorder<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn persist(&self, result: &AttemptResult) -> Result<i64, QuizError> {
        check_consistency(result)?;

        match self.store.insert_attempt(result).await {
            Ok(attempt_id) => {
                tracing::info!(
                    "Stored attempt {} as #{} (user {}, quiz {}, {}/{})",
                    result.attempt_token,
                    attempt_id,
                    result.user_id,
                    result.quiz_id,
                    result.score,
                    result.total
                );
                Ok(attempt_id)
            }
            Err(e) => {
                tracing::error!("Failed to store attempt {}: {:?}", result.attempt_token, e);
                Err(e.into())
            }
        }
    }
}

fn check_consistency(result: &AttemptResult) -> Result<(), QuizError> {
    if result.answers.is_empty() {
        return Err(QuizError::InvalidResult("no answer records".to_string()));
    }
    if result.score < 0 || result.score > result.total {
        return Err(QuizError::InvalidResult(format!(
            "score {} outside 0..={}",
            result.score, result.total
        )));
    }
    let awarded: i64 = result.answers.iter().map(|a| a.points_awarded).sum();
    if awarded != result.score {
        return Err(QuizError::InvalidResult(format!(
            "answer points sum to {} but score is {}",
            awarded, result.score
        )));
    }
    if result.ended_at < result.started_at {
        return Err(QuizError::InvalidResult("ended before it started".to_string()));
    }
    Ok(())
}
