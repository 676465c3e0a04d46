// src/models/attempt.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::question::OptionLabel;

/// Per-question outcome of a scored attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: i64,
    /// `None` when the question was never answered.
    pub chosen_option: Option<OptionLabel>,
    pub is_correct: bool,
    pub points_awarded: i64,
}

/// The immutable scored summary of a finished attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptResult {
    /// Idempotency key; the storage backend stores each token at most once.
    pub attempt_token: Uuid,
    pub user_id: i64,
    pub quiz_id: i64,
    pub score: i64,
    pub total: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_seconds: i64,
    pub answers: Vec<AnswerRecord>,
}

impl AttemptResult {
    pub fn correct_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_correct).count()
    }

    pub fn answered_count(&self) -> usize {
        self.answers
            .iter()
            .filter(|a| a.chosen_option.is_some())
            .count()
    }
}

/// An `AttemptResult` as read back from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredAttempt {
    pub id: i64,
    #[serde(flatten)]
    pub result: AttemptResult,
}

/// Listing row joined from 'attempts', 'users' and 'quizzes'.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AttemptSummary {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub quiz_id: i64,
    pub quiz_title: String,
    pub score: i64,
    pub total: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_seconds: i64,
}

impl AttemptSummary {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.score as f64 / self.total as f64) * 100.0
    }
}

/// DTO for submitting one answer to a running attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    pub question_id: i64,
    /// Option label, `A`-`D`.
    pub option: String,
}
