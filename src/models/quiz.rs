// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,

    pub title: String,

    /// How many questions each attempt draws from the pool.
    pub question_count: i32,

    pub time_limit_seconds: i32,

    /// Inactive quizzes cannot be started.
    pub active: bool,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Insert payload for a quiz, already validated.
#[derive(Debug, Clone)]
pub struct NewQuiz {
    pub title: String,
    pub question_count: i32,
    pub time_limit_seconds: i32,
    pub active: bool,
}

/// DTO for creating a new quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(range(min = 1, max = 500))]
    pub question_count: i32,
    #[validate(range(min = 1, max = 86400))]
    pub time_limit_seconds: i32,
    pub active: Option<bool>,
}

impl From<CreateQuizRequest> for NewQuiz {
    fn from(req: CreateQuizRequest) -> Self {
        NewQuiz {
            title: req.title.trim().to_string(),
            question_count: req.question_count,
            time_limit_seconds: req.time_limit_seconds,
            active: req.active.unwrap_or(true),
        }
    }
}
