// src/storage/mod.rs

//! Storage backend contract.
//!
//! The engine reads quizzes and questions through [`QuizStore`] and writes finished
//! attempts through [`AttemptStore`]. The HTTP layer additionally needs [`UserStore`]
//! for the identity provider. Both backends enforce the same integrity rules:
//! deleting a quiz removes its questions and attempts, and an attempt plus its
//! answers become visible together or not at all.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::StorageError,
    models::{
        attempt::{AttemptResult, AttemptSummary, StoredAttempt},
        question::{NewQuestion, QuestionSpec},
        quiz::{NewQuiz, Quiz},
        user::{NewUser, User},
    },
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait QuizStore: Send + Sync {
    async fn find_quiz(&self, id: i64) -> StorageResult<Option<Quiz>>;
    async fn list_active_quizzes(&self) -> StorageResult<Vec<Quiz>>;
    async fn count_quizzes(&self) -> StorageResult<i64>;
    /// Questions of a quiz ordered by id.
    async fn list_questions(&self, quiz_id: i64) -> StorageResult<Vec<QuestionSpec>>;
    async fn create_quiz(&self, quiz: &NewQuiz) -> StorageResult<Quiz>;
    async fn create_question(&self, question: &NewQuestion) -> StorageResult<QuestionSpec>;
    /// Returns `false` when no quiz had that id.
    async fn delete_quiz(&self, id: i64) -> StorageResult<bool>;
}

#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Atomically stores an attempt with all its answers.
    ///
    /// Storing a token that already exists returns the existing id without writing.
    async fn insert_attempt(&self, result: &AttemptResult) -> StorageResult<i64>;
    async fn find_attempt(&self, id: i64) -> StorageResult<Option<StoredAttempt>>;
    async fn list_attempts_for_user(&self, user_id: i64) -> StorageResult<Vec<AttemptSummary>>;
    async fn list_attempts_for_quiz(&self, quiz_id: i64) -> StorageResult<Vec<AttemptSummary>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `StorageError::Duplicate` when the username is taken.
    async fn create_user(&self, user: &NewUser) -> StorageResult<User>;
    async fn find_user_by_username(&self, username: &str) -> StorageResult<Option<User>>;
}

/// Everything the application needs from a backend.
pub trait Storage: QuizStore + AttemptStore + UserStore {}

impl<T: QuizStore + AttemptStore + UserStore> Storage for T {}

pub type SharedStore = Arc<dyn Storage>;
