// src/engine/bank.rs

use crate::{
    error::QuizError,
    models::{question::QuestionSpec, quiz::Quiz},
    storage::QuizStore,
};

/// Read-through view of the quiz catalog.
pub struct QuestionBank<'a, S: QuizStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: QuizStore + ?Sized> QuestionBank<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Loads an active quiz. Inactive quizzes are reported as missing.
    pub async fn load_quiz(&self, quiz_id: i64) -> Result<Quiz, QuizError> {
        self.store
            .find_quiz(quiz_id)
            .await?
            .filter(|quiz| quiz.active)
            .ok_or_else(|| QuizError::NotFound(format!("quiz {}", quiz_id)))
    }

    pub async fn load_questions(&self, quiz_id: i64) -> Result<Vec<QuestionSpec>, QuizError> {
        let questions = self.store.list_questions(quiz_id).await?;
        if questions.is_empty() {
            return Err(QuizError::NotFound(format!("questions for quiz {}", quiz_id)));
        }
        Ok(questions)
    }

    pub async fn load_pool(&self, quiz_id: i64) -> Result<(Quiz, Vec<QuestionSpec>), QuizError> {
        let quiz = self.load_quiz(quiz_id).await?;
        let questions = self.load_questions(quiz_id).await?;
        Ok((quiz, questions))
    }
}
