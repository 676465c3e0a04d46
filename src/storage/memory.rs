// src/storage/memory.rs

use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::Utc;

use super::{AttemptStore, QuizStore, StorageResult, UserStore};
use crate::{
    error::StorageError,
    models::{
        attempt::{AttemptResult, AttemptSummary, StoredAttempt},
        question::{NewQuestion, QuestionSpec},
        quiz::{NewQuiz, Quiz},
        user::{NewUser, User},
    },
};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<i64, User>,
    quizzes: BTreeMap<i64, Quiz>,
    questions: BTreeMap<i64, QuestionSpec>,
    attempts: BTreeMap<i64, AttemptResult>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn summary(&self, id: i64, result: &AttemptResult) -> AttemptSummary {
        AttemptSummary {
            id,
            user_id: result.user_id,
            username: self
                .users
                .get(&result.user_id)
                .map(|u| u.username.clone())
                .unwrap_or_default(),
            quiz_id: result.quiz_id,
            quiz_title: self
                .quizzes
                .get(&result.quiz_id)
                .map(|q| q.title.clone())
                .unwrap_or_default(),
            score: result.score,
            total: result.total,
            started_at: result.started_at,
            ended_at: result.ended_at,
            duration_seconds: result.duration_seconds,
        }
    }
}

/// In-process backend holding every table behind one mutex.
///
/// Each trait call takes the lock once, so multi-row writes are atomic. Foreign keys
/// are checked the way the SQL schema checks them.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StorageError::Backend("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl QuizStore for MemoryStore {
    async fn find_quiz(&self, id: i64) -> StorageResult<Option<Quiz>> {
        Ok(self.lock()?.quizzes.get(&id).cloned())
    }

    async fn list_active_quizzes(&self) -> StorageResult<Vec<Quiz>> {
        Ok(self
            .lock()?
            .quizzes
            .values()
            .filter(|q| q.active)
            .cloned()
            .collect())
    }

    async fn count_quizzes(&self) -> StorageResult<i64> {
        Ok(self.lock()?.quizzes.len() as i64)
    }

    async fn list_questions(&self, quiz_id: i64) -> StorageResult<Vec<QuestionSpec>> {
        Ok(self
            .lock()?
            .questions
            .values()
            .filter(|q| q.quiz_id == quiz_id)
            .cloned()
            .collect())
    }

    async fn create_quiz(&self, quiz: &NewQuiz) -> StorageResult<Quiz> {
        let mut tables = self.lock()?;
        let id = tables.allocate_id();
        let created = Quiz {
            id,
            title: quiz.title.clone(),
            question_count: quiz.question_count,
            time_limit_seconds: quiz.time_limit_seconds,
            active: quiz.active,
            created_at: Some(Utc::now()),
        };
        tables.quizzes.insert(id, created.clone());
        Ok(created)
    }

    async fn create_question(&self, question: &NewQuestion) -> StorageResult<QuestionSpec> {
        let mut tables = self.lock()?;
        if !tables.quizzes.contains_key(&question.quiz_id) {
            return Err(StorageError::Backend(format!(
                "question references missing quiz {}",
                question.quiz_id
            )));
        }
        let id = tables.allocate_id();
        let created = QuestionSpec {
            id,
            quiz_id: question.quiz_id,
            text: question.text.clone(),
            options: question.options.clone(),
            correct_option: question.correct_option,
            points: question.points,
        };
        tables.questions.insert(id, created.clone());
        Ok(created)
    }

    async fn delete_quiz(&self, id: i64) -> StorageResult<bool> {
        let mut tables = self.lock()?;
        if tables.quizzes.remove(&id).is_none() {
            return Ok(false);
        }
        tables.questions.retain(|_, q| q.quiz_id != id);
        tables.attempts.retain(|_, a| a.quiz_id != id);
        Ok(true)
    }
}

#[async_trait]
impl AttemptStore for MemoryStore {
    async fn insert_attempt(&self, result: &AttemptResult) -> StorageResult<i64> {
        let mut tables = self.lock()?;

        if let Some((&id, _)) = tables
            .attempts
            .iter()
            .find(|(_, a)| a.attempt_token == result.attempt_token)
        {
            return Ok(id);
        }

        // Validate every reference before writing anything.
        if !tables.users.contains_key(&result.user_id) {
            return Err(StorageError::Backend(format!(
                "attempt references missing user {}",
                result.user_id
            )));
        }
        if !tables.quizzes.contains_key(&result.quiz_id) {
            return Err(StorageError::Backend(format!(
                "attempt references missing quiz {}",
                result.quiz_id
            )));
        }
        if let Some(missing) = result
            .answers
            .iter()
            .find(|a| !tables.questions.contains_key(&a.question_id))
        {
            return Err(StorageError::Backend(format!(
                "answer references missing question {}",
                missing.question_id
            )));
        }

        let id = tables.allocate_id();
        tables.attempts.insert(id, result.clone());
        Ok(id)
    }

    async fn find_attempt(&self, id: i64) -> StorageResult<Option<StoredAttempt>> {
        Ok(self.lock()?.attempts.get(&id).map(|result| StoredAttempt {
            id,
            result: result.clone(),
        }))
    }

    async fn list_attempts_for_user(&self, user_id: i64) -> StorageResult<Vec<AttemptSummary>> {
        let tables = self.lock()?;
        let mut rows: Vec<AttemptSummary> = tables
            .attempts
            .iter()
            .filter(|(_, a)| a.user_id == user_id)
            .map(|(&id, a)| tables.summary(id, a))
            .collect();
        rows.sort_by(|a, b| b.ended_at.cmp(&a.ended_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn list_attempts_for_quiz(&self, quiz_id: i64) -> StorageResult<Vec<AttemptSummary>> {
        let tables = self.lock()?;
        let mut rows: Vec<AttemptSummary> = tables
            .attempts
            .iter()
            .filter(|(_, a)| a.quiz_id == quiz_id)
            .map(|(&id, a)| tables.summary(id, a))
            .collect();
        rows.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then(a.duration_seconds.cmp(&b.duration_seconds))
                .then(a.id.cmp(&b.id))
        });
        Ok(rows)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: &NewUser) -> StorageResult<User> {
        let mut tables = self.lock()?;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(StorageError::Duplicate(format!(
                "Username '{}' already exists",
                user.username
            )));
        }
        let id = tables.allocate_id();
        let created = User {
            id,
            username: user.username.clone(),
            password: user.password.clone(),
            full_name: user.full_name.clone(),
            role: user.role.clone(),
            created_at: Some(Utc::now()),
        };
        tables.users.insert(id, created.clone());
        Ok(created)
    }

    async fn find_user_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::OptionLabel;

    fn new_quiz() -> NewQuiz {
        NewQuiz {
            title: "Rust Basics".into(),
            question_count: 1,
            time_limit_seconds: 60,
            active: true,
        }
    }

    #[tokio::test]
    async fn test_delete_quiz_cascades_to_questions() {
        let store = MemoryStore::new();
        let quiz = store.create_quiz(&new_quiz()).await.unwrap();
        store
            .create_question(&NewQuestion {
                quiz_id: quiz.id,
                text: "Q".into(),
                options: ["a".into(), "b".into(), "c".into(), "d".into()],
                correct_option: OptionLabel::B,
                points: 1,
            })
            .await
            .unwrap();

        assert!(store.delete_quiz(quiz.id).await.unwrap());
        assert!(store.list_questions(quiz.id).await.unwrap().is_empty());
        assert!(!store.delete_quiz(quiz.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let store = MemoryStore::new();
        let user = NewUser {
            username: "demo".into(),
            password: "hash".into(),
            full_name: "Demo User".into(),
            role: "user".into(),
        };
        store.create_user(&user).await.unwrap();
        let err = store.create_user(&user).await.unwrap_err();
        assert!(matches!(err, StorageError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_question_requires_existing_quiz() {
        let store = MemoryStore::new();
        let err = store
            .create_question(&NewQuestion {
                quiz_id: 42,
                text: "Q".into(),
                options: ["a".into(), "b".into(), "c".into(), "d".into()],
                correct_option: OptionLabel::A,
                points: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Backend(_)));
    }
}
