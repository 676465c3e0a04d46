// src/sessions.rs

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use crate::{
    engine::AttemptSession,
    error::{AppError, QuizError},
};

/// Live attempts keyed by attempt token.
///
/// The lock is only ever held for a synchronous engine call, never across an `.await`.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<Uuid, AttemptSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Uuid, AttemptSession>>, AppError> {
        self.sessions
            .lock()
            .map_err(|_| AppError::InternalServerError("session registry poisoned".to_string()))
    }

    pub fn insert(&self, session: AttemptSession) -> Result<Uuid, AppError> {
        let token = session.token();
        self.lock()?.insert(token, session);
        Ok(token)
    }

    pub fn len(&self) -> Result<usize, AppError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, AppError> {
        Ok(self.lock()?.is_empty())
    }

    /// Runs `f` against the session if it belongs to `user_id`.
    ///
    /// Someone else's token is reported exactly like an unknown one.
    pub fn with_session<T>(
        &self,
        token: Uuid,
        user_id: i64,
        f: impl FnOnce(&mut AttemptSession) -> Result<T, QuizError>,
    ) -> Result<T, AppError> {
        let mut sessions = self.lock()?;
        let session = sessions
            .get_mut(&token)
            .filter(|s| s.user_id() == user_id)
            .ok_or_else(|| AppError::NotFound(format!("Attempt {} not found", token)))?;
        Ok(f(session)?)
    }

    /// Copies a session out so it can be scored and persisted without holding the lock.
    pub fn snapshot(&self, token: Uuid, user_id: i64) -> Result<AttemptSession, AppError> {
        self.with_session(token, user_id, |s| Ok(s.clone()))
    }

    pub fn remove(&self, token: Uuid) -> Result<Option<AttemptSession>, AppError> {
        Ok(self.lock()?.remove(&token))
    }

    /// Drops every live attempt on `quiz_id`. Returns how many were dropped.
    ///
    /// Called once the quiz is deleted: such attempts can no longer be stored.
    pub fn discard_quiz(&self, quiz_id: i64) -> Result<usize, AppError> {
        let mut sessions = self.lock()?;
        let before = sessions.len();
        sessions.retain(|_, s| s.quiz_id() != quiz_id);
        Ok(before - sessions.len())
    }

    /// Returns copies of sessions nobody submitted within `grace` of their end
    /// (or of their deadline, while still running), timing out the running ones.
    /// They stay registered until persisted.
    pub fn collect_abandoned(
        &self,
        now: DateTime<Utc>,
        grace: TimeDelta,
    ) -> Result<Vec<AttemptSession>, AppError> {
        let mut sessions = self.lock()?;
        let abandoned = sessions
            .values_mut()
            .filter(|s| now - s.ended_at().unwrap_or_else(|| s.deadline()) >= grace)
            .map(|s| {
                s.expire_if_due(now);
                s.clone()
            })
            .collect();
        Ok(abandoned)
    }
}
