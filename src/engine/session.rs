// src/engine/session.rs

//! The timed attempt state machine.
//!
//! A session starts `Active` and ends in exactly one of two terminal states:
//! `Completed` (every question answered, or the examinee ended early) or
//! `TimedOut` (the time budget ran out first). There is no timer: every call takes
//! the caller's `now` and re-checks the deadline before doing anything else.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::QuizError,
    models::question::{OptionLabel, QuestionSpec},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    TimedOut,
    Completed,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionStatus::Active)
    }
}

#[derive(Debug, Clone)]
pub struct AttemptSession {
    token: Uuid,
    user_id: i64,
    quiz_id: i64,
    questions: Vec<QuestionSpec>,
    answers: HashMap<i64, OptionLabel>,
    cursor: usize,
    time_limit: TimeDelta,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    status: SessionStatus,
}

impl AttemptSession {
    /// Starts an attempt over an already selected, ordered question list.
    pub fn start(
        user_id: i64,
        quiz_id: i64,
        questions: Vec<QuestionSpec>,
        time_limit_seconds: i64,
        now: DateTime<Utc>,
    ) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }
        let time_limit = TimeDelta::try_seconds(time_limit_seconds)
            .filter(|limit| *limit > TimeDelta::zero())
            .ok_or(QuizError::InvalidTimeLimit(time_limit_seconds))?;

        Ok(Self {
            token: Uuid::new_v4(),
            user_id,
            quiz_id,
            questions,
            answers: HashMap::new(),
            cursor: 0,
            time_limit,
            started_at: now,
            ended_at: None,
            status: SessionStatus::Active,
        })
    }

    pub fn token(&self) -> Uuid {
        self.token
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn quiz_id(&self) -> i64 {
        self.quiz_id
    }

    pub fn questions(&self) -> &[QuestionSpec] {
        &self.questions
    }

    pub fn answer_for(&self, question_id: i64) -> Option<OptionLabel> {
        self.answers.get(&question_id).copied()
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn deadline(&self) -> DateTime<Utc> {
        self.started_at + self.time_limit
    }

    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        let elapsed = now - self.started_at;
        (self.time_limit - elapsed).num_seconds().max(0)
    }

    /// Times the session out if its deadline has passed. Never fails.
    pub fn expire_if_due(&mut self, now: DateTime<Utc>) -> SessionStatus {
        if self.status == SessionStatus::Active && now - self.started_at >= self.time_limit {
            self.status = SessionStatus::TimedOut;
            self.ended_at = Some(self.deadline());
            tracing::info!(
                "Attempt {} timed out with {}/{} answered",
                self.token,
                self.answers.len(),
                self.questions.len()
            );
        }
        self.status
    }

    /// Status gate shared by every mutating call.
    fn ensure_active(&mut self, now: DateTime<Utc>) -> Result<(), QuizError> {
        match self.status {
            SessionStatus::Completed => return Err(QuizError::SessionTerminal),
            SessionStatus::TimedOut => return Err(QuizError::TimeExpired),
            SessionStatus::Active => {}
        }
        match self.expire_if_due(now) {
            SessionStatus::Active => Ok(()),
            _ => Err(QuizError::TimeExpired),
        }
    }

    pub fn current_question(&mut self, now: DateTime<Utc>) -> Result<&QuestionSpec, QuizError> {
        self.ensure_active(now)?;
        self.questions
            .get(self.cursor)
            .ok_or(QuizError::SessionTerminal)
    }

    /// Records the first and final answer for `question_id`.
    pub fn submit_answer(
        &mut self,
        question_id: i64,
        chosen_option: &str,
        now: DateTime<Utc>,
    ) -> Result<(), QuizError> {
        self.ensure_active(now)?;

        let chosen: OptionLabel = chosen_option.parse()?;
        if !self.questions.iter().any(|q| q.id == question_id) {
            return Err(QuizError::UnknownQuestion(question_id));
        }
        if self.answers.contains_key(&question_id) {
            return Err(QuizError::AlreadyAnswered(question_id));
        }

        self.answers.insert(question_id, chosen);
        while self
            .questions
            .get(self.cursor)
            .is_some_and(|q| self.answers.contains_key(&q.id))
        {
            self.cursor += 1;
        }

        if self.cursor == self.questions.len() {
            self.status = SessionStatus::Completed;
            self.ended_at = Some(now);
            tracing::info!("Attempt {} completed, all questions answered", self.token);
        }
        Ok(())
    }

    /// Examinee-initiated early submission.
    pub fn end_now(&mut self, now: DateTime<Utc>) -> Result<(), QuizError> {
        if self.status.is_terminal() {
            return Err(QuizError::SessionTerminal);
        }
        if self.expire_if_due(now).is_terminal() {
            return Err(QuizError::TimeExpired);
        }
        self.status = SessionStatus::Completed;
        self.ended_at = Some(now);
        tracing::info!(
            "Attempt {} ended early with {}/{} answered",
            self.token,
            self.answers.len(),
            self.questions.len()
        );
        Ok(())
    }
}
