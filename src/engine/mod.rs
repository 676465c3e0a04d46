// src/engine/mod.rs

//! Quiz attempt engine: selection, the timed session, scoring and recording.
//!
//! Nothing in here reads the wall clock or a global random source; callers pass
//! both in.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::{
    error::QuizError,
    models::attempt::AttemptResult,
    storage::{AttemptStore, QuizStore},
};

pub mod bank;
pub mod recorder;
pub mod scorer;
pub mod selector;
pub mod session;

pub use bank::QuestionBank;
pub use recorder::AttemptRecorder;
pub use session::{AttemptSession, SessionStatus};

/// Loads a quiz, draws its questions and starts the clock.
pub async fn start_attempt<S, R>(
    store: &S,
    user_id: i64,
    quiz_id: i64,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Result<AttemptSession, QuizError>
where
    S: QuizStore + ?Sized,
    R: Rng + ?Sized,
{
    let (quiz, pool) = QuestionBank::new(store).load_pool(quiz_id).await?;
    let count = usize::try_from(quiz.question_count)
        .map_err(|_| QuizError::InvalidQuestionCount(quiz.question_count))?;
    let questions = selector::select(&pool, count, rng)?;

    let session = AttemptSession::start(
        user_id,
        quiz.id,
        questions,
        i64::from(quiz.time_limit_seconds),
        now,
    )?;
    tracing::info!(
        "User {} started attempt {} on quiz {} ({} questions, {}s)",
        user_id,
        session.token(),
        quiz.id,
        count,
        quiz.time_limit_seconds
    );
    Ok(session)
}

/// Scores a session and persists the result, timing it out first if its deadline passed.
///
/// Fails with `NotTerminal` while the session is still running.
pub async fn finish_attempt<S>(
    store: &S,
    session: &mut AttemptSession,
    now: DateTime<Utc>,
) -> Result<(i64, AttemptResult), QuizError>
where
    S: AttemptStore + ?Sized,
{
    session.expire_if_due(now);
    let result = scorer::score(session)?;
    let attempt_id = AttemptRecorder::new(store).persist(&result).await?;
    Ok((attempt_id, result))
}
