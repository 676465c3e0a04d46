// src/sweeper.rs

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::{engine, error::AppError, state::AppState};

/// Persists attempts that ended (or ran out of time) but were never submitted.
///
/// Returns how many attempts were stored. A session whose write fails stays
/// registered and is retried on the next pass under the same attempt token,
/// unless its quiz is gone, in which case it is dropped.
pub async fn sweep_once(state: &AppState, now: DateTime<Utc>) -> Result<usize, AppError> {
    let grace = TimeDelta::try_seconds(state.config.session_grace_seconds)
        .unwrap_or(TimeDelta::zero());
    let abandoned = state.sessions.collect_abandoned(now, grace)?;

    let mut stored = 0;
    for mut session in abandoned {
        let token = session.token();
        match engine::finish_attempt(state.store.as_ref(), &mut session, now).await {
            Ok((attempt_id, _)) => {
                tracing::warn!(
                    "Stored abandoned attempt {} as #{} (user {})",
                    token,
                    attempt_id,
                    session.user_id()
                );
                state.sessions.remove(token)?;
                stored += 1;
            }
            Err(e) => {
                if state.store.find_quiz(session.quiz_id()).await?.is_none() {
                    tracing::warn!(
                        "Dropping abandoned attempt {}: quiz {} no longer exists",
                        token,
                        session.quiz_id()
                    );
                    state.sessions.remove(token)?;
                } else {
                    tracing::error!("Failed to store abandoned attempt {}: {}", token, e);
                }
            }
        }
    }
    Ok(stored)
}

/// Runs [`sweep_once`] every `interval` until the task is dropped.
pub async fn run(state: AppState, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if let Err(e) = sweep_once(&state, Utc::now()).await {
            tracing::error!("Session sweep failed: {}", e);
        }
    }
}
