// src/engine/scorer.rs

use crate::{
    engine::session::AttemptSession,
    error::QuizError,
    models::attempt::{AnswerRecord, AttemptResult},
};

/// Scores a finished attempt.
///
/// Unanswered questions count towards `total` and award nothing. Pure: calling it
/// again on the same session yields an identical result.
pub fn score(session: &AttemptSession) -> Result<AttemptResult, QuizError> {
    let ended_at = match (session.status().is_terminal(), session.ended_at()) {
        (true, Some(ended_at)) => ended_at,
        _ => return Err(QuizError::NotTerminal),
    };

    let mut total_score = 0;
    let mut total_possible = 0;
    let mut answers = Vec::with_capacity(session.questions().len());

    for question in session.questions() {
        let points = i64::from(question.points);
        total_possible += points;

        let chosen_option = session.answer_for(question.id);
        let is_correct = chosen_option.is_some_and(|chosen| question.is_correct(chosen));
        let points_awarded = if is_correct { points } else { 0 };
        total_score += points_awarded;

        answers.push(AnswerRecord {
            question_id: question.id,
            chosen_option,
            is_correct,
            points_awarded,
        });
    }

    Ok(AttemptResult {
        attempt_token: session.token(),
        user_id: session.user_id(),
        quiz_id: session.quiz_id(),
        score: total_score,
        total: total_possible,
        started_at: session.started_at(),
        ended_at,
        duration_seconds: (ended_at - session.started_at()).num_seconds(),
        answers,
    })
}
