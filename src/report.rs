// src/report.rs

//! CSV export of stored attempts.

use thiserror::Error;

use crate::models::attempt::{AttemptSummary, StoredAttempt};

pub const UNANSWERED: &str = "UNANSWERED";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("csv buffer error: {0}")]
    Buffer(String),
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, ReportError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| ReportError::Buffer(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ReportError::Buffer(e.to_string()))
}

/// One row per attempt, best score first as listed.
pub fn attempts_to_csv(rows: &[AttemptSummary]) -> Result<String, ReportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "attempt_id",
        "username",
        "quiz_title",
        "score",
        "total",
        "percentage",
        "started_at",
        "ended_at",
        "duration_seconds",
    ])?;

    for row in rows {
        writer.write_record([
            row.id.to_string(),
            row.username.clone(),
            row.quiz_title.clone(),
            row.score.to_string(),
            row.total.to_string(),
            format!("{:.1}", row.percentage()),
            row.started_at.to_rfc3339(),
            row.ended_at.to_rfc3339(),
            row.duration_seconds.to_string(),
        ])?;
    }

    finish(writer)
}

/// Per-question detail of a single attempt, in the order the questions were asked.
pub fn answers_to_csv(attempt: &StoredAttempt) -> Result<String, ReportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "attempt_id",
        "position",
        "question_id",
        "chosen_option",
        "is_correct",
        "points_awarded",
    ])?;

    for (position, answer) in attempt.result.answers.iter().enumerate() {
        writer.write_record([
            attempt.id.to_string(),
            (position + 1).to_string(),
            answer.question_id.to_string(),
            answer
                .chosen_option
                .map_or(UNANSWERED.to_string(), |o| o.to_string()),
            answer.is_correct.to_string(),
            answer.points_awarded.to_string(),
        ])?;
    }

    finish(writer)
}
