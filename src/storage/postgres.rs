// src/storage/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{AttemptStore, QuizStore, StorageResult, UserStore};
use crate::{
    error::StorageError,
    models::{
        attempt::{AnswerRecord, AttemptResult, AttemptSummary, StoredAttempt},
        question::{NewQuestion, OptionLabel, QuestionSpec},
        quiz::{NewQuiz, Quiz},
        user::{NewUser, User},
    },
};

const QUESTION_COLUMNS: &str = "id, quiz_id, question_text, option_a, option_b, option_c, option_d, correct_option, points";

const SUMMARY_SELECT: &str = r#"
    SELECT
        a.id,
        a.user_id,
        u.username,
        a.quiz_id,
        q.title AS quiz_title,
        a.score,
        a.total,
        a.started_at,
        a.ended_at,
        a.duration_seconds
    FROM attempts a
    JOIN users u ON u.id = a.user_id
    JOIN quizzes q ON q.id = a.quiz_id
"#;

/// Row of the 'questions' table; options are stored one per column.
#[derive(FromRow)]
struct QuestionRow {
    id: i64,
    quiz_id: i64,
    question_text: String,
    option_a: String,
    option_b: String,
    option_c: String,
    option_d: String,
    correct_option: String,
    points: i32,
}

impl TryFrom<QuestionRow> for QuestionSpec {
    type Error = StorageError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        let correct_option = parse_label(&row.correct_option, row.id)?;
        Ok(QuestionSpec {
            id: row.id,
            quiz_id: row.quiz_id,
            text: row.question_text,
            options: [row.option_a, row.option_b, row.option_c, row.option_d],
            correct_option,
            points: row.points,
        })
    }
}

#[derive(FromRow)]
struct AttemptRow {
    id: i64,
    attempt_token: Uuid,
    user_id: i64,
    quiz_id: i64,
    score: i64,
    total: i64,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
    duration_seconds: i64,
}

#[derive(FromRow)]
struct AnswerRow {
    question_id: i64,
    chosen_option: Option<String>,
    is_correct: bool,
    points_awarded: i64,
}

fn parse_label(raw: &str, question_id: i64) -> Result<OptionLabel, StorageError> {
    raw.parse().map_err(|_| {
        StorageError::Backend(format!(
            "question {} has corrupt option label '{}'",
            question_id, raw
        ))
    })
}

/// PostgreSQL backend. Every call checks a connection out of the pool and
/// returns it when the call finishes.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Applies the embedded migrations in `./migrations`.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl QuizStore for PgStore {
    async fn find_quiz(&self, id: i64) -> StorageResult<Option<Quiz>> {
        let quiz = sqlx::query_as::<_, Quiz>(
            r#"
            SELECT id, title, question_count, time_limit_seconds, active, created_at
            FROM quizzes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(quiz)
    }

    async fn list_active_quizzes(&self) -> StorageResult<Vec<Quiz>> {
        let quizzes = sqlx::query_as::<_, Quiz>(
            r#"
            SELECT id, title, question_count, time_limit_seconds, active, created_at
            FROM quizzes
            WHERE active = TRUE
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(quizzes)
    }

    async fn count_quizzes(&self) -> StorageResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quizzes")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list_questions(&self, quiz_id: i64) -> StorageResult<Vec<QuestionSpec>> {
        let sql = format!(
            "SELECT {} FROM questions WHERE quiz_id = $1 ORDER BY id",
            QUESTION_COLUMNS
        );
        let rows = sqlx::query_as::<_, QuestionRow>(&sql)
            .bind(quiz_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(QuestionSpec::try_from).collect()
    }

    async fn create_quiz(&self, quiz: &NewQuiz) -> StorageResult<Quiz> {
        let created = sqlx::query_as::<_, Quiz>(
            r#"
            INSERT INTO quizzes (title, question_count, time_limit_seconds, active)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, question_count, time_limit_seconds, active, created_at
            "#,
        )
        .bind(&quiz.title)
        .bind(quiz.question_count)
        .bind(quiz.time_limit_seconds)
        .bind(quiz.active)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn create_question(&self, question: &NewQuestion) -> StorageResult<QuestionSpec> {
        let sql = format!(
            r#"
            INSERT INTO questions
                (quiz_id, question_text, option_a, option_b, option_c, option_d, correct_option, points)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            QUESTION_COLUMNS
        );
        let [a, b, c, d] = &question.options;
        let row = sqlx::query_as::<_, QuestionRow>(&sql)
            .bind(question.quiz_id)
            .bind(&question.text)
            .bind(a)
            .bind(b)
            .bind(c)
            .bind(d)
            .bind(question.correct_option.as_str())
            .bind(question.points)
            .fetch_one(&self.pool)
            .await?;

        QuestionSpec::try_from(row)
    }

    async fn delete_quiz(&self, id: i64) -> StorageResult<bool> {
        // questions and attempts go with it via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM quizzes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AttemptStore for PgStore {
    async fn insert_attempt(&self, result: &AttemptResult) -> StorageResult<i64> {
        // Rolled back on drop unless committed.
        let mut tx = self.pool.begin().await?;

        let inserted: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO attempts
                (attempt_token, user_id, quiz_id, score, total, started_at, ended_at, duration_seconds)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (attempt_token) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(result.attempt_token)
        .bind(result.user_id)
        .bind(result.quiz_id)
        .bind(result.score)
        .bind(result.total)
        .bind(result.started_at)
        .bind(result.ended_at)
        .bind(result.duration_seconds)
        .fetch_optional(&mut *tx)
        .await?;

        let attempt_id = match inserted {
            Some(id) => id,
            None => {
                let existing: i64 =
                    sqlx::query_scalar("SELECT id FROM attempts WHERE attempt_token = $1")
                        .bind(result.attempt_token)
                        .fetch_one(&mut *tx)
                        .await?;
                tx.commit().await?;
                tracing::warn!(
                    "Attempt {} was already stored as #{}",
                    result.attempt_token,
                    existing
                );
                return Ok(existing);
            }
        };

        if !result.answers.is_empty() {
            let mut query_builder = QueryBuilder::<Postgres>::new(
                "INSERT INTO attempt_answers
                    (attempt_id, position, question_id, chosen_option, is_correct, points_awarded) ",
            );
            query_builder.push_values(
                result.answers.iter().enumerate(),
                |mut row, (position, answer)| {
                    row.push_bind(attempt_id)
                        .push_bind(position as i32)
                        .push_bind(answer.question_id)
                        .push_bind(answer.chosen_option.map(OptionLabel::as_str))
                        .push_bind(answer.is_correct)
                        .push_bind(answer.points_awarded);
                },
            );
            query_builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(attempt_id)
    }

    async fn find_attempt(&self, id: i64) -> StorageResult<Option<StoredAttempt>> {
        // One snapshot for both reads, so a concurrent cascade delete cannot
        // leave the attempt without its answers.
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await?;

        let Some(row) = sqlx::query_as::<_, AttemptRow>(
            r#"
            SELECT id, attempt_token, user_id, quiz_id, score, total,
                   started_at, ended_at, duration_seconds
            FROM attempts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };

        let answer_rows = sqlx::query_as::<_, AnswerRow>(
            r#"
            SELECT question_id, chosen_option, is_correct, points_awarded
            FROM attempt_answers
            WHERE attempt_id = $1
            ORDER BY position
            "#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        let answers = answer_rows
            .into_iter()
            .map(|a| {
                let chosen_option = a
                    .chosen_option
                    .as_deref()
                    .map(|raw| parse_label(raw, a.question_id))
                    .transpose()?;
                Ok(AnswerRecord {
                    question_id: a.question_id,
                    chosen_option,
                    is_correct: a.is_correct,
                    points_awarded: a.points_awarded,
                })
            })
            .collect::<Result<Vec<_>, StorageError>>()?;

        Ok(Some(StoredAttempt {
            id: row.id,
            result: AttemptResult {
                attempt_token: row.attempt_token,
                user_id: row.user_id,
                quiz_id: row.quiz_id,
                score: row.score,
                total: row.total,
                started_at: row.started_at,
                ended_at: row.ended_at,
                duration_seconds: row.duration_seconds,
                answers,
            },
        }))
    }

    async fn list_attempts_for_user(&self, user_id: i64) -> StorageResult<Vec<AttemptSummary>> {
        let sql = format!(
            "{} WHERE a.user_id = $1 ORDER BY a.ended_at DESC, a.id DESC",
            SUMMARY_SELECT
        );
        let rows = sqlx::query_as::<_, AttemptSummary>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_attempts_for_quiz(&self, quiz_id: i64) -> StorageResult<Vec<AttemptSummary>> {
        let sql = format!(
            "{} WHERE a.quiz_id = $1 ORDER BY a.score DESC, a.duration_seconds ASC, a.id",
            SUMMARY_SELECT
        );
        let rows = sqlx::query_as::<_, AttemptSummary>(&sql)
            .bind(quiz_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, user: &NewUser) -> StorageResult<User> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password, full_name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, password, full_name, role, created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.password)
        .bind(&user.full_name)
        .bind(&user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match StorageError::from(e) {
            StorageError::Duplicate(_) => {
                StorageError::Duplicate(format!("Username '{}' already exists", user.username))
            }
            other => other,
        })?;

        Ok(created)
    }

    async fn find_user_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password, full_name, role, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}
