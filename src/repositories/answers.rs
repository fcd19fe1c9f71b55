use sqlx::{PgConnection, PgPool};
use time::PrimitiveDateTime;

use crate::db::models::Answer;
use crate::db::types::AnswerStatus;

const COLUMNS: &str = "\
    id, question_id, student_name, answer_text, mark_gained, status, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Answer>, sqlx::Error> {
    sqlx::query_as::<_, Answer>(&format!("SELECT {COLUMNS} FROM answers WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) struct CreateAnswer<'a> {
    pub id: &'a str,
    pub question_id: &'a str,
    pub student_name: &'a str,
    pub answer_text: Option<&'a str>,
    pub created_at: PrimitiveDateTime,
}

/// Inserts one answer inside the ingest transaction so a failed sheet
/// leaves no partial rows behind.
pub(crate) async fn create(
    conn: &mut PgConnection,
    params: CreateAnswer<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO answers (
            id, question_id, student_name, answer_text, mark_gained, status, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,0,$5,$6,$6)",
    )
    .bind(params.id)
    .bind(params.question_id)
    .bind(params.student_name)
    .bind(params.answer_text)
    .bind(AnswerStatus::Unmarked)
    .bind(params.created_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub(crate) async fn list_for_test(pool: &PgPool, test_id: &str) -> Result<Vec<Answer>, sqlx::Error> {
    sqlx::query_as::<_, Answer>(&format!(
        "SELECT a.{} FROM answers a
         JOIN questions q ON q.id = a.question_id
         WHERE q.test_id = $1
         ORDER BY a.created_at, a.id",
        COLUMNS.replace(", ", ", a."),
    ))
    .bind(test_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_unmarked_for_test(
    pool: &PgPool,
    test_id: &str,
) -> Result<Vec<Answer>, sqlx::Error> {
    sqlx::query_as::<_, Answer>(&format!(
        "SELECT a.{} FROM answers a
         JOIN questions q ON q.id = a.question_id
         WHERE q.test_id = $1 AND a.status = $2
         ORDER BY a.created_at, a.id",
        COLUMNS.replace(", ", ", a."),
    ))
    .bind(test_id)
    .bind(AnswerStatus::Unmarked)
    .fetch_all(pool)
    .await
}

pub(crate) async fn update_mark(
    pool: &PgPool,
    id: &str,
    mark_gained: i32,
    status: AnswerStatus,
    updated_at: PrimitiveDateTime,
) -> Result<Option<Answer>, sqlx::Error> {
    sqlx::query_as::<_, Answer>(&format!(
        "UPDATE answers SET mark_gained = $1, status = $2, updated_at = $3
         WHERE id = $4
         RETURNING {COLUMNS}",
    ))
    .bind(mark_gained)
    .bind(status)
    .bind(updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct StatusCounts {
    pub(crate) unmarked: i64,
    pub(crate) flagged: i64,
    pub(crate) completed: i64,
}

pub(crate) async fn status_counts_for_test(
    pool: &PgPool,
    test_id: &str,
) -> Result<StatusCounts, sqlx::Error> {
    let rows: Vec<(AnswerStatus, i64)> = sqlx::query_as(
        "SELECT a.status, COUNT(*) FROM answers a
         JOIN questions q ON q.id = a.question_id
         WHERE q.test_id = $1
         GROUP BY a.status",
    )
    .bind(test_id)
    .fetch_all(pool)
    .await?;

    let mut counts = StatusCounts::default();
    for (status, count) in rows {
        match status {
            AnswerStatus::Unmarked => counts.unmarked = count,
            AnswerStatus::Flagged => counts.flagged = count,
            AnswerStatus::Completed => counts.completed = count,
        }
    }
    Ok(counts)
}
