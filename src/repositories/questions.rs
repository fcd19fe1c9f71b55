use sqlx::types::Json;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{AnswerKey, Question, RatingLevel};

const COLUMNS: &str = "\
    id, test_id, title, keys, rating_scale, mark_level, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!("SELECT {COLUMNS} FROM questions WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_by_test(
    pool: &PgPool,
    test_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE test_id = $1 ORDER BY created_at"
    ))
    .bind(test_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_by_title(
    pool: &PgPool,
    test_id: &str,
    title: &str,
) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE test_id = $1 AND title = $2"
    ))
    .bind(test_id)
    .bind(title)
    .fetch_optional(pool)
    .await
}

pub(crate) struct CreateQuestion<'a> {
    pub id: &'a str,
    pub test_id: &'a str,
    pub title: &'a str,
    pub keys: Vec<AnswerKey>,
    pub rating_scale: Vec<RatingLevel>,
    pub mark_level: i32,
    pub created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateQuestion<'_>,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (
            id, test_id, title, keys, rating_scale, mark_level, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$7)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.test_id)
    .bind(params.title)
    .bind(Json(params.keys))
    .bind(Json(params.rating_scale))
    .bind(params.mark_level)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    title: &str,
    keys: Vec<AnswerKey>,
    rating_scale: Vec<RatingLevel>,
    mark_level: i32,
    updated_at: PrimitiveDateTime,
) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "UPDATE questions
         SET title = $1, keys = $2, rating_scale = $3, mark_level = $4, updated_at = $5
         WHERE id = $6
         RETURNING {COLUMNS}",
    ))
    .bind(title)
    .bind(Json(keys))
    .bind(Json(rating_scale))
    .bind(mark_level)
    .bind(updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
