use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::User;
use crate::db::types::UserRole;

const COLUMNS: &str = "\
    id, username, hashed_password, full_name, role, is_active, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE username = $1"))
        .bind(username)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users ORDER BY created_at"))
        .fetch_all(pool)
        .await
}

pub(crate) async fn list_by_role(pool: &PgPool, role: UserRole) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {COLUMNS} FROM users WHERE role = $1 AND is_active ORDER BY created_at"
    ))
    .bind(role)
    .fetch_all(pool)
    .await
}

pub(crate) async fn update_password(
    pool: &PgPool,
    id: &str,
    hashed_password: String,
    updated_at: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET hashed_password = $1, updated_at = $2 WHERE id = $3")
        .bind(hashed_password)
        .bind(updated_at)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub(crate) struct CreateUser<'a> {
    pub id: &'a str,
    pub username: &'a str,
    pub hashed_password: String,
    pub full_name: &'a str,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateUser<'_>) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (
            id, username, hashed_password, full_name, role, is_active, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.username)
    .bind(params.hashed_password)
    .bind(params.full_name)
    .bind(params.role)
    .bind(params.is_active)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn set_active(
    pool: &PgPool,
    id: &str,
    is_active: bool,
    updated_at: PrimitiveDateTime,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET is_active = $1, updated_at = $2 WHERE id = $3 RETURNING {COLUMNS}",
    ))
    .bind(is_active)
    .bind(updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}
