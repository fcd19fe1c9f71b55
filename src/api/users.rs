use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::db::types::UserRole;
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::user::{UserActiveUpdate, UserCreate, UserResponse};


pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/markers", get(list_markers))
        .route("/:user_id", patch(update_user_active))
}

/// Active markers available for assignment. Open to any authenticated user
/// so developers can pick a marker for their tests.
async fn list_markers(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let markers = repositories::users::list_by_role(state.db(), UserRole::Marker)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list markers"))?;

    Ok(Json(markers.into_iter().map(UserResponse::from_db).collect()))
}

async fn list_users(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = repositories::users::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list users"))?;

    Ok(Json(users.into_iter().map(UserResponse::from_db).collect()))
}

async fn create_user(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Json(payload): Json<UserCreate>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let existing = repositories::users::find_by_username(state.db(), &payload.username)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing user"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict("User with this username already exists".to_string()));
    }

    let hashed_password = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;

    let now = primitive_now_utc();
    let user = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            username: &payload.username,
            hashed_password,
            full_name: &payload.full_name,
            role: payload.role,
            is_active: payload.is_active,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create user"))?;

    Ok((StatusCode::CREATED, Json(UserResponse::from_db(user))))
}

async fn update_user_active(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(user_id): Path<String>,
    Json(payload): Json<UserActiveUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    let user =
        repositories::users::set_active(state.db(), &user_id, payload.is_active, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to update user"))?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from_db(user)))
}
