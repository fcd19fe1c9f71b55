use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::security;
use crate::core::state::AppState;
use crate::repositories;
use crate::core::time::primitive_now_utc;
use crate::schemas::auth::TokenResponse;
use crate::schemas::user::{PasswordChange, UserLogin, UserResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/change-password", post(change_password))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<UserLogin>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = repositories::users::find_by_username(state.db(), &payload.username)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?
        .ok_or(ApiError::Unauthorized("Incorrect username or password"))?;

    let verified = security::verify_password(&payload.password, &user.hashed_password)
        .map_err(|e| ApiError::internal(e, "Failed to verify password"))?;
    if !verified {
        return Err(ApiError::Unauthorized("Incorrect username or password"));
    }
    if !user.is_active {
        return Err(ApiError::Unauthorized("Inactive user"));
    }

    let access_token = security::create_access_token(&user.id, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        user: UserResponse::from_db(user),
    }))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from_db(user))
}

async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<PasswordChange>,
) -> Result<Json<UserResponse>, ApiError> {
    use validator::Validate;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let verified = security::verify_password(&payload.current_password, &user.hashed_password)
        .map_err(|e| ApiError::internal(e, "Failed to verify password"))?;
    if !verified {
        return Err(ApiError::BadRequest("Current password is incorrect".to_string()));
    }

    let hashed_password = security::hash_password(&payload.new_password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;
    repositories::users::update_password(state.db(), &user.id, hashed_password, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update password"))?;

    Ok(Json(UserResponse::from_db(user)))
}
