use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::{security, state::AppState};
use crate::db::models::{Test, User};
use crate::db::types::UserRole;
use crate::repositories;

pub(crate) struct CurrentUser(pub(crate) User);
pub(crate) struct CurrentAdmin(pub(crate) User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let claims = security::verify_token(token, app_state.settings())
            .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

        let user = repositories::users::find_by_id(app_state.db(), &claims.sub)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load user"))?;

        let Some(user) = user else {
            return Err(ApiError::Unauthorized("User not found"));
        };

        if !user.is_active {
            return Err(ApiError::Unauthorized("Invalid authentication credentials"));
        }

        Ok(CurrentUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if user.role == UserRole::Admin {
            Ok(CurrentAdmin(user))
        } else {
            Err(ApiError::Forbidden("Admin access required"))
        }
    }
}

/// Loads a test the user may develop: its owning developer or an admin.
pub(crate) async fn require_test_owner(
    state: &AppState,
    user: &User,
    test_id: &str,
) -> Result<Test, ApiError> {
    let test = load_test(state, test_id).await?;

    if user.role == UserRole::Admin || test.developer_id == user.id {
        return Ok(test);
    }

    Err(ApiError::Forbidden("Not enough permissions for this test"))
}

/// Loads a test the user may mark: the assigned marker or an admin.
pub(crate) async fn require_test_marker(
    state: &AppState,
    user: &User,
    test_id: &str,
) -> Result<Test, ApiError> {
    let test = load_test(state, test_id).await?;

    if user.role == UserRole::Admin || test.marked_by.as_deref() == Some(user.id.as_str()) {
        return Ok(test);
    }

    Err(ApiError::Forbidden("Not enough permissions for this test"))
}

/// Loads a test the user may read results of: owner, assigned marker or admin.
pub(crate) async fn require_test_access(
    state: &AppState,
    user: &User,
    test_id: &str,
) -> Result<Test, ApiError> {
    let test = load_test(state, test_id).await?;

    if user.role == UserRole::Admin
        || test.developer_id == user.id
        || test.marked_by.as_deref() == Some(user.id.as_str())
    {
        return Ok(test);
    }

    Err(ApiError::Forbidden("Not enough permissions for this test"))
}

async fn load_test(state: &AppState, test_id: &str) -> Result<Test, ApiError> {
    repositories::tests::find_by_id(state.db(), test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch test"))?
        .ok_or_else(|| ApiError::NotFound("Test not found".to_string()))
}
