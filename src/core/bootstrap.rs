use uuid::Uuid;

use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;

/// Creates or repairs the default admin account on startup so a fresh
/// deployment is never locked out.
pub(crate) async fn ensure_admin(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_admin_password.is_empty() {
        tracing::warn!("FIRST_ADMIN_PASSWORD not configured; skipping admin creation");
        return Ok(());
    }

    let username = &admin.first_admin_username;
    let user = repositories::users::find_by_username(state.db(), username).await?;
    let now = primitive_now_utc();

    if let Some(user) = user {
        let mut needs_update = false;

        let verified = security::verify_password(&admin.first_admin_password, &user.hashed_password)
            .unwrap_or(false);
        let hashed_password = if verified {
            user.hashed_password.clone()
        } else {
            needs_update = true;
            security::hash_password(&admin.first_admin_password)?
        };

        let role = if user.role != UserRole::Admin {
            needs_update = true;
            UserRole::Admin
        } else {
            user.role
        };

        let is_active = if !user.is_active {
            needs_update = true;
            true
        } else {
            user.is_active
        };

        if needs_update {
            sqlx::query(
                "UPDATE users
                 SET hashed_password = $1, role = $2, is_active = $3, updated_at = $4
                 WHERE id = $5",
            )
            .bind(hashed_password)
            .bind(role)
            .bind(is_active)
            .bind(now)
            .bind(user.id)
            .execute(state.db())
            .await?;

            tracing::info!("Updated default admin {username}");
        } else {
            tracing::info!("Default admin already up to date");
        }

        return Ok(());
    }

    let hashed_password = security::hash_password(&admin.first_admin_password)?;

    repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            username,
            hashed_password,
            full_name: "Administrator",
            role: UserRole::Admin,
            is_active: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await?;

    tracing::info!("Created default admin {username}");
    Ok(())
}
