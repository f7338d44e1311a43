use axum::http::HeaderMap;
use sqlx::SqlitePool;

use crate::db::repository;
use crate::error::AppError;
use crate::models::Profile;

/// Header callers identify themselves with.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The one capability gate every mutating route goes through: resolve the
/// calling profile and require it to be an admin. Missing or unknown
/// identity is 401, a known non-admin is 403.
pub async fn require_admin(db: &SqlitePool, headers: &HeaderMap) -> Result<Profile, AppError> {
    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let profile = repository::find_profile_by_id(db, user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !profile.is_admin {
        return Err(AppError::Forbidden);
    }

    Ok(profile)
}
