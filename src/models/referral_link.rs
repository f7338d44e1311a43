use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Association of a generated code with its manager and target lecture.
/// Created by admin action, never mutated, never expired.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReferralLink {
    pub code: String,
    pub rm_id: String,
    pub lecture_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReferralLinkRequest {
    pub rm_id: String,
    pub lecture_id: String,
}
