use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub mobile: String,
    pub is_admin: bool,
    /// Id of the referring relationship manager, if any.
    pub referred_by: Option<String>,
    /// Full referral code the signup was attributed through.
    pub referral_code: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProfileRequest {
    pub username: String,
    pub email: String,
    pub mobile: String,
    #[serde(default)]
    pub referral_code: Option<String>,
}
