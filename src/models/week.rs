use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::lecture::LectureView;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Week {
    pub id: String,
    pub course_id: String,
    pub name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWeekRequest {
    pub course_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateWeekRequest {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekDetail {
    #[serde(flatten)]
    pub week: Week,
    pub lectures: Vec<LectureView>,
}
