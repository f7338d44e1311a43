use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::status::{self, LectureStatus, TimeRemaining};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lecture {
    pub id: String,
    pub course_id: String,
    pub week_id: String,
    pub title: String,
    pub description: Option<String>,
    pub youtube_id: String,
    /// RFC 3339, validated on every write.
    pub scheduled_time: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLectureRequest {
    pub course_id: String,
    pub week_id: String,
    pub title: String,
    pub description: Option<String>,
    pub youtube_id: String,
    pub scheduled_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateLectureRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub youtube_id: Option<String>,
    pub scheduled_time: Option<String>,
}

/// Lecture as served over HTTP: the stored record plus the status and
/// countdown derived from `scheduled_time` at read time.
#[derive(Debug, Clone, Serialize)]
pub struct LectureView {
    #[serde(flatten)]
    pub lecture: Lecture,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<LectureStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_remaining: Option<TimeRemaining>,
}

impl LectureView {
    pub fn derive(lecture: Lecture, now: DateTime<Utc>) -> Self {
        let scheduled = status::parse_timestamp(&lecture.scheduled_time);
        Self {
            status: scheduled.map(|s| status::classify(s, now)),
            time_remaining: scheduled.and_then(|s| status::time_until(s, now)),
            lecture,
        }
    }
}
