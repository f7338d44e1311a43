use chrono::{Duration, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::db::repository;
use crate::error::AppError;
use crate::models::{NewCourseRequest, NewLectureRequest, NewWeekRequest};

#[derive(Debug, Serialize)]
pub struct SeedStats {
    pub courses: usize,
    pub weeks: usize,
    pub lectures: usize,
}

/// Inserts the sample catalog: two courses, two weeks each, and six
/// lectures scheduled around now so every status shows up.
pub async fn seed_sample_data(db: &SqlitePool) -> Result<SeedStats, AppError> {
    let now = Utc::now();

    let chemistry = repository::insert_course(
        db,
        NewCourseRequest {
            name: "JEE Chemistry".to_string(),
            description: Some(
                "Comprehensive course covering all chemistry topics for JEE preparation."
                    .to_string(),
            ),
        },
    )
    .await?;
    let biology = repository::insert_course(
        db,
        NewCourseRequest {
            name: "NEET Biology".to_string(),
            description: Some(
                "Complete biology preparation for NEET aspirants with detailed explanations."
                    .to_string(),
            ),
        },
    )
    .await?;

    let mut weeks = Vec::new();
    for course_id in [&chemistry.id, &biology.id] {
        for name in ["Week 1", "Week 2"] {
            weeks.push(
                repository::insert_week(
                    db,
                    NewWeekRequest {
                        course_id: course_id.clone(),
                        name: name.to_string(),
                    },
                )
                .await?,
            );
        }
    }

    let samples = [
        (
            &chemistry.id,
            &weeks[0].id,
            "Atomic Structure - Basics",
            "Introduction to atomic structure and basic principles of chemistry.",
            now + Duration::days(1),
        ),
        (
            &chemistry.id,
            &weeks[0].id,
            "Chemical Bonding",
            "Understanding different types of chemical bonds and their properties.",
            now + Duration::days(2),
        ),
        (
            &chemistry.id,
            &weeks[1].id,
            "Thermodynamics Part 1",
            "First laws of thermodynamics and their applications.",
            now - Duration::days(2),
        ),
        (
            &biology.id,
            &weeks[2].id,
            "Cell Structure & Functions",
            "Detailed explanation of cell organelles and their functions.",
            now + Duration::minutes(10),
        ),
        (
            &biology.id,
            &weeks[2].id,
            "Plant Physiology",
            "Understanding plant growth, development and physiological processes.",
            now - Duration::minutes(30),
        ),
        (
            &biology.id,
            &weeks[3].id,
            "Human Anatomy Basics",
            "Introduction to major organ systems in the human body.",
            now + Duration::days(3),
        ),
    ];

    let mut lectures = 0;
    for (course_id, week_id, title, description, scheduled) in samples {
        repository::insert_lecture(
            db,
            NewLectureRequest {
                course_id: course_id.clone(),
                week_id: week_id.clone(),
                title: title.to_string(),
                description: Some(description.to_string()),
                youtube_id: "dQw4w9WgXcQ".to_string(),
                scheduled_time: scheduled.to_rfc3339(),
            },
        )
        .await?;
        lectures += 1;
    }

    let stats = SeedStats {
        courses: 2,
        weeks: weeks.len(),
        lectures,
    };
    info!("Sample data seeded: {:?}", stats);
    Ok(stats)
}
