use std::time::Duration;

use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use lecturehall::db::repository;
use lecturehall::models::{NewCourseRequest, NewLectureRequest, NewWeekRequest};
use lecturehall::services::StatusMonitor;

async fn setup_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite://:memory:")
        .await
        .expect("Failed to create database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

async fn insert_lecture_at(
    pool: &SqlitePool,
    course_id: &str,
    week_id: &str,
    title: &str,
    offset: chrono::Duration,
) {
    repository::insert_lecture(
        pool,
        NewLectureRequest {
            course_id: course_id.to_string(),
            week_id: week_id.to_string(),
            title: title.to_string(),
            description: None,
            youtube_id: "dQw4w9WgXcQ".to_string(),
            scheduled_time: (Utc::now() + offset).to_rfc3339(),
        },
    )
    .await
    .expect("Failed to insert lecture");
}

#[tokio::test]
async fn test_sweep_counts_and_transitions() {
    let pool = setup_db().await;

    let course = repository::insert_course(
        &pool,
        NewCourseRequest {
            name: "NEET Biology".to_string(),
            description: None,
        },
    )
    .await
    .expect("Failed to insert course");
    let week = repository::insert_week(
        &pool,
        NewWeekRequest {
            course_id: course.id.clone(),
            name: "Week 1".to_string(),
        },
    )
    .await
    .expect("Failed to insert week");

    insert_lecture_at(&pool, &course.id, &week.id, "Thermodynamics Part 1", -chrono::Duration::days(2)).await;
    insert_lecture_at(&pool, &course.id, &week.id, "Plant Physiology", -chrono::Duration::minutes(30)).await;
    insert_lecture_at(&pool, &course.id, &week.id, "Human Anatomy Basics", chrono::Duration::days(1)).await;

    let mut monitor = StatusMonitor::new(pool.clone(), 60);

    let stats = monitor.sweep().await.expect("Failed to sweep");
    assert_eq!(stats.upcoming, 1);
    assert_eq!(stats.live, 1);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.went_live, 1);

    // Nothing changed, so a second sweep reports no new transitions.
    let again = monitor.sweep().await.expect("Failed to sweep");
    assert_eq!(again.live, 1);
    assert_eq!(again.went_live, 0);
}

#[tokio::test]
async fn test_monitor_runs_on_short_interval() {
    let pool = setup_db().await;

    let monitor = StatusMonitor::new(pool, 1);

    let monitor_task = tokio::spawn(async move {
        monitor.start().await;
    });

    tokio::time::sleep(Duration::from_millis(1500)).await;

    monitor_task.abort();
}
