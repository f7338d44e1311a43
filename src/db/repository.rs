use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::{
    Course, Lecture, NewCourseRequest, NewLectureRequest, NewProfileRequest,
    NewRelationshipManagerRequest, NewWeekRequest, Profile, ReferralLink, RelationshipManager,
    UpdateCourseRequest, UpdateLectureRequest, UpdateWeekRequest, Week,
};
use crate::referral::{self, ReferralCode};

pub async fn fetch_courses(db: &SqlitePool) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(
        "SELECT id, name, description, created_at FROM courses ORDER BY name",
    )
    .fetch_all(db)
    .await
}

pub async fn find_course_by_id(db: &SqlitePool, id: &str) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(
        "SELECT id, name, description, created_at FROM courses WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn insert_course(
    db: &SqlitePool,
    req: NewCourseRequest,
) -> Result<Course, sqlx::Error> {
    let id = Uuid::new_v4().simple().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query("INSERT INTO courses (id, name, description, created_at) VALUES (?, ?, ?, ?)")
        .bind(&id)
        .bind(&req.name)
        .bind(&req.description)
        .bind(&now)
        .execute(db)
        .await?;

    Ok(Course {
        id,
        name: req.name,
        description: req.description,
        created_at: now,
    })
}

pub async fn update_course(
    db: &SqlitePool,
    id: &str,
    req: UpdateCourseRequest,
) -> Result<Option<Course>, sqlx::Error> {
    let mut current = match find_course_by_id(db, id).await? {
        Some(c) => c,
        None => return Ok(None),
    };

    if let Some(name) = req.name {
        current.name = name;
    }
    if let Some(description) = req.description {
        current.description = Some(description);
    }

    sqlx::query("UPDATE courses SET name = ?, description = ? WHERE id = ?")
        .bind(&current.name)
        .bind(&current.description)
        .bind(id)
        .execute(db)
        .await?;

    Ok(Some(current))
}

/// Removes the course together with its weeks and lectures in one
/// transaction, so reads never observe orphaned children.
pub async fn delete_course(db: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
    let mut tx = db.begin().await?;

    sqlx::query("DELETE FROM lectures WHERE course_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM weeks WHERE course_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM courses WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;
    Ok(result > 0)
}

pub async fn fetch_weeks_for_course(
    db: &SqlitePool,
    course_id: &str,
) -> Result<Vec<Week>, sqlx::Error> {
    sqlx::query_as::<_, Week>(
        "SELECT id, course_id, name, created_at FROM weeks WHERE course_id = ? ORDER BY name",
    )
    .bind(course_id)
    .fetch_all(db)
    .await
}

pub async fn find_week_by_id(db: &SqlitePool, id: &str) -> Result<Option<Week>, sqlx::Error> {
    sqlx::query_as::<_, Week>(
        "SELECT id, course_id, name, created_at FROM weeks WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn insert_week(db: &SqlitePool, req: NewWeekRequest) -> Result<Week, sqlx::Error> {
    let id = Uuid::new_v4().simple().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query("INSERT INTO weeks (id, course_id, name, created_at) VALUES (?, ?, ?, ?)")
        .bind(&id)
        .bind(&req.course_id)
        .bind(&req.name)
        .bind(&now)
        .execute(db)
        .await?;

    Ok(Week {
        id,
        course_id: req.course_id,
        name: req.name,
        created_at: now,
    })
}

pub async fn update_week(
    db: &SqlitePool,
    id: &str,
    req: UpdateWeekRequest,
) -> Result<Option<Week>, sqlx::Error> {
    let mut current = match find_week_by_id(db, id).await? {
        Some(w) => w,
        None => return Ok(None),
    };

    if let Some(name) = req.name {
        current.name = name;
    }

    sqlx::query("UPDATE weeks SET name = ? WHERE id = ?")
        .bind(&current.name)
        .bind(id)
        .execute(db)
        .await?;

    Ok(Some(current))
}

pub async fn delete_week(db: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
    let mut tx = db.begin().await?;

    sqlx::query("DELETE FROM lectures WHERE week_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM weeks WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;
    Ok(result > 0)
}

pub async fn fetch_lectures(db: &SqlitePool) -> Result<Vec<Lecture>, sqlx::Error> {
    sqlx::query_as::<_, Lecture>(
        "SELECT id, course_id, week_id, title, description, youtube_id, scheduled_time, created_at
         FROM lectures ORDER BY scheduled_time",
    )
    .fetch_all(db)
    .await
}

pub async fn fetch_lectures_for_week(
    db: &SqlitePool,
    week_id: &str,
) -> Result<Vec<Lecture>, sqlx::Error> {
    sqlx::query_as::<_, Lecture>(
        "SELECT id, course_id, week_id, title, description, youtube_id, scheduled_time, created_at
         FROM lectures WHERE week_id = ? ORDER BY scheduled_time",
    )
    .bind(week_id)
    .fetch_all(db)
    .await
}

pub async fn find_lecture_by_id(
    db: &SqlitePool,
    id: &str,
) -> Result<Option<Lecture>, sqlx::Error> {
    sqlx::query_as::<_, Lecture>(
        "SELECT id, course_id, week_id, title, description, youtube_id, scheduled_time, created_at
         FROM lectures WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn insert_lecture(
    db: &SqlitePool,
    req: NewLectureRequest,
) -> Result<Lecture, sqlx::Error> {
    let id = Uuid::new_v4().simple().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO lectures
            (id, course_id, week_id, title, description, youtube_id, scheduled_time, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&req.course_id)
    .bind(&req.week_id)
    .bind(&req.title)
    .bind(&req.description)
    .bind(&req.youtube_id)
    .bind(&req.scheduled_time)
    .bind(&now)
    .execute(db)
    .await?;

    Ok(Lecture {
        id,
        course_id: req.course_id,
        week_id: req.week_id,
        title: req.title,
        description: req.description,
        youtube_id: req.youtube_id,
        scheduled_time: req.scheduled_time,
        created_at: now,
    })
}

pub async fn update_lecture(
    db: &SqlitePool,
    id: &str,
    req: UpdateLectureRequest,
) -> Result<Option<Lecture>, sqlx::Error> {
    let mut current = match find_lecture_by_id(db, id).await? {
        Some(l) => l,
        None => return Ok(None),
    };

    if let Some(title) = req.title {
        current.title = title;
    }
    if let Some(description) = req.description {
        current.description = Some(description);
    }
    if let Some(youtube_id) = req.youtube_id {
        current.youtube_id = youtube_id;
    }
    if let Some(scheduled_time) = req.scheduled_time {
        current.scheduled_time = scheduled_time;
    }

    sqlx::query(
        "UPDATE lectures
         SET title = ?, description = ?, youtube_id = ?, scheduled_time = ?
         WHERE id = ?",
    )
    .bind(&current.title)
    .bind(&current.description)
    .bind(&current.youtube_id)
    .bind(&current.scheduled_time)
    .bind(id)
    .execute(db)
    .await?;

    Ok(Some(current))
}

pub async fn delete_lecture(db: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM lectures WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

pub async fn fetch_relationship_managers(
    db: &SqlitePool,
) -> Result<Vec<RelationshipManager>, sqlx::Error> {
    sqlx::query_as::<_, RelationshipManager>(
        "SELECT id, name, email, created_at FROM relationship_managers ORDER BY name",
    )
    .fetch_all(db)
    .await
}

pub async fn find_relationship_manager_by_id(
    db: &SqlitePool,
    id: &str,
) -> Result<Option<RelationshipManager>, sqlx::Error> {
    sqlx::query_as::<_, RelationshipManager>(
        "SELECT id, name, email, created_at FROM relationship_managers WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn find_relationship_manager_by_email(
    db: &SqlitePool,
    email: &str,
) -> Result<Option<RelationshipManager>, sqlx::Error> {
    sqlx::query_as::<_, RelationshipManager>(
        "SELECT id, name, email, created_at FROM relationship_managers WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(db)
    .await
}

pub async fn insert_relationship_manager(
    db: &SqlitePool,
    req: NewRelationshipManagerRequest,
) -> Result<RelationshipManager, sqlx::Error> {
    let id = Uuid::new_v4().simple().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query("INSERT INTO relationship_managers (id, name, email, created_at) VALUES (?, ?, ?, ?)")
        .bind(&id)
        .bind(&req.name)
        .bind(&req.email)
        .bind(&now)
        .execute(db)
        .await?;

    Ok(RelationshipManager {
        id,
        name: req.name,
        email: req.email,
        created_at: now,
    })
}

pub async fn fetch_referral_links(db: &SqlitePool) -> Result<Vec<ReferralLink>, sqlx::Error> {
    sqlx::query_as::<_, ReferralLink>(
        "SELECT code, rm_id, lecture_id, created_at FROM referral_links ORDER BY created_at DESC",
    )
    .fetch_all(db)
    .await
}

pub async fn find_referral_link(
    db: &SqlitePool,
    code: &str,
) -> Result<Option<ReferralLink>, sqlx::Error> {
    sqlx::query_as::<_, ReferralLink>(
        "SELECT code, rm_id, lecture_id, created_at FROM referral_links WHERE code = ?",
    )
    .bind(code)
    .fetch_optional(db)
    .await
}

pub async fn insert_referral_link(
    db: &SqlitePool,
    code: &str,
    rm_id: &str,
    lecture_id: &str,
) -> Result<ReferralLink, sqlx::Error> {
    let now = Utc::now().to_rfc3339();

    sqlx::query("INSERT INTO referral_links (code, rm_id, lecture_id, created_at) VALUES (?, ?, ?, ?)")
        .bind(code)
        .bind(rm_id)
        .bind(lecture_id)
        .bind(&now)
        .execute(db)
        .await?;

    Ok(ReferralLink {
        code: code.to_string(),
        rm_id: rm_id.to_string(),
        lecture_id: lecture_id.to_string(),
        created_at: now,
    })
}

pub async fn find_profile_by_id(db: &SqlitePool, id: &str) -> Result<Option<Profile>, sqlx::Error> {
    sqlx::query_as::<_, Profile>(
        "SELECT id, username, email, mobile, is_admin, referred_by, referral_code, created_at
         FROM profiles WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn find_profile_by_email(
    db: &SqlitePool,
    email: &str,
) -> Result<Option<Profile>, sqlx::Error> {
    sqlx::query_as::<_, Profile>(
        "SELECT id, username, email, mobile, is_admin, referred_by, referral_code, created_at
         FROM profiles WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(db)
    .await
}

pub async fn find_profile_by_username(
    db: &SqlitePool,
    username: &str,
) -> Result<Option<Profile>, sqlx::Error> {
    sqlx::query_as::<_, Profile>(
        "SELECT id, username, email, mobile, is_admin, referred_by, referral_code, created_at
         FROM profiles WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(db)
    .await
}

/// Profiles that signed up through a referral, for per-manager client lists.
pub async fn fetch_referred_profiles(db: &SqlitePool) -> Result<Vec<Profile>, sqlx::Error> {
    sqlx::query_as::<_, Profile>(
        "SELECT id, username, email, mobile, is_admin, referred_by, referral_code, created_at
         FROM profiles WHERE referred_by IS NOT NULL ORDER BY created_at",
    )
    .fetch_all(db)
    .await
}

pub async fn insert_profile(
    db: &SqlitePool,
    req: NewProfileRequest,
    referral: Option<ReferralCode>,
) -> Result<Profile, sqlx::Error> {
    let id = Uuid::new_v4().simple().to_string();
    let now = Utc::now().to_rfc3339();
    let referred_by = referral.as_ref().map(|c| c.rm_id.clone());
    let referral_code = referral.as_ref().map(|c| c.to_string());

    sqlx::query(
        "INSERT INTO profiles
            (id, username, email, mobile, is_admin, referred_by, referral_code, created_at)
         VALUES (?, ?, ?, ?, 0, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&req.username)
    .bind(&req.email)
    .bind(&req.mobile)
    .bind(&referred_by)
    .bind(&referral_code)
    .bind(&now)
    .execute(db)
    .await?;

    Ok(Profile {
        id,
        username: req.username,
        email: req.email,
        mobile: req.mobile,
        is_admin: false,
        referred_by,
        referral_code,
        created_at: now,
    })
}

pub async fn promote_profile_by_email(db: &SqlitePool, email: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE profiles SET is_admin = 1 WHERE email = ?")
        .bind(email)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

pub async fn admin_count(db: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM profiles WHERE is_admin = 1")
        .fetch_one(db)
        .await
}

pub async fn store_pending_code(db: &SqlitePool, code: &str) -> Result<(), sqlx::Error> {
    let now = Utc::now().to_rfc3339();

    sqlx::query("INSERT OR REPLACE INTO pending_referral (key, code, stored_at) VALUES (?, ?, ?)")
        .bind(referral::PENDING_CODE_KEY)
        .bind(code)
        .bind(&now)
        .execute(db)
        .await?;

    Ok(())
}

/// Reads and clears the stashed code in one transaction, so a given code is
/// handed out at most once.
pub async fn take_pending_code(db: &SqlitePool) -> Result<Option<String>, sqlx::Error> {
    let mut tx = db.begin().await?;

    let code = sqlx::query_scalar::<_, String>("SELECT code FROM pending_referral WHERE key = ?")
        .bind(referral::PENDING_CODE_KEY)
        .fetch_optional(&mut *tx)
        .await?;

    if code.is_some() {
        sqlx::query("DELETE FROM pending_referral WHERE key = ?")
            .bind(referral::PENDING_CODE_KEY)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite://:memory:")
            .await
            .expect("Failed to create test db");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        pool
    }

    async fn sample_catalog(pool: &SqlitePool) -> (Course, Week, Lecture) {
        let course = insert_course(
            pool,
            NewCourseRequest {
                name: "JEE Chemistry".to_string(),
                description: Some("Comprehensive chemistry for JEE preparation.".to_string()),
            },
        )
        .await
        .expect("Failed to insert course");

        let week = insert_week(
            pool,
            NewWeekRequest {
                course_id: course.id.clone(),
                name: "Week 1".to_string(),
            },
        )
        .await
        .expect("Failed to insert week");

        let lecture = insert_lecture(
            pool,
            NewLectureRequest {
                course_id: course.id.clone(),
                week_id: week.id.clone(),
                title: "Atomic Structure - Basics".to_string(),
                description: None,
                youtube_id: "dQw4w9WgXcQ".to_string(),
                scheduled_time: "2026-03-02T18:00:00+00:00".to_string(),
            },
        )
        .await
        .expect("Failed to insert lecture");

        (course, week, lecture)
    }

    #[tokio::test]
    async fn test_insert_and_fetch_course() {
        let pool = setup_test_db().await;

        let (course, _, _) = sample_catalog(&pool).await;
        assert_eq!(course.name, "JEE Chemistry");

        let courses = fetch_courses(&pool).await.expect("Failed to fetch courses");
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].id, course.id);
    }

    #[tokio::test]
    async fn test_update_lecture_partial() {
        let pool = setup_test_db().await;
        let (_, _, lecture) = sample_catalog(&pool).await;

        let updated = update_lecture(
            &pool,
            &lecture.id,
            UpdateLectureRequest {
                title: Some("Atomic Structure - Revised".to_string()),
                description: None,
                youtube_id: None,
                scheduled_time: Some("2026-03-03T18:00:00+00:00".to_string()),
            },
        )
        .await
        .expect("Failed to update lecture")
        .expect("Lecture not found");

        assert_eq!(updated.title, "Atomic Structure - Revised");
        assert_eq!(updated.scheduled_time, "2026-03-03T18:00:00+00:00");
        assert_eq!(updated.youtube_id, lecture.youtube_id);
    }

    #[tokio::test]
    async fn test_delete_course_cascades() {
        let pool = setup_test_db().await;
        let (course, week, _) = sample_catalog(&pool).await;

        let deleted = delete_course(&pool, &course.id)
            .await
            .expect("Failed to delete course");
        assert!(deleted);

        let lectures = fetch_lectures(&pool).await.expect("Failed to fetch lectures");
        assert!(lectures.is_empty());
        let weeks = fetch_weeks_for_course(&pool, &course.id)
            .await
            .expect("Failed to fetch weeks");
        assert!(weeks.is_empty());
        assert!(find_week_by_id(&pool, &week.id)
            .await
            .expect("Failed to look up week")
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_week_removes_its_lectures() {
        let pool = setup_test_db().await;
        let (course, week, lecture) = sample_catalog(&pool).await;

        let deleted = delete_week(&pool, &week.id).await.expect("Failed to delete week");
        assert!(deleted);

        assert!(find_lecture_by_id(&pool, &lecture.id)
            .await
            .expect("Failed to look up lecture")
            .is_none());
        assert!(find_course_by_id(&pool, &course.id)
            .await
            .expect("Failed to look up course")
            .is_some());
    }

    #[tokio::test]
    async fn test_pending_code_taken_once() {
        let pool = setup_test_db().await;

        store_pending_code(&pool, "rm1-l42")
            .await
            .expect("Failed to store code");
        store_pending_code(&pool, "rm7-l99")
            .await
            .expect("Failed to overwrite code");

        let first = take_pending_code(&pool).await.expect("Failed to take code");
        assert_eq!(first.as_deref(), Some("rm7-l99"));

        let second = take_pending_code(&pool).await.expect("Failed to take code");
        assert_eq!(second, None);
    }

    #[tokio::test]
    async fn test_insert_profile_with_attribution() {
        let pool = setup_test_db().await;

        let referral = crate::referral::decode("rm7-l99");
        let profile = insert_profile(
            &pool,
            NewProfileRequest {
                username: "asha".to_string(),
                email: "asha@example.com".to_string(),
                mobile: "9876543210".to_string(),
                referral_code: None,
            },
            referral,
        )
        .await
        .expect("Failed to insert profile");

        assert_eq!(profile.referred_by.as_deref(), Some("rm7"));
        assert_eq!(profile.referral_code.as_deref(), Some("rm7-l99"));
        assert!(!profile.is_admin);

        let referred = fetch_referred_profiles(&pool)
            .await
            .expect("Failed to fetch referred profiles");
        assert_eq!(referred.len(), 1);
        assert_eq!(referred[0].id, profile.id);
    }

    #[tokio::test]
    async fn test_promote_profile() {
        let pool = setup_test_db().await;

        insert_profile(
            &pool,
            NewProfileRequest {
                username: "admin".to_string(),
                email: "admin@example.com".to_string(),
                mobile: "9876543210".to_string(),
                referral_code: None,
            },
            None,
        )
        .await
        .expect("Failed to insert profile");

        assert_eq!(admin_count(&pool).await.expect("Failed to count admins"), 0);

        let promoted = promote_profile_by_email(&pool, "admin@example.com")
            .await
            .expect("Failed to promote profile");
        assert!(promoted);
        assert_eq!(admin_count(&pool).await.expect("Failed to count admins"), 1);

        let promoted_missing = promote_profile_by_email(&pool, "nobody@example.com")
            .await
            .expect("Failed to run promote");
        assert!(!promoted_missing);
    }
}
