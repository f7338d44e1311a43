use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, Query};
use axum::http::HeaderMap;
use axum::routing::{patch, post};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::require_admin;
use crate::db::repository;
use crate::error::AppError;
use crate::models::*;
use crate::referral::{self, ReferralCode};
use crate::services;
use crate::state::AppState;
use crate::status;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/courses", get(list_courses).post(create_course))
        .route(
            "/courses/{id}",
            get(get_course).patch(update_course).delete(delete_course),
        )
        .route("/weeks", post(create_week))
        .route("/weeks/{id}", patch(update_week).delete(delete_week))
        .route("/lectures", get(list_lectures).post(create_lecture))
        .route(
            "/lectures/{id}",
            get(get_lecture).patch(update_lecture).delete(delete_lecture),
        )
        .route(
            "/referral-managers",
            get(list_referral_managers).post(create_referral_manager),
        )
        .route("/referral-managers/clients", get(list_referred_clients))
        .route(
            "/referral-links",
            get(list_referral_links).post(create_referral_link),
        )
        .route("/signup", get(referral_landing).post(signup))
        .route("/admin/promote", post(promote_admin))
        .route("/admin/seed", post(seed_data))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn list_courses(State(state): State<AppState>) -> Result<Json<Vec<Course>>, AppError> {
    let courses = repository::fetch_courses(&state.db).await?;
    Ok(Json(courses))
}

async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CourseDetail>, AppError> {
    let course = repository::find_course_by_id(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;

    let now = Utc::now();
    let mut weeks = Vec::new();
    for week in repository::fetch_weeks_for_course(&state.db, &course.id).await? {
        let lectures = repository::fetch_lectures_for_week(&state.db, &week.id)
            .await?
            .into_iter()
            .map(|l| LectureView::derive(l, now))
            .collect();
        weeks.push(WeekDetail { week, lectures });
    }

    Ok(Json(CourseDetail { course, weeks }))
}

async fn create_course(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<NewCourseRequest>,
) -> Result<Json<Course>, AppError> {
    require_admin(&state.db, &headers).await?;
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("course name must not be empty".to_string()));
    }
    let course = repository::insert_course(&state.db, req).await?;
    Ok(Json(course))
}

async fn update_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<UpdateCourseRequest>,
) -> Result<Json<Course>, AppError> {
    require_admin(&state.db, &headers).await?;
    let course = repository::update_course(&state.db, &id, req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(course))
}

async fn delete_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    require_admin(&state.db, &headers).await?;
    let ok = repository::delete_course(&state.db, &id).await?;
    if ok {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}

async fn create_week(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<NewWeekRequest>,
) -> Result<Json<Week>, AppError> {
    require_admin(&state.db, &headers).await?;
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("week name must not be empty".to_string()));
    }
    repository::find_course_by_id(&state.db, &req.course_id)
        .await?
        .ok_or_else(|| AppError::BadRequest("unknown course".to_string()))?;
    let week = repository::insert_week(&state.db, req).await?;
    Ok(Json(week))
}

async fn update_week(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<UpdateWeekRequest>,
) -> Result<Json<Week>, AppError> {
    require_admin(&state.db, &headers).await?;
    let week = repository::update_week(&state.db, &id, req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(week))
}

async fn delete_week(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    require_admin(&state.db, &headers).await?;
    let ok = repository::delete_week(&state.db, &id).await?;
    if ok {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}

/// The schedule: every lecture in start order with its derived status.
async fn list_lectures(State(state): State<AppState>) -> Result<Json<Vec<LectureView>>, AppError> {
    let now = Utc::now();
    let lectures = repository::fetch_lectures(&state.db)
        .await?
        .into_iter()
        .map(|l| LectureView::derive(l, now))
        .collect();
    Ok(Json(lectures))
}

async fn get_lecture(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LectureView>, AppError> {
    let lecture = repository::find_lecture_by_id(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(LectureView::derive(lecture, Utc::now())))
}

async fn create_lecture(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<NewLectureRequest>,
) -> Result<Json<LectureView>, AppError> {
    require_admin(&state.db, &headers).await?;
    if req.title.trim().is_empty() {
        return Err(AppError::BadRequest("lecture title must not be empty".to_string()));
    }
    if status::parse_timestamp(&req.scheduled_time).is_none() {
        return Err(AppError::BadRequest(
            "scheduled_time must be an RFC 3339 timestamp".to_string(),
        ));
    }
    let week = repository::find_week_by_id(&state.db, &req.week_id)
        .await?
        .ok_or_else(|| AppError::BadRequest("unknown week".to_string()))?;
    if week.course_id != req.course_id {
        return Err(AppError::BadRequest(
            "week does not belong to the given course".to_string(),
        ));
    }

    check_video_reference(&state, &req.youtube_id).await;

    let lecture = repository::insert_lecture(&state.db, req).await?;
    Ok(Json(LectureView::derive(lecture, Utc::now())))
}

async fn update_lecture(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<UpdateLectureRequest>,
) -> Result<Json<LectureView>, AppError> {
    require_admin(&state.db, &headers).await?;
    if let Some(scheduled_time) = &req.scheduled_time {
        if status::parse_timestamp(scheduled_time).is_none() {
            return Err(AppError::BadRequest(
                "scheduled_time must be an RFC 3339 timestamp".to_string(),
            ));
        }
    }
    if let Some(youtube_id) = &req.youtube_id {
        check_video_reference(&state, youtube_id).await;
    }

    let lecture = repository::update_lecture(&state.db, &id, req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(LectureView::derive(lecture, Utc::now())))
}

async fn delete_lecture(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    require_admin(&state.db, &headers).await?;
    let ok = repository::delete_lecture(&state.db, &id).await?;
    if ok {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}

/// Lookup is advisory: a broken video reference is logged, never fatal.
async fn check_video_reference(state: &AppState, video_id: &str) {
    match state.video.lookup(video_id).await {
        Ok(Some(info)) => info!("video {} resolved: {}", video_id, info.title),
        Ok(None) => warn!("video {} did not resolve", video_id),
        Err(e) => warn!("video lookup for {} failed: {}", video_id, e),
    }
}

async fn list_referral_managers(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<RelationshipManager>>, AppError> {
    require_admin(&state.db, &headers).await?;
    let managers = repository::fetch_relationship_managers(&state.db).await?;
    Ok(Json(managers))
}

async fn create_referral_manager(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<NewRelationshipManagerRequest>,
) -> Result<Json<RelationshipManager>, AppError> {
    require_admin(&state.db, &headers).await?;
    if req.name.trim().is_empty() || req.email.trim().is_empty() {
        return Err(AppError::BadRequest("please fill in all fields".to_string()));
    }
    if !valid_email(&req.email) {
        return Err(AppError::BadRequest("please enter a valid email address".to_string()));
    }
    if repository::find_relationship_manager_by_email(&state.db, &req.email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "a relationship manager with this email already exists".to_string(),
        ));
    }
    let manager = repository::insert_relationship_manager(&state.db, req).await?;
    Ok(Json(manager))
}

/// Referred profiles grouped by the manager who brought them in.
async fn list_referred_clients(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<BTreeMap<String, Vec<Profile>>>, AppError> {
    require_admin(&state.db, &headers).await?;

    let mut clients: BTreeMap<String, Vec<Profile>> = BTreeMap::new();
    for profile in repository::fetch_referred_profiles(&state.db).await? {
        if let Some(rm_id) = profile.referred_by.clone() {
            clients.entry(rm_id).or_default().push(profile);
        }
    }

    Ok(Json(clients))
}

#[derive(Debug, Serialize)]
struct ManagerLinks {
    manager: RelationshipManager,
    links: Vec<ReferralLink>,
}

async fn list_referral_links(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ManagerLinks>>, AppError> {
    require_admin(&state.db, &headers).await?;

    let links = repository::fetch_referral_links(&state.db).await?;
    let managers = repository::fetch_relationship_managers(&state.db).await?;

    let mut grouped = Vec::new();
    for manager in managers {
        let own: Vec<ReferralLink> = links
            .iter()
            .filter(|l| l.rm_id == manager.id)
            .cloned()
            .collect();
        if !own.is_empty() {
            grouped.push(ManagerLinks { manager, links: own });
        }
    }

    Ok(Json(grouped))
}

#[derive(Debug, Serialize)]
struct ReferralLinkResponse {
    #[serde(flatten)]
    link: ReferralLink,
    url: String,
}

async fn create_referral_link(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<NewReferralLinkRequest>,
) -> Result<Json<ReferralLinkResponse>, AppError> {
    require_admin(&state.db, &headers).await?;
    repository::find_relationship_manager_by_id(&state.db, &req.rm_id)
        .await?
        .ok_or_else(|| AppError::BadRequest("unknown relationship manager".to_string()))?;
    repository::find_lecture_by_id(&state.db, &req.lecture_id)
        .await?
        .ok_or_else(|| AppError::BadRequest("unknown lecture".to_string()))?;

    let code = referral::encode(&req.rm_id, &req.lecture_id)?;
    let url = referral::referral_url(&state.config.public_base_url, &req.rm_id, &req.lecture_id)?;

    // Links are immutable, so regenerating the same pair hands back the
    // existing record.
    let link = match repository::find_referral_link(&state.db, &code).await? {
        Some(existing) => existing,
        None => repository::insert_referral_link(&state.db, &code, &req.rm_id, &req.lecture_id).await?,
    };

    Ok(Json(ReferralLinkResponse { link, url }))
}

#[derive(Deserialize)]
struct ReferralQuery {
    #[serde(default, rename = "ref")]
    referral: Option<String>,
}

#[derive(Debug, Serialize)]
struct ReferralLandingResponse {
    referral_detected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    lecture_id: Option<String>,
}

/// Referral landing: a well-formed `ref` is stashed for the signup that
/// follows; anything else is ignored.
async fn referral_landing(
    State(state): State<AppState>,
    Query(params): Query<ReferralQuery>,
) -> Result<Json<ReferralLandingResponse>, AppError> {
    if let Some(code) = params.referral.as_deref() {
        if let Some(decoded) = referral::decode(code) {
            repository::store_pending_code(&state.db, code).await?;
            info!("Referral code detected for lecture {}", decoded.lecture_id);
            return Ok(Json(ReferralLandingResponse {
                referral_detected: true,
                lecture_id: Some(decoded.lecture_id),
            }));
        }
    }

    Ok(Json(ReferralLandingResponse {
        referral_detected: false,
        lecture_id: None,
    }))
}

#[derive(Debug, Serialize)]
struct SignupResponse {
    profile: Profile,
    #[serde(skip_serializing_if = "Option::is_none")]
    referred_by: Option<ReferralCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_lecture_id: Option<String>,
}

async fn signup(
    State(state): State<AppState>,
    Json(req): Json<NewProfileRequest>,
) -> Result<Json<SignupResponse>, AppError> {
    if req.username.trim().is_empty() || req.email.is_empty() || req.mobile.is_empty() {
        return Err(AppError::BadRequest("please fill in all fields".to_string()));
    }
    if !valid_email(&req.email) {
        return Err(AppError::BadRequest("please enter a valid email address".to_string()));
    }
    if !valid_mobile(&req.mobile) {
        return Err(AppError::BadRequest(
            "please enter a valid 10-digit mobile number".to_string(),
        ));
    }
    if repository::find_profile_by_email(&state.db, &req.email).await?.is_some() {
        return Err(AppError::Conflict(
            "an account with this email already exists".to_string(),
        ));
    }
    if repository::find_profile_by_username(&state.db, &req.username)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("this username is taken".to_string()));
    }

    // The stash is cleared here whichever path wins; an invalid code
    // degrades to an ordinary signup.
    let pending = repository::take_pending_code(&state.db).await?;
    let referral = req
        .referral_code
        .as_deref()
        .and_then(referral::decode)
        .or_else(|| pending.as_deref().and_then(referral::decode));

    let profile = repository::insert_profile(&state.db, req, referral.clone()).await?;
    let redirect_lecture_id = referral.as_ref().map(|c| c.lecture_id.clone());

    Ok(Json(SignupResponse {
        profile,
        referred_by: referral,
        redirect_lecture_id,
    }))
}

#[derive(Deserialize)]
struct PromoteRequest {
    email: String,
}

async fn promote_admin(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PromoteRequest>,
) -> Result<Json<Profile>, AppError> {
    // The first promotion bootstraps the instance; after that it is
    // admin-only.
    if repository::admin_count(&state.db).await? > 0 {
        require_admin(&state.db, &headers).await?;
    }

    let promoted = repository::promote_profile_by_email(&state.db, &req.email).await?;
    if !promoted {
        return Err(AppError::NotFound);
    }
    let profile = repository::find_profile_by_email(&state.db, &req.email)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(profile))
}

async fn seed_data(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<services::SeedStats>, AppError> {
    require_admin(&state.db, &headers).await?;
    let stats = services::seed_sample_data(&state.db).await?;
    Ok(Json(stats))
}

fn valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let clean = |s: &str| !s.is_empty() && !s.chars().any(|c| c.is_whitespace() || c == '@');
    match domain.rsplit_once('.') {
        Some((host, tld)) => clean(local) && clean(host) && clean(tld),
        None => false,
    }
}

fn valid_mobile(mobile: &str) -> bool {
    mobile.len() == 10 && mobile.bytes().all(|b| b.is_ascii_digit())
}
