/// Course endpoints
///
/// # Endpoints
///
/// - `GET    /api/v1/courses` - Filtered, sorted, paginated list
/// - `GET    /api/v1/bootcamps/:id/courses` - All courses of one bootcamp
/// - `POST   /api/v1/bootcamps/:id/courses` - Add a course (bootcamp owner/admin)
/// - `GET    /api/v1/courses/:id` - One course
/// - `PUT    /api/v1/courses/:id` - Update (course owner/admin)
/// - `DELETE /api/v1/courses/:id` - Delete (course owner/admin)
///
/// Every write recomputes the parent bootcamp's `averageCost` in the same
/// transaction, with the bootcamp row locked.

use crate::{
    app::AppState,
    error::{ApiError, ApiJson, ApiPath, ApiQuery, ApiResult},
    routes::{data, empty, list, string_or_number, with_bootcamp_summaries, DataResponse},
};
use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use devcamper_shared::{
    auth::{authorization::require_owner_or_admin_to, middleware::AuthContext},
    models::{
        bootcamp::Bootcamp,
        course::{recompute_average_cost, Course, CreateCourse, SkillLevel, UpdateCourse},
    },
    query::{fetch_page, AdvancedResults, ListQuery, Listable},
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    #[validate(
        required(message = "Please add a course title"),
        length(min = 1, message = "Please add a course title")
    )]
    pub title: Option<String>,

    #[validate(required(message = "Please add a description"))]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "string_or_number")]
    #[validate(required(message = "Please add number of weeks"))]
    pub weeks: Option<String>,

    #[validate(
        required(message = "Please add a tuition cost"),
        range(min = 0.0, message = "Tuition can not be negative")
    )]
    pub tuition: Option<f64>,

    #[validate(required(message = "Please add a minimum skill"))]
    pub minimum_skill: Option<SkillLevel>,

    #[serde(default)]
    pub scholarship_available: bool,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseRequest {
    #[validate(length(min = 1, message = "Please add a course title"))]
    pub title: Option<String>,

    pub description: Option<String>,

    #[serde(default, deserialize_with = "string_or_number")]
    pub weeks: Option<String>,

    #[validate(range(min = 0.0, message = "Tuition can not be negative"))]
    pub tuition: Option<f64>,

    pub minimum_skill: Option<SkillLevel>,
    pub scholarship_available: Option<bool>,
}

async fn find_course(state: &AppState, id: Uuid) -> ApiResult<Course> {
    Course::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course", id))
}

/// List courses with their bootcamp's name and description
pub async fn list_courses(
    State(state): State<AppState>,
    ApiQuery(pairs): ApiQuery<Vec<(String, String)>>,
) -> ApiResult<Json<AdvancedResults>> {
    let query = ListQuery::parse(&pairs, Course::RESOURCE)?;
    let page = fetch_page::<Course>(&state.db, &query).await?;

    let values = if query.includes("bootcamp") {
        with_bootcamp_summaries(&state.db, &page.items, |c| c.bootcamp_id).await?
    } else {
        page.items
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?
    };

    let data = values.into_iter().map(|v| query.project(v)).collect();

    Ok(Json(AdvancedResults::new(data, page.pagination)))
}

/// All courses of one bootcamp, unpaginated
pub async fn list_bootcamp_courses(
    State(state): State<AppState>,
    ApiPath(bootcamp_id): ApiPath<Uuid>,
) -> ApiResult<Json<DataResponse<Vec<Course>>>> {
    let courses = Course::list_by_bootcamp(&state.db, bootcamp_id).await?;
    Ok(list(courses))
}

/// One course with its bootcamp's name and description
pub async fn get_course(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<DataResponse<Value>>> {
    let course = find_course(&state, id).await?;

    let mut values =
        with_bootcamp_summaries(&state.db, std::slice::from_ref(&course), |c| c.bootcamp_id)
            .await?;

    Ok(data(values.pop().unwrap_or(Value::Null)))
}

/// Add a course to a bootcamp the caller owns
pub async fn create_course(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(bootcamp_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<CreateCourseRequest>,
) -> ApiResult<(StatusCode, Json<DataResponse<Course>>)> {
    let bootcamp = Bootcamp::find_by_id(&state.db, bootcamp_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Bootcamp", bootcamp_id))?;

    require_owner_or_admin_to(
        &auth,
        bootcamp.user_id,
        &format!("add a course to bootcamp {}", bootcamp.id),
    )?;

    req.validate()?;

    let mut tx = state.db.begin().await?;
    if !Bootcamp::lock_for_update(&mut tx, bootcamp_id).await? {
        return Err(ApiError::not_found("Bootcamp", bootcamp_id));
    }

    let course = Course::create(
        &mut *tx,
        CreateCourse {
            title: req.title.unwrap_or_default(),
            description: req.description.unwrap_or_default(),
            weeks: req.weeks.unwrap_or_default(),
            tuition: req.tuition.unwrap_or_default(),
            minimum_skill: req.minimum_skill.unwrap_or(SkillLevel::Beginner),
            scholarship_available: req.scholarship_available,
            bootcamp_id,
            user_id: auth.user_id(),
        },
    )
    .await?;

    recompute_average_cost(&mut tx, bootcamp_id).await?;
    tx.commit().await?;

    tracing::info!(course_id = %course.id, bootcamp_id = %bootcamp_id, "Course created");

    Ok((StatusCode::CREATED, data(course)))
}

/// Update a course the caller owns
pub async fn update_course(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateCourseRequest>,
) -> ApiResult<Json<DataResponse<Course>>> {
    let course = find_course(&state, id).await?;
    require_owner_or_admin_to(&auth, course.user_id, &format!("update course {}", course.id))?;

    req.validate()?;

    let mut tx = state.db.begin().await?;
    Bootcamp::lock_for_update(&mut tx, course.bootcamp_id).await?;

    let updated = Course::update(
        &mut *tx,
        id,
        UpdateCourse {
            title: req.title,
            description: req.description,
            weeks: req.weeks,
            tuition: req.tuition,
            minimum_skill: req.minimum_skill,
            scholarship_available: req.scholarship_available,
        },
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Course", id))?;

    recompute_average_cost(&mut tx, updated.bootcamp_id).await?;
    tx.commit().await?;

    Ok(data(updated))
}

/// Delete a course the caller owns
pub async fn delete_course(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<DataResponse<Value>>> {
    let course = find_course(&state, id).await?;
    require_owner_or_admin_to(&auth, course.user_id, &format!("delete course {}", course.id))?;

    let mut tx = state.db.begin().await?;
    Bootcamp::lock_for_update(&mut tx, course.bootcamp_id).await?;

    if !Course::delete(&mut *tx, id).await? {
        return Err(ApiError::not_found("Course", id));
    }

    let average_cost = recompute_average_cost(&mut tx, course.bootcamp_id).await?;
    tx.commit().await?;

    tracing::info!(course_id = %id, bootcamp_id = %course.bootcamp_id, ?average_cost, "Course deleted");

    Ok(empty())
}
