/// Review endpoints
///
/// # Endpoints
///
/// - `GET    /api/v1/reviews` - Filtered, sorted, paginated list
/// - `GET    /api/v1/bootcamps/:id/reviews` - All reviews of one bootcamp
/// - `POST   /api/v1/bootcamps/:id/reviews` - Review a bootcamp (user/admin)
/// - `GET    /api/v1/reviews/:id` - One review
/// - `PUT    /api/v1/reviews/:id` - Update (review owner/admin)
/// - `DELETE /api/v1/reviews/:id` - Delete (review owner/admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiJson, ApiPath, ApiQuery, ApiResult},
    routes::{data, empty, list, with_bootcamp_summaries, DataResponse},
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
        review::{recompute_average_rating, CreateReview, Review, UpdateReview},
    },
    query::{fetch_page, AdvancedResults, ListQuery, Listable},
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[validate(
        required(message = "Please add a title for the review"),
        length(min = 1, max = 100, message = "Title can not be more than 100 characters")
    )]
    pub title: Option<String>,

    #[validate(
        required(message = "Please add some text"),
        length(min = 1, message = "Please add some text")
    )]
    pub text: Option<String>,

    #[validate(
        required(message = "Please add a rating between 1 and 10"),
        range(min = 1, max = 10, message = "Please add a rating between 1 and 10")
    )]
    pub rating: Option<i16>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateReviewRequest {
    #[validate(length(min = 1, max = 100, message = "Title can not be more than 100 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, message = "Please add some text"))]
    pub text: Option<String>,

    #[validate(range(min = 1, max = 10, message = "Please add a rating between 1 and 10"))]
    pub rating: Option<i16>,
}

async fn find_review(state: &AppState, id: Uuid) -> ApiResult<Review> {
    Review::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Review", id))
}

pub async fn list_reviews(
    State(state): State<AppState>,
    ApiQuery(pairs): ApiQuery<Vec<(String, String)>>,
) -> ApiResult<Json<AdvancedResults>> {
    let query = ListQuery::parse(&pairs, Review::RESOURCE)?;
    let page = fetch_page::<Review>(&state.db, &query).await?;

    let values = if query.includes("bootcamp") {
        with_bootcamp_summaries(&state.db, &page.items, |r| r.bootcamp_id).await?
    } else {
        page.items
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?
    };

    let data = values.into_iter().map(|v| query.project(v)).collect();

    Ok(Json(AdvancedResults::new(data, page.pagination)))
}

pub async fn list_bootcamp_reviews(
    State(state): State<AppState>,
    ApiPath(bootcamp_id): ApiPath<Uuid>,
) -> ApiResult<Json<DataResponse<Vec<Review>>>> {
    let reviews = Review::list_by_bootcamp(&state.db, bootcamp_id).await?;
    Ok(list(reviews))
}

pub async fn get_review(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<DataResponse<Value>>> {
    let review = find_review(&state, id).await?;

    let mut values =
        with_bootcamp_summaries(&state.db, std::slice::from_ref(&review), |r| r.bootcamp_id)
            .await?;

    Ok(data(values.pop().unwrap_or(Value::Null)))
}

/// Review a bootcamp
///
/// # Errors
///
/// - 404 Not Found: bootcamp does not exist
/// - 400 Bad Request: invalid payload, or the caller already reviewed this bootcamp
pub async fn create_review(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(bootcamp_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<CreateReviewRequest>,
) -> ApiResult<(StatusCode, Json<DataResponse<Review>>)> {
    req.validate()?;

    let mut tx = state.db.begin().await?;
    if !Bootcamp::lock_for_update(&mut tx, bootcamp_id).await? {
        return Err(ApiError::not_found("Bootcamp", bootcamp_id));
    }

    let review = Review::create(
        &mut *tx,
        CreateReview {
            title: req.title.unwrap_or_default(),
            text: req.text.unwrap_or_default(),
            rating: req.rating.unwrap_or_default(),
            bootcamp_id,
            user_id: auth.user_id(),
        },
    )
    .await?;

    recompute_average_rating(&mut tx, bootcamp_id).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, data(review)))
}

pub async fn update_review(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateReviewRequest>,
) -> ApiResult<Json<DataResponse<Review>>> {
    let review = find_review(&state, id).await?;
    require_owner_or_admin_to(&auth, review.user_id, &format!("update review {}", review.id))?;

    req.validate()?;

    let mut tx = state.db.begin().await?;
    Bootcamp::lock_for_update(&mut tx, review.bootcamp_id).await?;

    let updated = Review::update(
        &mut *tx,
        id,
        UpdateReview {
            title: req.title,
            text: req.text,
            rating: req.rating,
        },
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Review", id))?;

    recompute_average_rating(&mut tx, updated.bootcamp_id).await?;
    tx.commit().await?;

    Ok(data(updated))
}

pub async fn delete_review(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<DataResponse<Value>>> {
    let review = find_review(&state, id).await?;
    require_owner_or_admin_to(&auth, review.user_id, &format!("delete review {}", review.id))?;

    let mut tx = state.db.begin().await?;
    Bootcamp::lock_for_update(&mut tx, review.bootcamp_id).await?;

    if !Review::delete(&mut *tx, id).await? {
        return Err(ApiError::not_found("Review", id));
    }

    recompute_average_rating(&mut tx, review.bootcamp_id).await?;
    tx.commit().await?;

    tracing::info!(review_id = %id, bootcamp_id = %review.bootcamp_id, "Review deleted");

    Ok(empty())
}
