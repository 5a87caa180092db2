/// User administration endpoints (admin only)
///
/// # Endpoints
///
/// - `GET    /api/v1/users` - Filtered, sorted, paginated list
/// - `POST   /api/v1/users` - Create a user with any role
/// - `GET    /api/v1/users/:id` - One user
/// - `PUT    /api/v1/users/:id` - Update name, email or role
/// - `DELETE /api/v1/users/:id` - Delete a user owning nothing

use crate::{
    app::AppState,
    error::{ApiError, ApiJson, ApiPath, ApiQuery, ApiResult},
    routes::{data, empty, DataResponse},
};
use axum::{extract::State, http::StatusCode, Json};
use devcamper_shared::{
    auth::password,
    models::user::{CreateUser, UpdateUser, User, UserRole},
    query::{fetch_page, AdvancedResults, ListQuery, Listable},
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(
        required(message = "Please add a name"),
        length(min = 1, message = "Please add a name")
    )]
    pub name: Option<String>,

    #[validate(
        required(message = "Please add an email"),
        email(message = "Please add a valid email")
    )]
    pub email: Option<String>,

    #[validate(
        required(message = "Please add a password"),
        length(min = 6, message = "Password must be at least 6 characters")
    )]
    pub password: Option<String>,

    pub role: Option<UserRole>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, message = "Please add a name"))]
    pub name: Option<String>,

    #[validate(email(message = "Please add a valid email"))]
    pub email: Option<String>,

    pub role: Option<UserRole>,
}

pub async fn list_users(
    State(state): State<AppState>,
    ApiQuery(pairs): ApiQuery<Vec<(String, String)>>,
) -> ApiResult<Json<AdvancedResults>> {
    let query = ListQuery::parse(&pairs, User::RESOURCE)?;
    let page = fetch_page::<User>(&state.db, &query).await?;

    let data = page
        .items
        .iter()
        .map(|user| serde_json::to_value(user).map(|v| query.project(v)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(AdvancedResults::new(data, page.pagination)))
}

pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<DataResponse<User>>> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", id))?;

    Ok(data(user))
}

/// Create a user; unlike registration any role may be assigned
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<DataResponse<User>>)> {
    req.validate()?;

    let password_hash = password::hash_password_async(req.password.unwrap_or_default()).await?;

    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name.unwrap_or_default(),
            email: req.email.unwrap_or_default(),
            password_hash,
            role: req.role.unwrap_or_default(),
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "User created by admin");

    Ok((StatusCode::CREATED, data(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> ApiResult<Json<DataResponse<User>>> {
    req.validate()?;

    let user = User::update(
        &state.db,
        id,
        UpdateUser {
            name: req.name,
            email: req.email,
            role: req.role,
        },
    )
    .await?
    .ok_or_else(|| ApiError::not_found("User", id))?;

    Ok(data(user))
}

/// Delete a user
///
/// # Errors
///
/// - 400 Bad Request: the user still owns bootcamps, courses or reviews
/// - 404 Not Found: no such user
pub async fn delete_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<DataResponse<Value>>> {
    if !User::delete(&state.db, id).await? {
        return Err(ApiError::not_found("User", id));
    }

    tracing::info!(user_id = %id, "User deleted");

    Ok(empty())
}
