/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/v1/auth/register` - Register and start a session
/// - `POST /api/v1/auth/login` - Start a session
/// - `GET  /api/v1/auth/logout` - End the session cookie
/// - `GET  /api/v1/auth/me` - Current user
/// - `PUT  /api/v1/auth/updatedetails` - Change name/email
/// - `PUT  /api/v1/auth/changepassword` - Change password
/// - `POST /api/v1/auth/forgotpassword` - Email a reset link
/// - `PUT  /api/v1/auth/resetpassword/:resettoken` - Set a new password
///
/// Every endpoint that starts a session answers `{ "success": true, "token": "..." }`
/// and sets the same token in an HTTP-only `token` cookie.

use crate::{
    app::AppState,
    error::{ApiError, ApiJson, ApiPath, ApiResult},
    routes::{data, empty, DataResponse},
};
use axum::{
    extract::{Extension, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use devcamper_shared::{
    auth::{
        jwt,
        middleware::{AuthContext, LOGGED_OUT_TOKEN, TOKEN_COOKIE},
        password,
        reset_token::{generate_reset_token, hash_reset_token, reset_token_expiry},
    },
    mail::EmailMessage,
    models::user::{CreateUser, UpdateUser, User, UserRole},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
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

    /// `user` or `publisher`; defaults to `user`
    pub role: Option<UserRole>,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDetailsRequest {
    #[validate(length(min = 1, message = "Please add a name"))]
    pub name: Option<String>,

    #[validate(email(message = "Please add a valid email"))]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(required(message = "Please provide your current password"))]
    pub current_password: Option<String>,

    #[validate(
        required(message = "Please add a new password"),
        length(min = 6, message = "Password must be at least 6 characters")
    )]
    pub new_password: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(
        required(message = "Please add an email"),
        email(message = "Please add a valid email")
    )]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(
        required(message = "Please add a password"),
        length(min = 6, message = "Password must be at least 6 characters")
    )]
    pub password: Option<String>,
}

/// Session response body
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub success: bool,
    pub token: String,
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid credentials".to_string())
}

/// Builds a `token` cookie
pub fn session_cookie(value: &str, max_age: Duration, secure: bool) -> String {
    let expires = (Utc::now() + max_age).format("%a, %d %b %Y %H:%M:%S GMT");

    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; Max-Age={}; Expires={}",
        TOKEN_COOKIE,
        value,
        max_age.num_seconds(),
        expires
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn with_cookie(mut response: Response, cookie: &str) -> ApiResult<Response> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|e| ApiError::InternalError(format!("Invalid cookie header: {}", e)))?;
    response.headers_mut().insert(header::SET_COOKIE, value);
    Ok(response)
}

/// Signs a token for `user` and returns it in both body and cookie
fn session_response(state: &AppState, user: &User, status: StatusCode) -> ApiResult<Response> {
    let config = &state.config;
    let token = jwt::issue_session_token(user.id, state.jwt_secret(), config.jwt.expire)?;

    let cookie = session_cookie(
        &token,
        Duration::days(config.jwt.cookie_expire_days),
        config.is_production(),
    );

    let body = Json(TokenResponse {
        success: true,
        token,
    });

    with_cookie((status, body).into_response(), &cookie)
}

/// Register a new user
///
/// ```text
/// POST /api/v1/auth/register
///
/// { "name": "John Doe", "email": "john@gmail.com", "password": "123456", "role": "publisher" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: validation failed, admin role requested, or email taken
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<Response> {
    req.validate()?;

    let role = req.role.unwrap_or_default();
    if !role.is_self_assignable() {
        return Err(ApiError::BadRequest(format!(
            "Role {} cannot be chosen at registration",
            role.as_str()
        )));
    }

    let password_hash = password::hash_password_async(req.password.unwrap_or_default()).await?;

    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name.unwrap_or_default(),
            email: req.email.unwrap_or_default(),
            password_hash,
            role,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, role = role.as_str(), "User registered");

    session_response(&state, &user, StatusCode::OK)
}

/// Log in with email and password
///
/// Unknown email and wrong password fail identically.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Response> {
    let email = req.email.filter(|e| !e.trim().is_empty());
    let password = req.password.filter(|p| !p.is_empty());

    let (Some(email), Some(password)) = (email, password) else {
        return Err(ApiError::BadRequest(
            "Please provide an email and password".to_string(),
        ));
    };

    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        password::verify_against_dummy_async(password).await;
        tracing::debug!("Login for unknown email");
        return Err(invalid_credentials());
    };

    if !password::verify_password_async(password, user.password_hash.clone()).await? {
        tracing::debug!(user_id = %user.id, "Login with wrong password");
        return Err(invalid_credentials());
    }

    session_response(&state, &user, StatusCode::OK)
}

/// Overwrite the session cookie
pub async fn logout(State(state): State<AppState>) -> ApiResult<Response> {
    let cookie = session_cookie(
        LOGGED_OUT_TOKEN,
        Duration::seconds(10),
        state.config.is_production(),
    );

    with_cookie(empty().into_response(), &cookie)
}

/// Current user
pub async fn me(Extension(auth): Extension<AuthContext>) -> Json<DataResponse<User>> {
    data(auth.user)
}

/// Update the caller's name and email
pub async fn update_details(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<UpdateDetailsRequest>,
) -> ApiResult<Json<DataResponse<User>>> {
    req.validate()?;

    let user = User::update(
        &state.db,
        auth.user_id(),
        UpdateUser {
            name: req.name,
            email: req.email,
            role: None,
        },
    )
    .await?
    .ok_or_else(|| ApiError::not_found("User", auth.user_id()))?;

    Ok(data(user))
}

/// Change the caller's password after checking the current one
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> ApiResult<Response> {
    req.validate()?;

    let current = req.current_password.unwrap_or_default();
    if !password::verify_password_async(current, auth.user.password_hash.clone()).await? {
        return Err(ApiError::Unauthorized("Password is incorrect".to_string()));
    }

    let password_hash = password::hash_password_async(req.new_password.unwrap_or_default()).await?;
    let user = User::set_password(&state.db, auth.user_id(), &password_hash)
        .await?
        .ok_or_else(|| ApiError::not_found("User", auth.user_id()))?;

    tracing::info!(user_id = %user.id, "Password changed");

    session_response(&state, &user, StatusCode::OK)
}

/// Email a password reset link
///
/// The link points at `{scheme}://{host}/api/v1/auth/resetpassword/{token}`.
/// When the mail cannot be sent the pending token is cleared again.
pub async fn forgot_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<ForgotPasswordRequest>,
) -> ApiResult<Json<DataResponse<&'static str>>> {
    req.validate()?;

    let email = req.email.unwrap_or_default();
    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("There is no user with that email".to_string()))?;

    let (token, token_hash) = generate_reset_token();
    User::set_reset_token(&state.db, user.id, &token_hash, reset_token_expiry()).await?;

    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| state.config.bind_address());

    let reset_url = format!(
        "{}://{}/api/v1/auth/resetpassword/{}",
        state.config.public_scheme(),
        host,
        token
    );

    let message = EmailMessage {
        to: user.email.clone(),
        subject: "Password reset token".to_string(),
        text: format!(
            "You are receiving this email because you (or someone else) has requested \
             the reset of a password. Please make a PUT request to: \n\n {}",
            reset_url
        ),
    };

    if let Err(e) = state.mailer.send(message).await {
        tracing::error!(error = %e, user_id = %user.id, "Reset email failed");
        User::clear_reset_token(&state.db, user.id).await?;
        return Err(ApiError::ServerError("Email could not be sent".to_string()));
    }

    tracing::info!(user_id = %user.id, "Reset email sent");

    Ok(data("Email sent"))
}

/// Set a new password with a reset token
pub async fn reset_password(
    State(state): State<AppState>,
    ApiPath(reset_token): ApiPath<String>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> ApiResult<Response> {
    req.validate()?;

    let token_hash = hash_reset_token(&reset_token);
    let user = User::find_by_reset_token(&state.db, &token_hash)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Invalid token".to_string()))?;

    let password_hash = password::hash_password_async(req.password.unwrap_or_default()).await?;
    let user = User::set_password(&state.db, user.id, &password_hash)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Invalid token".to_string()))?;

    tracing::info!(user_id = %user.id, "Password reset");

    session_response(&state, &user, StatusCode::OK)
}
