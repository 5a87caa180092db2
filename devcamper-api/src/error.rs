/// Error handling for the API server
///
/// Every failure leaves the server through [`ApiError`], which renders the
/// envelope `{ "success": false, "error": "<message>" }` with a matching status.
/// Shared-crate errors, sqlx errors, validation failures and extractor
/// rejections all convert into it, so handlers just use `?`.
///
/// # Example
///
/// ```no_run
/// use devcamper_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::{json, Value};
///
/// async fn handler(found: bool) -> ApiResult<Json<Value>> {
///     if !found {
///         return Err(ApiError::NotFound("Bootcamp not found".to_string()));
///     }
///     Ok(Json(json!({ "success": true })))
/// }
/// ```

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts,
    },
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use devcamper_shared::{
    auth::{authorization::AuthzError, jwt::JwtError, middleware::AuthError, password::PasswordError},
    geo::GeocodeError,
    query::QueryError,
};
use serde::Serialize;
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401): missing or invalid credentials
    Unauthorized(String),

    /// Forbidden (403): role or ownership mismatch
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Validation failed (400); one message per failed rule
    Validation(Vec<String>),

    /// Too many requests (429)
    RateLimitExceeded { retry_after: u64 },

    /// Server error (500) whose message is safe to show
    ServerError(String),

    /// Internal error (500); logged, never shown
    InternalError(String),

    /// Service unavailable (503)
    ServiceUnavailable(String),
}

/// Error response envelope
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// Message shown for internal errors
const SERVER_ERROR: &str = "Server Error";

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::ServerError(_) | ApiError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Client-visible message
    pub fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::ServerError(msg)
            | ApiError::ServiceUnavailable(msg) => msg.clone(),
            ApiError::Validation(messages) => messages.join(", "),
            ApiError::RateLimitExceeded { .. } => {
                "Too many requests, please try again later".to_string()
            }
            ApiError::InternalError(_) => SERVER_ERROR.to_string(),
        }
    }

    /// 404 for a missing resource id
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        ApiError::NotFound(format!("{} not found with id of {}", resource, id))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Validation(messages) => {
                write!(f, "Validation failed: {}", messages.join(", "))
            }
            ApiError::RateLimitExceeded { retry_after } => {
                write!(f, "Rate limit exceeded, retry after {}s", retry_after)
            }
            ApiError::ServerError(msg) => write!(f, "Server error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
            }
            ApiError::ServerError(msg) => tracing::error!("Server error: {}", msg),
            _ => tracing::debug!(status = %self.status(), error = %self, "Request failed"),
        }

        let body = Json(ErrorResponse {
            success: false,
            error: self.message(),
        });

        let mut response = (self.status(), body).into_response();

        if let ApiError::RateLimitExceeded { retry_after } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                // unique_violation
                Some("23505") => ApiError::BadRequest("Duplicate field value entered".to_string()),
                // check_violation
                Some("23514") => ApiError::BadRequest(match db_err.constraint() {
                    Some(constraint) => format!("Invalid value ({})", constraint),
                    None => "Invalid value".to_string(),
                }),
                // foreign_key_violation
                Some("23503") => {
                    ApiError::BadRequest("Related resource constraint violated".to_string())
                }
                _ => ApiError::InternalError(format!("Database error: {}", db_err)),
            },
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert validation failures to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let messages = fields
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", field))
                })
            })
            .collect();

        ApiError::Validation(messages)
    }
}

/// Convert auth errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::DatabaseError(db) => ApiError::from(db),
            AuthError::InvalidToken(JwtError::CreateError(msg)) => ApiError::InternalError(msg),
            AuthError::MissingCredentials
            | AuthError::InvalidToken(_)
            | AuthError::UnknownUser(_) => {
                ApiError::Unauthorized("Not authorized to access this route".to_string())
            }
        }
    }
}

/// Convert authorization errors to API errors
impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        ApiError::Forbidden(err.to_string())
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Convert JWT errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => ApiError::InternalError(format!("Token creation failed: {}", msg)),
            _ => ApiError::Unauthorized("Not authorized to access this route".to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::InternalError(format!("Serialization failed: {}", err))
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<GeocodeError> for ApiError {
    fn from(err: GeocodeError) -> Self {
        match err {
            GeocodeError::NoResults(_) => ApiError::BadRequest(err.to_string()),
            GeocodeError::NotConfigured => ApiError::ServerError(err.to_string()),
            GeocodeError::Transport(_) | GeocodeError::Provider(_) => {
                ApiError::InternalError(err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Malformed ids in the path read as a missing resource
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(rejection = %rejection.body_text(), "Path rejected");
        ApiError::NotFound("Resource not found".to_string())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(_: MultipartRejection) -> Self {
        ApiError::BadRequest("Please upload a file".to_string())
    }
}

/// `Json` extractor that rejects through [`ApiError`]
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Path` extractor that rejects through [`ApiError`]
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// `Query` extractor that rejects through [`ApiError`]
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Fallback for unknown routes
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}
