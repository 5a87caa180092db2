/// Request authentication
///
/// A session token can arrive two ways:
/// - `Authorization: Bearer <token>` (checked first)
/// - the `token` cookie set by the login/register responses
///
/// After the token verifies, the subject is resolved to a live user record.
/// Tokens for deleted users are rejected even if the signature is still valid.
///
/// # Example
///
/// ```no_run
/// use axum::http::HeaderMap;
/// use devcamper_shared::auth::middleware::authenticate;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, headers: HeaderMap) -> Result<(), Box<dyn std::error::Error>> {
/// let auth = authenticate(&pool, &headers, "secret").await?;
/// println!("Caller: {} ({})", auth.user.email, auth.role().as_str());
/// # Ok(())
/// # }
/// ```

use axum::http::{header, HeaderMap};
use sqlx::PgPool;
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};
use crate::models::user::{User, UserRole};

/// Name of the session cookie
pub const TOKEN_COOKIE: &str = "token";

/// Cookie value written on logout
pub const LOGGED_OUT_TOKEN: &str = "none";

/// Authentication context added to request extensions
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The authenticated user, freshly loaded from the database
    pub user: User,
}

impl AuthContext {
    pub fn new(user: User) -> Self {
        Self { user }
    }

    pub fn user_id(&self) -> Uuid {
        self.user.id
    }

    pub fn role(&self) -> UserRole {
        self.user.role
    }

    pub fn is_admin(&self) -> bool {
        self.user.role == UserRole::Admin
    }
}

/// Error type for request authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No bearer token and no usable cookie
    #[error("Not authorized to access this route")]
    MissingCredentials,

    /// Token failed signature, issuer or expiry checks
    #[error("Invalid token: {0}")]
    InvalidToken(#[from] JwtError),

    /// Token subject no longer exists
    #[error("User {0} no longer exists")]
    UnknownUser(Uuid),

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Extracts the session token from the request headers
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    cookie_value(headers, TOKEN_COOKIE)
        .filter(|t| !t.is_empty() && *t != LOGGED_OUT_TOKEN)
        .map(str::to_string)
}

/// Looks up a cookie by name across all `Cookie` headers
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
}

/// Verifies the request's session token and loads the caller
pub async fn authenticate(
    pool: &PgPool,
    headers: &HeaderMap,
    secret: &str,
) -> Result<AuthContext, AuthError> {
    let token = extract_token(headers).ok_or(AuthError::MissingCredentials)?;

    let claims = validate_token(&token, secret)?;

    let user = User::find_by_id(pool, claims.sub)
        .await?
        .ok_or(AuthError::UnknownUser(claims.sub))?;

    tracing::debug!(user_id = %user.id, role = user.role.as_str(), "Request authenticated");

    Ok(AuthContext::new(user))
}
