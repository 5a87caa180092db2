/// Authentication and role middleware
///
/// [`protect`] resolves the caller from the bearer token or `token` cookie and
/// inserts an [`AuthContext`] into the request extensions. [`require_roles`]
/// runs after it and rejects callers whose role is not in the route's
/// allow-list.
///
/// # Example
///
/// ```no_run
/// use axum::{extract::Request, middleware::{self, Next}, routing::post, Router};
/// use devcamper_api::app::AppState;
/// use devcamper_api::middleware::auth::{protect, require_roles};
/// use devcamper_shared::auth::authorization::PUBLISHER_ROLES;
///
/// # fn example(state: AppState) -> Router<AppState> {
/// # async fn handler() {}
/// Router::new()
///     .route("/bootcamps", post(handler))
///     .route_layer(middleware::from_fn(|req: Request, next: Next| {
///         require_roles(PUBLISHER_ROLES, req, next)
///     }))
///     .route_layer(middleware::from_fn_with_state(state, protect))
/// # }
/// ```

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use devcamper_shared::auth::{
    authorization::require_role,
    middleware::{authenticate, AuthContext},
};
use devcamper_shared::models::user::UserRole;

use crate::{app::AppState, error::ApiError};

/// Requires a valid session and attaches the caller
pub async fn protect(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = authenticate(&state.db, request.headers(), state.jwt_secret()).await?;

    request.extensions_mut().insert(auth);

    Ok(next.run(request).await)
}

/// Rejects callers whose role is not in `allowed`
///
/// Must run inside [`protect`].
pub async fn require_roles(
    allowed: &'static [UserRole],
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = request
        .extensions()
        .get::<AuthContext>()
        .ok_or_else(|| ApiError::Unauthorized("Not authorized to access this route".to_string()))?;

    if let Err(err) = require_role(auth, allowed) {
        tracing::warn!(user_id = %auth.user_id(), role = auth.role().as_str(), "Role check failed");
        return Err(err.into());
    }

    Ok(next.run(request).await)
}
