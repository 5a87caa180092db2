/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use devcamper_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config)?;
/// let app = devcamper_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error,
    middleware::{
        auth::{protect, require_roles},
        rate_limit::{rate_limit_layer, RateLimiter},
        security::SecurityHeadersLayer,
    },
    routes,
};
use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state, Next},
    routing::{get, post, put},
    Router,
};
use devcamper_shared::{
    auth::authorization::{ADMIN_ROLES, PUBLISHER_ROLES, REVIEWER_ROLES},
    geo::{build_geocoder, Geocoder},
    mail::{build_mailer, Mailer},
    models::user::UserRole,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Room for multipart framing and JSON bodies on top of the photo limit
const BODY_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Address lookup for bootcamp locations and radius search
    pub geocoder: Arc<dyn Geocoder>,

    /// Outbound mail (password reset)
    pub mailer: Arc<dyn Mailer>,

    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Creates application state with the geocoder and mailer described by `config`
    pub fn new(db: PgPool, config: Config) -> anyhow::Result<Self> {
        let geocoder = build_geocoder(&config.geocoder)?;
        let mailer = build_mailer(config.smtp.as_ref())?;

        Ok(Self::with_services(db, config, geocoder, mailer))
    }

    /// Creates application state around explicit collaborators
    pub fn with_services(
        db: PgPool,
        config: Config,
        geocoder: Arc<dyn Geocoder>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(&config.rate_limit));

        Self {
            db,
            config: Arc::new(config),
            geocoder,
            mailer,
            rate_limiter,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Applies [`protect`] and then a role allow-list to every route of `router`
fn guarded(
    router: Router<AppState>,
    state: &AppState,
    roles: &'static [UserRole],
) -> Router<AppState> {
    router
        .route_layer(from_fn(move |req: Request, next: Next| {
            require_roles(roles, req, next)
        }))
        .route_layer(from_fn_with_state(state.clone(), protect))
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                              # Health check (public)
/// ├── /uploads/*                           # Uploaded photos (static)
/// └── /api/v1/
///     ├── /auth/                           # register, login, logout, me, ...
///     ├── /bootcamps                       # GET public, writes publisher/admin
///     │   ├── /radius/:zipcode/:distance
///     │   ├── /:id/photo
///     │   ├── /:id/courses                 # POST publisher/admin
///     │   └── /:id/reviews                 # POST user/admin
///     ├── /courses                         # GET public, writes publisher/admin
///     ├── /reviews                         # GET public, writes user/admin
///     └── /users                           # admin only
/// ```
///
/// Routes sharing a path but not an access rule live in separate routers
/// that are merged, so each method carries its own guard.
///
/// # Middleware Stack
///
/// Outermost first:
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
/// 4. Per-client rate limit
/// 5. Request body limit
/// 6. Authentication and roles (per route group)
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/logout", get(routes::auth::logout))
        .route("/auth/forgotpassword", post(routes::auth::forgot_password))
        .route(
            "/auth/resetpassword/:resettoken",
            put(routes::auth::reset_password),
        )
        .route("/bootcamps", get(routes::bootcamps::list_bootcamps))
        .route("/bootcamps/:id", get(routes::bootcamps::get_bootcamp))
        .route(
            "/bootcamps/radius/:zipcode/:distance",
            get(routes::bootcamps::bootcamps_in_radius),
        )
        .route(
            "/bootcamps/:id/courses",
            get(routes::courses::list_bootcamp_courses),
        )
        .route(
            "/bootcamps/:id/reviews",
            get(routes::reviews::list_bootcamp_reviews),
        )
        .route("/courses", get(routes::courses::list_courses))
        .route("/courses/:id", get(routes::courses::get_course))
        .route("/reviews", get(routes::reviews::list_reviews))
        .route("/reviews/:id", get(routes::reviews::get_review));

    let session_routes = Router::new()
        .route("/auth/me", get(routes::auth::me))
        .route("/auth/updatedetails", put(routes::auth::update_details))
        .route("/auth/changepassword", put(routes::auth::change_password))
        .route_layer(from_fn_with_state(state.clone(), protect));

    let publisher_routes = Router::new()
        .route("/bootcamps", post(routes::bootcamps::create_bootcamp))
        .route(
            "/bootcamps/:id",
            put(routes::bootcamps::update_bootcamp).delete(routes::bootcamps::delete_bootcamp),
        )
        .route("/bootcamps/:id/photo", put(routes::bootcamps::upload_photo))
        .route(
            "/bootcamps/:id/courses",
            post(routes::courses::create_course),
        )
        .route(
            "/courses/:id",
            put(routes::courses::update_course).delete(routes::courses::delete_course),
        );

    let reviewer_routes = Router::new()
        .route(
            "/bootcamps/:id/reviews",
            post(routes::reviews::create_review),
        )
        .route(
            "/reviews/:id",
            put(routes::reviews::update_review).delete(routes::reviews::delete_review),
        );

    let admin_routes = Router::new()
        .route(
            "/users",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route(
            "/users/:id",
            get(routes::users::get_user)
                .put(routes::users::update_user)
                .delete(routes::users::delete_user),
        );

    let v1_routes = Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .merge(guarded(publisher_routes, &state, PUBLISHER_ROLES))
        .merge(guarded(reviewer_routes, &state, REVIEWER_ROLES))
        .merge(guarded(admin_routes, &state, ADMIN_ROLES));

    let body_limit = state.config.uploads.max_file_upload + BODY_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api/v1", v1_routes)
        .nest_service("/uploads", ServeDir::new(&state.config.uploads.path))
        .fallback(error::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(from_fn_with_state(state.clone(), rate_limit_layer))
        .layer(SecurityHeadersLayer::new(state.config.is_production()))
        .layer(cors_layer(&state.config))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Permissive without configured origins, otherwise an explicit allow-list
fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_origins.is_empty() || config.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
