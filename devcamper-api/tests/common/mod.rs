//! Common test utilities for integration tests
//!
//! This module provides shared infrastructure for integration tests:
//! - Test database setup (skipped without `DATABASE_URL`)
//! - Deterministic geocoder and recording/failing mailers
//! - User registration and token helpers
//! - Request helpers driving the router directly

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use devcamper_api::app::{build_router, AppState};
use devcamper_api::config::Config;
use devcamper_shared::db::migrations::{ensure_database_exists, run_migrations};
use devcamper_shared::db::pool::{connect, PoolSettings};
use devcamper_shared::geo::{GeocodeError, GeocodedLocation, Geocoder};
use devcamper_shared::mail::{EmailMessage, MailError, Mailer};
use serde_json::Value;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::Service as _;
use uuid::Uuid;

pub const PASSWORD: &str = "123456";

/// Every address resolves to Boston, MA 02118
pub struct StaticGeocoder;

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn geocode(&self, query: &str) -> Result<GeocodedLocation, GeocodeError> {
        if query.trim().is_empty() {
            return Err(GeocodeError::NoResults(query.to_string()));
        }

        Ok(GeocodedLocation {
            latitude: 42.3396,
            longitude: -71.0769,
            formatted_address: Some("233 Bay State Rd, Boston, MA 02118-1234, US".to_string()),
            street: Some("233 Bay State Rd".to_string()),
            city: Some("Boston".to_string()),
            state: Some("MA".to_string()),
            zipcode: Some("02118".to_string()),
            country: Some("US".to_string()),
        })
    }
}

/// Keeps every message it is asked to send
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingMailer {
    pub fn last(&self) -> Option<EmailMessage> {
        self.sent.lock().ok()?.last().cloned()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message);
        }
        Ok(())
    }
}

/// Refuses every message
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _message: EmailMessage) -> Result<(), MailError> {
        Err(MailError::Delivery("relay refused connection".to_string()))
    }
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: Router,
    pub mailer: Arc<RecordingMailer>,
}

/// A parsed response
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

impl TestContext {
    /// Creates a context, or `None` when `DATABASE_URL` is unset
    pub async fn try_new() -> Option<Self> {
        Self::with_mailer_and(|_| {}).await
    }

    /// Like [`TestContext::try_new`] with extra configuration variables
    pub async fn with_mailer_and<F>(adjust: F) -> Option<Self>
    where
        F: FnOnce(&mut HashMap<String, String>),
    {
        let mailer = Arc::new(RecordingMailer::default());
        let (db, app) = build(adjust, mailer.clone()).await?;
        Some(Self { db, app, mailer })
    }

    /// A context whose mailer always fails
    pub async fn with_failing_mailer() -> Option<Self> {
        let (db, app) = build(|_| {}, Arc::new(FailingMailer)).await?;
        Some(Self {
            db,
            app,
            mailer: Arc::new(RecordingMailer::default()),
        })
    }

    /// Sends a request, with an optional bearer token and JSON body
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.call(request).await
    }

    pub async fn call(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().call(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Registers a user with `role` and returns `(token, user_id)`
    ///
    /// Admins cannot self-register; they are registered as users and promoted.
    pub async fn register(&self, role: &str) -> (String, Uuid) {
        let email = format!("{}-{}@test.devcamper.io", role, unique());
        let requested = if role == "admin" { "user" } else { role };

        let response = self
            .send(
                "POST",
                "/api/v1/auth/register",
                None,
                Some(serde_json::json!({
                    "name": format!("Test {}", role),
                    "email": email,
                    "password": PASSWORD,
                    "role": requested
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);

        let token = response.body["token"].as_str().unwrap().to_string();
        let me = self.send("GET", "/api/v1/auth/me", Some(&token), None).await;
        let id: Uuid = me.body["data"]["_id"].as_str().unwrap().parse().unwrap();

        if role == "admin" {
            sqlx::query("UPDATE users SET role = 'admin' WHERE id = $1")
                .bind(id)
                .execute(&self.db)
                .await
                .unwrap();
        }

        (token, id)
    }

    /// Creates a bootcamp as `token`'s owner and returns its JSON
    pub async fn create_bootcamp(&self, token: &str, name: &str) -> Value {
        let response = self
            .send(
                "POST",
                "/api/v1/bootcamps",
                Some(token),
                Some(serde_json::json!({
                    "name": name,
                    "description": "Full stack web development",
                    "website": "https://devworks.com",
                    "email": "enroll@devworks.com",
                    "address": "233 Bay State Rd Boston MA 02215",
                    "careers": ["Web Development", "UI/UX"],
                    "housing": true
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["data"].clone()
    }

    /// Adds a course and returns its JSON
    pub async fn create_course(&self, token: &str, bootcamp_id: &str, tuition: f64) -> Value {
        let response = self
            .send(
                "POST",
                &format!("/api/v1/bootcamps/{}/courses", bootcamp_id),
                Some(token),
                Some(serde_json::json!({
                    "title": "Full Stack Web Development",
                    "description": "Node, React and MongoDB",
                    "weeks": "12",
                    "tuition": tuition,
                    "minimumSkill": "intermediate"
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["data"].clone()
    }
}

async fn build<F>(adjust: F, mailer: Arc<dyn Mailer>) -> Option<(PgPool, Router)>
where
    F: FnOnce(&mut HashMap<String, String>),
{
    let url = std::env::var("DATABASE_URL").ok()?;

    ensure_database_exists(&url)
        .await
        .expect("Failed to create database");

    let db = connect(&PoolSettings::new(url.clone(), 5))
        .await
        .expect("Failed to create pool");

    run_migrations(&db).await.expect("Failed to run migrations");

    let upload_dir = std::env::temp_dir().join(format!("devcamper-uploads-{}", unique()));

    let mut vars: HashMap<String, String> = [
        ("DATABASE_URL", url.as_str()),
        ("JWT_SECRET", "integration-test-secret-at-least-32-bytes"),
        ("RATE_LIMIT_MAX", "100000"),
        ("MAX_FILE_UPLOAD", "1024"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    vars.insert(
        "FILE_UPLOAD_PATH".to_string(),
        upload_dir.to_string_lossy().into_owned(),
    );
    adjust(&mut vars);

    let config = Config::from_lookup(|key| vars.get(key).cloned()).expect("Invalid test config");
    tokio::fs::create_dir_all(&config.uploads.path)
        .await
        .expect("Failed to create upload dir");

    let state = AppState::with_services(db.clone(), config, Arc::new(StaticGeocoder), mailer);

    Some((db, build_router(state)))
}

/// Short random suffix for unique names
pub fn unique() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}
