//! Shared helpers for database-backed tests.
//!
//! Tests skip (return early) when `DATABASE_URL` is unset.

#![allow(dead_code)]

use devcamper_shared::db::migrations::{ensure_database_exists, run_migrations};
use devcamper_shared::db::pool::{connect, PoolSettings};
use devcamper_shared::models::bootcamp::{Bootcamp, CreateBootcamp, Location};
use devcamper_shared::models::user::{CreateUser, User, UserRole};
use devcamper_shared::slug::slugify;
use sqlx::PgPool;
use uuid::Uuid;

/// Connects and migrates, or `None` without `DATABASE_URL`
pub async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_URL").ok()?;

    ensure_database_exists(&url)
        .await
        .expect("Failed to create database");

    let pool = connect(&PoolSettings::new(url, 5))
        .await
        .expect("Failed to create pool");

    run_migrations(&pool).await.expect("Failed to run migrations");

    Some(pool)
}

/// Short random suffix for unique names
pub fn unique() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

pub async fn create_user(pool: &PgPool, role: UserRole) -> User {
    User::create(
        pool,
        CreateUser {
            name: format!("Test {}", role.as_str()),
            email: format!("{}-{}@test.devcamper.io", role.as_str(), unique()),
            password_hash: "$argon2id$not-a-real-hash".to_string(),
            role,
        },
    )
    .await
    .expect("Failed to create user")
}

pub async fn create_bootcamp(pool: &PgPool, owner: Uuid, latitude: f64, longitude: f64) -> Bootcamp {
    let name = format!("Test Camp {}", unique());
    Bootcamp::create(
        pool,
        CreateBootcamp {
            slug: slugify(&name),
            name,
            description: "A test bootcamp".to_string(),
            website: None,
            phone: None,
            email: None,
            location: Location::point(latitude, longitude),
            careers: vec!["Web Development".to_string()],
            housing: false,
            job_assistance: false,
            job_guarantee: false,
            accept_gi: false,
            user_id: owner,
        },
    )
    .await
    .expect("Failed to create bootcamp")
}
