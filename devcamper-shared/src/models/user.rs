/// User model and database operations
///
/// Users sign in with email and password. The role decides what they may
/// write: publishers manage bootcamps and courses, users write reviews, admins
/// can do everything.
///
/// Password hashes and reset-token state are never serialized.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('user', 'publisher', 'admin');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     role user_role NOT NULL DEFAULT 'user',
///     password_hash VARCHAR(255) NOT NULL,
///     reset_password_token VARCHAR(64),
///     reset_password_expire TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use devcamper_shared::models::user::{CreateUser, User, UserRole};
/// use devcamper_shared::db::pool::{connect, PoolSettings};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = connect(&PoolSettings::new("postgresql://localhost/devcamper", 5)).await?;
///
/// let user = User::create(&pool, CreateUser {
///     name: "John Doe".to_string(),
///     email: "john@gmail.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     role: UserRole::Publisher,
/// }).await?;
///
/// let found = User::find_by_email(&pool, "JOHN@gmail.com").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::query::{Field, FieldKind, Listable, Resource};

/// Account role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Can write reviews
    #[default]
    User,

    /// Can publish a bootcamp and its courses
    Publisher,

    /// Unrestricted
    Admin,
}

impl UserRole {
    pub const ALL: &'static [&'static str] = &["user", "publisher", "admin"];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Publisher => "publisher",
            UserRole::Admin => "admin",
        }
    }

    /// Whether a caller may pick this role for themselves at registration
    pub fn is_self_assignable(&self) -> bool {
        !matches!(self, UserRole::Admin)
    }
}

/// User account
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,

    pub name: String,

    /// Stored lowercase
    pub email: String,

    pub role: UserRole,

    #[serde(skip_serializing)]
    pub password_hash: String,

    /// SHA-256 hex digest of the pending reset token
    #[serde(skip_serializing)]
    pub reset_password_token: Option<String>,

    #[serde(skip_serializing)]
    pub reset_password_expire: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl Listable for User {
    const RESOURCE: &'static Resource = &Resource {
        table: "users",
        fields: &[
            Field::new("_id", "id", FieldKind::Uuid),
            Field::new("name", "name", FieldKind::Text),
            Field::new("email", "email", FieldKind::Text),
            Field::new("role", "role", FieldKind::Enum(UserRole::ALL)),
            Field::new("createdAt", "created_at", FieldKind::Timestamp),
        ],
    };
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    /// Argon2id hash, never the plaintext password
    pub password_hash: String,
    pub role: UserRole,
}

/// Partial update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Fails with a unique violation (`users_email_key`) when the email is taken.
    pub async fn create<'e, E>(executor: E, data: CreateUser) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, role, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, role, password_hash, reset_password_token,
                      reset_password_expire, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.name.trim())
        .bind(normalize_email(&data.email))
        .bind(data.role)
        .bind(data.password_hash)
        .fetch_one(executor)
        .await?;

        tracing::info!(user_id = %user.id, role = user.role.as_str(), "User created");

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, role, password_hash, reset_password_token,
                   reset_password_expire, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user by email (case-insensitive)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, role, password_hash, reset_password_token,
                   reset_password_expire, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(normalize_email(email))
        .fetch_optional(pool)
        .await
    }

    /// Finds the user holding an unexpired reset token with this digest
    pub async fn find_by_reset_token(
        pool: &PgPool,
        token_hash: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, role, password_hash, reset_password_token,
                   reset_password_expire, created_at
            FROM users
            WHERE reset_password_token = $1
              AND reset_password_expire > NOW()
            "#,
        )
        .bind(token_hash)
        .fetch_optional(pool)
        .await
    }

    /// Stores a pending reset token digest and its expiry
    pub async fn set_reset_token(
        pool: &PgPool,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET reset_password_token = $2, reset_password_expire = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Clears any pending reset token
    pub async fn clear_reset_token(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET reset_password_token = NULL, reset_password_expire = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replaces the password hash and clears any pending reset token
    pub async fn set_password(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET password_hash = $2,
                reset_password_token = NULL,
                reset_password_expire = NULL
            WHERE id = $1
            RETURNING id, name, email, role, password_hash, reset_password_token,
                      reset_password_expire, created_at
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .fetch_optional(pool)
        .await
    }

    /// Applies a partial update
    ///
    /// Returns `None` when the user does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                role = COALESCE($4, role)
            WHERE id = $1
            RETURNING id, name, email, role, password_hash, reset_password_token,
                      reset_password_expire, created_at
            "#,
        )
        .bind(id)
        .bind(data.name.as_deref().map(str::trim))
        .bind(data.email.as_deref().map(normalize_email))
        .bind(data.role)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Deletes a user by ID
    ///
    /// # Errors
    ///
    /// Fails with a foreign key violation while the user still owns
    /// bootcamps, courses or reviews.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Emails are compared and stored lowercase
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
