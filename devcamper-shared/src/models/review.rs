/// Review model and database operations
///
/// A user may review each bootcamp once (`reviews_bootcamp_user_key`). Review
/// writes are followed by [`recompute_average_rating`] in the same
/// transaction.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgConnection, PgExecutor, PgPool};
use uuid::Uuid;

use super::bootcamp::Bootcamp;
use crate::query::{Field, FieldKind, Listable, Resource};

/// Lowest accepted rating
pub const MIN_RATING: i16 = 1;

/// Highest accepted rating
pub const MAX_RATING: i16 = 10;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: Uuid,

    pub title: String,
    pub text: String,
    pub rating: i16,
    pub created_at: DateTime<Utc>,

    #[serde(rename = "bootcamp")]
    pub bootcamp_id: Uuid,

    #[serde(rename = "user")]
    pub user_id: Uuid,
}

impl Listable for Review {
    const RESOURCE: &'static Resource = &Resource {
        table: "reviews",
        fields: &[
            Field::new("_id", "id", FieldKind::Uuid),
            Field::new("title", "title", FieldKind::Text),
            Field::new("text", "text", FieldKind::Text),
            Field::new("rating", "rating", FieldKind::Number),
            Field::new("createdAt", "created_at", FieldKind::Timestamp),
            Field::new("bootcamp", "bootcamp_id", FieldKind::Uuid),
            Field::new("user", "user_id", FieldKind::Uuid),
        ],
    };
}

#[derive(Debug, Clone)]
pub struct CreateReview {
    pub title: String,
    pub text: String,
    pub rating: i16,
    pub bootcamp_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateReview {
    pub title: Option<String>,
    pub text: Option<String>,
    pub rating: Option<i16>,
}

impl Review {
    /// Inserts a review
    ///
    /// # Errors
    ///
    /// Fails with a unique violation when the user already reviewed the bootcamp.
    pub async fn create<'e, E>(executor: E, data: CreateReview) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let review = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (id, title, text, rating, bootcamp_id, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.title.trim())
        .bind(&data.text)
        .bind(data.rating)
        .bind(data.bootcamp_id)
        .bind(data.user_id)
        .fetch_one(executor)
        .await?;

        tracing::info!(review_id = %review.id, bootcamp_id = %review.bootcamp_id, "Review created");

        Ok(review)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All reviews of one bootcamp, oldest first
    pub async fn list_by_bootcamp(pool: &PgPool, bootcamp_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Review>(
            r#"
            SELECT *
            FROM reviews
            WHERE bootcamp_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(bootcamp_id)
        .fetch_all(pool)
        .await
    }

    pub async fn update<'e, E>(
        executor: E,
        id: Uuid,
        data: UpdateReview,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Review>(
            r#"
            UPDATE reviews
            SET title = COALESCE($2, title),
                text = COALESCE($3, text),
                rating = COALESCE($4, rating)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.title.as_deref().map(str::trim))
        .bind(data.text)
        .bind(data.rating)
        .fetch_optional(executor)
        .await
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_by_bootcamp<'e, E>(executor: E, bootcamp_id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM reviews WHERE bootcamp_id = $1")
            .bind(bootcamp_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// Mean rating of a bootcamp's reviews; `None` without reviews
    pub async fn average_rating<'e, E>(executor: E, bootcamp_id: Uuid) -> Result<Option<f64>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let (avg,): (Option<f64>,) =
            sqlx::query_as("SELECT AVG(rating)::float8 FROM reviews WHERE bootcamp_id = $1")
                .bind(bootcamp_id)
                .fetch_one(executor)
                .await?;

        Ok(avg)
    }
}

/// Recomputes and stores a bootcamp's `average_rating`
pub async fn recompute_average_rating(
    conn: &mut PgConnection,
    bootcamp_id: Uuid,
) -> Result<Option<f64>, sqlx::Error> {
    let average_rating = Review::average_rating(&mut *conn, bootcamp_id).await?;

    Bootcamp::set_average_rating(&mut *conn, bootcamp_id, average_rating).await?;

    tracing::debug!(%bootcamp_id, ?average_rating, "Average rating recomputed");

    Ok(average_rating)
}
