/// Course model and database operations
///
/// Courses belong to a bootcamp and to the publisher who created them. Every
/// course write must be followed by [`recompute_average_cost`] inside the same
/// transaction, after locking the parent with
/// [`Bootcamp::lock_for_update`].
///
/// # Example
///
/// ```no_run
/// use devcamper_shared::models::bootcamp::Bootcamp;
/// use devcamper_shared::models::course::{recompute_average_cost, Course, CreateCourse, SkillLevel};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, bootcamp_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
/// let mut tx = pool.begin().await?;
/// Bootcamp::lock_for_update(&mut tx, bootcamp_id).await?;
/// let course = Course::create(&mut *tx, CreateCourse {
///     title: "Front End Web Development".to_string(),
///     description: "HTML, CSS and JavaScript".to_string(),
///     weeks: "8".to_string(),
///     tuition: 8000.0,
///     minimum_skill: SkillLevel::Beginner,
///     scholarship_available: true,
///     bootcamp_id,
///     user_id,
/// }).await?;
/// recompute_average_cost(&mut tx, bootcamp_id).await?;
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor, PgPool};
use uuid::Uuid;

use super::bootcamp::Bootcamp;
use crate::query::{Field, FieldKind, Listable, Resource};

/// Minimum skill a student needs for a course
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "skill_level", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl SkillLevel {
    pub const ALL: &'static [&'static str] = &["beginner", "intermediate", "advanced"];

    pub fn as_str(&self) -> &'static str {
        match self {
            SkillLevel::Beginner => "beginner",
            SkillLevel::Intermediate => "intermediate",
            SkillLevel::Advanced => "advanced",
        }
    }
}

/// Course offered by a bootcamp
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(rename = "_id")]
    pub id: Uuid,

    pub title: String,
    pub description: String,

    /// Duration as entered, e.g. "8" or "12-14"
    pub weeks: String,

    pub tuition: f64,
    pub minimum_skill: SkillLevel,
    pub scholarship_available: bool,
    pub created_at: DateTime<Utc>,

    #[serde(rename = "bootcamp")]
    pub bootcamp_id: Uuid,

    #[serde(rename = "user")]
    pub user_id: Uuid,
}

impl Listable for Course {
    const RESOURCE: &'static Resource = &Resource {
        table: "courses",
        fields: &[
            Field::new("_id", "id", FieldKind::Uuid),
            Field::new("title", "title", FieldKind::Text),
            Field::new("description", "description", FieldKind::Text),
            Field::new("weeks", "weeks", FieldKind::Text),
            Field::new("tuition", "tuition", FieldKind::Number),
            Field::new("minimumSkill", "minimum_skill", FieldKind::Enum(SkillLevel::ALL)),
            Field::new("scholarshipAvailable", "scholarship_available", FieldKind::Bool),
            Field::new("createdAt", "created_at", FieldKind::Timestamp),
            Field::new("bootcamp", "bootcamp_id", FieldKind::Uuid),
            Field::new("user", "user_id", FieldKind::Uuid),
        ],
    };
}

/// Input for creating a course
#[derive(Debug, Clone)]
pub struct CreateCourse {
    pub title: String,
    pub description: String,
    pub weeks: String,
    pub tuition: f64,
    pub minimum_skill: SkillLevel,
    pub scholarship_available: bool,
    pub bootcamp_id: Uuid,
    pub user_id: Uuid,
}

/// Partial update; the parent bootcamp and owner cannot change
#[derive(Debug, Clone, Default)]
pub struct UpdateCourse {
    pub title: Option<String>,
    pub description: Option<String>,
    pub weeks: Option<String>,
    pub tuition: Option<f64>,
    pub minimum_skill: Option<SkillLevel>,
    pub scholarship_available: Option<bool>,
}

impl Course {
    pub async fn create<'e, E>(executor: E, data: CreateCourse) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let course = sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses (
                id, title, description, weeks, tuition, minimum_skill,
                scholarship_available, bootcamp_id, user_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.title.trim())
        .bind(&data.description)
        .bind(&data.weeks)
        .bind(data.tuition)
        .bind(data.minimum_skill)
        .bind(data.scholarship_available)
        .bind(data.bootcamp_id)
        .bind(data.user_id)
        .fetch_one(executor)
        .await?;

        tracing::info!(course_id = %course.id, bootcamp_id = %course.bootcamp_id, "Course created");

        Ok(course)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All courses of one bootcamp, oldest first
    pub async fn list_by_bootcamp(pool: &PgPool, bootcamp_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        Self::list_by_bootcamps(pool, &[bootcamp_id]).await
    }

    /// All courses of several bootcamps, oldest first
    pub async fn list_by_bootcamps(
        pool: &PgPool,
        bootcamp_ids: &[Uuid],
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Course>(
            r#"
            SELECT *
            FROM courses
            WHERE bootcamp_id = ANY($1)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(bootcamp_ids)
        .fetch_all(pool)
        .await
    }

    /// Applies a partial update
    pub async fn update<'e, E>(
        executor: E,
        id: Uuid,
        data: UpdateCourse,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Course>(
            r#"
            UPDATE courses
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                weeks = COALESCE($4, weeks),
                tuition = COALESCE($5, tuition),
                minimum_skill = COALESCE($6, minimum_skill),
                scholarship_available = COALESCE($7, scholarship_available)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.title.as_deref().map(str::trim))
        .bind(data.description)
        .bind(data.weeks)
        .bind(data.tuition)
        .bind(data.minimum_skill)
        .bind(data.scholarship_available)
        .fetch_optional(executor)
        .await
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every course of a bootcamp, returning how many went
    pub async fn delete_by_bootcamp<'e, E>(executor: E, bootcamp_id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM courses WHERE bootcamp_id = $1")
            .bind(bootcamp_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// Mean tuition of a bootcamp's courses; `None` without courses
    pub async fn average_tuition<'e, E>(executor: E, bootcamp_id: Uuid) -> Result<Option<f64>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let (avg,): (Option<f64>,) =
            sqlx::query_as("SELECT AVG(tuition)::float8 FROM courses WHERE bootcamp_id = $1")
                .bind(bootcamp_id)
                .fetch_one(executor)
                .await?;

        Ok(avg)
    }
}

/// Rounds up to the next multiple of 10
pub fn round_up_to_ten(value: f64) -> f64 {
    (value / 10.0).ceil() * 10.0
}

/// Recomputes and stores a bootcamp's `average_cost`
///
/// Run inside the transaction that changed the bootcamp's courses.
pub async fn recompute_average_cost(
    conn: &mut PgConnection,
    bootcamp_id: Uuid,
) -> Result<Option<f64>, sqlx::Error> {
    let average_cost = Course::average_tuition(&mut *conn, bootcamp_id)
        .await?
        .map(round_up_to_ten);

    Bootcamp::set_average_cost(&mut *conn, bootcamp_id, average_cost).await?;

    tracing::debug!(%bootcamp_id, ?average_cost, "Average cost recomputed");

    Ok(average_cost)
}
