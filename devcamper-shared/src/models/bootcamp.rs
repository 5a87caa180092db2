/// Bootcamp model and database operations
///
/// A bootcamp is the root listing. Its location is geocoded from a free-form
/// address when it is created; the address itself is not stored.
/// `average_cost` and `average_rating` are derived from the bootcamp's
/// courses and reviews and are only written by the recompute helpers in
/// [`course`](super::course) and [`review`](super::review).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE bootcamps (
///     id UUID PRIMARY KEY,
///     name VARCHAR(50) NOT NULL UNIQUE,
///     slug VARCHAR(64) NOT NULL,
///     description VARCHAR(500) NOT NULL,
///     website VARCHAR(255),
///     phone VARCHAR(20),
///     email VARCHAR(255),
///     longitude DOUBLE PRECISION NOT NULL,
///     latitude DOUBLE PRECISION NOT NULL,
///     formatted_address VARCHAR(512),
///     street, city, state, zipcode, country ...,
///     careers TEXT[] NOT NULL,
///     average_rating DOUBLE PRECISION,
///     average_cost DOUBLE PRECISION,
///     photo VARCHAR(255) NOT NULL DEFAULT 'no-photo.jpg',
///     housing, job_assistance, job_guarantee, accept_gi BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     user_id UUID NOT NULL REFERENCES users (id)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use devcamper_shared::models::bootcamp::{Bootcamp, CreateBootcamp, Location};
/// use devcamper_shared::slug::slugify;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, owner: Uuid) -> Result<(), sqlx::Error> {
/// let name = "Devworks Bootcamp".to_string();
/// let bootcamp = Bootcamp::create(&pool, CreateBootcamp {
///     slug: slugify(&name),
///     name,
///     description: "Full stack web development".to_string(),
///     website: None,
///     phone: None,
///     email: None,
///     location: Location::point(42.35, -71.10),
///     careers: vec!["Web Development".to_string()],
///     housing: true,
///     job_assistance: true,
///     job_guarantee: false,
///     accept_gi: true,
///     user_id: owner,
/// }).await?;
///
/// let nearby = Bootcamp::within_radius(&pool, 42.36, -71.06, 10.0 / 3963.0).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use sqlx::{PgConnection, PgExecutor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;
use validator::ValidationError;

use crate::geo::GeocodedLocation;
use crate::query::{Field, FieldKind, Listable, Resource};

/// Allowed career tags
pub const CAREERS: &[&str] = &[
    "Web Development",
    "Mobile Development",
    "UI/UX",
    "Data Science",
    "Business",
    "Other",
];

/// Photo filename until one is uploaded
pub const DEFAULT_PHOTO: &str = "no-photo.jpg";

/// Validates a career list for the `careers` field
pub fn validate_careers(careers: &[String]) -> Result<(), ValidationError> {
    if careers.is_empty() {
        return Err(ValidationError::new("careers")
            .with_message("Please add at least one career".into()));
    }

    match careers.iter().find(|c| !CAREERS.contains(&c.as_str())) {
        Some(bad) => Err(ValidationError::new("careers")
            .with_message(format!("{} is not an allowed career", bad).into())),
        None => Ok(()),
    }
}

/// Geocoded point plus address components
///
/// Serialized GeoJSON-style: `{ "type": "Point", "coordinates": [lng, lat], ... }`.
#[derive(Debug, Clone, PartialEq, Default, sqlx::FromRow)]
pub struct Location {
    pub longitude: f64,
    pub latitude: f64,
    pub formatted_address: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    pub country: Option<String>,
}

impl Location {
    /// A bare point with no address components
    pub fn point(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            ..Default::default()
        }
    }
}

impl From<GeocodedLocation> for Location {
    fn from(g: GeocodedLocation) -> Self {
        Self {
            longitude: g.longitude,
            latitude: g.latitude,
            formatted_address: g.formatted_address,
            street: g.street,
            city: g.city,
            state: g.state,
            zipcode: g.zipcode,
            country: g.country,
        }
    }
}

impl Serialize for Location {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Location", 8)?;
        s.serialize_field("type", "Point")?;
        s.serialize_field("coordinates", &[self.longitude, self.latitude])?;
        s.serialize_field("formattedAddress", &self.formatted_address)?;
        s.serialize_field("street", &self.street)?;
        s.serialize_field("city", &self.city)?;
        s.serialize_field("state", &self.state)?;
        s.serialize_field("zipcode", &self.zipcode)?;
        s.serialize_field("country", &self.country)?;
        s.end()
    }
}

/// Bootcamp listing
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Bootcamp {
    #[serde(rename = "_id")]
    pub id: Uuid,

    pub name: String,
    pub slug: String,
    pub description: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[sqlx(flatten)]
    pub location: Location,

    pub careers: Vec<String>,

    /// Mean review rating; unset without reviews
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,

    /// Mean course tuition rounded up to a multiple of 10; unset without courses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_cost: Option<f64>,

    pub photo: String,
    pub housing: bool,
    pub job_assistance: bool,
    pub job_guarantee: bool,
    pub accept_gi: bool,
    pub created_at: DateTime<Utc>,

    /// Owning publisher
    #[serde(rename = "user")]
    pub user_id: Uuid,
}

impl Listable for Bootcamp {
    const RESOURCE: &'static Resource = &Resource {
        table: "bootcamps",
        fields: &[
            Field::new("_id", "id", FieldKind::Uuid),
            Field::new("name", "name", FieldKind::Text),
            Field::new("slug", "slug", FieldKind::Text),
            Field::new("description", "description", FieldKind::Text),
            Field::new("website", "website", FieldKind::Text),
            Field::new("phone", "phone", FieldKind::Text),
            Field::new("email", "email", FieldKind::Text),
            Field::new("location.city", "city", FieldKind::Text),
            Field::new("location.state", "state", FieldKind::Text),
            Field::new("location.zipcode", "zipcode", FieldKind::Text),
            Field::new("location.country", "country", FieldKind::Text),
            Field::new("careers", "careers", FieldKind::TextArray),
            Field::new("averageRating", "average_rating", FieldKind::Number),
            Field::new("averageCost", "average_cost", FieldKind::Number),
            Field::new("photo", "photo", FieldKind::Text),
            Field::new("housing", "housing", FieldKind::Bool),
            Field::new("jobAssistance", "job_assistance", FieldKind::Bool),
            Field::new("jobGuarantee", "job_guarantee", FieldKind::Bool),
            Field::new("acceptGi", "accept_gi", FieldKind::Bool),
            Field::new("createdAt", "created_at", FieldKind::Timestamp),
            Field::new("user", "user_id", FieldKind::Uuid),
        ],
    };
}

/// Parent reference embedded in course and review listings
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct BootcampSummary {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub description: String,
}

/// Input for creating a bootcamp
#[derive(Debug, Clone)]
pub struct CreateBootcamp {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub location: Location,
    pub careers: Vec<String>,
    pub housing: bool,
    pub job_assistance: bool,
    pub job_guarantee: bool,
    pub accept_gi: bool,
    pub user_id: Uuid,
}

/// Partial update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct UpdateBootcamp {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub location: Option<Location>,
    pub careers: Option<Vec<String>>,
    pub housing: Option<bool>,
    pub job_assistance: Option<bool>,
    pub job_guarantee: Option<bool>,
    pub accept_gi: Option<bool>,
}

impl UpdateBootcamp {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.slug.is_none()
            && self.description.is_none()
            && self.website.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.location.is_none()
            && self.careers.is_none()
            && self.housing.is_none()
            && self.job_assistance.is_none()
            && self.job_guarantee.is_none()
            && self.accept_gi.is_none()
    }
}

impl Bootcamp {
    /// Inserts a new bootcamp
    ///
    /// # Errors
    ///
    /// Fails with a unique violation (`bootcamps_name_key`) when the name is taken.
    pub async fn create<'e, E>(executor: E, data: CreateBootcamp) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let bootcamp = sqlx::query_as::<_, Bootcamp>(
            r#"
            INSERT INTO bootcamps (
                id, name, slug, description, website, phone, email,
                longitude, latitude, formatted_address, street, city, state, zipcode, country,
                careers, housing, job_assistance, job_guarantee, accept_gi, user_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                    $16, $17, $18, $19, $20, $21)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.name.trim())
        .bind(&data.slug)
        .bind(&data.description)
        .bind(&data.website)
        .bind(&data.phone)
        .bind(&data.email)
        .bind(data.location.longitude)
        .bind(data.location.latitude)
        .bind(&data.location.formatted_address)
        .bind(&data.location.street)
        .bind(&data.location.city)
        .bind(&data.location.state)
        .bind(&data.location.zipcode)
        .bind(&data.location.country)
        .bind(&data.careers)
        .bind(data.housing)
        .bind(data.job_assistance)
        .bind(data.job_guarantee)
        .bind(data.accept_gi)
        .bind(data.user_id)
        .fetch_one(executor)
        .await?;

        tracing::info!(bootcamp_id = %bootcamp.id, slug = %bootcamp.slug, "Bootcamp created");

        Ok(bootcamp)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Bootcamp>("SELECT * FROM bootcamps WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Locks the bootcamp row for the rest of the transaction
    ///
    /// Serializes writers that recompute this bootcamp's averages. Returns
    /// `false` when the bootcamp does not exist.
    pub async fn lock_for_update(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
        let row: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM bootcamps WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(row.is_some())
    }

    /// Applies a partial update
    ///
    /// Returns `None` when the bootcamp does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateBootcamp,
    ) -> Result<Option<Self>, sqlx::Error> {
        if data.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE bootcamps SET ");
        {
            let mut set = qb.separated(", ");

            if let Some(name) = data.name {
                set.push("name = ").push_bind_unseparated(name.trim().to_string());
            }
            if let Some(slug) = data.slug {
                set.push("slug = ").push_bind_unseparated(slug);
            }
            if let Some(description) = data.description {
                set.push("description = ").push_bind_unseparated(description);
            }
            if let Some(website) = data.website {
                set.push("website = ").push_bind_unseparated(website);
            }
            if let Some(phone) = data.phone {
                set.push("phone = ").push_bind_unseparated(phone);
            }
            if let Some(email) = data.email {
                set.push("email = ").push_bind_unseparated(email);
            }
            if let Some(location) = data.location {
                set.push("longitude = ").push_bind_unseparated(location.longitude);
                set.push("latitude = ").push_bind_unseparated(location.latitude);
                set.push("formatted_address = ").push_bind_unseparated(location.formatted_address);
                set.push("street = ").push_bind_unseparated(location.street);
                set.push("city = ").push_bind_unseparated(location.city);
                set.push("state = ").push_bind_unseparated(location.state);
                set.push("zipcode = ").push_bind_unseparated(location.zipcode);
                set.push("country = ").push_bind_unseparated(location.country);
            }
            if let Some(careers) = data.careers {
                set.push("careers = ").push_bind_unseparated(careers);
            }
            if let Some(housing) = data.housing {
                set.push("housing = ").push_bind_unseparated(housing);
            }
            if let Some(job_assistance) = data.job_assistance {
                set.push("job_assistance = ").push_bind_unseparated(job_assistance);
            }
            if let Some(job_guarantee) = data.job_guarantee {
                set.push("job_guarantee = ").push_bind_unseparated(job_guarantee);
            }
            if let Some(accept_gi) = data.accept_gi {
                set.push("accept_gi = ").push_bind_unseparated(accept_gi);
            }
        }
        qb.push(" WHERE id = ");
        qb.push_bind(id);
        qb.push(" RETURNING *");

        qb.build_query_as::<Bootcamp>().fetch_optional(pool).await
    }

    /// Deletes the bootcamp row only
    ///
    /// Children must be removed first; see
    /// [`Course::delete_by_bootcamp`](super::course::Course::delete_by_bootcamp) and
    /// [`Review::delete_by_bootcamp`](super::review::Review::delete_by_bootcamp).
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM bootcamps WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All bootcamps within `radius` radians of a point, in creation order
    pub async fn within_radius(
        pool: &PgPool,
        latitude: f64,
        longitude: f64,
        radius: f64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Bootcamp>(
            r#"
            SELECT *
            FROM bootcamps
            WHERE 2 * asin(sqrt(least(1.0,
                    power(sin(radians(latitude - $1) / 2), 2)
                    + cos(radians($1)) * cos(radians(latitude))
                      * power(sin(radians(longitude - $2) / 2), 2)
                  ))) <= $3
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(latitude)
        .bind(longitude)
        .bind(radius)
        .fetch_all(pool)
        .await
    }

    /// Number of bootcamps owned by a user
    pub async fn count_by_user(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bootcamps WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Records the uploaded photo's filename
    pub async fn set_photo(
        pool: &PgPool,
        id: Uuid,
        photo: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Bootcamp>("UPDATE bootcamps SET photo = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(photo)
            .fetch_optional(pool)
            .await
    }

    /// Stores the recomputed mean course cost
    pub async fn set_average_cost<'e, E>(
        executor: E,
        id: Uuid,
        average_cost: Option<f64>,
    ) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query("UPDATE bootcamps SET average_cost = $2 WHERE id = $1")
            .bind(id)
            .bind(average_cost)
            .execute(executor)
            .await?;

        Ok(())
    }

    /// Stores the recomputed mean review rating
    pub async fn set_average_rating<'e, E>(
        executor: E,
        id: Uuid,
        average_rating: Option<f64>,
    ) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query("UPDATE bootcamps SET average_rating = $2 WHERE id = $1")
            .bind(id)
            .bind(average_rating)
            .execute(executor)
            .await?;

        Ok(())
    }

    /// Name and description for each id that exists
    pub async fn summaries_by_ids(
        pool: &PgPool,
        ids: &[Uuid],
    ) -> Result<Vec<BootcampSummary>, sqlx::Error> {
        sqlx::query_as::<_, BootcampSummary>(
            "SELECT id, name, description FROM bootcamps WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ListQuery;

    fn sample() -> Bootcamp {
        Bootcamp {
            id: Uuid::new_v4(),
            name: "Devworks Bootcamp".into(),
            slug: "devworks-bootcamp".into(),
            description: "Full stack".into(),
            website: Some("https://devworks.com".into()),
            phone: None,
            email: None,
            location: Location {
                longitude: -71.104,
                latitude: 42.35,
                formatted_address: Some("233 Bay State Rd, Boston, MA 02215, US".into()),
                street: Some("233 Bay State Rd".into()),
                city: Some("Boston".into()),
                state: Some("MA".into()),
                zipcode: Some("02215".into()),
                country: Some("US".into()),
            },
            careers: vec!["Web Development".into(), "UI/UX".into()],
            average_rating: None,
            average_cost: Some(10000.0),
            photo: DEFAULT_PHOTO.into(),
            housing: true,
            job_assistance: true,
            job_guarantee: false,
            accept_gi: true,
            created_at: Utc::now(),
            user_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_location_serializes_as_point() {
        let json = serde_json::to_value(sample().location).unwrap();
        assert_eq!(json["type"], "Point");
        assert_eq!(json["coordinates"], serde_json::json!([-71.104, 42.35]));
        assert_eq!(json["formattedAddress"], "233 Bay State Rd, Boston, MA 02215, US");
        assert_eq!(json["zipcode"], "02215");
    }

    #[test]
    fn test_bootcamp_json_shape() {
        let bootcamp = sample();
        let json = serde_json::to_value(&bootcamp).unwrap();

        assert_eq!(json["_id"], bootcamp.id.to_string());
        assert_eq!(json["user"], bootcamp.user_id.to_string());
        assert_eq!(json["jobAssistance"], true);
        assert_eq!(json["acceptGi"], true);
        assert_eq!(json["averageCost"], 10000.0);
        assert!(json.get("averageRating").is_none());
        assert!(json.get("phone").is_none());
        assert!(json.get("address").is_none());
    }

    #[test]
    fn test_location_from_geocoder() {
        let location: Location = GeocodedLocation {
            latitude: 1.0,
            longitude: 2.0,
            formatted_address: None,
            street: None,
            city: Some("Boston".into()),
            state: None,
            zipcode: None,
            country: None,
        }
        .into();

        assert_eq!(location.latitude, 1.0);
        assert_eq!(location.longitude, 2.0);
        assert_eq!(location.city.as_deref(), Some("Boston"));
    }

    #[test]
    fn test_validate_careers() {
        let ok = vec!["Business".to_string(), "Other".to_string()];
        assert!(validate_careers(&ok).is_ok());
        assert!(validate_careers(&Vec::new()).is_err());

        let bad = vec!["Basket Weaving".to_string()];
        let err = validate_careers(&bad).unwrap_err();
        assert_eq!(
            err.message.as_deref(),
            Some("Basket Weaving is not an allowed career")
        );
    }

    #[test]
    fn test_field_table_covers_location_parts() {
        let pairs = vec![
            ("location.state".to_string(), "MA".to_string()),
            ("careers[in]".to_string(), "Business,UI/UX".to_string()),
            ("sort".to_string(), "-averageCost".to_string()),
        ];
        let query = ListQuery::parse(&pairs, Bootcamp::RESOURCE).unwrap();
        assert_eq!(query.filters[0].field.column, "state");
        assert_eq!(query.sort[0].field.column, "average_cost");
    }

    #[test]
    fn test_empty_update() {
        assert!(UpdateBootcamp::default().is_empty());
        assert!(!UpdateBootcamp {
            housing: Some(false),
            ..Default::default()
        }
        .is_empty());
    }
}
