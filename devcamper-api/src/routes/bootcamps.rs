/// Bootcamp endpoints
///
/// # Endpoints
///
/// - `GET    /api/v1/bootcamps` - Filtered, sorted, paginated list with courses
/// - `POST   /api/v1/bootcamps` - Create (publisher/admin, one per publisher)
/// - `GET    /api/v1/bootcamps/:id` - One bootcamp with its courses
/// - `PUT    /api/v1/bootcamps/:id` - Update (owner/admin)
/// - `DELETE /api/v1/bootcamps/:id` - Delete with its courses and reviews (owner/admin)
/// - `GET    /api/v1/bootcamps/radius/:zipcode/:distance` - Within `distance` miles
/// - `PUT    /api/v1/bootcamps/:id/photo` - Multipart photo upload (owner/admin)

use std::collections::HashMap;
use std::path::Path;

use crate::{
    app::AppState,
    error::{ApiError, ApiJson, ApiPath, ApiQuery, ApiResult},
    routes::{data, empty, list, DataResponse},
};
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Extension, Multipart, State,
    },
    http::StatusCode,
    Json,
};
use devcamper_shared::{
    auth::{authorization::require_owner_or_admin_to, middleware::AuthContext},
    geo::SphericalCap,
    models::{
        bootcamp::{validate_careers, Bootcamp, CreateBootcamp, Location, UpdateBootcamp},
        course::Course,
        review::Review,
    },
    query::{fetch_page, AdvancedResults, ListQuery, Listable},
    slug::slugify,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Create bootcamp request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBootcampRequest {
    #[validate(
        required(message = "Please add a name"),
        length(min = 1, max = 50, message = "Name can not be more than 50 characters")
    )]
    pub name: Option<String>,

    #[validate(
        required(message = "Please add a description"),
        length(min = 1, max = 500, message = "Description can not be more than 500 characters")
    )]
    pub description: Option<String>,

    #[validate(custom(function = "validate_http_url"))]
    pub website: Option<String>,

    #[validate(length(max = 20, message = "Phone number can not be longer than 20 characters"))]
    pub phone: Option<String>,

    #[validate(email(message = "Please add a valid email"))]
    pub email: Option<String>,

    #[validate(required(message = "Please add an address"))]
    pub address: Option<String>,

    #[validate(
        required(message = "Please add at least one career"),
        custom(function = "validate_careers")
    )]
    pub careers: Option<Vec<String>>,

    #[serde(default)]
    pub housing: bool,

    #[serde(default)]
    pub job_assistance: bool,

    #[serde(default)]
    pub job_guarantee: bool,

    #[serde(default)]
    pub accept_gi: bool,
}

/// Partial update; omitted fields stay unchanged
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBootcampRequest {
    #[validate(length(min = 1, max = 50, message = "Name can not be more than 50 characters"))]
    pub name: Option<String>,

    #[validate(length(
        min = 1,
        max = 500,
        message = "Description can not be more than 500 characters"
    ))]
    pub description: Option<String>,

    #[validate(custom(function = "validate_http_url"))]
    pub website: Option<String>,

    #[validate(length(max = 20, message = "Phone number can not be longer than 20 characters"))]
    pub phone: Option<String>,

    #[validate(email(message = "Please add a valid email"))]
    pub email: Option<String>,

    /// Re-geocoded when present
    pub address: Option<String>,

    #[validate(custom(function = "validate_careers"))]
    pub careers: Option<Vec<String>>,

    pub housing: Option<bool>,
    pub job_assistance: Option<bool>,
    pub job_guarantee: Option<bool>,
    pub accept_gi: Option<bool>,
}

/// Accepts only absolute http(s) URLs
fn validate_http_url(url: &str) -> Result<(), ValidationError> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));

    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') && !host.contains(' ') => Ok(()),
        _ => Err(ValidationError::new("website")
            .with_message("Please use a valid URL with HTTP or HTTPS".into())),
    }
}

/// Slug for a display name; names without letters or digits are rejected
fn slug_for(name: &str) -> ApiResult<String> {
    let slug = slugify(name);
    if slug.is_empty() {
        return Err(ApiError::Validation(vec![
            "Name must contain letters or digits".to_string(),
        ]));
    }
    Ok(slug)
}

async fn find_bootcamp(state: &AppState, id: Uuid) -> ApiResult<Bootcamp> {
    Bootcamp::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Bootcamp", id))
}

/// Serializes a bootcamp with its courses embedded
fn with_courses(bootcamp: &Bootcamp, courses: Vec<Course>) -> ApiResult<Value> {
    let mut value = serde_json::to_value(bootcamp)?;
    if let Value::Object(map) = &mut value {
        map.insert("courses".to_string(), serde_json::to_value(courses)?);
    }
    Ok(value)
}

/// List bootcamps
///
/// ```text
/// GET /api/v1/bootcamps?careers[in]=Business,UI/UX&averageCost[lte]=10000&select=name,averageCost&sort=-averageCost&page=2&limit=10
/// ```
pub async fn list_bootcamps(
    State(state): State<AppState>,
    ApiQuery(pairs): ApiQuery<Vec<(String, String)>>,
) -> ApiResult<Json<AdvancedResults>> {
    let query = ListQuery::parse(&pairs, Bootcamp::RESOURCE)?;
    let page = fetch_page::<Bootcamp>(&state.db, &query).await?;

    let mut courses: HashMap<Uuid, Vec<Course>> = HashMap::new();
    if query.includes("courses") && !page.items.is_empty() {
        let ids: Vec<Uuid> = page.items.iter().map(|b| b.id).collect();
        for course in Course::list_by_bootcamps(&state.db, &ids).await? {
            courses.entry(course.bootcamp_id).or_default().push(course);
        }
    }

    let data = page
        .items
        .iter()
        .map(|bootcamp| -> ApiResult<Value> {
            let value = if query.includes("courses") {
                with_courses(bootcamp, courses.remove(&bootcamp.id).unwrap_or_default())?
            } else {
                serde_json::to_value(bootcamp)?
            };
            Ok(query.project(value))
        })
        .collect::<ApiResult<Vec<Value>>>()?;

    Ok(Json(AdvancedResults::new(data, page.pagination)))
}

/// Single bootcamp with its courses
pub async fn get_bootcamp(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<DataResponse<Value>>> {
    let bootcamp = find_bootcamp(&state, id).await?;
    let courses = Course::list_by_bootcamp(&state.db, id).await?;

    Ok(data(with_courses(&bootcamp, courses)?))
}

/// Create a bootcamp owned by the caller
///
/// The address is geocoded into `location` and not stored itself.
///
/// # Errors
///
/// - `400 Bad Request`: validation failed, name taken, address not found,
///   or the publisher already owns a bootcamp
pub async fn create_bootcamp(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateBootcampRequest>,
) -> ApiResult<(StatusCode, Json<DataResponse<Bootcamp>>)> {
    req.validate()?;

    if !auth.is_admin() && Bootcamp::count_by_user(&state.db, auth.user_id()).await? > 0 {
        return Err(ApiError::BadRequest(format!(
            "The user with ID {} has already published a bootcamp",
            auth.user_id()
        )));
    }

    let name = req.name.unwrap_or_default().trim().to_string();
    let slug = slug_for(&name)?;

    let address = req.address.unwrap_or_default();
    let location = Location::from(state.geocoder.geocode(&address).await?);

    let bootcamp = Bootcamp::create(
        &state.db,
        CreateBootcamp {
            name,
            slug,
            description: req.description.unwrap_or_default(),
            website: req.website,
            phone: req.phone,
            email: req.email,
            location,
            careers: req.careers.unwrap_or_default(),
            housing: req.housing,
            job_assistance: req.job_assistance,
            job_guarantee: req.job_guarantee,
            accept_gi: req.accept_gi,
            user_id: auth.user_id(),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, data(bootcamp)))
}

/// Update a bootcamp
///
/// A new name regenerates the slug; a new address is geocoded again.
pub async fn update_bootcamp(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateBootcampRequest>,
) -> ApiResult<Json<DataResponse<Bootcamp>>> {
    let bootcamp = find_bootcamp(&state, id).await?;
    require_owner_or_admin_to(&auth, bootcamp.user_id, "update this bootcamp")?;

    req.validate()?;

    let name = req.name.map(|n| n.trim().to_string());
    let slug = match &name {
        Some(name) => Some(slug_for(name)?),
        None => None,
    };

    let location = match &req.address {
        Some(address) => Some(Location::from(state.geocoder.geocode(address).await?)),
        None => None,
    };

    let updated = Bootcamp::update(
        &state.db,
        id,
        UpdateBootcamp {
            name,
            slug,
            description: req.description,
            website: req.website,
            phone: req.phone,
            email: req.email,
            location,
            careers: req.careers,
            housing: req.housing,
            job_assistance: req.job_assistance,
            job_guarantee: req.job_guarantee,
            accept_gi: req.accept_gi,
        },
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Bootcamp", id))?;

    Ok(data(updated))
}

/// Delete a bootcamp together with its courses and reviews
pub async fn delete_bootcamp(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<DataResponse<Value>>> {
    let bootcamp = find_bootcamp(&state, id).await?;
    require_owner_or_admin_to(&auth, bootcamp.user_id, "delete this bootcamp")?;

    let mut tx = state.db.begin().await?;
    let courses = Course::delete_by_bootcamp(&mut *tx, id).await?;
    let reviews = Review::delete_by_bootcamp(&mut *tx, id).await?;
    Bootcamp::delete(&mut *tx, id).await?;
    tx.commit().await?;

    tracing::info!(bootcamp_id = %id, courses, reviews, "Bootcamp deleted");

    Ok(empty())
}

/// Bootcamps within `distance` miles of a zipcode
pub async fn bootcamps_in_radius(
    State(state): State<AppState>,
    ApiPath((zipcode, distance)): ApiPath<(String, String)>,
) -> ApiResult<Json<DataResponse<Vec<Bootcamp>>>> {
    let miles = distance
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| ApiError::BadRequest("Distance must be a positive number".to_string()))?;

    let center = state.geocoder.geocode(&zipcode).await?;
    let cap = SphericalCap::from_miles(center.latitude, center.longitude, miles)
        .ok_or_else(|| ApiError::BadRequest("Distance must be a positive number".to_string()))?;

    let bootcamps =
        Bootcamp::within_radius(&state.db, cap.center_lat, cap.center_lng, cap.radius).await?;

    Ok(list(bootcamps))
}

fn multipart_error(err: MultipartError, max_bytes: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::BadRequest(format!("Please upload an image less than {} bytes", max_bytes))
    } else {
        tracing::debug!(error = %err, "Malformed multipart body");
        ApiError::BadRequest("Please upload a file".to_string())
    }
}

/// `.ext` from an uploaded file name; empty unless purely alphanumeric
fn file_extension(file_name: Option<&str>) -> String {
    file_name
        .and_then(|n| Path::new(n).extension())
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default()
}

async fn save_upload(dir: &Path, file_name: &str, bytes: &[u8]) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(dir.join(file_name), bytes).await
}

/// Upload a bootcamp photo
///
/// Multipart field `file`, `image/*`, at most `MAX_FILE_UPLOAD` bytes. Stored as
/// `photo_{id}{ext}` under the upload directory.
pub async fn upload_photo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<DataResponse<String>>> {
    let bootcamp = find_bootcamp(&state, id).await?;
    require_owner_or_admin_to(&auth, bootcamp.user_id, "update this bootcamp")?;

    let mut multipart = multipart?;
    let max_bytes = state.config.uploads.max_file_upload;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let extension = file_extension(field.file_name());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, max_bytes))?;

        upload = Some((content_type, extension, bytes));
        break;
    }

    let Some((content_type, extension, bytes)) = upload else {
        return Err(ApiError::BadRequest("Please upload a file".to_string()));
    };

    if !content_type.starts_with("image/") {
        return Err(ApiError::BadRequest("Please upload an image file".to_string()));
    }

    if bytes.len() > max_bytes {
        return Err(ApiError::BadRequest(format!(
            "Please upload an image less than {} bytes",
            max_bytes
        )));
    }

    let file_name = format!("photo_{}{}", id, extension);
    let dir = &state.config.uploads.path;

    if let Err(e) = save_upload(dir, &file_name, &bytes).await {
        tracing::error!(error = %e, bootcamp_id = %id, "Photo write failed");
        return Err(ApiError::ServerError("Problem with file upload".to_string()));
    }

    Bootcamp::set_photo(&state.db, id, &file_name)
        .await?
        .ok_or_else(|| ApiError::not_found("Bootcamp", id))?;

    tracing::info!(bootcamp_id = %id, file = %file_name, size = bytes.len(), "Photo uploaded");

    Ok(data(file_name))
}
