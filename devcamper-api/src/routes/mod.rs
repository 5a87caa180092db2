/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, session and password endpoints
/// - `bootcamps`: Bootcamp CRUD, radius search and photo upload
/// - `courses`: Course CRUD, also nested under a bootcamp
/// - `reviews`: Review CRUD, also nested under a bootcamp
/// - `users`: Admin user management

pub mod auth;
pub mod bootcamps;
pub mod courses;
pub mod health;
pub mod reviews;
pub mod users;

use std::collections::HashMap;

use axum::Json;
use devcamper_shared::models::bootcamp::{Bootcamp, BootcampSummary};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiResult;

/// Success envelope: `{ "success": true, "count"?: n, "data": ... }`
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,

    pub data: T,
}

/// Wraps a single record
pub fn data<T: Serialize>(data: T) -> Json<DataResponse<T>> {
    Json(DataResponse {
        success: true,
        count: None,
        data,
    })
}

/// Wraps an unpaginated list, adding its length as `count`
pub fn list<T: Serialize>(items: Vec<T>) -> Json<DataResponse<Vec<T>>> {
    Json(DataResponse {
        success: true,
        count: Some(items.len()),
        data: items,
    })
}

/// `{ "success": true, "data": {} }` for deletes and logout
pub fn empty() -> Json<DataResponse<Value>> {
    data(Value::Object(Map::new()))
}

/// Serializes child records with `bootcamp` replaced by `{ _id, name, description }`
pub async fn with_bootcamp_summaries<T, F>(
    db: &PgPool,
    items: &[T],
    bootcamp_of: F,
) -> ApiResult<Vec<Value>>
where
    T: Serialize,
    F: Fn(&T) -> Uuid,
{
    let mut ids: Vec<Uuid> = items.iter().map(&bootcamp_of).collect();
    ids.sort_unstable();
    ids.dedup();

    let summaries: HashMap<Uuid, BootcampSummary> = Bootcamp::summaries_by_ids(db, &ids)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();

    items
        .iter()
        .map(|item| -> ApiResult<Value> {
            let mut value = serde_json::to_value(item)?;
            if let (Value::Object(map), Some(summary)) =
                (&mut value, summaries.get(&bootcamp_of(item)))
            {
                map.insert("bootcamp".to_string(), serde_json::to_value(summary)?);
            }
            Ok(value)
        })
        .collect()
}

/// Accepts `"8"` or `8` for free-text fields clients often send as numbers
pub fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(f) => f.to_string(),
    }))
}
