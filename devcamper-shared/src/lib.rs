//! # DevCamper Shared Library
//!
//! This crate contains the persistence models, authentication primitives and
//! outbound collaborators used by the DevCamper API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models (bootcamps, courses, reviews, users)
//! - `db`: Connection pool and embedded migrations
//! - `auth`: JWT, password hashing, reset tokens, role checks
//! - `query`: Filter/sort/pagination translation for list endpoints
//! - `geo`: Geocoding and radius math
//! - `mail`: Outbound email
//! - `slug`: URL-safe names

pub mod auth;
pub mod db;
pub mod geo;
pub mod mail;
pub mod models;
pub mod query;
pub mod slug;

/// Current version of the DevCamper shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
