/// Middleware modules for the API server
///
/// This module contains custom middleware for:
/// - Session authentication and role checks
/// - Security headers
/// - Per-client rate limiting

pub mod auth;
pub mod rate_limit;
pub mod security;
