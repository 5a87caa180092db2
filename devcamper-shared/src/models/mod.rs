/// Database models for DevCamper
///
/// Each model owns its SQL. Multi-step writes (averages, cascading deletes)
/// are composed by the caller inside a transaction.
///
/// # Models
///
/// - `user`: accounts, roles and password-reset state
/// - `bootcamp`: listings with geocoded location and derived averages
/// - `course`: courses offered by a bootcamp
/// - `review`: one rating per user per bootcamp

pub mod bootcamp;
pub mod course;
pub mod review;
pub mod user;
