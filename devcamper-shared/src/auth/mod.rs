/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: session token creation and validation
/// - [`reset_token`]: password-reset token generation and hashing
/// - [`middleware`]: token extraction and caller resolution
/// - [`authorization`]: role allow-lists and ownership checks
///
/// # Example
///
/// ```no_run
/// use devcamper_shared::auth::password::{hash_password, verify_password};
/// use devcamper_shared::auth::jwt::{create_token, validate_token, Claims};
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), Duration::days(30));
/// let token = create_token(&claims, "secret")?;
/// let claims = validate_token(&token, "secret")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod reset_token;
