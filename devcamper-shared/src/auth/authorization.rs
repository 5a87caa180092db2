/// Role and ownership checks
///
/// Two independent checks gate write access:
///
/// 1. **Role allow-list**: each route names the roles that may call it
///    (e.g. only publishers and admins may create bootcamps).
/// 2. **Ownership**: a resource may only be changed by the user who created
///    it, unless the caller is an admin.
///
/// # Example
///
/// ```no_run
/// use devcamper_shared::auth::authorization::{require_owner_or_admin_to, require_role};
/// use devcamper_shared::auth::middleware::AuthContext;
/// use devcamper_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// fn check(auth: &AuthContext, owner: Uuid) -> Result<(), Box<dyn std::error::Error>> {
///     require_role(auth, &[UserRole::Publisher, UserRole::Admin])?;
///     require_owner_or_admin_to(auth, owner, "update this bootcamp")?;
///     Ok(())
/// }
/// ```

use uuid::Uuid;

use super::middleware::AuthContext;
use crate::models::user::UserRole;

/// Roles allowed to manage bootcamps and courses
pub const PUBLISHER_ROLES: &[UserRole] = &[UserRole::Publisher, UserRole::Admin];

/// Roles allowed to write reviews
pub const REVIEWER_ROLES: &[UserRole] = &[UserRole::User, UserRole::Admin];

/// Roles allowed to manage user accounts
pub const ADMIN_ROLES: &[UserRole] = &[UserRole::Admin];

/// Error type for authorization checks
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthzError {
    /// Caller's role is not in the route's allow-list
    #[error("User role {0} is not authorized to access this route")]
    RoleNotAllowed(&'static str),

    /// Caller does not own the resource and is not an admin
    #[error("User {user_id} is not authorized to {action}")]
    NotOwner { user_id: Uuid, action: String },
}

/// Checks the caller's role against an allow-list
pub fn require_role(auth: &AuthContext, allowed: &[UserRole]) -> Result<(), AuthzError> {
    check_role(auth.role(), allowed)
}

fn check_role(role: UserRole, allowed: &[UserRole]) -> Result<(), AuthzError> {
    if allowed.contains(&role) {
        Ok(())
    } else {
        Err(AuthzError::RoleNotAllowed(role.as_str()))
    }
}

/// Checks that the caller owns a resource or is an admin
///
/// `action` completes the rejection message, e.g. "update course {id}".
pub fn require_owner_or_admin_to(
    auth: &AuthContext,
    owner_id: Uuid,
    action: &str,
) -> Result<(), AuthzError> {
    check_owner(auth.user_id(), auth.role(), owner_id, action)
}

fn check_owner(
    user_id: Uuid,
    role: UserRole,
    owner_id: Uuid,
    action: &str,
) -> Result<(), AuthzError> {
    if user_id == owner_id || role == UserRole::Admin {
        Ok(())
    } else {
        Err(AuthzError::NotOwner {
            user_id,
            action: action.to_string(),
        })
    }
}
