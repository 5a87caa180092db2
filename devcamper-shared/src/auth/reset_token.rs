/// Password reset tokens
///
/// The plaintext token is mailed to the user and never stored. Only its
/// SHA-256 hex digest is persisted, together with an expiry.
///
/// # Example
///
/// ```
/// use devcamper_shared::auth::reset_token::{generate_reset_token, hash_reset_token};
///
/// let (token, hash) = generate_reset_token();
/// assert_eq!(hash_reset_token(&token), hash);
/// ```

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of random bytes in a reset token (hex doubles the length)
const TOKEN_BYTES: usize = 20;

/// How long a reset token stays valid
pub const RESET_TOKEN_TTL_MINUTES: i64 = 10;

/// Generates a new reset token
///
/// Returns `(plaintext, sha256_hex)`.
pub fn generate_reset_token() -> (String, String) {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);

    let token = hex::encode(bytes);
    let hash = hash_reset_token(&token);

    (token, hash)
}

/// Hashes a reset token with SHA-256
pub fn hash_reset_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Expiry timestamp for a token issued now
pub fn reset_token_expiry() -> DateTime<Utc> {
    Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES)
}
