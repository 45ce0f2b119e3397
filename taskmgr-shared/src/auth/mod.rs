/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: Session token issuing and verification
/// - [`middleware`]: Token extraction and the `AuthContext` extractor
/// - [`authorization`]: Ownership checks for owned resources
///
/// # Example
///
/// ```no_run
/// use taskmgr_shared::auth::password::{hash_password, verify_password};
/// use taskmgr_shared::auth::jwt::TokenKeys;
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash));
///
/// let keys = TokenKeys::new("secret-key-of-at-least-thirty-two-bytes", Duration::days(7));
/// let token = keys.issue(Uuid::new_v4())?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
