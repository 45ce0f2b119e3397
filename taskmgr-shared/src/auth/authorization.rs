/// Resource ownership checks
///
/// Every task has exactly one owner, and only the owner may change or
/// delete it. Services load the record first and call [`require_owner`]
/// before touching it.
///
/// # Example
///
/// ```
/// use taskmgr_shared::auth::authorization::{require_ownership, AuthzError};
/// use taskmgr_shared::auth::middleware::AuthContext;
/// use uuid::Uuid;
///
/// let owner = Uuid::new_v4();
/// assert!(require_ownership(&AuthContext::new(owner), owner).is_ok());
///
/// let stranger = AuthContext::new(Uuid::new_v4());
/// assert!(matches!(require_ownership(&stranger, owner), Err(AuthzError::NotOwner)));
/// ```

use uuid::Uuid;

use super::middleware::AuthContext;
use crate::models::task::Task;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Caller doesn't own the resource
    #[error("Not authorized to access this resource")]
    NotOwner,
}

/// A record that belongs to exactly one user
pub trait OwnedResource {
    fn owner_id(&self) -> Uuid;
}

impl OwnedResource for Task {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

/// Checks that `auth` is the owner identified by `owner_id`
pub fn require_ownership(auth: &AuthContext, owner_id: Uuid) -> Result<(), AuthzError> {
    if auth.user_id == owner_id {
        Ok(())
    } else {
        Err(AuthzError::NotOwner)
    }
}

/// Checks that `auth` owns `resource`
pub fn require_owner<R: OwnedResource>(auth: &AuthContext, resource: &R) -> Result<(), AuthzError> {
    require_ownership(auth, resource.owner_id())
}
