//! Service-level error taxonomy
//!
//! Services return [`ServiceError`]; the API crate maps each variant to an
//! HTTP status. Adapter and auth errors convert in with `?`.

use crate::auth::authorization::AuthzError;
use crate::auth::jwt::JwtError;
use crate::auth::middleware::AuthError;
use crate::auth::password::PasswordError;
use crate::store::StoreError;
use crate::validation::FieldError;

/// Result alias used by the services
pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// One or more fields failed validation
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("User with this email already exists")]
    DuplicateEmail,

    /// Unknown email or wrong password; deliberately indistinguishable
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Access denied. No token provided.")]
    MissingToken,

    #[error("Token is not valid")]
    InvalidToken,

    /// Authenticated, but not the owner
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(&'static str),

    /// Anything the caller can't fix; the detail is logged, never returned
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<Vec<FieldError>> for ServiceError {
    fn from(errors: Vec<FieldError>) -> Self {
        ServiceError::Validation(errors)
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => ServiceError::DuplicateEmail,
            StoreError::Backend(msg) => ServiceError::Internal(msg),
        }
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl From<JwtError> for ServiceError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => ServiceError::Internal(msg),
            JwtError::ValidationError(_) | JwtError::Expired => ServiceError::InvalidToken,
        }
    }
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken => ServiceError::MissingToken,
            AuthError::InvalidToken(_) => ServiceError::InvalidToken,
        }
    }
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotOwner => ServiceError::Forbidden(err.to_string()),
        }
    }
}
