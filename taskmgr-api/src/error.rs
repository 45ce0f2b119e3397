/// Error handling for the API server
///
/// All handlers return `ApiResult<T>`. Every error renders as
///
/// ```json
/// { "success": false, "error": "<code>", "message": "...", "details": [...] }
/// ```
///
/// with `details` present only for validation failures.
///
/// # Status mapping
///
/// | Service error | Status |
/// |---|---|
/// | Validation, DuplicateEmail, InvalidCredentials | 400 |
/// | MissingToken, InvalidToken | 401 |
/// | Forbidden | 403 |
/// | NotFound | 404 |
/// | Internal | 500 |

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use taskmgr_shared::{
    auth::middleware::AuthError, error::ServiceError, validation::FieldError,
};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Field-level validation failure as rendered in `details`
pub type ValidationErrorDetail = FieldError;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400) with a machine-readable code
    BadRequest { code: &'static str, message: String },

    /// Unauthorized (401)
    Unauthorized { code: &'static str, message: String },

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Validation errors (400)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always false
    pub success: bool,

    /// Error code (e.g., "validation_error", "invalid_token")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest { message, .. } => write!(f, "Bad request: {}", message),
            ApiError::Unauthorized { message, .. } => write!(f, "Unauthorized: {}", message),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, code, message, None)
            }
            ApiError::Unauthorized { code, message } => {
                (StatusCode::UNAUTHORIZED, code, message, None)
            }
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::ValidationError(errors) => {
                // The first failure doubles as the headline message.
                let message = errors
                    .first()
                    .map(|e| e.message.clone())
                    .unwrap_or_else(|| "Request validation failed".to_string());
                (StatusCode::BAD_REQUEST, "validation_error", message, Some(errors))
            }
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Server error".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::Validation(errors) => ApiError::ValidationError(errors),
            ServiceError::DuplicateEmail => ApiError::BadRequest {
                code: "duplicate_email",
                message,
            },
            ServiceError::InvalidCredentials => ApiError::BadRequest {
                code: "invalid_credentials",
                message,
            },
            ServiceError::MissingToken => ApiError::Unauthorized {
                code: "missing_token",
                message,
            },
            ServiceError::InvalidToken => ApiError::Unauthorized {
                code: "invalid_token",
                message,
            },
            ServiceError::Forbidden(msg) => ApiError::Forbidden(msg),
            ServiceError::NotFound(msg) => ApiError::NotFound(msg.to_string()),
            ServiceError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

/// Convert auth guard errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        if let AuthError::InvalidToken(reason) = &err {
            tracing::debug!(reason = %reason, "Rejected session token");
        }
        ServiceError::from(err).into()
    }
}

/// Malformed or non-JSON request bodies
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest {
            code: "invalid_body",
            message: rejection.body_text(),
        }
    }
}
