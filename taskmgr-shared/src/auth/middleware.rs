/// Request authentication helpers for Axum
///
/// The API server installs a guard layer that calls [`authenticate`] for every
/// protected route and inserts the resulting [`AuthContext`] into the request
/// extensions. Handlers then take `AuthContext` as an extractor.
///
/// # Token sources
///
/// 1. `Authorization: Bearer <token>`
/// 2. `x-auth-token: <token>` (fallback)
///
/// # Example
///
/// ```
/// use axum::http::{header, HeaderMap, HeaderValue};
/// use chrono::Duration;
/// use taskmgr_shared::auth::{jwt::TokenKeys, middleware::authenticate};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let keys = TokenKeys::new("your-secret-key-at-least-32-bytes!!", Duration::days(7));
/// let user_id = Uuid::new_v4();
/// let token = keys.issue(user_id)?;
///
/// let mut headers = HeaderMap::new();
/// headers.insert(header::AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", token))?);
///
/// let auth = authenticate(&headers, &keys)?;
/// assert_eq!(auth.user_id, user_id);
/// # Ok(())
/// # }
/// ```

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use super::jwt::{JwtError, TokenKeys};

/// Custom token header accepted alongside `Authorization`
pub const TOKEN_HEADER: &str = "x-auth-token";

/// Authentication context added to request extensions
///
/// Handlers can take it directly as an extractor:
///
/// ```
/// use taskmgr_shared::auth::middleware::AuthContext;
///
/// async fn handler(auth: AuthContext) -> String {
///     format!("User: {}", auth.user_id)
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,
}

impl AuthContext {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

/// Error type for request authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Neither token header present
    #[error("Access denied. No token provided.")]
    MissingToken,

    /// Token present but rejected
    #[error("Token is not valid")]
    InvalidToken(String),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        AuthError::InvalidToken(err.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let error = match &self {
            AuthError::MissingToken => "missing_token",
            AuthError::InvalidToken(reason) => {
                tracing::debug!(reason = %reason, "Rejected session token");
                "invalid_token"
            }
        };

        let body = Json(json!({
            "success": false,
            "error": error,
            "message": self.to_string(),
        }));

        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// Pulls the raw token out of the request headers
///
/// A `Bearer` authorization header wins; otherwise `x-auth-token` is used.
/// Blank values count as absent.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    bearer.or_else(|| {
        headers
            .get(TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|t| !t.is_empty())
    })
}

/// Resolves the acting identity from request headers
///
/// # Errors
///
/// - `AuthError::MissingToken` if no token is supplied
/// - `AuthError::InvalidToken` if the token is malformed, forged or expired
pub fn authenticate(headers: &HeaderMap, keys: &TokenKeys) -> Result<AuthContext, AuthError> {
    let token = extract_token(headers).ok_or(AuthError::MissingToken)?;
    let user_id = keys.verify(token)?;

    Ok(AuthContext::new(user_id))
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .copied()
            .ok_or(AuthError::MissingToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::Duration;

    fn keys() -> TokenKeys {
        TokenKeys::new("test-secret-key-at-least-32-bytes-long", Duration::days(7))
    }

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                header::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_extract_bearer() {
        let map = headers(&[("authorization", "Bearer abc.def.ghi")]);
        assert_eq!(extract_token(&map), Some("abc.def.ghi"));
    }

    #[test]
    fn test_extract_custom_header() {
        let map = headers(&[(TOKEN_HEADER, "abc.def.ghi")]);
        assert_eq!(extract_token(&map), Some("abc.def.ghi"));
    }

    #[test]
    fn test_bearer_preferred() {
        let map = headers(&[
            ("authorization", "Bearer from-bearer"),
            (TOKEN_HEADER, "from-custom"),
        ]);
        assert_eq!(extract_token(&map), Some("from-bearer"));
    }

    #[test]
    fn test_non_bearer_falls_back() {
        let map = headers(&[("authorization", "Basic dXNlcjpwYXNz")]);
        assert_eq!(extract_token(&map), None);

        let map = headers(&[("authorization", "Bearer "), (TOKEN_HEADER, "custom")]);
        assert_eq!(extract_token(&map), Some("custom"));
    }

    #[test]
    fn test_authenticate_missing() {
        let result = authenticate(&HeaderMap::new(), &keys());
        assert!(matches!(result, Err(AuthError::MissingToken)));
    }

    #[test]
    fn test_authenticate_valid_and_repeatable() {
        let user_id = Uuid::new_v4();
        let token = keys().issue(user_id).unwrap();
        let map = headers(&[(TOKEN_HEADER, &token)]);

        assert_eq!(authenticate(&map, &keys()).unwrap().user_id, user_id);
        assert_eq!(authenticate(&map, &keys()).unwrap().user_id, user_id);
    }

    #[test]
    fn test_authenticate_invalid() {
        let map = headers(&[("authorization", "Bearer garbage")]);
        assert!(matches!(
            authenticate(&map, &keys()),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_auth_error_into_response() {
        let response = AuthError::MissingToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthError::InvalidToken("bad".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
