/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Register a new user and get a token
/// - `POST /api/auth/login` - Login and get a token
/// - `GET /api/auth/user` - Current user's public profile (authenticated)
/// - `PUT /api/auth/update` - Partial profile update (authenticated)

use crate::{app::AppState, error::ApiResult};
use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use serde::Serialize;
use taskmgr_shared::{
    auth::middleware::AuthContext,
    models::user::{ProfileUpdate, UserProfile, UserSummary},
    services::auth::{AuthSession, Credentials, Registration},
};

/// Register and login response
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub message: String,

    /// Signed session token
    pub token: String,

    pub user: UserSummary,
}

impl SessionResponse {
    fn new(message: String, session: AuthSession) -> Self {
        Self {
            message,
            token: session.token,
            user: session.user,
        }
    }
}

/// Profile update response
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub message: String,
    pub user: UserProfile,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/register
/// Content-Type: application/json
///
/// {
///   "username": "alice",
///   "email": "alice@example.com",
///   "password": "secret1"
/// }
/// ```
///
/// # Response (201)
///
/// ```json
/// {
///   "message": "Registration successful!",
///   "token": "eyJ...",
///   "user": { "id": "uuid", "username": "alice", "email": "alice@example.com" }
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or email already registered
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Registration>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let Json(req) = payload?;

    let session = state.auth.register(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse::new(
            "Registration successful!".to_string(),
            session,
        )),
    ))
}

/// Login with email and password
///
/// Unknown email and wrong password produce the same
/// `400 Invalid email or password` response.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult<Json<SessionResponse>> {
    let Json(req) = payload?;

    let session = state.auth.login(req).await?;
    let message = format!("Welcome back, {}!", session.user.username);

    Ok(Json(SessionResponse::new(message, session)))
}

/// Current user's public profile
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid token
/// - `404 Not Found`: The token's user no longer exists
pub async fn current_user(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<UserProfile>> {
    let profile = state.auth.current_user(auth.user_id).await?;
    Ok(Json(profile))
}

/// Partial profile update
///
/// Accepts any of `username`, `email`, `bio`, `phoneNumber`, `location`.
/// Omitted fields are left unchanged.
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthContext,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> ApiResult<Json<ProfileResponse>> {
    let Json(update) = payload?;

    let user = state.auth.update_profile(auth.user_id, update).await?;

    Ok(Json(ProfileResponse {
        message: "Profile updated successfully".to_string(),
        user,
    }))
}
