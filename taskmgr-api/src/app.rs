/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskmgr_api::{app::AppState, config::Config};
/// use taskmgr_shared::store::MemoryStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), config);
/// let app = taskmgr_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use taskmgr_shared::{
    auth::{
        jwt::{TokenKeys, DEFAULT_TOKEN_TTL_DAYS},
        middleware::{authenticate, TOKEN_HEADER},
    },
    services::{AuthService, TaskService},
    store::Store,
    validation::Calendar,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Persistence backend
    pub store: Arc<dyn Store>,

    /// Application configuration
    pub config: Arc<Config>,

    pub auth: AuthService,
    pub tasks: TaskService,
}

impl AppState {
    /// Creates new application state
    ///
    /// The token keys and due-date calendar are derived from `config`.
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        let ttl = chrono::Duration::try_days(config.jwt.ttl_days).unwrap_or_else(|| {
            tracing::warn!(
                ttl_days = config.jwt.ttl_days,
                "Token lifetime out of range, using default"
            );
            chrono::Duration::days(DEFAULT_TOKEN_TTL_DAYS)
        });
        let keys = TokenKeys::new(&config.jwt.secret, ttl);
        let calendar = Calendar::with_offset_minutes(config.due_date_utc_offset_minutes)
            .unwrap_or_else(Calendar::utc);

        Self {
            auth: AuthService::new(store.clone(), keys),
            tasks: TaskService::new(store.clone(), calendar),
            store,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                   # Store connectivity (public)
/// └── /api/
///     ├── /auth/
///     │   ├── POST /register
///     │   ├── POST /login
///     │   ├── GET  /user        # authenticated
///     │   └── PUT  /update      # authenticated
///     └── /task/                # authenticated
///         ├── GET    /
///         ├── POST   /
///         ├── PUT    /:id
///         └── DELETE /:id
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
/// 4. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let session_routes = Router::new()
        .route("/user", get(routes::auth::current_user))
        .route("/update", put(routes::auth::update_profile))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .merge(session_routes);

    let task_routes = Router::new()
        .route(
            "/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/:id",
            put(routes::tasks::update_task).delete(routes::tasks::delete_task),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/task", task_routes);

    let cors = cors_layer(&state.config.api.cors_origins);

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(TOKEN_HEADER),
        ])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Session authentication middleware layer
///
/// Reads the token from `Authorization: Bearer` or `x-auth-token`,
/// verifies it, then injects `AuthContext` into request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth_context = authenticate(req.headers(), state.auth.keys())?;

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
