//! # TaskMgr API Server
//!
//! REST backend for a personal task manager: account registration and
//! login with signed session tokens, profile management, and CRUD over
//! tasks that only their owner can see or change.
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=$(openssl rand -hex 32) STORE_BACKEND=memory cargo run -p taskmgr-api
//! ```

use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;
use taskmgr_api::{
    app::{build_router, AppState},
    config::{Config, LogFormat, StoreBackend},
};
use taskmgr_shared::{
    db::{
        migrations::{ensure_database_exists, get_migration_status, run_migrations},
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    store::{MemoryStore, PgStore, Store},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    init_tracing(config.log_format);

    tracing::info!(
        "TaskMgr API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let (store, pool) = open_store(&config).await?;
    tracing::info!(backend = store.backend_name(), "Store ready");

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(pool) = pool {
        close_pool(pool).await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "taskmgr_api=debug,taskmgr_shared=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Opens the configured store, returning the pool too when there is one
async fn open_store(config: &Config) -> anyhow::Result<(Arc<dyn Store>, Option<PgPool>)> {
    match config.store {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on shutdown");
            Ok((Arc::new(MemoryStore::new()), None))
        }
        StoreBackend::Postgres => {
            let database = config
                .database
                .as_ref()
                .context("DATABASE_URL is required for the postgres store")?;

            ensure_database_exists(&database.url)
                .await
                .context("Failed to create database")?;

            let pool = create_pool(DatabaseConfig {
                max_connections: database.max_connections,
                ..DatabaseConfig::new(database.url.clone())
            })
            .await
            .context("Failed to connect to database")?;

            run_migrations(&pool)
                .await
                .context("Failed to run migrations")?;

            let status = get_migration_status(&pool).await?;
            tracing::info!(
                applied = status.applied_migrations,
                latest = ?status.latest_version,
                "Migrations applied"
            );

            Ok((Arc::new(PgStore::new(pool.clone())), Some(pool)))
        }
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received, draining connections..."),
        Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
    }
}
