/// Configuration management for the API server
///
/// Configuration is read from environment variables, with a `.env` file
/// loaded first when present.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 5000)
/// - `JWT_SECRET`: Token signing secret, at least 32 characters (required)
/// - `JWT_TTL_DAYS`: Session lifetime in days, 1 to 3650 (default: 7)
/// - `STORE_BACKEND`: `postgres` or `memory` (default: postgres)
/// - `DATABASE_URL`: PostgreSQL connection string (required for postgres)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, `*` for any (default: *)
/// - `PRODUCTION`: Enables HSTS (default: false)
/// - `DUE_DATE_UTC_OFFSET_MINUTES`: Offset used for "today" in due-date checks (default: 0)
/// - `LOG_FORMAT`: `pretty` or `json` (default: pretty)
/// - `RUST_LOG`: Log filter (default: taskmgr_api=debug,taskmgr_shared=debug,tower_http=debug)
///
/// # Example
///
/// ```no_run
/// use taskmgr_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::{env, fmt, str::FromStr};

use anyhow::Context;
use taskmgr_shared::auth::jwt::{DEFAULT_TOKEN_TTL_DAYS, MAX_TOKEN_TTL_DAYS};

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server configuration
    pub api: ApiConfig,

    /// Which store implementation to run against
    pub store: StoreBackend,

    /// Database configuration (postgres backend only)
    pub database: Option<DatabaseConfig>,

    /// Session token configuration
    pub jwt: JwtConfig,

    /// Minutes east of UTC used to decide where "today" starts
    pub due_date_utc_offset_minutes: i32,

    pub log_format: LogFormat,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Production mode turns on HSTS
    pub production: bool,
}

/// Database configuration
#[derive(Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// Session token configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Signing secret
    ///
    /// Must be at least 32 bytes. Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Token lifetime in days
    pub ttl_days: i64,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("ttl_days", &self.ttl_days)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => anyhow::bail!("Unknown STORE_BACKEND '{}': expected postgres or memory", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("Unknown LOG_FORMAT '{}': expected pretty or json", other),
        }
    }
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `JWT_SECRET` is missing or shorter than 32 characters
    /// - `DATABASE_URL` is missing while the postgres backend is selected
    /// - A variable has an unparseable value
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let host = var("API_HOST", "0.0.0.0");
        let port = var("API_PORT", "5000")
            .parse::<u16>()
            .context("API_PORT must be a valid port number")?;

        let cors_origins = var("CORS_ORIGINS", "*")
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let production = parse_bool(&var("PRODUCTION", "false"))
            .context("PRODUCTION must be true or false")?;

        let store = var("STORE_BACKEND", "postgres").parse::<StoreBackend>()?;

        let database = match store {
            StoreBackend::Postgres => {
                let url = lookup("DATABASE_URL").ok_or_else(|| {
                    anyhow::anyhow!("DATABASE_URL environment variable is required")
                })?;
                let max_connections = var("DATABASE_MAX_CONNECTIONS", "10")
                    .parse::<u32>()
                    .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?;
                Some(DatabaseConfig {
                    url,
                    max_connections,
                })
            }
            StoreBackend::Memory => None,
        };

        let secret = lookup("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;
        if secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let ttl_days = lookup("JWT_TTL_DAYS")
            .map(|raw| raw.parse::<i64>())
            .transpose()
            .context("JWT_TTL_DAYS must be an integer")?
            .unwrap_or(DEFAULT_TOKEN_TTL_DAYS);
        if !(1..=MAX_TOKEN_TTL_DAYS).contains(&ttl_days) {
            anyhow::bail!("JWT_TTL_DAYS must be between 1 and {}", MAX_TOKEN_TTL_DAYS);
        }

        let due_date_utc_offset_minutes = var("DUE_DATE_UTC_OFFSET_MINUTES", "0")
            .parse::<i32>()
            .context("DUE_DATE_UTC_OFFSET_MINUTES must be an integer")?;
        if due_date_utc_offset_minutes.abs() >= 24 * 60 {
            anyhow::bail!("DUE_DATE_UTC_OFFSET_MINUTES must be within ±1439");
        }

        let log_format = var("LOG_FORMAT", "pretty").parse::<LogFormat>()?;

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
                production,
            },
            store,
            database,
            jwt: JwtConfig { secret, ttl_days },
            due_date_utc_offset_minutes,
            log_format,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_bool(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("invalid boolean '{}'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_with_memory_store() {
        let config = load(&[("JWT_SECRET", SECRET), ("STORE_BACKEND", "memory")]).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.store, StoreBackend::Memory);
        assert!(config.database.is_none());
        assert_eq!(config.jwt.ttl_days, 7);
        assert_eq!(config.api.cors_origins, vec!["*"]);
        assert!(!config.api.production);
        assert_eq!(config.due_date_utc_offset_minutes, 0);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_postgres_requires_database_url() {
        let err = load(&[("JWT_SECRET", SECRET)]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));

        let config = load(&[
            ("JWT_SECRET", SECRET),
            ("DATABASE_URL", "postgresql://localhost/taskmgr"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
        ])
        .unwrap();
        assert_eq!(config.store, StoreBackend::Postgres);
        assert_eq!(config.database.map(|d| d.max_connections), Some(4));
    }

    #[test]
    fn test_jwt_secret_rules() {
        let err = load(&[("STORE_BACKEND", "memory")]).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));

        let err = load(&[("STORE_BACKEND", "memory"), ("JWT_SECRET", "short")]).unwrap_err();
        assert!(err.to_string().contains("32"));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("JWT_SECRET", SECRET),
            ("STORE_BACKEND", "memory"),
            ("API_HOST", "127.0.0.1"),
            ("API_PORT", "8080"),
            ("CORS_ORIGINS", "http://localhost:5173, https://tasks.example.com"),
            ("PRODUCTION", "true"),
            ("DUE_DATE_UTC_OFFSET_MINUTES", "330"),
            ("LOG_FORMAT", "json"),
            ("JWT_TTL_DAYS", "1"),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(
            config.api.cors_origins,
            vec!["http://localhost:5173", "https://tasks.example.com"]
        );
        assert!(config.api.production);
        assert_eq!(config.due_date_utc_offset_minutes, 330);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.jwt.ttl_days, 1);
    }

    #[test]
    fn test_jwt_ttl_bounds() {
        let ttl = |days: &str| {
            load(&[
                ("JWT_SECRET", SECRET),
                ("STORE_BACKEND", "memory"),
                ("JWT_TTL_DAYS", days),
            ])
        };

        assert_eq!(ttl("3650").unwrap().jwt.ttl_days, 3650);
        for days in ["0", "-1", "3651", "9223372036854775807", "seven"] {
            let err = ttl(days).unwrap_err();
            assert!(format!("{:#}", err).contains("JWT_TTL_DAYS"), "{}", days);
        }
    }

    #[test]
    fn test_invalid_values() {
        assert!(load(&[("JWT_SECRET", SECRET), ("STORE_BACKEND", "sqlite")]).is_err());
        assert!(load(&[
            ("JWT_SECRET", SECRET),
            ("STORE_BACKEND", "memory"),
            ("API_PORT", "seventy")
        ])
        .is_err());
        assert!(load(&[
            ("JWT_SECRET", SECRET),
            ("STORE_BACKEND", "memory"),
            ("DUE_DATE_UTC_OFFSET_MINUTES", "1440")
        ])
        .is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = load(&[
            ("JWT_SECRET", SECRET),
            ("DATABASE_URL", "postgresql://user:hunter2@db/taskmgr"),
        ])
        .unwrap();
        let rendered = format!("{:?}", config);

        assert!(!rendered.contains(SECRET));
        assert!(!rendered.contains("hunter2"));
    }
}
