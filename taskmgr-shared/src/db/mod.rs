/// PostgreSQL plumbing
///
/// - `pool`: connection pool creation and health checks
/// - `migrations`: embedded schema migrations
///
/// Queries themselves live on the models (`crate::models`).

pub mod migrations;
pub mod pool;
