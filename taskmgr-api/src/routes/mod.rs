/// API route handlers
///
/// Handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login and profile endpoints
/// - `tasks`: Owner-scoped task CRUD

pub mod auth;
pub mod health;
pub mod tasks;
