//! Business logic on top of the store
//!
//! - `auth`: registration, login, current user and profile updates
//! - `tasks`: owner-scoped task CRUD

pub mod auth;
pub mod tasks;

pub use auth::AuthService;
pub use tasks::TaskService;
