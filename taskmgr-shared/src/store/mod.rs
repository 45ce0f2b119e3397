//! Storage ports for users and tasks
//!
//! Services talk to an `Arc<dyn Store>`. Two adapters implement it:
//!
//! - [`postgres::PgStore`]: `sqlx` queries defined on the models
//! - [`memory::MemoryStore`]: an in-process map for tests and local runs
//!
//! Adapters map their failures into [`StoreError`] so services never see
//! backend-specific error types.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::task::{NewTask, Task, TaskChanges};
use crate::models::user::{NewUser, User, UserChanges};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors surfaced by storage adapters
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Another user already holds this email
    #[error("email already registered")]
    DuplicateEmail,

    /// Connectivity, query or other backend failure
    #[error("store backend failure: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let on_email = db_err
                .constraint()
                .map(|c| c.contains("email"))
                .unwrap_or(false);
            if db_err.is_unique_violation() && on_email {
                return StoreError::DuplicateEmail;
            }
        }

        StoreError::Backend(err.to_string())
    }
}

/// Credential store
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persists a new user; `DuplicateEmail` if the email is taken
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Looks up by normalized email
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Applies profile changes; `None` if the user doesn't exist
    async fn update_user(
        &self,
        id: Uuid,
        changes: UserChanges,
    ) -> Result<Option<User>, StoreError>;

    /// Stamps `last_login_at` with the current time
    async fn touch_last_login(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Task store
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, task: NewTask) -> Result<Task, StoreError>;

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StoreError>;

    /// All tasks owned by `user_id`, newest first
    async fn list_tasks_by_owner(&self, user_id: Uuid) -> Result<Vec<Task>, StoreError>;

    /// Applies changes; `None` if the task doesn't exist
    async fn update_task(
        &self,
        id: Uuid,
        changes: TaskChanges,
    ) -> Result<Option<Task>, StoreError>;

    /// Removes a task; false if it didn't exist
    async fn delete_task(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Everything the services need from persistence
#[async_trait]
pub trait Store: UserStore + TaskStore {
    /// Short name for logs and the health endpoint
    fn backend_name(&self) -> &'static str;

    /// Verifies the backend is reachable
    async fn ping(&self) -> Result<(), StoreError>;
}
