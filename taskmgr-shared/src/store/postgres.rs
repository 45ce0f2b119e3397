//! PostgreSQL store backed by the model queries

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Store, StoreError, TaskStore, UserStore};
use crate::db::pool::health_check;
use crate::models::task::{NewTask, Task, TaskChanges};
use crate::models::user::{NewUser, User, UserChanges};

/// `sqlx` adapter; cloning shares the underlying pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        Ok(User::create(&self.pool, user).await?)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn update_user(
        &self,
        id: Uuid,
        changes: UserChanges,
    ) -> Result<Option<User>, StoreError> {
        Ok(User::update(&self.pool, id, changes).await?)
    }

    async fn touch_last_login(&self, id: Uuid) -> Result<(), StoreError> {
        User::update_last_login(&self.pool, id).await?;
        Ok(())
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn insert_task(&self, task: NewTask) -> Result<Task, StoreError> {
        Ok(Task::create(&self.pool, task).await?)
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn list_tasks_by_owner(&self, user_id: Uuid) -> Result<Vec<Task>, StoreError> {
        Ok(Task::list_by_owner(&self.pool, user_id).await?)
    }

    async fn update_task(
        &self,
        id: Uuid,
        changes: TaskChanges,
    ) -> Result<Option<Task>, StoreError> {
        Ok(Task::update(&self.pool, id, changes).await?)
    }

    async fn delete_task(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(Task::delete(&self.pool, id).await?)
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(health_check(&self.pool).await?)
    }
}
