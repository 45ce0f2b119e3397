//! In-process store for tests and local development
//!
//! Mirrors the PostgreSQL schema rules that services rely on: unique emails
//! and newest-first task listing. Data is lost when the process exits.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError, TaskStore, UserStore};
use crate::models::task::{NewTask, Task, TaskChanges};
use crate::models::user::{NewUser, User, UserChanges, DEFAULT_BIO};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    // Insertion order; listing relies on it to break created_at ties.
    tasks: Vec<Task>,
}

impl Inner {
    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| Some(u.id) != except && u.email.eq_ignore_ascii_case(email))
    }
}

/// Map-backed store guarded by a `tokio` read/write lock
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;

        if inner.email_taken(&user.email, None) {
            return Err(StoreError::DuplicateEmail);
        }

        let now = Utc::now();
        let record = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            bio: DEFAULT_BIO.to_string(),
            phone_number: None,
            location: String::new(),
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(record.id, record.clone());

        Ok(record)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update_user(
        &self,
        id: Uuid,
        changes: UserChanges,
    ) -> Result<Option<User>, StoreError> {
        let mut inner = self.inner.write().await;

        if let Some(email) = &changes.email {
            if inner.email_taken(email, Some(id)) {
                return Err(StoreError::DuplicateEmail);
            }
        }

        Ok(inner.users.get_mut(&id).map(|user| {
            changes.apply_to(user);
            user.clone()
        }))
    }

    async fn touch_last_login(&self, id: Uuid) -> Result<(), StoreError> {
        if let Some(user) = self.inner.write().await.users.get_mut(&id) {
            user.last_login_at = Some(Utc::now());
        }
        Ok(())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, task: NewTask) -> Result<Task, StoreError> {
        let record = Task {
            id: Uuid::new_v4(),
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            due_date: task.due_date,
            user_id: task.user_id,
            created_at: Utc::now(),
        };
        self.inner.write().await.tasks.push(record.clone());

        Ok(record)
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tasks_by_owner(&self, user_id: Uuid) -> Result<Vec<Task>, StoreError> {
        let inner = self.inner.read().await;
        let mut tasks: Vec<Task> = inner
            .tasks
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        // Stable sort keeps later inserts first when timestamps tie.
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(tasks)
    }

    async fn update_task(
        &self,
        id: Uuid,
        changes: TaskChanges,
    ) -> Result<Option<Task>, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.tasks.iter_mut().find(|t| t.id == id).map(|task| {
            changes.apply_to(task);
            task.clone()
        }))
    }

    async fn delete_task(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.tasks.len();
        inner.tasks.retain(|t| t.id != id);

        Ok(inner.tasks.len() != before)
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::{TaskPriority, TaskStatus};

    fn new_user(email: &str) -> NewUser {
        NewUser {
            username: "alice".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    fn new_task(user_id: Uuid, title: &str) -> NewTask {
        NewTask {
            user_id,
            title: title.to_string(),
            description: "2%".to_string(),
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
            due_date: None,
        }
    }

    #[tokio::test]
    async fn test_insert_user_defaults() {
        let store = MemoryStore::new();
        let user = store.insert_user(new_user("a@x.com")).await.unwrap();

        assert_eq!(user.bio, DEFAULT_BIO);
        assert_eq!(user.location, "");
        assert!(user.is_active);
        assert!(user.last_login_at.is_none());
        assert_eq!(
            store.find_user_by_email("a@x.com").await.unwrap().map(|u| u.id),
            Some(user.id)
        );
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        store.insert_user(new_user("a@x.com")).await.unwrap();

        let err = store.insert_user(new_user("A@X.com")).await.unwrap_err();
        assert_eq!(err, StoreError::DuplicateEmail);
        assert_eq!(store.inner.read().await.users.len(), 1);
    }

    #[tokio::test]
    async fn test_update_user_email_conflict() {
        let store = MemoryStore::new();
        store.insert_user(new_user("a@x.com")).await.unwrap();
        let bob = store.insert_user(new_user("b@x.com")).await.unwrap();

        let changes = UserChanges {
            email: Some("a@x.com".to_string()),
            ..Default::default()
        };
        assert_eq!(
            store.update_user(bob.id, changes).await.unwrap_err(),
            StoreError::DuplicateEmail
        );

        // Keeping your own email is not a conflict
        let changes = UserChanges {
            email: Some("b@x.com".to_string()),
            ..Default::default()
        };
        assert!(store.update_user(bob.id, changes).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_touch_last_login() {
        let store = MemoryStore::new();
        let user = store.insert_user(new_user("a@x.com")).await.unwrap();

        store.touch_last_login(user.id).await.unwrap();

        let user = store.find_user_by_id(user.id).await.unwrap().unwrap();
        assert!(user.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_list_newest_first_and_scoped() {
        let store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        store.insert_task(new_task(alice, "first")).await.unwrap();
        store.insert_task(new_task(bob, "other")).await.unwrap();
        store.insert_task(new_task(alice, "second")).await.unwrap();

        let titles: Vec<String> = store
            .list_tasks_by_owner(alice)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn test_update_and_delete_task() {
        let store = MemoryStore::new();
        let task = store.insert_task(new_task(Uuid::new_v4(), "Buy milk")).await.unwrap();

        let changes = TaskChanges {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        };
        let updated = store.update_task(task.id, changes).await.unwrap().unwrap();
        assert_eq!(updated.status, TaskStatus::Completed);
        assert_eq!(updated.title, "Buy milk");

        assert!(store.delete_task(task.id).await.unwrap());
        assert!(!store.delete_task(task.id).await.unwrap());
        assert!(store.find_task(task.id).await.unwrap().is_none());
        assert!(store
            .update_task(task.id, TaskChanges::default())
            .await
            .unwrap()
            .is_none());
    }
}
