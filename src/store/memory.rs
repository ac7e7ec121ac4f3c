//! In-process store backed by a single `RwLock`.
//!
//! Used by the test suites and handy for running the API without PostgreSQL.
//! Users and tasks share one lock so the delete cascade is atomic.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, TaskStore, UserStore};
use crate::models::{NewUser, Task, TaskQuery, User};

#[derive(Default)]
struct Tables {
    next_user_id: i32,
    users: HashMap<i32, User>,
    tasks: HashMap<Uuid, Task>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn conflict_with<'a>(
    users: impl Iterator<Item = &'a User>,
    username: &str,
    email: &str,
    excluding: Option<i32>,
) -> Option<&'a User> {
    users
        .filter(|u| Some(u.id) != excluding)
        .find(|u| u.username == username || u.email == email)
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_by_id(&self, id: i32) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_conflicting(
        &self,
        username: &str,
        email: &str,
        excluding: Option<i32>,
    ) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(conflict_with(tables.users.values(), username, email, excluding).cloned())
    }

    async fn get_admin(&self) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .filter(|u| u.is_admin)
            .min_by_key(|u| u.id)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables.users.values().cloned().collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        if conflict_with(tables.users.values(), &user.username, &user.email, None).is_some() {
            return Err(StoreError::Conflict(
                "username or email already registered".into(),
            ));
        }
        tables.next_user_id += 1;
        let stored = User {
            id: tables.next_user_id,
            username: user.username,
            email: user.email,
            name: user.name,
            password_hash: user.password_hash,
            is_admin: user.is_admin,
            created_at: Utc::now(),
        };
        tables.users.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, user: &User) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user.id) {
            return Err(StoreError::Backend(format!("user {} does not exist", user.id)));
        }
        if conflict_with(tables.users.values(), &user.username, &user.email, Some(user.id))
            .is_some()
        {
            return Err(StoreError::Conflict(
                "username or email already registered".into(),
            ));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }
        tables.tasks.retain(|_, task| task.user_id != id);
        Ok(true)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list_for_user(
        &self,
        user_id: i32,
        query: &TaskQuery,
    ) -> Result<Vec<Task>, StoreError> {
        let tables = self.tables.read().await;
        let mut tasks: Vec<Task> = tables
            .tasks
            .values()
            .filter(|t| t.user_id == user_id && t.matches(query))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(self.tables.read().await.tasks.get(&id).cloned())
    }

    async fn insert(&self, task: &Task) -> Result<Task, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&task.user_id) {
            return Err(StoreError::Backend(format!(
                "user {} does not exist",
                task.user_id
            )));
        }
        tables.tasks.insert(task.id, task.clone());
        Ok(task.clone())
    }

    async fn update(&self, task: &Task) -> Result<Task, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.tasks.get_mut(&task.id) {
            Some(stored) => {
                *stored = task.clone();
                Ok(task.clone())
            }
            None => Err(StoreError::Backend(format!("task {} does not exist", task.id))),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.tables.write().await.tasks.remove(&id).is_some())
    }
}
