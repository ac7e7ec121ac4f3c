//! Persistence seams.
//!
//! The auth core and the services only talk to [`UserStore`] and
//! [`TaskStore`]. Each method is one atomic logical operation; callers add no
//! locking of their own.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::fmt;
use uuid::Uuid;

use crate::models::{NewUser, Task, TaskQuery, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique constraint (username, email) was violated.
    Conflict(String),
    /// Anything else the backend reported.
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StoreError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            StoreError::Backend(msg) => write!(f, "Storage backend error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> StoreError {
        match &error {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(db.message().to_string())
            }
            _ => StoreError::Backend(error.to_string()),
        }
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_by_id(&self, id: i32) -> Result<Option<User>, StoreError>;
    async fn get_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    /// A user other than `excluding` holding `username` or `email`, if any.
    async fn find_conflicting(
        &self,
        username: &str,
        email: &str,
        excluding: Option<i32>,
    ) -> Result<Option<User>, StoreError>;
    async fn get_admin(&self) -> Result<Option<User>, StoreError>;
    async fn list(&self) -> Result<Vec<User>, StoreError>;
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;
    async fn update(&self, user: &User) -> Result<User, StoreError>;
    /// Removes the user and every task they own. Returns `false` if absent.
    async fn delete(&self, id: i32) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Tasks owned by `user_id` matching `query`, newest first.
    async fn list_for_user(&self, user_id: i32, query: &TaskQuery)
        -> Result<Vec<Task>, StoreError>;
    async fn get(&self, id: Uuid) -> Result<Option<Task>, StoreError>;
    async fn insert(&self, task: &Task) -> Result<Task, StoreError>;
    async fn update(&self, task: &Task) -> Result<Task, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}
