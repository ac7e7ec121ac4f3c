//! Ownership-checked task CRUD.

use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::models::{Task, TaskInput, TaskPatch, TaskQuery, User};
use crate::store::TaskStore;

#[derive(Clone)]
pub struct TaskService {
    tasks: Arc<dyn TaskStore>,
}

impl TaskService {
    pub fn new(tasks: Arc<dyn TaskStore>) -> Self {
        Self { tasks }
    }

    pub async fn list(&self, owner: &User, query: &TaskQuery) -> Result<Vec<Task>, AppError> {
        Ok(self.tasks.list_for_user(owner.id, query).await?)
    }

    pub async fn create(&self, input: TaskInput, owner: &User) -> Result<Task, AppError> {
        input.validate()?;
        Ok(self.tasks.insert(&Task::new(input, owner.id)).await?)
    }

    /// Unknown ids are `NotFound`; tasks of other users are `Forbidden`.
    pub async fn get(&self, id: Uuid, owner: &User) -> Result<Task, AppError> {
        let task = self
            .tasks
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Task not found.".into()))?;
        if task.user_id != owner.id {
            return Err(AppError::Forbidden(
                "You do not have permission to access this task.".into(),
            ));
        }
        Ok(task)
    }

    pub async fn update(&self, id: Uuid, patch: TaskPatch, owner: &User) -> Result<Task, AppError> {
        patch.validate()?;
        let mut task = self.get(id, owner).await?;
        task.apply(patch);
        Ok(self.tasks.update(&task).await?)
    }

    pub async fn delete(&self, id: Uuid, owner: &User) -> Result<(), AppError> {
        let task = self.get(id, owner).await?;
        if !self.tasks.delete(task.id).await? {
            return Err(AppError::NotFound("Task not found.".into()));
        }
        Ok(())
    }
}
