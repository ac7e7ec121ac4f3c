use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{TaskInput, TaskPatch, TaskQuery},
    services::TaskService,
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use serde_json::json;
use uuid::Uuid;

/// Retrieves the authenticated user's tasks, newest first.
///
/// ## Query Parameters:
/// - `status` (optional): `pending`, `in_progress` or `done`.
/// - `priority` (optional): `low`, `medium` or `high`.
/// - `search` (optional): Case-insensitive match on title and description.
#[get("")]
pub async fn get_tasks(
    tasks: web::Data<TaskService>,
    query: web::Query<TaskQuery>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let list = tasks.list(&user.0, &query).await?;
    Ok(HttpResponse::Ok().json(list))
}

/// Creates a task owned by the authenticated user.
///
/// ## Responses:
/// - `201 Created`: The new `Task`.
/// - `422 Unprocessable Entity`: Validation failed (e.g. empty title).
#[post("")]
pub async fn create_task(
    tasks: web::Data<TaskService>,
    body: web::Json<TaskInput>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let task = tasks.create(body.into_inner(), &user.0).await?;
    Ok(HttpResponse::Created().json(task))
}

/// Retrieves one task.
///
/// ## Responses:
/// - `200 OK`: The `Task`.
/// - `403 Forbidden`: The task belongs to someone else.
/// - `404 Not Found`: No task with that id.
#[get("/{id}")]
pub async fn get_task(
    tasks: web::Data<TaskService>,
    path: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let task = tasks.get(path.into_inner(), &user.0).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Partially updates a task owned by the authenticated user.
#[patch("/{id}")]
pub async fn update_task(
    tasks: web::Data<TaskService>,
    path: web::Path<Uuid>,
    body: web::Json<TaskPatch>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let task = tasks
        .update(path.into_inner(), body.into_inner(), &user.0)
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Deletes a task owned by the authenticated user.
#[delete("/{id}")]
pub async fn delete_task(
    tasks: web::Data<TaskService>,
    path: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    tasks.delete(path.into_inner(), &user.0).await?;
    Ok(HttpResponse::Ok().json(json!({ "detail": "Task deleted successfully." })))
}
