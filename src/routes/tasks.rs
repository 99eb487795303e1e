use crate::{
    auth::AuthenticatedUserId,
    error::AppError,
    models::{
        CreateTaskRequest, MessageResponse, Task, TaskEnvelope, TaskList, UpdateTaskRequest,
    },
    store::TaskStore,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use chrono::Utc;
use uuid::Uuid;

/// Lists the authenticated user's tasks, newest first.
///
/// ## Responses:
/// - `200 OK`: `{ "tasks": [Task, ...] }`, possibly empty.
/// - `401 Unauthorized`: missing or invalid token.
#[get("")]
pub async fn list_tasks(
    tasks: web::Data<dyn TaskStore>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let tasks = tasks.find_by_owner(user.0).await?;
    Ok(HttpResponse::Ok().json(TaskList { tasks }))
}

/// Creates a task owned by the authenticated user.
///
/// ## Request Body:
/// - `title`, `description`, `dueDate`: required, non-empty.
/// - `status` (optional): `pending` (default), `in-progress` or `completed`.
/// - `priority` (optional): `low`, `medium` (default) or `high`.
///
/// ## Responses:
/// - `201 Created`: `{ "message", "task" }`.
/// - `400 Bad Request`: validation failure, one entry per field.
/// - `401 Unauthorized`: missing or invalid token.
#[post("")]
pub async fn create_task(
    tasks: web::Data<dyn TaskStore>,
    user: AuthenticatedUserId,
    body: web::Json<serde_json::Value>,
) -> Result<impl Responder, AppError> {
    let new_task = CreateTaskRequest::from_json(body.into_inner())?;
    let task = tasks.insert(&Task::new(new_task, user.0, Utc::now())).await?;

    log::info!("user {} created task {}", user.0, task.id);
    Ok(HttpResponse::Created().json(TaskEnvelope {
        message: Some("Task created successfully".into()),
        task,
    }))
}

/// Returns one task. Same lookup-then-authorize guard as update and delete.
#[get("/{id}")]
pub async fn get_task(
    tasks: web::Data<dyn TaskStore>,
    user: AuthenticatedUserId,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = fetch_task(tasks.get_ref(), task_id.into_inner()).await?;
    authorize(&task, user, "view")?;

    Ok(HttpResponse::Ok().json(TaskEnvelope {
        message: None,
        task,
    }))
}

/// Partially updates a task.
///
/// The task is looked up (404 if absent) and its owner checked against the
/// caller (403 otherwise) before the body is even parsed, so a non-owner gets
/// 403 whatever was sent. Fields missing from the body keep their stored value;
/// `updatedAt` always advances.
///
/// ## Responses:
/// - `200 OK`: `{ "message", "task" }`.
/// - `400`, `401`, `403`, `404` as described above.
#[put("/{id}")]
pub async fn update_task(
    tasks: web::Data<dyn TaskStore>,
    user: AuthenticatedUserId,
    task_id: web::Path<Uuid>,
    body: web::Bytes,
) -> Result<impl Responder, AppError> {
    let mut task = fetch_task(tasks.get_ref(), task_id.into_inner()).await?;
    authorize(&task, user, "update")?;

    let changes = UpdateTaskRequest::from_body(&body)?;
    task.apply(changes, Utc::now());

    // Last write wins; a concurrent delete surfaces as 404.
    let task = tasks
        .update(&task)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    log::info!("user {} updated task {}", user.0, task.id);
    Ok(HttpResponse::Ok().json(TaskEnvelope {
        message: Some("Task updated successfully".into()),
        task,
    }))
}

/// Permanently deletes a task.
///
/// ## Responses:
/// - `200 OK`: `{ "message": "Task deleted successfully" }`.
/// - `401`, `403`, `404` as for update.
#[delete("/{id}")]
pub async fn delete_task(
    tasks: web::Data<dyn TaskStore>,
    user: AuthenticatedUserId,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = fetch_task(tasks.get_ref(), task_id.into_inner()).await?;
    authorize(&task, user, "delete")?;

    if !tasks.delete(task.id).await? {
        return Err(AppError::NotFound("Task not found".into()));
    }

    log::info!("user {} deleted task {}", user.0, task.id);
    Ok(HttpResponse::Ok().json(MessageResponse::new("Task deleted successfully")))
}

/// First step of the guard: the task must exist.
async fn fetch_task(tasks: &dyn TaskStore, id: Uuid) -> Result<Task, AppError> {
    tasks
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))
}

/// Second step of the guard: the caller must own it.
fn authorize(task: &Task, user: AuthenticatedUserId, action: &str) -> Result<(), AppError> {
    if task.is_owned_by(user.0) {
        Ok(())
    } else {
        log::warn!("user {} tried to {} task {} owned by someone else", user.0, action, task.id);
        Err(AppError::Forbidden(format!(
            "Not authorized to {} this task",
            action
        )))
    }
}
