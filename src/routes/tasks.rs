use crate::{
    error::AppError,
    models::{Task, TaskInput, TaskUpdate},
};
use actix_web::{delete, get, post, route, web, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

const TASK_COLUMNS: &str =
    "id, title, description, due_date, is_completed, created_at, updated_at";

/// Retrieves all tasks, newest first.
///
/// ## Responses:
/// - `200 OK`: JSON array of `Task` objects.
/// - `401 Unauthorized`: If the request lacks a valid bearer token.
#[get("")]
pub async fn list_tasks(pool: web::Data<PgPool>) -> Result<impl Responder, AppError> {
    let tasks = sqlx::query_as::<_, Task>(&format!(
        "SELECT {} FROM tasks ORDER BY created_at DESC",
        TASK_COLUMNS
    ))
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new task.
///
/// Required fields: `title`, `due_date` (RFC 3339), `is_completed`.
/// `description` is optional.
///
/// ## Responses:
/// - `201 Created`: The new `Task`.
/// - `422 Unprocessable Entity`: If validation fails.
#[post("")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    let input = task_data.into_inner();

    let task = sqlx::query_as::<_, Task>(&format!(
        "INSERT INTO tasks (title, description, due_date, is_completed)
         VALUES ($1, $2, $3, $4)
         RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(input.title)
    .bind(input.description)
    .bind(input.due_date)
    .bind(input.is_completed)
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Created().json(task))
}

/// Retrieves a single task by id.
///
/// ## Responses:
/// - `200 OK`: The `Task`.
/// - `404 Not Found`: If no task with that id exists.
#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let task = sqlx::query_as::<_, Task>(&format!(
        "SELECT {} FROM tasks WHERE id = $1",
        TASK_COLUMNS
    ))
    .bind(task_id.into_inner())
    .fetch_optional(&**pool)
    .await?;

    match task {
        Some(task) => Ok(HttpResponse::Ok().json(task)),
        None => Err(AppError::NotFound("Task Not Found".into())),
    }
}

/// Partially updates a task. Fields absent from the payload keep their
/// current value. Accepts both PUT and PATCH.
///
/// ## Responses:
/// - `200 OK`: The updated `Task`.
/// - `404 Not Found`: If no task with that id exists.
/// - `422 Unprocessable Entity`: If validation on the supplied fields fails.
#[route("/{id}", method = "PUT", method = "PATCH")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<i64>,
    task_data: web::Json<TaskUpdate>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    let update = task_data.into_inner();

    let task = sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks
         SET title = COALESCE($1, title),
             description = COALESCE($2, description),
             due_date = COALESCE($3, due_date),
             is_completed = COALESCE($4, is_completed),
             updated_at = NOW()
         WHERE id = $5
         RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(update.title)
    .bind(update.description)
    .bind(update.due_date)
    .bind(update.is_completed)
    .bind(task_id.into_inner())
    .fetch_optional(&**pool)
    .await?;

    match task {
        Some(task) => Ok(HttpResponse::Ok().json(task)),
        None => Err(AppError::NotFound("Task Not Found".into())),
    }
}

/// Deletes a task by id.
///
/// ## Responses:
/// - `204 No Content`: On successful deletion.
/// - `404 Not Found`: If no task with that id exists.
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(task_id.into_inner())
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Task Not Found".into()));
    }

    Ok(HttpResponse::NoContent().finish())
}

/// Marks a task as completed. Idempotent: completing an already completed
/// task is a no-op that still returns the task.
///
/// ## Responses:
/// - `200 OK`: The `Task` with `is_completed = true`.
/// - `404 Not Found`: If no task with that id exists.
#[post("/{id}/complete")]
pub async fn complete_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    set_completion(&pool, task_id.into_inner(), true).await
}

/// Marks a task as not completed. Idempotent, mirror of `complete_task`.
///
/// ## Responses:
/// - `200 OK`: The `Task` with `is_completed = false`.
/// - `404 Not Found`: If no task with that id exists.
#[post("/{id}/incomplete")]
pub async fn incomplete_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    set_completion(&pool, task_id.into_inner(), false).await
}

/// Shared transition for the two-state completion machine. The last call
/// wins regardless of the current state.
async fn set_completion(
    pool: &PgPool,
    task_id: i64,
    is_completed: bool,
) -> Result<HttpResponse, AppError> {
    let task = sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks SET is_completed = $1, updated_at = NOW()
         WHERE id = $2
         RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(is_completed)
    .bind(task_id)
    .fetch_optional(pool)
    .await?;

    match task {
        Some(task) => Ok(HttpResponse::Ok().json(task)),
        None => Err(AppError::NotFound("Task Not Found".into())),
    }
}
