//! Student Routes
//!
//! Maps the five CRUD operations onto the student repository.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use storage::Student;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Canonical collection path, used for `Location` headers
pub const STUDENTS_PATH: &str = "/students";

/// Student routes, relative to the mount point
pub fn student_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_students).post(create_student))
        .route(
            "/:id",
            get(get_student).put(update_student).delete(delete_student),
        )
}

/// List all students
pub async fn list_students(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Student>>> {
    Ok(Json(state.repository.list()?))
}

/// Get a student by id
pub async fn get_student(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Student>> {
    state
        .repository
        .get(id)?
        .map(Json)
        .ok_or(ApiError::NotFound(id))
}

/// Create a student; the body's id is ignored
pub async fn create_student(
    State(state): State<Arc<AppState>>,
    Json(candidate): Json<Student>,
) -> ApiResult<impl IntoResponse> {
    let created = state.repository.create(candidate)?;
    info!("Created student {}", created.id);

    let location = format!("{}/{}", STUDENTS_PATH, created.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(created)))
}

/// Replace a student's fields; the body id must equal the path id
pub async fn update_student(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(replacement): Json<Student>,
) -> ApiResult<StatusCode> {
    if replacement.id != id {
        return Err(ApiError::IdMismatch {
            path: id,
            body: replacement.id,
        });
    }

    state.repository.update(id, replacement)?;
    info!("Updated student {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a student
pub async fn delete_student(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    match state.repository.delete(id)? {
        Some(_) => {
            info!("Deleted student {}", id);
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(ApiError::NotFound(id)),
    }
}
