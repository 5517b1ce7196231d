//! Todo handlers.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::pagination::PageRequest;
use crate::application::repos::TodoQueryFilter;

use super::HttpState;
use super::error::ApiError;
use super::models::{
    SuccessResponse, TodoCreateRequest, TodoListQuery, TodoUpdateRequest,
};

fn todo_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|err| ApiError::bad_request("invalid todo id", Some(err.body_text())))
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|err| ApiError::bad_request("invalid request body", Some(err.body_text())))
}

pub async fn create_todo(
    State(state): State<HttpState>,
    payload: Result<Json<TodoCreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(payload)?;
    let todo = state.todos.create_todo(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

pub async fn list_todos(
    State(state): State<HttpState>,
    query: Result<Query<TodoListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query
        .map_err(|err| ApiError::bad_request("invalid query", Some(err.body_text())))?;

    let filter = TodoQueryFilter {
        completed: query.completed,
        search: query.search.filter(|term| !term.trim().is_empty()),
    };
    let list = state
        .todos
        .todos(&filter, PageRequest::new(query.page, query.per))
        .await?;

    Ok(Json(list))
}

pub async fn get_todo(
    State(state): State<HttpState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = todo_id(path)?;
    let todo = state.todos.todo_by_id(id).await?;
    Ok(Json(todo))
}

pub async fn update_todo(
    State(state): State<HttpState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<TodoUpdateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = todo_id(path)?;
    let payload = json_body(payload)?;
    let todo = state.todos.update_todo(id, payload.into()).await?;
    Ok(Json(todo))
}

pub async fn complete_todo(
    State(state): State<HttpState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = todo_id(path)?;
    let todo = state.todos.complete_todo(id).await?;
    Ok(Json(todo))
}

pub async fn delete_todo(
    State(state): State<HttpState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = todo_id(path)?;
    state.todos.delete_todo(id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn healthz(State(state): State<HttpState>) -> Response {
    for probe in state.probes.iter() {
        if let Err(err) = probe.check().await {
            tracing::debug!(probe = probe.name(), error = %err, "health probe failed");
            return ApiError::from(err).into_response();
        }
    }
    StatusCode::NO_CONTENT.into_response()
}

pub async fn fallback() -> ApiError {
    ApiError::not_found("endpoint not found")
}
