use serde::{Deserialize, Serialize};

use crate::application::todos::{CreateTodoCommand, UpdateTodoCommand};

#[derive(Debug, Deserialize, Serialize)]
pub struct TodoCreateRequest {
    pub title: String,
    pub description: Option<String>,
}

impl From<TodoCreateRequest> for CreateTodoCommand {
    fn from(request: TodoCreateRequest) -> Self {
        Self {
            title: request.title,
            description: request.description,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TodoUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl From<TodoUpdateRequest> for UpdateTodoCommand {
    fn from(request: TodoUpdateRequest) -> Self {
        Self {
            title: request.title,
            description: request.description,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TodoListQuery {
    pub page: Option<u32>,
    pub per: Option<u32>,
    pub completed: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}
