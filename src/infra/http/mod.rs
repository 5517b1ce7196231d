//! HTTP binding for the todo service.

mod error;
mod handlers;
mod middleware;
mod models;

pub use error::{ApiError, ApiErrorBody, ApiErrorMessage, codes};
pub use middleware::{REQUEST_ID_HEADER, RequestContext};
pub use models::{TodoCreateRequest, TodoUpdateRequest};

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::application::todos::TodoService;
use crate::infra::health::HealthProbe;

#[derive(Clone)]
pub struct HttpState {
    pub todos: Arc<TodoService>,
    pub probes: Arc<[Arc<dyn HealthProbe>]>,
}

impl HttpState {
    pub fn new(todos: Arc<TodoService>, probes: Vec<Arc<dyn HealthProbe>>) -> Self {
        Self {
            todos,
            probes: probes.into(),
        }
    }
}

pub fn build_router(state: HttpState) -> Router {
    let v1 = Router::new()
        .route("/todo", post(handlers::create_todo))
        .route("/todos", get(handlers::list_todos))
        .route(
            "/todo/{id}",
            get(handlers::get_todo)
                .put(handlers::update_todo)
                .post(handlers::complete_todo)
                .delete(handlers::delete_todo),
        );

    Router::new()
        .nest("/v1", v1)
        .route("/healthz", get(handlers::healthz))
        .fallback(handlers::fallback)
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}
