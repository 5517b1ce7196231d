use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::error::ErrorReport;
use crate::application::repos::RepoError;
use crate::application::todos::TodoError;
use crate::infra::error::InfraError;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const VALIDATION: &str = "validation_failed";
    pub const NOT_FOUND: &str = "not_found";
    pub const ALREADY_COMPLETED: &str = "already_completed";
    pub const CANNOT_DELETE_COMPLETED: &str = "cannot_delete_completed";
    pub const DB_TIMEOUT: &str = "db_timeout";
    pub const REPO: &str = "repo_error";
    pub const CACHE: &str = "cache_error";
    pub const INTEGRITY: &str = "integrity_error";
    pub const UNAVAILABLE: &str = "service_unavailable";
    pub const INTERNAL: &str = "internal_error";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
    report: Option<ErrorReport>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
            report: None,
        }
    }

    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, hint)
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    fn with_report(mut self, source: &'static str, error: &dyn std::error::Error) -> Self {
        self.report = Some(ErrorReport::from_error(source, self.status, error));
        self
    }
}

impl From<TodoError> for ApiError {
    fn from(err: TodoError) -> Self {
        let api = match &err {
            TodoError::Validation(message) => Self::new(
                StatusCode::BAD_REQUEST,
                codes::VALIDATION,
                "validation failed",
                Some(message.clone()),
            ),
            TodoError::NotFound { .. } => Self::not_found("todo not found"),
            TodoError::AlreadyCompleted { .. } => Self::new(
                StatusCode::CONFLICT,
                codes::ALREADY_COMPLETED,
                "todo has already been completed",
                None,
            ),
            TodoError::CannotDeleteCompleted { .. } => Self::new(
                StatusCode::CONFLICT,
                codes::CANNOT_DELETE_COMPLETED,
                "completed todos cannot be deleted",
                None,
            ),
            TodoError::Repo(RepoError::Timeout) => Self::new(
                StatusCode::GATEWAY_TIMEOUT,
                codes::DB_TIMEOUT,
                "database timeout",
                None,
            ),
            TodoError::Repo(RepoError::NotFound) => Self::not_found("todo not found"),
            TodoError::Repo(RepoError::InvalidInput { message }) => {
                Self::bad_request("store rejected the input", Some(message.clone()))
            }
            TodoError::Repo(RepoError::Integrity { .. }) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::INTEGRITY,
                "stored data violates a constraint",
                None,
            ),
            TodoError::Repo(RepoError::Persistence(_)) => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                codes::REPO,
                "persistent store unavailable",
                None,
            ),
            TodoError::Cache(_) => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                codes::CACHE,
                "cache unavailable",
                Some("the store may already reflect this change".to_string()),
            ),
            TodoError::Invariant { .. } => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::INTEGRITY,
                "stored todo is inconsistent",
                None,
            ),
        };
        api.with_report("infra::http::todos", &err)
    }
}

impl From<InfraError> for ApiError {
    fn from(err: InfraError) -> Self {
        let api = match &err {
            InfraError::Database { .. } | InfraError::Cache { .. } => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                codes::UNAVAILABLE,
                "dependency unavailable",
                None,
            ),
            InfraError::Io(_) | InfraError::Telemetry(_) | InfraError::Configuration { .. } => {
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    codes::INTERNAL,
                    "internal error",
                    None,
                )
            }
        };
        api.with_report("infra::http::health", &err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let report = self.report.unwrap_or_else(|| {
            ErrorReport::from_message(
                "infra::http",
                self.status,
                format!(
                    "{}: {}",
                    self.code,
                    self.hint.as_deref().unwrap_or(self.message)
                ),
            )
        });
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        // Picked up by `log_responses`.
        report.attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheError, CacheStoreError};

    #[test]
    fn todo_errors_map_to_distinct_statuses() {
        let cases = [
            (TodoError::Validation("title".into()), StatusCode::BAD_REQUEST, codes::VALIDATION),
            (TodoError::NotFound { id: 1 }, StatusCode::NOT_FOUND, codes::NOT_FOUND),
            (
                TodoError::AlreadyCompleted { id: 1 },
                StatusCode::CONFLICT,
                codes::ALREADY_COMPLETED,
            ),
            (
                TodoError::CannotDeleteCompleted { id: 1 },
                StatusCode::CONFLICT,
                codes::CANNOT_DELETE_COMPLETED,
            ),
            (
                TodoError::Repo(RepoError::Timeout),
                StatusCode::GATEWAY_TIMEOUT,
                codes::DB_TIMEOUT,
            ),
            (
                TodoError::Repo(RepoError::from_persistence("pool closed")),
                StatusCode::SERVICE_UNAVAILABLE,
                codes::REPO,
            ),
            (
                TodoError::Repo(RepoError::Integrity {
                    message: "violates check constraint \"todos_title_not_blank\"".into(),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::INTEGRITY,
            ),
            (
                TodoError::Repo(RepoError::InvalidInput {
                    message: "invalid byte sequence".into(),
                }),
                StatusCode::BAD_REQUEST,
                codes::BAD_REQUEST,
            ),
            (
                TodoError::Cache(CacheError::Store(CacheStoreError::Unavailable("down".into()))),
                StatusCode::SERVICE_UNAVAILABLE,
                codes::CACHE,
            ),
            (
                TodoError::Invariant {
                    id: 1,
                    message: "completed without timestamp".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::INTEGRITY,
            ),
        ];

        for (err, status, code) in cases {
            let api = ApiError::from(err);
            assert_eq!(api.status(), status);
            assert_eq!(api.code(), code);
        }
    }

    #[test]
    fn infra_outages_map_to_service_unavailable() {
        for err in [
            InfraError::database("pool closed"),
            InfraError::cache("connection refused"),
        ] {
            let api = ApiError::from(err);
            assert_eq!(api.status(), StatusCode::SERVICE_UNAVAILABLE);
            assert_eq!(api.code(), codes::UNAVAILABLE);
        }

        let api = ApiError::from(InfraError::configuration("missing url"));
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.code(), codes::INTERNAL);
    }

    #[test]
    fn health_report_names_its_source() {
        let response = ApiError::from(InfraError::database("pool closed")).into_response();
        let report = response
            .extensions()
            .get::<ErrorReport>()
            .expect("report attached");
        assert_eq!(report.source, "infra::http::health");
        assert!(report.messages[0].contains("pool closed"));
    }

    #[test]
    fn report_keeps_error_chain() {
        let err = TodoError::Cache(CacheError::Store(CacheStoreError::Unavailable(
            "connection refused".into(),
        )));
        let response = ApiError::from(err).into_response();
        let report = response
            .extensions()
            .get::<ErrorReport>()
            .expect("report attached");
        assert!(report.messages[0].contains("connection refused"));
    }
}
