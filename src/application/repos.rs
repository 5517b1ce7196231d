//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::application::pagination::PageRequest;
use crate::domain::todos::Todo;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoQueryFilter {
    pub completed: Option<bool>,
    pub search: Option<String>,
}

impl TodoQueryFilter {
    /// Whether `todo` satisfies this filter.
    pub fn matches(&self, todo: &Todo) -> bool {
        if let Some(completed) = self.completed
            && todo.completed != completed
        {
            return false;
        }

        match self.search.as_deref() {
            Some(term) => {
                let term = term.to_lowercase();
                todo.title.to_lowercase().contains(&term)
                    || todo.description.to_lowercase().contains(&term)
            }
            None => true,
        }
    }
}

#[async_trait]
pub trait TodosRepo: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Todo>, RepoError>;

    async fn list_todos(
        &self,
        filter: &TodoQueryFilter,
        page: PageRequest,
    ) -> Result<Vec<Todo>, RepoError>;

    async fn count_todos(&self, filter: &TodoQueryFilter) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait TodosWriteRepo: Send + Sync {
    /// Upsert keyed on identity presence.
    ///
    /// A todo without an assigned id is inserted and returned with the id the
    /// store picked; otherwise the row with that id is overwritten. Returns the
    /// snapshot as stored.
    async fn save(&self, todo: &Todo) -> Result<Todo, RepoError>;

    async fn delete_todo(&self, id: i64) -> Result<(), RepoError>;
}
