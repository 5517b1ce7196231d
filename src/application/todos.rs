//! Todo service: orchestrates the persistent store and the cache-aside layer.
//!
//! Cache protocol per todo identity (cache state is either absent or cached):
//!
//! - reads check the cache first and fall back to the store on a miss, without
//!   populating the cache;
//! - create persists, then caches the stored snapshot;
//! - update and complete resolve the current snapshot the same way reads do,
//!   persist, evict, then re-cache;
//! - delete resolves, evicts, then deletes from the store;
//! - listings always go to the store.
//!
//! No step is retried and no lock is held across round trips. A failure after
//! the store write (evict or re-cache) is still reported as an error even though
//! the store already holds the new snapshot; the next read on a miss reconciles.

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::application::pagination::PageRequest;
use crate::application::repos::{RepoError, TodoQueryFilter, TodosRepo, TodosWriteRepo};
use crate::cache::{CacheAside, CacheError, CacheKey, KeyNamespace};
use crate::domain::error::DomainError;
use crate::domain::todos::{Pagination, Todo, TodoList, UNASSIGNED_ID};

#[derive(Debug, Error)]
pub enum TodoError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("todo {id} not found")]
    NotFound { id: i64 },
    #[error("todo {id} has already been completed")]
    AlreadyCompleted { id: i64 },
    #[error("todo {id} has been completed and cannot be deleted")]
    CannotDeleteCompleted { id: i64 },
    #[error(transparent)]
    Repo(RepoError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("todo {id} is inconsistent: {message}")]
    Invariant { id: i64, message: String },
}

impl TodoError {
    fn from_domain(id: i64, err: DomainError) -> Self {
        match err {
            DomainError::Validation { message } => Self::Validation(message),
            DomainError::AlreadyCompleted => Self::AlreadyCompleted { id },
            DomainError::CannotDeleteCompleted => Self::CannotDeleteCompleted { id },
            DomainError::Invariant { message } => Self::Invariant { id, message },
        }
    }

    fn from_repo(id: i64, err: RepoError) -> Self {
        match err {
            RepoError::NotFound => Self::NotFound { id },
            other => Self::Repo(other),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateTodoCommand {
    pub title: String,
    pub description: Option<String>,
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateTodoCommand {
    pub title: Option<String>,
    /// A blank description is ignored rather than clearing the stored one.
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct TodoService {
    reader: Arc<dyn TodosRepo>,
    writer: Arc<dyn TodosWriteRepo>,
    cache: CacheAside,
    namespace: KeyNamespace,
}

impl TodoService {
    pub fn new(
        reader: Arc<dyn TodosRepo>,
        writer: Arc<dyn TodosWriteRepo>,
        cache: CacheAside,
        namespace: KeyNamespace,
    ) -> Self {
        Self {
            reader,
            writer,
            cache,
            namespace,
        }
    }

    pub fn cache_key(&self, id: i64) -> CacheKey {
        self.namespace.key(id)
    }

    pub async fn todo_by_id(&self, id: i64) -> Result<Todo, TodoError> {
        self.resolve(id).await
    }

    pub async fn create_todo(&self, command: CreateTodoCommand) -> Result<Todo, TodoError> {
        let CreateTodoCommand { title, description } = command;
        let draft = Todo::draft(title, description)
            .map_err(|err| TodoError::from_domain(UNASSIGNED_ID, err))?;

        let todo = self
            .writer
            .save(&draft)
            .await
            .map_err(TodoError::Repo)?;

        self.cache_todo(&todo).await?;
        info!(todo_id = todo.id, "created todo");
        Ok(todo)
    }

    pub async fn update_todo(
        &self,
        id: i64,
        command: UpdateTodoCommand,
    ) -> Result<Todo, TodoError> {
        let mut todo = self.resolve(id).await?;

        if let Some(title) = command.title {
            todo.retitle(title)
                .map_err(|err| TodoError::from_domain(id, err))?;
        }
        if let Some(description) = command.description {
            todo.redescribe(description);
        }
        todo.updated_at = OffsetDateTime::now_utc();

        let todo = self
            .writer
            .save(&todo)
            .await
            .map_err(|err| TodoError::from_repo(id, err))?;

        self.recache(&todo).await?;
        info!(todo_id = todo.id, "updated todo");
        Ok(todo)
    }

    pub async fn complete_todo(&self, id: i64) -> Result<Todo, TodoError> {
        let mut todo = self.resolve(id).await?;

        let now = OffsetDateTime::now_utc();
        todo.complete(now)
            .map_err(|err| TodoError::from_domain(id, err))?;
        todo.updated_at = now;

        let todo = self
            .writer
            .save(&todo)
            .await
            .map_err(|err| TodoError::from_repo(id, err))?;

        self.recache(&todo).await?;
        info!(todo_id = todo.id, "completed todo");
        Ok(todo)
    }

    pub async fn delete_todo(&self, id: i64) -> Result<(), TodoError> {
        let todo = self.resolve(id).await?;
        todo.ensure_deletable()
            .map_err(|err| TodoError::from_domain(id, err))?;

        // Evict before the store delete so a crash in between cannot leave a
        // cached snapshot of a row that no longer exists.
        self.evict(todo.id).await?;
        self.writer
            .delete_todo(todo.id)
            .await
            .map_err(|err| TodoError::from_repo(id, err))?;

        info!(todo_id = todo.id, "deleted todo");
        Ok(())
    }

    pub async fn todos(
        &self,
        filter: &TodoQueryFilter,
        page: PageRequest,
    ) -> Result<TodoList, TodoError> {
        let todos = self
            .reader
            .list_todos(filter, page)
            .await
            .map_err(TodoError::Repo)?;
        let count = self
            .reader
            .count_todos(filter)
            .await
            .map_err(TodoError::Repo)?;

        Ok(TodoList {
            todos,
            pagination: Pagination::new(count, page.page(), page.per()),
        })
    }

    /// Current snapshot for `id`: the cached copy when present, else the store's.
    async fn resolve(&self, id: i64) -> Result<Todo, TodoError> {
        let key = self.cache_key(id);

        if self.cache.exists(key.as_str()).await? {
            counter!("tasklane_cache_hit_total").increment(1);
            debug!(todo_id = id, cache_key = %key, "cache hit");
            let todo: Todo = self.cache.get_cached_value(key.as_str()).await?;
            return Ok(todo);
        }

        counter!("tasklane_cache_miss_total").increment(1);
        debug!(todo_id = id, cache_key = %key, "cache miss");
        let todo = self
            .reader
            .find_by_id(id)
            .await
            .map_err(|err| TodoError::from_repo(id, err))?
            .ok_or(TodoError::NotFound { id })?;
        todo.check_invariants()
            .map_err(|err| TodoError::from_domain(id, err))?;
        Ok(todo)
    }

    async fn cache_todo(&self, todo: &Todo) -> Result<(), TodoError> {
        let key = self.cache_key(todo.id);
        if let Err(err) = self.cache.cache_value(key.as_str(), todo).await {
            warn!(
                todo_id = todo.id,
                cache_key = %key,
                error = %err,
                "todo persisted but caching the snapshot failed"
            );
            return Err(err.into());
        }
        Ok(())
    }

    async fn evict(&self, id: i64) -> Result<(), TodoError> {
        let key = self.cache_key(id);
        self.cache.remove_from_cache(key.as_str()).await?;
        Ok(())
    }

    /// Evict, then write the fresh snapshot. Never the other way around: a failed
    /// rewrite leaves the key absent, which readers treat as a miss.
    async fn recache(&self, todo: &Todo) -> Result<(), TodoError> {
        if let Err(err) = self.evict(todo.id).await {
            warn!(
                todo_id = todo.id,
                error = %err,
                "todo persisted but evicting the stale snapshot failed"
            );
            return Err(err);
        }
        self.cache_todo(todo).await
    }
}
