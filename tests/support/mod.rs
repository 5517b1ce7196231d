//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tasklane::application::pagination::PageRequest;
use tasklane::application::repos::{RepoError, TodoQueryFilter, TodosRepo, TodosWriteRepo};
use tasklane::application::todos::TodoService;
use tasklane::cache::{CacheAside, CacheStore, KeyNamespace, MemoryCacheStore};
use tasklane::domain::todos::Todo;

/// Store double that assigns ids sequentially from 1, like `BIGSERIAL`.
#[derive(Default)]
pub struct InMemoryTodos {
    rows: Mutex<BTreeMap<i64, Todo>>,
    last_id: Mutex<i64>,
    point_reads: AtomicUsize,
}

impl InMemoryTodos {
    pub fn row(&self, id: i64) -> Option<Todo> {
        self.rows.lock().expect("rows lock").get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().expect("rows lock").len()
    }

    pub fn point_reads(&self) -> usize {
        self.point_reads.load(Ordering::SeqCst)
    }

    fn matching(&self, filter: &TodoQueryFilter) -> Vec<Todo> {
        self.rows
            .lock()
            .expect("rows lock")
            .values()
            .filter(|todo| filter.matches(todo))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TodosRepo for InMemoryTodos {
    async fn find_by_id(&self, id: i64) -> Result<Option<Todo>, RepoError> {
        self.point_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.row(id))
    }

    async fn list_todos(
        &self,
        filter: &TodoQueryFilter,
        page: PageRequest,
    ) -> Result<Vec<Todo>, RepoError> {
        Ok(self
            .matching(filter)
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect())
    }

    async fn count_todos(&self, filter: &TodoQueryFilter) -> Result<u64, RepoError> {
        Ok(self.matching(filter).len() as u64)
    }
}

#[async_trait]
impl TodosWriteRepo for InMemoryTodos {
    async fn save(&self, todo: &Todo) -> Result<Todo, RepoError> {
        let mut rows = self.rows.lock().expect("rows lock");
        let mut stored = todo.clone();
        if stored.is_persisted() {
            if !rows.contains_key(&stored.id) {
                return Err(RepoError::NotFound);
            }
        } else {
            let mut last_id = self.last_id.lock().expect("id lock");
            *last_id += 1;
            stored.id = *last_id;
        }
        rows.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn delete_todo(&self, id: i64) -> Result<(), RepoError> {
        self.rows
            .lock()
            .expect("rows lock")
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

pub struct Fixture {
    pub repo: Arc<InMemoryTodos>,
    pub store: Arc<MemoryCacheStore>,
    pub service: Arc<TodoService>,
}

impl Fixture {
    pub fn new() -> Self {
        let repo = Arc::new(InMemoryTodos::default());
        let store = Arc::new(MemoryCacheStore::new());
        let service = Arc::new(TodoService::new(
            repo.clone(),
            repo.clone(),
            CacheAside::new(store.clone()),
            KeyNamespace::default(),
        ));
        Self {
            repo,
            store,
            service,
        }
    }

    pub async fn cached(&self, id: i64) -> Option<Todo> {
        let key = self.service.cache_key(id);
        self.store
            .get(key.as_str())
            .await
            .expect("cache get")
            .map(|blob| serde_json::from_slice(&blob).expect("cached snapshot decodes"))
    }

    pub async fn is_cached(&self, id: i64) -> bool {
        let key = self.service.cache_key(id);
        self.store.exists(key.as_str()).await.expect("cache exists")
    }
}
