use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::{
    application::pagination::PageRequest,
    application::repos::{RepoError, TodoQueryFilter, TodosRepo, TodosWriteRepo},
    domain::todos::Todo,
};

use super::{PostgresRepositories, map_sqlx_error};

const TODO_COLUMNS: &str =
    "t.id, t.title, t.description, t.completed, t.completed_at, t.created_at, t.updated_at";

#[derive(sqlx::FromRow)]
struct TodoRow {
    id: i64,
    title: String,
    description: String,
    completed: bool,
    completed_at: Option<OffsetDateTime>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<TodoRow> for Todo {
    fn from(row: TodoRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            completed: row.completed,
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl TodosRepo for PostgresRepositories {
    async fn find_by_id(&self, id: i64) -> Result<Option<Todo>, RepoError> {
        let row = sqlx::query_as::<_, TodoRow>(&format!(
            "SELECT {TODO_COLUMNS} FROM todos t WHERE t.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Todo::from))
    }

    async fn list_todos(
        &self,
        filter: &TodoQueryFilter,
        page: PageRequest,
    ) -> Result<Vec<Todo>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {TODO_COLUMNS} FROM todos t"));
        Self::apply_filter(&mut qb, filter);
        qb.push(" ORDER BY t.id ASC LIMIT ");
        qb.push_bind(page.limit());
        qb.push(" OFFSET ");
        qb.push_bind(page.offset());

        let rows = qb
            .build_query_as::<TodoRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Todo::from).collect())
    }

    async fn count_todos(&self, filter: &TodoQueryFilter) -> Result<u64, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM todos t");
        Self::apply_filter(&mut qb, filter);

        let count = qb
            .build_query_scalar::<i64>()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Self::convert_count(count)
    }
}

#[async_trait]
impl TodosWriteRepo for PostgresRepositories {
    async fn save(&self, todo: &Todo) -> Result<Todo, RepoError> {
        let row = if todo.is_persisted() {
            sqlx::query_as::<_, TodoRow>(&format!(
                "UPDATE todos t \
                 SET title = $2, description = $3, completed = $4, completed_at = $5, updated_at = $6 \
                 WHERE t.id = $1 \
                 RETURNING {TODO_COLUMNS}"
            ))
            .bind(todo.id)
            .bind(&todo.title)
            .bind(&todo.description)
            .bind(todo.completed)
            .bind(todo.completed_at)
            .bind(todo.updated_at)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepoError::NotFound)?
        } else {
            sqlx::query_as::<_, TodoRow>(&format!(
                "INSERT INTO todos AS t (title, description, completed, completed_at, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6) \
                 RETURNING {TODO_COLUMNS}"
            ))
            .bind(&todo.title)
            .bind(&todo.description)
            .bind(todo.completed)
            .bind(todo.completed_at)
            .bind(todo.created_at)
            .bind(todo.updated_at)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?
        };

        Ok(Todo::from(row))
    }

    async fn delete_todo(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
