//! Todo entity and its lifecycle rules.
//!
//! A todo is created with a non-blank title, may be retitled or redescribed any
//! number of times while open, is completed at most once, and can only be
//! deleted while still open. `completed_at` is stamped exactly once, on the
//! open → completed transition, and is never cleared afterwards.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::error::DomainError;

/// Identity carried by a todo that the store has not assigned an id to yet.
pub const UNASSIGNED_ID: i64 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Todo {
    /// Build an unsaved todo from a creation request.
    ///
    /// A blank description is dropped rather than stored.
    pub fn draft(title: String, description: Option<String>) -> Result<Self, DomainError> {
        validate_title(&title)?;

        let now = OffsetDateTime::now_utc();
        let description = description
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_default();

        Ok(Self {
            id: UNASSIGNED_ID,
            title,
            description,
            completed: false,
            completed_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_persisted(&self) -> bool {
        self.id != UNASSIGNED_ID
    }

    pub fn retitle(&mut self, title: String) -> Result<(), DomainError> {
        validate_title(&title)?;
        self.title = title;
        Ok(())
    }

    /// Replace the description unless `description` is blank.
    ///
    /// Returns whether the stored description changed.
    pub fn redescribe(&mut self, description: String) -> bool {
        if description.trim().is_empty() {
            return false;
        }
        self.description = description;
        true
    }

    pub fn complete(&mut self, at: OffsetDateTime) -> Result<(), DomainError> {
        if self.completed {
            return Err(DomainError::AlreadyCompleted);
        }
        self.completed = true;
        self.completed_at = Some(at);
        Ok(())
    }

    pub fn ensure_deletable(&self) -> Result<(), DomainError> {
        if self.completed {
            return Err(DomainError::CannotDeleteCompleted);
        }
        Ok(())
    }

    /// Check the completion-timestamp invariant on a snapshot read back from storage.
    pub fn check_invariants(&self) -> Result<(), DomainError> {
        match (self.completed, self.completed_at) {
            (true, None) => Err(DomainError::invariant(format!(
                "todo {} is completed without a completion timestamp",
                self.id
            ))),
            (false, Some(_)) => Err(DomainError::invariant(format!(
                "todo {} carries a completion timestamp while open",
                self.id
            ))),
            _ => Ok(()),
        }
    }
}

pub fn validate_title(title: &str) -> Result<(), DomainError> {
    if title.trim().is_empty() {
        return Err(DomainError::validation("title must not be empty"));
    }
    Ok(())
}

/// Page metadata attached to a todo listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub count: u64,
    pub page: u32,
    pub per: u32,
    pub num_pages: u64,
}

impl Pagination {
    pub fn new(count: u64, page: u32, per: u32) -> Self {
        let num_pages = if per == 0 {
            0
        } else {
            count.div_ceil(u64::from(per))
        };
        Self {
            count,
            page,
            per,
            num_pages,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodoList {
    pub todos: Vec<Todo>,
    pub pagination: Pagination,
}
