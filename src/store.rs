//! Task persistence and query layer.
//!
//! `TaskStore` is the whole contract the presentation layer talks to: create,
//! get, update, delete, toggle completion, and a filtered, sorted list. Input
//! is validated before anything is written, missing ids are reported as
//! `StoreError::NotFound`, and database failures surface as
//! `StoreError::Storage` without retries.

use log::{info, warn};
use std::cmp::Ordering;
use std::path::Path;
use thiserror::Error;

use crate::database::{Database, DatabaseError};
use crate::models::{Task, TaskDraft, TaskSummary, ValidationError};
use crate::utils::now_timestamp;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error("Task {0} not found")]
    NotFound(i64),
    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Storage(DatabaseError::from(err))
    }
}

impl StoreError {
    /// The caller can fix this by editing the input.
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, StoreError::Storage(_))
    }
}

pub struct TaskStore {
    db: Database,
}

impl TaskStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open the store backed by the database file at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Ok(Self::new(Database::open(path)?))
    }

    /// Open a throwaway in-memory store
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Release the database handle, reporting any close failure
    pub fn close(self) -> Result<(), StoreError> {
        self.db.close().map_err(StoreError::from)
    }

    /// Persist a new task and return its id
    pub fn create(&self, draft: &TaskDraft) -> Result<i64, StoreError> {
        let draft = draft.validated().inspect_err(|e| {
            warn!("event=task_create module=store status=rejected reason={:?}", e);
        })?;
        let id = self.db.insert_task(&draft, now_timestamp())?;
        info!("event=task_create module=store status=ok id={}", id);
        Ok(id)
    }

    /// Fetch a task; `Ok(None)` when the id does not exist
    pub fn get_by_id(&self, id: i64) -> Result<Option<Task>, StoreError> {
        Ok(self.db.get_task(id)?)
    }

    /// Replace title, description, priority and deadline. `id`, `created_at`
    /// and `completed` are left as they are.
    pub fn update(&self, id: i64, draft: &TaskDraft) -> Result<(), StoreError> {
        let draft = draft.validated().inspect_err(|e| {
            warn!("event=task_update module=store status=rejected id={} reason={:?}", id, e);
        })?;
        if !self.db.update_task(id, &draft)? {
            warn!("event=task_update module=store status=not_found id={}", id);
            return Err(StoreError::NotFound(id));
        }
        info!("event=task_update module=store status=ok id={}", id);
        Ok(())
    }

    /// Permanently remove a task. Its id is never handed out again.
    pub fn delete(&self, id: i64) -> Result<(), StoreError> {
        if !self.db.delete_task(id)? {
            warn!("event=task_delete module=store status=not_found id={}", id);
            return Err(StoreError::NotFound(id));
        }
        info!("event=task_delete module=store status=ok id={}", id);
        Ok(())
    }

    /// Flip the completion flag and return the new value
    pub fn toggle_completion(&self, id: i64) -> Result<bool, StoreError> {
        match self.db.toggle_task_completed(id)? {
            Some(completed) => {
                info!(
                    "event=task_toggle module=store status=ok id={} completed={}",
                    id, completed
                );
                Ok(completed)
            }
            None => {
                warn!("event=task_toggle module=store status=not_found id={}", id);
                Err(StoreError::NotFound(id))
            }
        }
    }

    /// List tasks in display order, optionally keeping only those whose title
    /// or description contains `search` (case-insensitive). A blank search
    /// term lists everything.
    pub fn list(&self, search: Option<&str>) -> Result<Vec<TaskSummary>, StoreError> {
        let needle = search
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase);

        let mut summaries: Vec<TaskSummary> = self
            .db
            .get_all_tasks()?
            .into_iter()
            .filter(|task| needle.as_deref().is_none_or(|n| matches_search(task, n)))
            .map(TaskSummary::from)
            .collect();
        summaries.sort_by(compare_for_listing);
        Ok(summaries)
    }
}

/// `needle` must already be lowercase.
fn matches_search(task: &Task, needle: &str) -> bool {
    task.title.to_lowercase().contains(needle)
        || task
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(needle))
}

/// Display order: priority rank (High, Medium, Low, then unrecognised stored
/// values), then deadline ascending with undated tasks after dated ones, then
/// id ascending.
pub fn compare_for_listing(a: &TaskSummary, b: &TaskSummary) -> Ordering {
    a.priority
        .rank()
        .cmp(&b.priority.rank())
        .then_with(|| match (a.deadline, b.deadline) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.id.cmp(&b.id))
}
