use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::parse_date;

/// Caller-supplied data that breaks a precondition. Nothing is written when
/// one of these is returned.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Task title cannot be empty")]
    EmptyTitle,
    #[error("Invalid priority '{0}' (expected Low, Medium or High)")]
    InvalidPriority(String),
    #[error("Invalid date '{value}' (expected YYYY-MM-DD): {source}")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Position in the task list: High first, Low last.
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }

    /// The exact text stored in the `priority` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    /// Accepts the stored spelling in any letter case, surrounding
    /// whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ValidationError::InvalidPriority(s.to_string()))
    }
}

/// Priority as read back from the `priority` column.
///
/// The store only ever writes one of the three `Priority` values, but rows
/// written by other tools may hold anything; those are kept as `Other` and
/// listed after Low.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredPriority {
    Known(Priority),
    Other(String),
}

impl StoredPriority {
    /// Interpret column text. Only the exact stored spellings are recognised.
    pub fn from_stored(text: &str) -> Self {
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str() == text)
            .map(StoredPriority::Known)
            .unwrap_or_else(|| StoredPriority::Other(text.to_string()))
    }

    /// Like `Priority::rank`, with 4 for anything unrecognised.
    pub fn rank(&self) -> u8 {
        match self {
            StoredPriority::Known(p) => p.rank(),
            StoredPriority::Other(_) => 4,
        }
    }

    pub fn known(&self) -> Option<Priority> {
        match self {
            StoredPriority::Known(p) => Some(*p),
            StoredPriority::Other(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            StoredPriority::Known(p) => p.as_str(),
            StoredPriority::Other(text) => text,
        }
    }
}

impl From<Priority> for StoredPriority {
    fn from(priority: Priority) -> Self {
        StoredPriority::Known(priority)
    }
}

impl PartialEq<Priority> for StoredPriority {
    fn eq(&self, other: &Priority) -> bool {
        self.known() == Some(*other)
    }
}

impl fmt::Display for StoredPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub priority: StoredPriority,
    pub deadline: Option<NaiveDate>, // ISO 8601: YYYY-MM-DD
    pub completed: bool,
    pub created_at: NaiveDateTime,
}

/// The columns a task list needs to render one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: i64,
    pub title: String,
    pub priority: StoredPriority,
    pub deadline: Option<NaiveDate>,
    pub completed: bool,
}

impl From<&Task> for TaskSummary {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            priority: task.priority.clone(),
            deadline: task.deadline,
            completed: task.completed,
        }
    }
}

impl From<Task> for TaskSummary {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            priority: task.priority,
            deadline: task.deadline,
            completed: task.completed,
        }
    }
}

/// The four user-editable fields, as passed to create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            priority: Priority::default(),
            deadline: None,
        }
    }

    /// Draft pre-filled from an existing task, for edit flows. An
    /// unrecognised stored priority becomes the default.
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority.known().unwrap_or_default(),
            deadline: task.deadline,
        }
    }

    /// Copy of the draft with title and description trimmed and a blank
    /// description dropped, or `EmptyTitle` if the title is blank.
    pub fn validated(&self) -> Result<TaskDraft, ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        let description = self
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        Ok(TaskDraft {
            title: title.to_string(),
            description,
            priority: self.priority,
            deadline: self.deadline,
        })
    }
}

/// Parse a deadline typed by the user. Blank input means "no deadline".
pub fn parse_deadline(input: &str) -> Result<Option<NaiveDate>, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse_date(trimmed)
        .map(Some)
        .map_err(|source| ValidationError::InvalidDate {
            value: input.to_string(),
            source,
        })
}
