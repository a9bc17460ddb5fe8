use log::{debug, error, info};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::models::{StoredPriority, Task, TaskDraft};
use crate::utils::{format_date, format_timestamp, parse_date, parse_timestamp};

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
    #[error("Stored task {id} is unreadable: {reason}")]
    CorruptRow { id: i64, reason: String },
}

const TASK_COLUMNS: &str = "id, title, description, priority, deadline, completed, created_at";

/// Owns the single SQLite connection for the lifetime of the process.
///
/// Dropping a `Database` closes the connection; `close` does the same but
/// reports failures.
pub struct Database {
    conn: Connection,
}

/// A `tasks` row exactly as stored, before any interpretation.
struct TaskRow {
    id: i64,
    title: String,
    description: Option<String>,
    priority: String,
    deadline: Option<String>,
    completed: i64,
    created_at: Option<String>,
}

impl Database {
    /// Open (or create) the database file and initialize the schema
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        let db_path = path.as_ref();
        let started_at = Instant::now();
        info!("event=db_open module=db status=start mode=file");

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::DirectoryError(e.to_string()))?;
            }
        }

        let result = Connection::open(db_path)
            .map_err(DatabaseError::from)
            .and_then(Self::bootstrap);
        Self::log_open_result(&result, "file", started_at);
        result
    }

    /// Open a private in-memory database with the schema applied
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let started_at = Instant::now();
        info!("event=db_open module=db status=start mode=memory");

        let result = Connection::open_in_memory()
            .map_err(DatabaseError::from)
            .and_then(Self::bootstrap);
        Self::log_open_result(&result, "memory", started_at);
        result
    }

    fn bootstrap(conn: Connection) -> Result<Self, DatabaseError> {
        conn.busy_timeout(Duration::from_secs(5))?;
        let db = Database { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    fn log_open_result(result: &Result<Self, DatabaseError>, mode: &str, started_at: Instant) {
        match result {
            Ok(_) => info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=db_open module=db status=error mode={} duration_ms={} error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            ),
        }
    }

    /// Create the tasks table and its indexes if they are missing
    fn initialize_schema(&self) -> Result<(), DatabaseError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS tasks (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                title           TEXT NOT NULL,
                description     TEXT,
                priority        TEXT NOT NULL,
                deadline        TEXT,
                completed       INTEGER DEFAULT 0,
                created_at      TEXT DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tasks_priority ON tasks(priority)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tasks_deadline ON tasks(deadline)",
            [],
        )?;

        Ok(())
    }

    /// Get a reference to the underlying connection
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Close the connection, surfacing any error SQLite reports on close
    pub fn close(self) -> Result<(), DatabaseError> {
        let started_at = Instant::now();
        match self.conn.close() {
            Ok(()) => {
                info!(
                    "event=db_close module=db status=ok duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err((_conn, err)) => {
                error!("event=db_close module=db status=error error={}", err);
                Err(err.into())
            }
        }
    }

    /// Insert an already-validated task and return its ID
    pub fn insert_task(
        &self,
        draft: &TaskDraft,
        created_at: chrono::NaiveDateTime,
    ) -> Result<i64, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO tasks (title, description, priority, deadline, completed, created_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5)",
            rusqlite::params![
                draft.title,
                draft.description,
                draft.priority.as_str(),
                draft.deadline.map(format_date),
                format_timestamp(created_at),
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        debug!("event=task_insert module=db status=ok id={}", id);
        Ok(id)
    }

    fn row_to_task_row(row: &rusqlite::Row) -> Result<TaskRow, rusqlite::Error> {
        Ok(TaskRow {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            priority: row.get(3)?,
            deadline: row.get(4)?,
            completed: row.get::<_, Option<i64>>(5)?.unwrap_or(0),
            created_at: row.get(6)?,
        })
    }

    /// Get a single task by ID, `None` if no such row exists
    pub fn get_task(&self, id: i64) -> Result<Option<Task>, DatabaseError> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1");
        let row = self
            .conn
            .query_row(&sql, rusqlite::params![id], Self::row_to_task_row)
            .optional()?;
        row.map(TaskRow::into_task).transpose()
    }

    /// Get every task in id order
    pub fn get_all_tasks(&self) -> Result<Vec<Task>, DatabaseError> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY id ASC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], Self::row_to_task_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(TaskRow::into_task).collect()
    }

    /// Replace the editable fields of a task. Returns whether a row matched.
    pub fn update_task(&self, id: i64, draft: &TaskDraft) -> Result<bool, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE tasks SET title = ?1, description = ?2, priority = ?3, deadline = ?4
             WHERE id = ?5",
            rusqlite::params![
                draft.title,
                draft.description,
                draft.priority.as_str(),
                draft.deadline.map(format_date),
                id
            ],
        )?;
        tx.commit()?;
        Ok(changed > 0)
    }

    /// Flip `completed` and return the new value, `None` if no row matched
    pub fn toggle_task_completed(&self, id: i64) -> Result<Option<bool>, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE tasks SET completed = CASE WHEN completed THEN 0 ELSE 1 END WHERE id = ?1",
            rusqlite::params![id],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        let completed: i64 = tx.query_row(
            "SELECT completed FROM tasks WHERE id = ?1",
            rusqlite::params![id],
            |row| row.get(0),
        )?;
        tx.commit()?;
        Ok(Some(completed != 0))
    }

    /// Delete a task by ID. Returns whether a row was removed.
    pub fn delete_task(&self, id: i64) -> Result<bool, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute("DELETE FROM tasks WHERE id = ?1", rusqlite::params![id])?;
        tx.commit()?;
        Ok(changed > 0)
    }
}

impl TaskRow {
    fn into_task(self) -> Result<Task, DatabaseError> {
        let id = self.id;
        let corrupt = |reason: String| DatabaseError::CorruptRow { id, reason };

        let priority = StoredPriority::from_stored(&self.priority);

        // Blank deadlines were written by older builds that always stored a value
        let deadline = match self.deadline.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(text) => Some(
                parse_date(text).map_err(|e| corrupt(format!("deadline '{text}': {e}")))?,
            ),
        };

        let created_text = self
            .created_at
            .ok_or_else(|| corrupt("created_at is NULL".to_string()))?;
        let created_at = parse_timestamp(&created_text)
            .map_err(|e| corrupt(format!("created_at '{created_text}': {e}")))?;

        Ok(Task {
            id,
            title: self.title,
            description: self.description,
            priority,
            deadline,
            completed: self.completed != 0,
            created_at,
        })
    }
}
