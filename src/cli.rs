use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::io::{BufRead, Write};
use thiserror::Error;

use crate::models::{Priority, TaskDraft, TaskSummary, ValidationError, parse_deadline};
use crate::store::{StoreError, TaskStore};
use crate::utils::format_date;

const TITLE_COLUMN_WIDTH: usize = 40;

#[derive(Parser)]
#[command(name = "taskman")]
#[command(about = "A small personal task manager")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    /// Log at debug level regardless of the configured level
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// List tasks by priority, then deadline (default if no subcommand)
    List {
        /// Only tasks whose title or description contains this text (case-insensitive)
        #[arg(short, long)]
        search: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show every field of one task
    Show {
        id: i64,
        #[arg(long)]
        json: bool,
    },
    /// Add a new task
    Add {
        /// Task title
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        /// Low, Medium or High (default Medium)
        #[arg(short, long)]
        priority: Option<String>,
        /// Deadline (YYYY-MM-DD)
        #[arg(long)]
        deadline: Option<String>,
    },
    /// Edit a task; fields not given keep their current value
    Edit {
        id: i64,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        priority: Option<String>,
        /// New deadline (YYYY-MM-DD)
        #[arg(long, conflicts_with = "clear_deadline")]
        deadline: Option<String>,
        /// Remove the deadline
        #[arg(long)]
        clear_deadline: bool,
    },
    /// Delete a task
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Mark a task complete, or incomplete if it already is
    Toggle { id: i64 },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        CliError::Store(StoreError::Validation(err))
    }
}

/// Everything a command needs besides the store itself.
pub struct Console<'a> {
    pub input: &'a mut dyn BufRead,
    pub out: &'a mut dyn Write,
    /// chrono format for printed deadlines
    pub date_format: &'a str,
}

/// Run one command against the store
pub fn run(command: Commands, store: &TaskStore, io: &mut Console<'_>) -> Result<(), CliError> {
    match command {
        Commands::List { search, json } => handle_list(search.as_deref(), json, store, io),
        Commands::Show { id, json } => handle_show(id, json, store, io),
        Commands::Add {
            title,
            description,
            priority,
            deadline,
        } => handle_add(title, description, priority, deadline, store, io),
        Commands::Edit {
            id,
            title,
            description,
            priority,
            deadline,
            clear_deadline,
        } => {
            let changes = EditArgs {
                title,
                description,
                priority,
                deadline,
                clear_deadline,
            };
            handle_edit(id, changes, store, io)
        }
        Commands::Delete { id, yes } => handle_delete(id, yes, store, io),
        Commands::Toggle { id } => handle_toggle(id, store, io),
    }
}

fn parse_priority_arg(priority: Option<&str>) -> Result<Option<Priority>, ValidationError> {
    priority.map(str::parse::<Priority>).transpose()
}

fn parse_deadline_arg(
    deadline: Option<&str>,
) -> Result<Option<Option<chrono::NaiveDate>>, ValidationError> {
    deadline.map(parse_deadline).transpose()
}

/// Handle the list command
pub fn handle_list(
    search: Option<&str>,
    json: bool,
    store: &TaskStore,
    io: &mut Console<'_>,
) -> Result<(), CliError> {
    let tasks = store.list(search)?;
    if json {
        serde_json::to_writer_pretty(&mut *io.out, &tasks)?;
        writeln!(io.out)?;
        return Ok(());
    }
    if tasks.is_empty() {
        writeln!(io.out, "No tasks found")?;
        return Ok(());
    }
    write_table(&tasks, io)
}

fn write_table(tasks: &[TaskSummary], io: &mut Console<'_>) -> Result<(), CliError> {
    writeln!(
        io.out,
        "{:>5}  {:<width$}  {:<8}  {:<10}  {}",
        "ID",
        "Title",
        "Priority",
        "Deadline",
        "Completed",
        width = TITLE_COLUMN_WIDTH
    )?;
    for task in tasks {
        let deadline = task
            .deadline
            .map(|d| display_date(d, io.date_format))
            .unwrap_or_default();
        writeln!(
            io.out,
            "{:>5}  {:<width$}  {:<8}  {:<10}  {}",
            task.id,
            truncate(&task.title, TITLE_COLUMN_WIDTH),
            task.priority,
            deadline,
            yes_no(task.completed),
            width = TITLE_COLUMN_WIDTH
        )?;
    }
    Ok(())
}

/// Handle the show command
pub fn handle_show(id: i64, json: bool, store: &TaskStore, io: &mut Console<'_>) -> Result<(), CliError> {
    let task = store.get_by_id(id)?.ok_or(StoreError::NotFound(id))?;
    if json {
        serde_json::to_writer_pretty(&mut *io.out, &task)?;
        writeln!(io.out)?;
        return Ok(());
    }
    let deadline = task
        .deadline
        .map(|d| display_date(d, io.date_format))
        .unwrap_or_else(|| "-".to_string());
    writeln!(io.out, "ID:          {}", task.id)?;
    writeln!(io.out, "Title:       {}", task.title)?;
    writeln!(io.out, "Description: {}", task.description.as_deref().unwrap_or(""))?;
    writeln!(io.out, "Priority:    {}", task.priority)?;
    writeln!(io.out, "Deadline:    {}", deadline)?;
    writeln!(io.out, "Completed:   {}", yes_no(task.completed))?;
    writeln!(io.out, "Created:     {}", task.created_at)?;
    Ok(())
}

/// Handle the add command
pub fn handle_add(
    title: String,
    description: Option<String>,
    priority: Option<String>,
    deadline: Option<String>,
    store: &TaskStore,
    io: &mut Console<'_>,
) -> Result<(), CliError> {
    let mut draft = TaskDraft::new(title);
    draft.description = description;
    if let Some(priority) = parse_priority_arg(priority.as_deref())? {
        draft.priority = priority;
    }
    draft.deadline = parse_deadline_arg(deadline.as_deref())?.flatten();

    let id = store.create(&draft)?;
    writeln!(io.out, "Task created successfully (ID: {})", id)?;
    Ok(())
}

/// Optional field overrides collected from `edit`
#[derive(Debug, Default)]
pub struct EditArgs {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub deadline: Option<String>,
    pub clear_deadline: bool,
}

/// Handle the edit command
pub fn handle_edit(
    id: i64,
    changes: EditArgs,
    store: &TaskStore,
    io: &mut Console<'_>,
) -> Result<(), CliError> {
    // Parse everything before touching the store
    let priority = parse_priority_arg(changes.priority.as_deref())?;
    let deadline = parse_deadline_arg(changes.deadline.as_deref())?;

    let current = store.get_by_id(id)?.ok_or(StoreError::NotFound(id))?;
    let mut draft = TaskDraft::from_task(&current);
    if let Some(title) = changes.title {
        draft.title = title;
    }
    if let Some(description) = changes.description {
        draft.description = Some(description);
    }
    if let Some(priority) = priority {
        draft.priority = priority;
    }
    if changes.clear_deadline {
        draft.deadline = None;
    } else if let Some(deadline) = deadline {
        draft.deadline = deadline;
    }

    store.update(id, &draft)?;
    writeln!(io.out, "Task {} updated successfully", id)?;
    Ok(())
}

/// Handle the delete command
pub fn handle_delete(id: i64, yes: bool, store: &TaskStore, io: &mut Console<'_>) -> Result<(), CliError> {
    if !yes {
        write!(io.out, "Are you sure you want to delete task {}? [y/N] ", id)?;
        io.out.flush()?;
        let mut answer = String::new();
        io.input.read_line(&mut answer)?;
        if !matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes") {
            writeln!(io.out, "Cancelled")?;
            return Ok(());
        }
    }
    store.delete(id)?;
    writeln!(io.out, "Task {} deleted successfully", id)?;
    Ok(())
}

/// Handle the toggle command
pub fn handle_toggle(id: i64, store: &TaskStore, io: &mut Console<'_>) -> Result<(), CliError> {
    let completed = store.toggle_completion(id)?;
    let state = if completed { "complete" } else { "incomplete" };
    writeln!(io.out, "Task {} marked {}", id, state)?;
    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

/// Format with the configured pattern, falling back to ISO if it is invalid
fn display_date(date: chrono::NaiveDate, pattern: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", date.format(pattern)).is_err() {
        return format_date(date);
    }
    out
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}
