pub mod cli;
pub mod config;
pub mod database;
pub mod logging;
pub mod models;
pub mod store;
pub mod utils;

pub use config::Config;
pub use database::{Database, DatabaseError};
pub use models::{Priority, StoredPriority, Task, TaskDraft, TaskSummary, ValidationError};
pub use store::{StoreError, TaskStore};
pub use utils::Profile;
