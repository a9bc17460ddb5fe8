use chrono::{NaiveDate, NaiveDateTime, Utc};
use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Date format stored in the `deadline` column
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Timestamp format stored in `created_at`; matches SQLite's CURRENT_TIMESTAMP
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Profile mode for the application (dev or prod)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Dev,
    Prod,
}

impl Profile {
    fn app_name(self) -> &'static str {
        match self {
            Profile::Dev => "taskman-dev",
            Profile::Prod => "taskman",
        }
    }
}

fn project_dirs(profile: Profile) -> Option<ProjectDirs> {
    ProjectDirs::from("com", "taskman", profile.app_name())
}

/// Get the configuration directory path
/// If profile is Dev, uses "taskman-dev" instead of "taskman"
pub fn get_config_dir(profile: Profile) -> Option<PathBuf> {
    project_dirs(profile).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the data directory path (database and logs live here)
pub fn get_data_dir(profile: Profile) -> Option<PathBuf> {
    project_dirs(profile).map(|dirs| dirs.data_dir().to_path_buf())
}

/// Expand `~` in a path string to the user's home directory
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Parse a date string in ISO 8601 format (YYYY-MM-DD)
pub fn parse_date(date_str: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(date_str, DATE_FORMAT)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Current UTC time truncated to whole seconds, as stored in `created_at`
pub fn now_timestamp() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    // Round-trips through the text column without losing precision
    parse_timestamp(&format_timestamp(now)).unwrap_or(now)
}

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
}
