use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use std::path::Path;
use taskman::cli::{self, Cli, Commands, Console};
use taskman::logging::{self, LoggingError};
use taskman::{Config, Profile, TaskStore};

fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;

    let cli = Cli::parse();

    // Determine profile: --dev flag enables dev mode, otherwise use prod
    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };

    let config = match cli.config.as_deref() {
        Some(path) => Config::load_from_path(&taskman::utils::expand_path(path))?,
        None => Config::load_with_profile(profile)?,
    };

    let level = if cli.verbose { "debug" } else { config.log_level.as_str() };
    // Held until exit so buffered log lines get flushed
    let _logger = match logging::init_logging(level, &config.get_log_dir()) {
        Ok(handle) => Some(handle),
        Err(err @ LoggingError::InvalidLevel(_)) => return Err(eyre!("{}", err)),
        Err(err) => {
            eprintln!("Warning: file logging disabled: {}", err);
            None
        }
    };

    let db_path = config.get_database_path();
    let store = open_store(&db_path)?;

    let command = cli.command.unwrap_or(Commands::List {
        search: None,
        json: false,
    });

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut stdout = std::io::stdout().lock();
    let mut console = Console {
        input: &mut input,
        out: &mut stdout,
        date_format: &config.date_format,
    };
    let outcome = cli::run(command, &store, &mut console);

    // Release the database before reporting, whatever the outcome
    let closed = store.close();
    outcome?;
    closed?;

    Ok(())
}

fn open_store(path: &Path) -> Result<TaskStore> {
    TaskStore::open(path).map_err(|e| {
        eyre!("Failed to open task database at {}: {}", path.display(), e)
    })
}
