mod commands;
mod info;
mod setup;

pub use commands::AdminCommands;
pub use info::run_info;
pub use setup::{run_init, run_seed};

use std::path::PathBuf;

use crate::config::DB_FILE_NAME;
use crate::store::SqliteStore;

/// Opens the database in `data_dir`, failing if `admin init` has not run.
pub fn init_store(data_dir: &str) -> anyhow::Result<SqliteStore> {
    let db_path = PathBuf::from(data_dir).join(DB_FILE_NAME);

    if !db_path.exists() {
        anyhow::bail!(
            "Database not found at {}. Run 'campus admin init' first.",
            db_path.display()
        );
    }

    SqliteStore::new(&db_path).map_err(Into::into)
}

/// Asks before a destructive operation unless `--yes` was given.
pub fn confirm_action(message: &str, yes: bool) -> anyhow::Result<bool> {
    if yes {
        return Ok(true);
    }
    Ok(inquire::Confirm::new(message)
        .with_default(false)
        .prompt()?)
}
