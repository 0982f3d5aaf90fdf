mod account;
mod backup;
mod commands;
mod init;
mod status;

pub use account::{run_account_activate, run_account_create, run_account_list, run_account_set_role};
pub use backup::{run_backup_create, run_backup_restore};
pub use commands::{AccountCommands, BackupCommands};
pub use init::{run_init, run_seed};
pub use status::run_status;

use crate::store::SqliteStore;

/// Opens the store from a data directory, checking it exists.
pub fn init_store(data_dir: &str) -> anyhow::Result<SqliteStore> {
    let data_path: std::path::PathBuf = data_dir.into();
    let db_path = data_path.join("pressbase.db");

    if !db_path.exists() {
        anyhow::bail!(
            "Database not found at {}. Run 'pressbase init' first.",
            db_path.display()
        );
    }

    SqliteStore::open(&db_path).map_err(Into::into)
}
