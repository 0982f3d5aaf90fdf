use std::path::PathBuf;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create an account (active immediately)
    Create {
        /// Data directory holding the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Email address for the new account
        #[arg(long)]
        email: Option<String>,

        /// Display name
        #[arg(long)]
        name: Option<String>,

        /// Password (prompted for when omitted)
        #[arg(long)]
        password: Option<String>,

        /// Role: user, admin, or moderator
        #[arg(long, default_value = "user")]
        role: String,

        /// Skip interactive prompts (requires --email, --name, --password)
        #[arg(long)]
        non_interactive: bool,
    },

    /// Activate a pending or inactive account
    Activate {
        /// Data directory holding the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Email of the account to activate
        email: String,
    },

    /// Change an account's role
    SetRole {
        /// Data directory holding the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Email of the account to change
        email: String,

        /// New role: user, admin, or moderator
        role: String,
    },

    /// List accounts
    List {
        /// Data directory holding the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum BackupCommands {
    /// Write a full backup of the store as JSON
    Create {
        /// Data directory holding the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// File to write (stdout when omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Replace store content with a backup file's
    Restore {
        /// Data directory holding the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Backup file to read
        input: PathBuf,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}
