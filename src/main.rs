use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pressbase::cli::{
    AccountCommands, BackupCommands, run_account_activate, run_account_create, run_account_list,
    run_account_set_role, run_backup_create, run_backup_restore, run_init, run_seed, run_status,
};

#[derive(Parser)]
#[command(name = "pressbase")]
#[command(about = "Blog content store with migrations, seeding and backups", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database, run migrations, and seed baseline content
    Init {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Skip interactive prompts
        #[arg(long)]
        non_interactive: bool,
    },

    /// Re-run the baseline seeder against an existing database
    Seed {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },

    /// Show record counts and schema version
    Status {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage accounts
    Account {
        #[command(subcommand)]
        command: AccountCommands,
    },

    /// Backup and restore store content
    Backup {
        #[command(subcommand)]
        command: BackupCommands,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("pressbase=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            data_dir,
            non_interactive,
        } => run_init(data_dir, non_interactive)?,
        Commands::Seed { data_dir } => run_seed(data_dir)?,
        Commands::Status { data_dir, json } => run_status(data_dir, json)?,
        Commands::Account { command } => match command {
            AccountCommands::Create {
                data_dir,
                email,
                name,
                password,
                role,
                non_interactive,
            } => run_account_create(data_dir, email, name, password, role, non_interactive)?,
            AccountCommands::Activate { data_dir, email } => run_account_activate(data_dir, email)?,
            AccountCommands::SetRole {
                data_dir,
                email,
                role,
            } => run_account_set_role(data_dir, email, role)?,
            AccountCommands::List { data_dir, json } => run_account_list(data_dir, json)?,
        },
        Commands::Backup { command } => match command {
            BackupCommands::Create { data_dir, output } => run_backup_create(data_dir, output)?,
            BackupCommands::Restore {
                data_dir,
                input,
                yes,
            } => run_backup_restore(data_dir, input, yes)?,
        },
    }

    Ok(())
}
