use std::fs;

use inquire::{Confirm, Password};

use crate::auth::PasswordHasher;
use crate::config::AppConfig;
use crate::seed;
use crate::store::{SqliteStore, Store};

use super::init_store;

/// Creates the database, runs pending migrations, and seeds baseline
/// content. Safe to re-run.
pub fn run_init(data_dir: String, non_interactive: bool) -> anyhow::Result<()> {
    let mut config = AppConfig::from_env();
    config.data_dir = data_dir.into();
    fs::create_dir_all(&config.data_dir)?;

    if !non_interactive {
        prompt_admin_password(&mut config)?;
    }

    let store = SqliteStore::open(config.db_path())?;
    seed::run(&store, &PasswordHasher::new(), &config);

    let counts = store.counts()?;
    store.close()?;

    println!();
    println!("Initialized {}", config.db_path().display());
    println!("Administrator: {}", config.admin.email);
    println!(
        "Seeded: {} accounts, {} categories, {} posts, {} ai configs",
        counts.accounts, counts.categories, counts.posts, counts.ai_configs
    );
    println!();

    Ok(())
}

fn prompt_admin_password(config: &mut AppConfig) -> anyhow::Result<()> {
    let custom = Confirm::new("Set a custom administrator password?")
        .with_default(false)
        .prompt()?;
    if !custom {
        return Ok(());
    }

    config.admin.password = Password::new("Administrator password:")
        .with_validator(|input: &str| {
            if input.len() < 8 {
                Ok(inquire::validator::Validation::Invalid(
                    "Password must be at least 8 characters".into(),
                ))
            } else {
                Ok(inquire::validator::Validation::Valid)
            }
        })
        .prompt()?;
    Ok(())
}

/// Re-runs the baseline seeder against an existing database.
pub fn run_seed(data_dir: String) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;

    let mut config = AppConfig::from_env();
    config.data_dir = data_dir.into();
    seed::run(&store, &PasswordHasher::new(), &config);

    let counts = store.counts()?;
    store.close()?;
    println!(
        "Seed complete: {} accounts, {} categories, {} posts, {} ai configs",
        counts.accounts, counts.categories, counts.posts, counts.ai_configs
    );

    Ok(())
}
