use std::fs;
use std::path::PathBuf;

use inquire::Confirm;

use crate::backup;
use crate::store::Store;

use super::init_store;

pub fn run_backup_create(data_dir: String, output: Option<PathBuf>) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;

    let snapshot = backup::create(&store)?;
    let json = backup::to_json(&snapshot)?;

    match output {
        Some(path) => {
            fs::write(&path, &json)?;
            println!(
                "Backup written to {} ({} records)",
                path.display(),
                snapshot.metadata.accounts
                    + snapshot.metadata.categories
                    + snapshot.metadata.posts
                    + snapshot.metadata.comments
                    + snapshot.metadata.ai_configs
            );
        }
        None => println!("{json}"),
    }

    Ok(())
}

pub fn run_backup_restore(data_dir: String, input: PathBuf, yes: bool) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;

    let json = fs::read_to_string(&input)?;
    let snapshot = backup::from_json(&json)?;

    // The restore prune keeps exactly one account; an admin must exist to be it.
    let admin = store
        .find_admin_account()?
        .ok_or_else(|| anyhow::anyhow!("No admin account to preserve. Run 'pressbase init' first."))?;

    if !yes {
        let confirmed = Confirm::new(&format!(
            "Replace ALL content with the backup from {}?",
            snapshot.timestamp.to_rfc3339()
        ))
        .with_default(false)
        .prompt()?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let summary = backup::restore(&store, &snapshot, &admin.id)?;
    store.close()?;

    println!();
    println!("Restored {} record(s)", summary.inserted());
    if !summary.all_ok() {
        for failure in summary
            .accounts
            .failed
            .iter()
            .chain(&summary.categories.failed)
            .chain(&summary.posts.failed)
            .chain(&summary.comments.failed)
            .chain(&summary.ai_configs.failed)
        {
            println!("  skipped {}: {}", failure.id, failure.error);
        }
    }
    println!();

    Ok(())
}
