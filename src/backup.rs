//! Full-content backup and restore.
//!
//! A backup is a single self-describing JSON document: format version,
//! export timestamp, per-collection counts, and the records themselves.
//! Restore is destructive by design: existing content is dropped before the
//! backup is loaded, keeping only the account performing the restore.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{Account, AiConfig, BulkResult, Category, Comment, Post, StoreCounts};

/// Format version written into every backup. Restores accept any `1.x`.
pub const BACKUP_VERSION: &str = "1.0.0";

#[derive(Debug, Serialize, Deserialize)]
pub struct Backup {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: StoreCounts,
    pub data: BackupData,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BackupData {
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub ai_configs: Vec<AiConfig>,
}

/// Per-collection insert outcome of a restore.
#[derive(Debug, Default)]
pub struct RestoreSummary {
    pub accounts: BulkResult,
    pub categories: BulkResult,
    pub posts: BulkResult,
    pub comments: BulkResult,
    pub ai_configs: BulkResult,
}

impl RestoreSummary {
    #[must_use]
    pub fn all_ok(&self) -> bool {
        self.accounts.all_ok()
            && self.categories.all_ok()
            && self.posts.all_ok()
            && self.comments.all_ok()
            && self.ai_configs.all_ok()
    }

    #[must_use]
    pub fn inserted(&self) -> usize {
        self.accounts.inserted
            + self.categories.inserted
            + self.posts.inserted
            + self.comments.inserted
            + self.ai_configs.inserted
    }
}

/// Snapshots every collection. Sessions are deliberately excluded: they are
/// server-side state, not content.
pub fn create(store: &dyn Store) -> Result<Backup> {
    let data = BackupData {
        accounts: store.list_accounts()?,
        categories: store.list_categories()?,
        posts: store.list_posts()?,
        comments: store.list_comments()?,
        ai_configs: store.list_ai_configs()?,
    };

    Ok(Backup {
        version: BACKUP_VERSION.to_string(),
        timestamp: Utc::now(),
        metadata: store.counts()?,
        data,
    })
}

pub fn to_json(backup: &Backup) -> Result<String> {
    Ok(serde_json::to_string_pretty(backup)?)
}

pub fn from_json(json: &str) -> Result<Backup> {
    let backup: Backup = serde_json::from_str(json)?;
    check_version(&backup.version)?;
    Ok(backup)
}

fn check_version(version: &str) -> Result<()> {
    if version == BACKUP_VERSION || version.starts_with("1.") {
        return Ok(());
    }
    Err(Error::Validation(format!(
        "unsupported backup version: {version}"
    )))
}

/// Replaces store content with the backup's.
///
/// `keep_account_id` is the account performing the restore; it survives the
/// account prune so the caller is not locked out, and a backup row carrying
/// the same id is skipped rather than re-inserted. Inserts are best-effort:
/// each failure is logged and reported, the rest proceed.
pub fn restore(store: &dyn Store, backup: &Backup, keep_account_id: &str) -> Result<RestoreSummary> {
    check_version(&backup.version)?;

    let pruned = store.prune_accounts_except(keep_account_id)?;
    store.clear_comments()?;
    store.clear_posts()?;
    store.clear_categories()?;
    store.clear_ai_configs()?;
    // Every other session is now pointing at deleted accounts.
    store.clear_sessions()?;
    info!(pruned, "cleared existing content for restore");

    let accounts: Vec<Account> = backup
        .data
        .accounts
        .iter()
        .filter(|a| a.id != keep_account_id)
        .cloned()
        .collect();

    let summary = RestoreSummary {
        accounts: store.bulk_add_accounts(&accounts)?,
        categories: store.bulk_add_categories(&backup.data.categories)?,
        posts: store.bulk_add_posts(&backup.data.posts)?,
        comments: store.bulk_add_comments(&backup.data.comments)?,
        ai_configs: store.bulk_add_ai_configs(&backup.data.ai_configs)?,
    };

    for failure in summary
        .accounts
        .failed
        .iter()
        .chain(&summary.categories.failed)
        .chain(&summary.posts.failed)
        .chain(&summary.comments.failed)
        .chain(&summary.ai_configs.failed)
    {
        warn!(id = %failure.id, "record not restored: {}", failure.error);
    }
    info!(inserted = summary.inserted(), "restore finished");

    Ok(summary)
}
