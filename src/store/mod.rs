mod migrate;
mod schema;
mod sqlite;

pub use migrate::{current_version, migrate, migrate_to};
pub use schema::LATEST_VERSION;
pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::*;

/// Store is the only way features reach persisted data.
///
/// Per collection it offers add (fails on a duplicate id), get by id,
/// equality lookups on indexed fields, partial update via a patch struct
/// (fails if the id is absent), delete by id, count, and a bulk insert that
/// reports partial failure explicitly instead of pretending to be atomic.
pub trait Store: Send + Sync {
    // Account operations
    fn add_account(&self, account: &Account) -> Result<()>;
    fn get_account(&self, id: &str) -> Result<Option<Account>>;
    fn get_account_by_email(&self, email: &str) -> Result<Option<Account>>;
    /// Oldest account holding the admin role, if any.
    fn find_admin_account(&self) -> Result<Option<Account>>;
    fn list_accounts(&self) -> Result<Vec<Account>>;
    fn update_account(&self, id: &str, patch: &AccountPatch) -> Result<Account>;
    fn delete_account(&self, id: &str) -> Result<bool>;
    fn count_accounts(&self) -> Result<i64>;
    fn bulk_add_accounts(&self, accounts: &[Account]) -> Result<BulkResult>;

    // Category operations
    fn add_category(&self, category: &Category) -> Result<()>;
    fn get_category(&self, id: &str) -> Result<Option<Category>>;
    fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>>;
    fn list_categories(&self) -> Result<Vec<Category>>;
    fn update_category(&self, id: &str, patch: &CategoryPatch) -> Result<Category>;
    /// No cascade: posts referencing the category keep their dangling id.
    fn delete_category(&self, id: &str) -> Result<bool>;
    fn count_categories(&self) -> Result<i64>;
    fn bulk_add_categories(&self, categories: &[Category]) -> Result<BulkResult>;

    // Post operations
    fn add_post(&self, post: &Post) -> Result<()>;
    fn get_post(&self, id: &str) -> Result<Option<Post>>;
    fn get_post_by_slug(&self, slug: &str) -> Result<Option<Post>>;
    /// Newest first by published timestamp, then creation time.
    fn list_posts(&self) -> Result<Vec<Post>>;
    fn list_posts_by_status(&self, status: PostStatus) -> Result<Vec<Post>>;
    fn list_posts_by_category(&self, category_id: &str) -> Result<Vec<Post>>;
    fn update_post(&self, id: &str, patch: &PostPatch) -> Result<Post>;
    fn delete_post(&self, id: &str) -> Result<bool>;
    fn count_posts(&self) -> Result<i64>;
    fn bulk_add_posts(&self, posts: &[Post]) -> Result<BulkResult>;

    // Comment operations
    fn add_comment(&self, comment: &Comment) -> Result<()>;
    fn get_comment(&self, id: &str) -> Result<Option<Comment>>;
    fn list_comments(&self) -> Result<Vec<Comment>>;
    fn list_comments_for_post(
        &self,
        post_id: &str,
        status: Option<CommentStatus>,
    ) -> Result<Vec<Comment>>;
    fn list_comments_by_status(&self, status: CommentStatus) -> Result<Vec<Comment>>;
    fn update_comment(&self, id: &str, patch: &CommentPatch) -> Result<Comment>;
    fn delete_comment(&self, id: &str) -> Result<bool>;
    fn count_comments(&self) -> Result<i64>;
    fn bulk_add_comments(&self, comments: &[Comment]) -> Result<BulkResult>;

    // AI config operations
    fn add_ai_config(&self, config: &AiConfig) -> Result<()>;
    fn get_ai_config(&self, id: &str) -> Result<Option<AiConfig>>;
    fn list_ai_configs(&self) -> Result<Vec<AiConfig>>;
    fn list_ai_configs_by_provider(&self, provider: Provider) -> Result<Vec<AiConfig>>;
    fn get_default_ai_config(&self, provider: Provider) -> Result<Option<AiConfig>>;
    /// Unsets the previous default for the row's provider and sets this one,
    /// inside a single transaction.
    fn set_default_ai_config(&self, id: &str) -> Result<()>;
    fn update_ai_config(&self, id: &str, patch: &AiConfigPatch) -> Result<AiConfig>;
    fn delete_ai_config(&self, id: &str) -> Result<bool>;
    fn count_ai_configs(&self) -> Result<i64>;
    fn bulk_add_ai_configs(&self, configs: &[AiConfig]) -> Result<BulkResult>;

    // Session operations
    fn add_session(&self, session: &Session) -> Result<()>;
    /// Expired sessions read back as absent and are purged on the way.
    fn get_session(&self, token: &str) -> Result<Option<Session>>;
    fn delete_session(&self, token: &str) -> Result<bool>;
    fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize>;

    // Backup support
    fn counts(&self) -> Result<StoreCounts>;
    fn clear_posts(&self) -> Result<()>;
    fn clear_categories(&self) -> Result<()>;
    fn clear_comments(&self) -> Result<()>;
    fn clear_ai_configs(&self) -> Result<()>;
    fn clear_sessions(&self) -> Result<()>;
    /// Removes every account except the one given (the restoring session's).
    fn prune_accounts_except(&self, keep_id: &str) -> Result<usize>;

    /// Flushes pending journal state to the database file. Callers invoke it
    /// after their last write and drop the store afterwards.
    fn close(&self) -> Result<()>;
}
