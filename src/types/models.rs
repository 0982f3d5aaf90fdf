use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AccountStatus, CommentStatus, PostStatus, Provider, Role};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub status: AccountStatus,
    /// Argon2id PHC string. Serialized so backups can restore logins.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    /// Data-URL or remote URL; backups carry it inline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    pub status: PostStatus,
    pub category_id: String,
    pub author_id: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seo_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seo_description: Option<String>,
    #[serde(default)]
    pub seo_keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Set on the first transition to `published` and never overwritten after.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub content: String,
    /// Display identity captured at submission time, registered or not.
    pub author_name: String,
    pub author_email: String,
    pub status: CommentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub id: String,
    pub provider: Provider,
    pub name: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: i64,
    pub top_p: f64,
    /// Reasoning-model tunables; NULL for models that do not support them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_quality: Option<String>,
    pub content_template: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_template: Option<String>,
    pub enabled: bool,
    pub is_default: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    #[serde(skip)]
    pub token: String,
    pub account_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Partial updates: `Some` overwrites the field, `None` leaves it untouched.

#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
    pub status: Option<AccountStatus>,
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub status: Option<PostStatus>,
    pub category_id: Option<String>,
    pub tags: Option<Vec<String>>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub seo_keywords: Option<Vec<String>>,
    pub scheduled_for: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct CommentPatch {
    pub content: Option<String>,
    pub status: Option<CommentStatus>,
    /// Moderator recorded when `status` moves to `Approved`.
    pub approved_by: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AiConfigPatch {
    pub name: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<i64>,
    pub top_p: Option<f64>,
    pub verbosity: Option<String>,
    pub reasoning_effort: Option<String>,
    pub image_size: Option<String>,
    pub image_quality: Option<String>,
    pub content_template: Option<String>,
    pub image_template: Option<String>,
    pub enabled: Option<bool>,
    pub is_default: Option<bool>,
}

/// Per-collection record counts, used by `status` and backup metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCounts {
    pub accounts: i64,
    pub categories: i64,
    pub posts: i64,
    pub comments: i64,
    pub ai_configs: i64,
}

/// Outcome of a bulk insert. Never all-or-nothing: callers decide what a
/// partial failure means for them.
#[derive(Debug, Default)]
pub struct BulkResult {
    pub inserted: usize,
    pub failed: Vec<BulkFailure>,
}

#[derive(Debug)]
pub struct BulkFailure {
    pub id: String,
    pub error: String,
}

impl BulkResult {
    #[must_use]
    pub fn all_ok(&self) -> bool {
        self.failed.is_empty()
    }
}
