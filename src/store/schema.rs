//! Schema registry: every schema version the store has ever shipped, in
//! ascending order. The migration engine replays the pending suffix of this
//! list at open time; nothing else consults it.

use rusqlite::{Transaction, params};

use crate::error::Result;
use crate::templates;
use crate::types::Provider;

/// Data rewrite applied inside a version's upgrade transaction. Transforms
/// only ever overwrite fields, so replaying one over already-migrated rows is
/// a no-op.
pub type Transform = fn(&Transaction<'_>) -> Result<()>;

pub struct SchemaVersion {
    pub version: i64,
    pub ddl: &'static str,
    pub transform: Option<Transform>,
}

pub const LATEST_VERSION: i64 = 3;

pub const VERSIONS: &[SchemaVersion] = &[
    SchemaVersion {
        version: 1,
        ddl: SCHEMA_V1,
        transform: None,
    },
    SchemaVersion {
        version: 2,
        ddl: SCHEMA_V2,
        transform: None,
    },
    SchemaVersion {
        version: 3,
        ddl: SCHEMA_V3,
        transform: Some(refresh_ai_defaults),
    },
];

const SCHEMA_V1: &str = r#"
-- Cross-collection references are soft ids, matching the object-store
-- heritage: no cascades, no referential integrity at this layer. Cleanup of
-- dangling references is a caller concern.

-- Accounts double as authors and administrators
CREATE TABLE IF NOT EXISTS accounts (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'user',
    status TEXT NOT NULL DEFAULT 'inactive',
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS categories (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    slug TEXT NOT NULL UNIQUE,
    description TEXT,
    created_by TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS posts (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    slug TEXT NOT NULL UNIQUE,
    content TEXT NOT NULL,
    excerpt TEXT NOT NULL,
    featured_image TEXT,         -- data-URL or remote URL, kept inline
    status TEXT NOT NULL DEFAULT 'draft',
    category_id TEXT NOT NULL,
    author_id TEXT NOT NULL,
    tags_json TEXT NOT NULL DEFAULT '[]',
    seo_title TEXT,
    seo_description TEXT,
    seo_keywords_json TEXT NOT NULL DEFAULT '[]',
    scheduled_for TEXT,
    published_at TEXT,           -- first publish only, preserved afterwards
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS comments (
    id TEXT PRIMARY KEY,
    post_id TEXT NOT NULL,
    author_id TEXT,                 -- NULL for anonymous
    parent_id TEXT,                 -- one reply level in the UI
    content TEXT NOT NULL,
    author_name TEXT NOT NULL,
    author_email TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    ip_address TEXT,
    user_agent TEXT,
    approved_at TEXT,
    approved_by TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS ai_configs (
    id TEXT PRIMARY KEY,
    provider TEXT NOT NULL,
    name TEXT NOT NULL,
    api_key TEXT NOT NULL,
    model TEXT NOT NULL,
    temperature REAL NOT NULL DEFAULT 0.7,
    max_tokens INTEGER NOT NULL DEFAULT 4096,
    top_p REAL NOT NULL DEFAULT 1.0,
    image_size TEXT,
    image_quality TEXT,
    content_template TEXT NOT NULL,
    image_template TEXT,
    enabled INTEGER NOT NULL DEFAULT 1,
    is_default INTEGER NOT NULL DEFAULT 0,
    created_by TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Indexed fields: everything features query by equality
CREATE INDEX IF NOT EXISTS idx_accounts_role ON accounts(role);
CREATE INDEX IF NOT EXISTS idx_posts_status ON posts(status);
CREATE INDEX IF NOT EXISTS idx_posts_category ON posts(category_id);
CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id);
CREATE INDEX IF NOT EXISTS idx_posts_published_at ON posts(published_at DESC);
CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id);
CREATE INDEX IF NOT EXISTS idx_comments_status ON comments(status);
CREATE INDEX IF NOT EXISTS idx_ai_configs_provider ON ai_configs(provider);
CREATE INDEX IF NOT EXISTS idx_ai_configs_default ON ai_configs(provider, is_default);
"#;

const SCHEMA_V2: &str = r#"
-- Sessions moved into the store so expiry can be purged in one place
CREATE TABLE IF NOT EXISTS sessions (
    token TEXT PRIMARY KEY,
    account_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sessions_account ON sessions(account_id);
CREATE INDEX IF NOT EXISTS idx_sessions_expires ON sessions(expires_at);
"#;

const SCHEMA_V3: &str = r#"
-- Reasoning-capable models grew dedicated tunables
ALTER TABLE ai_configs ADD COLUMN verbosity TEXT;
ALTER TABLE ai_configs ADD COLUMN reasoning_effort TEXT;
"#;

/// Version-3 transform. Two rewrites over existing `ai_configs` rows:
/// refresh prompt text that still equals the previous shipped default, and
/// backfill `verbosity`/`reasoning_effort` on reasoning-capable models.
fn refresh_ai_defaults(tx: &Transaction<'_>) -> Result<()> {
    for provider in [Provider::OpenAi, Provider::Perplexity] {
        tx.execute(
            "UPDATE ai_configs SET content_template = ?1
             WHERE provider = ?2 AND content_template = ?3",
            params![
                templates::current_article_template(provider),
                provider.as_str(),
                templates::previous_article_template(provider),
            ],
        )?;
    }

    // Enumerate instead of encoding the model pattern in SQL; the pattern
    // lives next to the template assets.
    let mut stmt = tx.prepare(
        "SELECT id, model FROM ai_configs WHERE provider IN ('openai', 'perplexity')",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    drop(stmt);

    for (id, model) in rows {
        if templates::is_reasoning_model(&model) {
            tx.execute(
                "UPDATE ai_configs
                 SET verbosity = COALESCE(verbosity, 'medium'),
                     reasoning_effort = COALESCE(reasoning_effort, 'medium')
                 WHERE id = ?1",
                params![id],
            )?;
        }
    }

    Ok(())
}
