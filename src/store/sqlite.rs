use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::Store;
use super::migrate;
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the store and brings it to the latest schema
    /// version. Nothing happens at import time; this is the whole lifecycle
    /// entry point.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let mut conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        migrate::migrate(&mut conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying connection for custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn parse_enum<T>(idx: usize, s: &str) -> rusqlite::Result<T>
where
    T: FromStr<Err = Error>,
{
    s.parse().map_err(|e: Error| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_string_list(idx: usize, s: &str) -> rusqlite::Result<Vec<String>> {
    serde_json::from_str(s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn encode_string_list(list: &[String]) -> String {
    serde_json::to_string(list).unwrap_or_else(|_| "[]".to_string())
}

/// Maps UNIQUE-constraint failures to the adapter's error taxonomy: a primary
/// key collision is `AlreadyExists`, any other unique column is a `Conflict`
/// named after the column.
fn map_insert_error(e: rusqlite::Error) -> Error {
    if let rusqlite::Error::SqliteFailure(err, Some(ref msg)) = e {
        if err.code == rusqlite::ErrorCode::ConstraintViolation {
            if msg.contains(".id") || msg.contains("PRIMARY KEY") || msg.contains(".token") {
                return Error::AlreadyExists;
            }
            if msg.contains(".email") {
                return Error::Conflict("email already registered".to_string());
            }
            if msg.contains(".slug") {
                return Error::Conflict("slug already in use".to_string());
            }
            return Error::Conflict(msg.clone());
        }
    }
    Error::from(e)
}

const ACCOUNT_COLS: &str = "id, email, name, role, status, password_hash, created_at, updated_at";

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        role: parse_enum(3, &row.get::<_, String>(3)?)?,
        status: parse_enum(4, &row.get::<_, String>(4)?)?,
        password_hash: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
        updated_at: parse_datetime(&row.get::<_, String>(7)?),
    })
}

const CATEGORY_COLS: &str = "id, name, slug, description, created_by, created_at, updated_at";

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
        created_by: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
        updated_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

const POST_COLS: &str = "id, title, slug, content, excerpt, featured_image, status, category_id, \
                         author_id, tags_json, seo_title, seo_description, seo_keywords_json, \
                         scheduled_for, published_at, created_at, updated_at";

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        content: row.get(3)?,
        excerpt: row.get(4)?,
        featured_image: row.get(5)?,
        status: parse_enum(6, &row.get::<_, String>(6)?)?,
        category_id: row.get(7)?,
        author_id: row.get(8)?,
        tags: parse_string_list(9, &row.get::<_, String>(9)?)?,
        seo_title: row.get(10)?,
        seo_description: row.get(11)?,
        seo_keywords: parse_string_list(12, &row.get::<_, String>(12)?)?,
        scheduled_for: row.get::<_, Option<String>>(13)?.map(|s| parse_datetime(&s)),
        published_at: row.get::<_, Option<String>>(14)?.map(|s| parse_datetime(&s)),
        created_at: parse_datetime(&row.get::<_, String>(15)?),
        updated_at: parse_datetime(&row.get::<_, String>(16)?),
    })
}

const COMMENT_COLS: &str = "id, post_id, author_id, parent_id, content, author_name, author_email, \
                            status, ip_address, user_agent, approved_at, approved_by, created_at, \
                            updated_at";

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        post_id: row.get(1)?,
        author_id: row.get(2)?,
        parent_id: row.get(3)?,
        content: row.get(4)?,
        author_name: row.get(5)?,
        author_email: row.get(6)?,
        status: parse_enum(7, &row.get::<_, String>(7)?)?,
        ip_address: row.get(8)?,
        user_agent: row.get(9)?,
        approved_at: row.get::<_, Option<String>>(10)?.map(|s| parse_datetime(&s)),
        approved_by: row.get(11)?,
        created_at: parse_datetime(&row.get::<_, String>(12)?),
        updated_at: parse_datetime(&row.get::<_, String>(13)?),
    })
}

const AI_CONFIG_COLS: &str = "id, provider, name, api_key, model, temperature, max_tokens, top_p, \
                              verbosity, reasoning_effort, image_size, image_quality, \
                              content_template, image_template, enabled, is_default, created_by, \
                              created_at, updated_at";

fn ai_config_from_row(row: &Row<'_>) -> rusqlite::Result<AiConfig> {
    Ok(AiConfig {
        id: row.get(0)?,
        provider: parse_enum(1, &row.get::<_, String>(1)?)?,
        name: row.get(2)?,
        api_key: row.get(3)?,
        model: row.get(4)?,
        temperature: row.get(5)?,
        max_tokens: row.get(6)?,
        top_p: row.get(7)?,
        verbosity: row.get(8)?,
        reasoning_effort: row.get(9)?,
        image_size: row.get(10)?,
        image_quality: row.get(11)?,
        content_template: row.get(12)?,
        image_template: row.get(13)?,
        enabled: row.get(14)?,
        is_default: row.get(15)?,
        created_by: row.get(16)?,
        created_at: parse_datetime(&row.get::<_, String>(17)?),
        updated_at: parse_datetime(&row.get::<_, String>(18)?),
    })
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        token: row.get(0)?,
        account_id: row.get(1)?,
        created_at: parse_datetime(&row.get::<_, String>(2)?),
        expires_at: parse_datetime(&row.get::<_, String>(3)?),
    })
}

fn insert_account(conn: &Connection, account: &Account) -> Result<()> {
    conn.execute(
        "INSERT INTO accounts (id, email, name, role, status, password_hash, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            account.id,
            account.email,
            account.name,
            account.role.as_str(),
            account.status.as_str(),
            account.password_hash,
            format_datetime(&account.created_at),
            format_datetime(&account.updated_at),
        ],
    )
    .map_err(map_insert_error)?;
    Ok(())
}

fn insert_category(conn: &Connection, category: &Category) -> Result<()> {
    conn.execute(
        "INSERT INTO categories (id, name, slug, description, created_by, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            category.id,
            category.name,
            category.slug,
            category.description,
            category.created_by,
            format_datetime(&category.created_at),
            format_datetime(&category.updated_at),
        ],
    )
    .map_err(map_insert_error)?;
    Ok(())
}

fn insert_post(conn: &Connection, post: &Post) -> Result<()> {
    conn.execute(
        "INSERT INTO posts (id, title, slug, content, excerpt, featured_image, status, category_id,
                            author_id, tags_json, seo_title, seo_description, seo_keywords_json,
                            scheduled_for, published_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            post.id,
            post.title,
            post.slug,
            post.content,
            post.excerpt,
            post.featured_image,
            post.status.as_str(),
            post.category_id,
            post.author_id,
            encode_string_list(&post.tags),
            post.seo_title,
            post.seo_description,
            encode_string_list(&post.seo_keywords),
            post.scheduled_for.as_ref().map(format_datetime),
            post.published_at.as_ref().map(format_datetime),
            format_datetime(&post.created_at),
            format_datetime(&post.updated_at),
        ],
    )
    .map_err(map_insert_error)?;
    Ok(())
}

fn insert_comment(conn: &Connection, comment: &Comment) -> Result<()> {
    conn.execute(
        "INSERT INTO comments (id, post_id, author_id, parent_id, content, author_name,
                               author_email, status, ip_address, user_agent, approved_at,
                               approved_by, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            comment.id,
            comment.post_id,
            comment.author_id,
            comment.parent_id,
            comment.content,
            comment.author_name,
            comment.author_email,
            comment.status.as_str(),
            comment.ip_address,
            comment.user_agent,
            comment.approved_at.as_ref().map(format_datetime),
            comment.approved_by,
            format_datetime(&comment.created_at),
            format_datetime(&comment.updated_at),
        ],
    )
    .map_err(map_insert_error)?;
    Ok(())
}

fn insert_ai_config(conn: &Connection, config: &AiConfig) -> Result<()> {
    conn.execute(
        "INSERT INTO ai_configs (id, provider, name, api_key, model, temperature, max_tokens,
                                 top_p, verbosity, reasoning_effort, image_size, image_quality,
                                 content_template, image_template, enabled, is_default, created_by,
                                 created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
        params![
            config.id,
            config.provider.as_str(),
            config.name,
            config.api_key,
            config.model,
            config.temperature,
            config.max_tokens,
            config.top_p,
            config.verbosity,
            config.reasoning_effort,
            config.image_size,
            config.image_quality,
            config.content_template,
            config.image_template,
            config.enabled,
            config.is_default,
            config.created_by,
            format_datetime(&config.created_at),
            format_datetime(&config.updated_at),
        ],
    )
    .map_err(map_insert_error)?;
    Ok(())
}

fn get_post_on(conn: &Connection, id: &str) -> Result<Option<Post>> {
    conn.query_row(
        &format!("SELECT {POST_COLS} FROM posts WHERE id = ?1"),
        params![id],
        post_from_row,
    )
    .optional()
    .map_err(Error::from)
}

fn write_post(conn: &Connection, post: &Post) -> Result<()> {
    let rows = conn.execute(
        "UPDATE posts SET title = ?1, slug = ?2, content = ?3, excerpt = ?4, featured_image = ?5,
                          status = ?6, category_id = ?7, tags_json = ?8, seo_title = ?9,
                          seo_description = ?10, seo_keywords_json = ?11, scheduled_for = ?12,
                          published_at = ?13, updated_at = ?14
         WHERE id = ?15",
        params![
            post.title,
            post.slug,
            post.content,
            post.excerpt,
            post.featured_image,
            post.status.as_str(),
            post.category_id,
            encode_string_list(&post.tags),
            post.seo_title,
            post.seo_description,
            encode_string_list(&post.seo_keywords),
            post.scheduled_for.as_ref().map(format_datetime),
            post.published_at.as_ref().map(format_datetime),
            format_datetime(&post.updated_at),
            post.id,
        ],
    )?;

    if rows == 0 {
        return Err(Error::NotFound);
    }
    Ok(())
}

fn bulk_insert<T, F>(items: &[T], id_of: fn(&T) -> &str, mut insert: F) -> BulkResult
where
    F: FnMut(&T) -> Result<()>,
{
    let mut result = BulkResult::default();
    for item in items {
        match insert(item) {
            Ok(()) => result.inserted += 1,
            Err(e) => result.failed.push(BulkFailure {
                id: id_of(item).to_string(),
                error: e.to_string(),
            }),
        }
    }
    result
}

impl Store for SqliteStore {
    // Account operations

    fn add_account(&self, account: &Account) -> Result<()> {
        insert_account(&self.conn(), account)
    }

    fn get_account(&self, id: &str) -> Result<Option<Account>> {
        self.conn()
            .query_row(
                &format!("SELECT {ACCOUNT_COLS} FROM accounts WHERE id = ?1"),
                params![id],
                account_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.conn()
            .query_row(
                &format!("SELECT {ACCOUNT_COLS} FROM accounts WHERE email = ?1"),
                params![email],
                account_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn find_admin_account(&self) -> Result<Option<Account>> {
        self.conn()
            .query_row(
                &format!(
                    "SELECT {ACCOUNT_COLS} FROM accounts WHERE role = 'admin'
                     ORDER BY created_at LIMIT 1"
                ),
                [],
                account_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_accounts(&self) -> Result<Vec<Account>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare(&format!("SELECT {ACCOUNT_COLS} FROM accounts ORDER BY created_at"))?;
        let rows = stmt.query_map([], account_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_account(&self, id: &str, patch: &AccountPatch) -> Result<Account> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let mut account = tx
            .query_row(
                &format!("SELECT {ACCOUNT_COLS} FROM accounts WHERE id = ?1"),
                params![id],
                account_from_row,
            )
            .optional()?
            .ok_or(Error::NotFound)?;

        if let Some(email) = &patch.email {
            account.email = email.clone();
        }
        if let Some(name) = &patch.name {
            account.name = name.clone();
        }
        if let Some(role) = patch.role {
            account.role = role;
        }
        if let Some(status) = patch.status {
            account.status = status;
        }
        if let Some(hash) = &patch.password_hash {
            account.password_hash = hash.clone();
        }
        account.updated_at = Utc::now();

        tx.execute(
            "UPDATE accounts SET email = ?1, name = ?2, role = ?3, status = ?4,
                                 password_hash = ?5, updated_at = ?6
             WHERE id = ?7",
            params![
                account.email,
                account.name,
                account.role.as_str(),
                account.status.as_str(),
                account.password_hash,
                format_datetime(&account.updated_at),
                account.id,
            ],
        )
        .map_err(map_insert_error)?;

        tx.commit()?;
        Ok(account)
    }

    fn delete_account(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM accounts WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn count_accounts(&self) -> Result<i64> {
        self.conn()
            .query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))
            .map_err(Error::from)
    }

    fn bulk_add_accounts(&self, accounts: &[Account]) -> Result<BulkResult> {
        let conn = self.conn();
        Ok(bulk_insert(accounts, |a| &a.id, |a| insert_account(&conn, a)))
    }

    // Category operations

    fn add_category(&self, category: &Category) -> Result<()> {
        insert_category(&self.conn(), category)
    }

    fn get_category(&self, id: &str) -> Result<Option<Category>> {
        self.conn()
            .query_row(
                &format!("SELECT {CATEGORY_COLS} FROM categories WHERE id = ?1"),
                params![id],
                category_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        self.conn()
            .query_row(
                &format!("SELECT {CATEGORY_COLS} FROM categories WHERE slug = ?1"),
                params![slug],
                category_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_categories(&self) -> Result<Vec<Category>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare(&format!("SELECT {CATEGORY_COLS} FROM categories ORDER BY name"))?;
        let rows = stmt.query_map([], category_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_category(&self, id: &str, patch: &CategoryPatch) -> Result<Category> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let mut category = tx
            .query_row(
                &format!("SELECT {CATEGORY_COLS} FROM categories WHERE id = ?1"),
                params![id],
                category_from_row,
            )
            .optional()?
            .ok_or(Error::NotFound)?;

        if let Some(name) = &patch.name {
            category.name = name.clone();
        }
        if let Some(slug) = &patch.slug {
            category.slug = slug.clone();
        }
        if let Some(description) = &patch.description {
            category.description = Some(description.clone());
        }
        category.updated_at = Utc::now();

        tx.execute(
            "UPDATE categories SET name = ?1, slug = ?2, description = ?3, updated_at = ?4
             WHERE id = ?5",
            params![
                category.name,
                category.slug,
                category.description,
                format_datetime(&category.updated_at),
                category.id,
            ],
        )
        .map_err(map_insert_error)?;

        tx.commit()?;
        Ok(category)
    }

    fn delete_category(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM categories WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn count_categories(&self) -> Result<i64> {
        self.conn()
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))
            .map_err(Error::from)
    }

    fn bulk_add_categories(&self, categories: &[Category]) -> Result<BulkResult> {
        let conn = self.conn();
        Ok(bulk_insert(categories, |c| &c.id, |c| insert_category(&conn, c)))
    }

    // Post operations

    fn add_post(&self, post: &Post) -> Result<()> {
        insert_post(&self.conn(), post)
    }

    fn get_post(&self, id: &str) -> Result<Option<Post>> {
        get_post_on(&self.conn(), id)
    }

    fn get_post_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        self.conn()
            .query_row(
                &format!("SELECT {POST_COLS} FROM posts WHERE slug = ?1"),
                params![slug],
                post_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_posts(&self) -> Result<Vec<Post>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {POST_COLS} FROM posts
             ORDER BY published_at IS NULL, published_at DESC, created_at DESC"
        ))?;
        let rows = stmt.query_map([], post_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_posts_by_status(&self, status: PostStatus) -> Result<Vec<Post>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {POST_COLS} FROM posts WHERE status = ?1
             ORDER BY published_at IS NULL, published_at DESC, created_at DESC"
        ))?;
        let rows = stmt.query_map(params![status.as_str()], post_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_posts_by_category(&self, category_id: &str) -> Result<Vec<Post>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {POST_COLS} FROM posts WHERE category_id = ?1
             ORDER BY published_at IS NULL, published_at DESC, created_at DESC"
        ))?;
        let rows = stmt.query_map(params![category_id], post_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_post(&self, id: &str, patch: &PostPatch) -> Result<Post> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let mut post = get_post_on(&tx, id)?.ok_or(Error::NotFound)?;

        if let Some(title) = &patch.title {
            post.title = title.clone();
        }
        if let Some(slug) = &patch.slug {
            post.slug = slug.clone();
        }
        if let Some(content) = &patch.content {
            post.content = content.clone();
        }
        if let Some(excerpt) = &patch.excerpt {
            post.excerpt = excerpt.clone();
        }
        if let Some(image) = &patch.featured_image {
            post.featured_image = Some(image.clone());
        }
        if let Some(category_id) = &patch.category_id {
            post.category_id = category_id.clone();
        }
        if let Some(tags) = &patch.tags {
            post.tags = tags.clone();
        }
        if let Some(seo_title) = &patch.seo_title {
            post.seo_title = Some(seo_title.clone());
        }
        if let Some(seo_description) = &patch.seo_description {
            post.seo_description = Some(seo_description.clone());
        }
        if let Some(keywords) = &patch.seo_keywords {
            post.seo_keywords = keywords.clone();
        }
        if let Some(scheduled_for) = patch.scheduled_for {
            post.scheduled_for = Some(scheduled_for);
        }
        if let Some(status) = patch.status {
            // First publish stamps the timestamp; it survives every edit after.
            if status == PostStatus::Published && post.published_at.is_none() {
                post.published_at = Some(Utc::now());
            }
            post.status = status;
        }
        post.updated_at = Utc::now();

        write_post(&tx, &post)?;
        tx.commit()?;
        Ok(post)
    }

    fn delete_post(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM posts WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn count_posts(&self) -> Result<i64> {
        self.conn()
            .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))
            .map_err(Error::from)
    }

    fn bulk_add_posts(&self, posts: &[Post]) -> Result<BulkResult> {
        let conn = self.conn();
        Ok(bulk_insert(posts, |p| &p.id, |p| insert_post(&conn, p)))
    }

    // Comment operations

    fn add_comment(&self, comment: &Comment) -> Result<()> {
        insert_comment(&self.conn(), comment)
    }

    fn get_comment(&self, id: &str) -> Result<Option<Comment>> {
        self.conn()
            .query_row(
                &format!("SELECT {COMMENT_COLS} FROM comments WHERE id = ?1"),
                params![id],
                comment_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_comments(&self) -> Result<Vec<Comment>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare(&format!("SELECT {COMMENT_COLS} FROM comments ORDER BY created_at"))?;
        let rows = stmt.query_map([], comment_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_comments_for_post(
        &self,
        post_id: &str,
        status: Option<CommentStatus>,
    ) -> Result<Vec<Comment>> {
        let conn = self.conn();
        match status {
            Some(status) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {COMMENT_COLS} FROM comments
                     WHERE post_id = ?1 AND status = ?2 ORDER BY created_at"
                ))?;
                let rows = stmt.query_map(params![post_id, status.as_str()], comment_from_row)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(Error::from)
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {COMMENT_COLS} FROM comments WHERE post_id = ?1 ORDER BY created_at"
                ))?;
                let rows = stmt.query_map(params![post_id], comment_from_row)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(Error::from)
            }
        }
    }

    fn list_comments_by_status(&self, status: CommentStatus) -> Result<Vec<Comment>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {COMMENT_COLS} FROM comments WHERE status = ?1 ORDER BY created_at"
        ))?;
        let rows = stmt.query_map(params![status.as_str()], comment_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_comment(&self, id: &str, patch: &CommentPatch) -> Result<Comment> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let mut comment = tx
            .query_row(
                &format!("SELECT {COMMENT_COLS} FROM comments WHERE id = ?1"),
                params![id],
                comment_from_row,
            )
            .optional()?
            .ok_or(Error::NotFound)?;

        if let Some(content) = &patch.content {
            comment.content = content.clone();
        }
        if let Some(status) = patch.status {
            if status == CommentStatus::Approved && comment.status != CommentStatus::Approved {
                comment.approved_at = Some(Utc::now());
                comment.approved_by = patch.approved_by.clone();
            }
            comment.status = status;
        }
        comment.updated_at = Utc::now();

        tx.execute(
            "UPDATE comments SET content = ?1, status = ?2, approved_at = ?3, approved_by = ?4,
                                 updated_at = ?5
             WHERE id = ?6",
            params![
                comment.content,
                comment.status.as_str(),
                comment.approved_at.as_ref().map(format_datetime),
                comment.approved_by,
                format_datetime(&comment.updated_at),
                comment.id,
            ],
        )?;

        tx.commit()?;
        Ok(comment)
    }

    fn delete_comment(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM comments WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn count_comments(&self) -> Result<i64> {
        self.conn()
            .query_row("SELECT COUNT(*) FROM comments", [], |row| row.get(0))
            .map_err(Error::from)
    }

    fn bulk_add_comments(&self, comments: &[Comment]) -> Result<BulkResult> {
        let conn = self.conn();
        Ok(bulk_insert(comments, |c| &c.id, |c| insert_comment(&conn, c)))
    }

    // AI config operations

    fn add_ai_config(&self, config: &AiConfig) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        if config.is_default {
            tx.execute(
                "UPDATE ai_configs SET is_default = 0 WHERE provider = ?1 AND is_default = 1",
                params![config.provider.as_str()],
            )?;
        }
        insert_ai_config(&tx, config)?;
        tx.commit()?;
        Ok(())
    }

    fn get_ai_config(&self, id: &str) -> Result<Option<AiConfig>> {
        self.conn()
            .query_row(
                &format!("SELECT {AI_CONFIG_COLS} FROM ai_configs WHERE id = ?1"),
                params![id],
                ai_config_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_ai_configs(&self) -> Result<Vec<AiConfig>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {AI_CONFIG_COLS} FROM ai_configs ORDER BY created_at"
        ))?;
        let rows = stmt.query_map([], ai_config_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_ai_configs_by_provider(&self, provider: Provider) -> Result<Vec<AiConfig>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {AI_CONFIG_COLS} FROM ai_configs WHERE provider = ?1 ORDER BY created_at"
        ))?;
        let rows = stmt.query_map(params![provider.as_str()], ai_config_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn get_default_ai_config(&self, provider: Provider) -> Result<Option<AiConfig>> {
        self.conn()
            .query_row(
                &format!(
                    "SELECT {AI_CONFIG_COLS} FROM ai_configs
                     WHERE provider = ?1 AND is_default = 1 LIMIT 1"
                ),
                params![provider.as_str()],
                ai_config_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn set_default_ai_config(&self, id: &str) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let provider: String = tx
            .query_row(
                "SELECT provider FROM ai_configs WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(Error::NotFound)?;

        // Both writes commit together, so there is never zero or two defaults.
        tx.execute(
            "UPDATE ai_configs SET is_default = 0 WHERE provider = ?1 AND is_default = 1",
            params![provider],
        )?;
        tx.execute(
            "UPDATE ai_configs SET is_default = 1, updated_at = ?1 WHERE id = ?2",
            params![format_datetime(&Utc::now()), id],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn update_ai_config(&self, id: &str, patch: &AiConfigPatch) -> Result<AiConfig> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let mut config = tx
            .query_row(
                &format!("SELECT {AI_CONFIG_COLS} FROM ai_configs WHERE id = ?1"),
                params![id],
                ai_config_from_row,
            )
            .optional()?
            .ok_or(Error::NotFound)?;

        if let Some(name) = &patch.name {
            config.name = name.clone();
        }
        if let Some(api_key) = &patch.api_key {
            config.api_key = api_key.clone();
        }
        if let Some(model) = &patch.model {
            config.model = model.clone();
        }
        if let Some(temperature) = patch.temperature {
            config.temperature = temperature;
        }
        if let Some(max_tokens) = patch.max_tokens {
            config.max_tokens = max_tokens;
        }
        if let Some(top_p) = patch.top_p {
            config.top_p = top_p;
        }
        if let Some(verbosity) = &patch.verbosity {
            config.verbosity = Some(verbosity.clone());
        }
        if let Some(effort) = &patch.reasoning_effort {
            config.reasoning_effort = Some(effort.clone());
        }
        if let Some(size) = &patch.image_size {
            config.image_size = Some(size.clone());
        }
        if let Some(quality) = &patch.image_quality {
            config.image_quality = Some(quality.clone());
        }
        if let Some(template) = &patch.content_template {
            config.content_template = template.clone();
        }
        if let Some(template) = &patch.image_template {
            config.image_template = Some(template.clone());
        }
        if let Some(enabled) = patch.enabled {
            config.enabled = enabled;
        }
        if let Some(is_default) = patch.is_default {
            if is_default && !config.is_default {
                tx.execute(
                    "UPDATE ai_configs SET is_default = 0 WHERE provider = ?1 AND is_default = 1",
                    params![config.provider.as_str()],
                )?;
            }
            config.is_default = is_default;
        }
        config.updated_at = Utc::now();

        tx.execute(
            "UPDATE ai_configs SET name = ?1, api_key = ?2, model = ?3, temperature = ?4,
                                   max_tokens = ?5, top_p = ?6, verbosity = ?7,
                                   reasoning_effort = ?8, image_size = ?9, image_quality = ?10,
                                   content_template = ?11, image_template = ?12, enabled = ?13,
                                   is_default = ?14, updated_at = ?15
             WHERE id = ?16",
            params![
                config.name,
                config.api_key,
                config.model,
                config.temperature,
                config.max_tokens,
                config.top_p,
                config.verbosity,
                config.reasoning_effort,
                config.image_size,
                config.image_quality,
                config.content_template,
                config.image_template,
                config.enabled,
                config.is_default,
                format_datetime(&config.updated_at),
                config.id,
            ],
        )?;

        tx.commit()?;
        Ok(config)
    }

    fn delete_ai_config(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM ai_configs WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn count_ai_configs(&self) -> Result<i64> {
        self.conn()
            .query_row("SELECT COUNT(*) FROM ai_configs", [], |row| row.get(0))
            .map_err(Error::from)
    }

    fn bulk_add_ai_configs(&self, configs: &[AiConfig]) -> Result<BulkResult> {
        let conn = self.conn();
        Ok(bulk_insert(configs, |c| &c.id, |c| insert_ai_config(&conn, c)))
    }

    // Session operations

    fn add_session(&self, session: &Session) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO sessions (token, account_id, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    session.token,
                    session.account_id,
                    format_datetime(&session.created_at),
                    format_datetime(&session.expires_at),
                ],
            )
            .map_err(map_insert_error)?;
        Ok(())
    }

    fn get_session(&self, token: &str) -> Result<Option<Session>> {
        let conn = self.conn();
        let session = conn
            .query_row(
                "SELECT token, account_id, created_at, expires_at FROM sessions WHERE token = ?1",
                params![token],
                session_from_row,
            )
            .optional()?;

        match session {
            Some(session) if session.expires_at <= Utc::now() => {
                conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    fn delete_session(&self, token: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
        Ok(rows > 0)
    }

    fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
        let rows = self.conn().execute(
            "DELETE FROM sessions WHERE expires_at <= ?1",
            params![format_datetime(&now)],
        )?;
        Ok(rows)
    }

    // Backup support

    fn counts(&self) -> Result<StoreCounts> {
        Ok(StoreCounts {
            accounts: self.count_accounts()?,
            categories: self.count_categories()?,
            posts: self.count_posts()?,
            comments: self.count_comments()?,
            ai_configs: self.count_ai_configs()?,
        })
    }

    fn clear_posts(&self) -> Result<()> {
        self.conn().execute("DELETE FROM posts", [])?;
        Ok(())
    }

    fn clear_categories(&self) -> Result<()> {
        self.conn().execute("DELETE FROM categories", [])?;
        Ok(())
    }

    fn clear_comments(&self) -> Result<()> {
        self.conn().execute("DELETE FROM comments", [])?;
        Ok(())
    }

    fn clear_ai_configs(&self) -> Result<()> {
        self.conn().execute("DELETE FROM ai_configs", [])?;
        Ok(())
    }

    fn clear_sessions(&self) -> Result<()> {
        self.conn().execute("DELETE FROM sessions", [])?;
        Ok(())
    }

    fn prune_accounts_except(&self, keep_id: &str) -> Result<usize> {
        let rows = self
            .conn()
            .execute("DELETE FROM accounts WHERE id != ?1", params![keep_id])?;
        Ok(rows)
    }

    /// Flushes the WAL back into the database file so the single `.db` file
    /// is complete on disk. The connection itself is released on drop.
    fn close(&self) -> Result<()> {
        self.conn()
            .execute_batch("PRAGMA wal_checkpoint(TRUNCATE); PRAGMA optimize;")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::testutil::*;

    fn open_store(temp: &TempDir) -> SqliteStore {
        SqliteStore::open(temp.path().join("test.db")).unwrap()
    }

    #[test]
    fn test_account_crud() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let account = account("acct-1", "ana@example.com", Role::Admin, AccountStatus::Active);
        store.add_account(&account).unwrap();

        let fetched = store.get_account("acct-1").unwrap().unwrap();
        assert_eq!(fetched.email, "ana@example.com");
        assert_eq!(fetched.role, Role::Admin);

        let by_email = store.get_account_by_email("ana@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, "acct-1");

        let updated = store
            .update_account(
                "acct-1",
                &AccountPatch {
                    status: Some(AccountStatus::Suspended),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.status, AccountStatus::Suspended);
        assert_eq!(updated.email, "ana@example.com");

        assert!(store.delete_account("acct-1").unwrap());
        assert!(store.get_account("acct-1").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_id_is_already_exists() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let a = account("acct-1", "one@example.com", Role::User, AccountStatus::Inactive);
        store.add_account(&a).unwrap();

        let mut dup = a.clone();
        dup.email = "other@example.com".to_string();
        assert!(matches!(store.add_account(&dup), Err(Error::AlreadyExists)));
    }

    #[test]
    fn test_duplicate_email_is_conflict() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        store
            .add_account(&account("acct-1", "same@example.com", Role::User, AccountStatus::Inactive))
            .unwrap();
        let result = store.add_account(&account(
            "acct-2",
            "same@example.com",
            Role::User,
            AccountStatus::Inactive,
        ));
        assert!(matches!(result, Err(Error::Conflict(_))));
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let result = store.update_account("ghost", &AccountPatch::default());
        assert!(matches!(result, Err(Error::NotFound)));
    }

    #[test]
    fn test_first_publish_timestamp_is_preserved() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        seed_post_graph(&store);

        let draft = post("post-1", "First Post", PostStatus::Draft, None);
        store.add_post(&draft).unwrap();

        let published = store
            .update_post(
                "post-1",
                &PostPatch {
                    status: Some(PostStatus::Published),
                    ..Default::default()
                },
            )
            .unwrap();
        let first_published_at = published.published_at.unwrap();

        // Archive and re-publish; the original timestamp must survive.
        store
            .update_post(
                "post-1",
                &PostPatch {
                    status: Some(PostStatus::Archived),
                    ..Default::default()
                },
            )
            .unwrap();
        let republished = store
            .update_post(
                "post-1",
                &PostPatch {
                    status: Some(PostStatus::Published),
                    title: Some("First Post, edited".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(republished.published_at.unwrap(), first_published_at);
    }

    #[test]
    fn test_list_posts_newest_published_first() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        seed_post_graph(&store);

        let older = post(
            "post-old",
            "Older",
            PostStatus::Published,
            Some(Utc::now() - chrono::Duration::days(7)),
        );
        let newer = post("post-new", "Newer", PostStatus::Published, Some(Utc::now()));
        store.add_post(&older).unwrap();
        store.add_post(&newer).unwrap();

        let listed = store.list_posts().unwrap();
        assert_eq!(listed[0].id, "post-new");
        assert_eq!(listed[1].id, "post-old");
    }

    #[test]
    fn test_default_ai_config_swap_is_exclusive() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        seed_post_graph(&store);

        let a = ai_config("cfg-a", Provider::OpenAi, true);
        let b = ai_config("cfg-b", Provider::OpenAi, false);
        let other = ai_config("cfg-p", Provider::Perplexity, true);
        store.add_ai_config(&a).unwrap();
        store.add_ai_config(&b).unwrap();
        store.add_ai_config(&other).unwrap();

        store.set_default_ai_config("cfg-b").unwrap();

        let defaults: Vec<_> = store
            .list_ai_configs_by_provider(Provider::OpenAi)
            .unwrap()
            .into_iter()
            .filter(|c| c.is_default)
            .collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].id, "cfg-b");
        assert!(!store.get_ai_config("cfg-a").unwrap().unwrap().is_default);

        // The other provider's default is untouched.
        let pplx = store.get_default_ai_config(Provider::Perplexity).unwrap().unwrap();
        assert_eq!(pplx.id, "cfg-p");
    }

    #[test]
    fn test_adding_second_default_unsets_first() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        seed_post_graph(&store);

        store.add_ai_config(&ai_config("cfg-a", Provider::OpenAi, true)).unwrap();
        store.add_ai_config(&ai_config("cfg-b", Provider::OpenAi, true)).unwrap();

        let defaults: Vec<_> = store
            .list_ai_configs_by_provider(Provider::OpenAi)
            .unwrap()
            .into_iter()
            .filter(|c| c.is_default)
            .collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].id, "cfg-b");
        assert!(!store.get_ai_config("cfg-a").unwrap().unwrap().is_default);
    }

    #[test]
    fn test_update_patch_can_claim_default() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        seed_post_graph(&store);

        store.add_ai_config(&ai_config("cfg-a", Provider::OpenAi, true)).unwrap();
        store.add_ai_config(&ai_config("cfg-b", Provider::OpenAi, false)).unwrap();

        store
            .update_ai_config(
                "cfg-b",
                &AiConfigPatch {
                    is_default: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();

        let default = store.get_default_ai_config(Provider::OpenAi).unwrap().unwrap();
        assert_eq!(default.id, "cfg-b");
        assert!(!store.get_ai_config("cfg-a").unwrap().unwrap().is_default);
    }

    #[test]
    fn test_expired_session_reads_back_absent_and_is_purged() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        seed_post_graph(&store);

        let now = Utc::now();
        let stale = Session {
            token: "tok-stale".to_string(),
            account_id: "author".to_string(),
            created_at: now - chrono::Duration::days(8),
            expires_at: now - chrono::Duration::days(1),
        };
        store.add_session(&stale).unwrap();

        assert!(store.get_session("tok-stale").unwrap().is_none());

        // Purged, not merely filtered: the row is gone.
        let raw: i64 = store
            .connection()
            .query_row("SELECT COUNT(*) FROM sessions WHERE token = 'tok-stale'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(raw, 0);
    }

    #[test]
    fn test_bulk_add_reports_partial_failure() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        seed_post_graph(&store);

        let cat = |id: &str, slug: &str| {
            let mut c = category(id, "Dup");
            c.slug = slug.to_string();
            c
        };

        let result = store
            .bulk_add_categories(&[
                cat("cat-a", "slug-a"),
                cat("cat-b", "slug-a"), // unique slug collision
                cat("cat-c", "slug-c"),
            ])
            .unwrap();

        assert_eq!(result.inserted, 2);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].id, "cat-b");
        assert!(!result.all_ok());
    }

    #[test]
    fn test_close_checkpoints_wal_and_data_survives_reopen() {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("test.db");

        let store = SqliteStore::open(&db_path).unwrap();
        store
            .add_account(&account("acct-1", "keep@x.com", Role::User, AccountStatus::Active))
            .unwrap();
        store.close().unwrap();

        // After the checkpoint the write lives in the main database file,
        // not just the WAL sidecar.
        let wal_len = std::fs::metadata(temp.path().join("test.db-wal"))
            .map(|m| m.len())
            .unwrap_or(0);
        assert_eq!(wal_len, 0);
        drop(store);

        let reopened = SqliteStore::open(&db_path).unwrap();
        assert!(reopened.get_account("acct-1").unwrap().is_some());
    }

    #[test]
    fn test_prune_accounts_except() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        for (id, email) in [("a", "a@x.com"), ("b", "b@x.com"), ("c", "c@x.com")] {
            store
                .add_account(&account(id, email, Role::User, AccountStatus::Active))
                .unwrap();
        }

        let removed = store.prune_accounts_except("b").unwrap();
        assert_eq!(removed, 2);
        let remaining = store.list_accounts().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "b");
    }
}
