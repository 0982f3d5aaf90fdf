//! Migration engine: replays pending schema versions in ascending order, one
//! upgrade transaction per version. A failed step rolls back, leaves the
//! store at the last fully applied version, and surfaces the failure; the
//! caller must not keep going with a half-migrated store.

use rusqlite::Connection;

use super::schema::{SchemaVersion, VERSIONS};
use crate::error::{Error, Result};

pub fn current_version(conn: &Connection) -> Result<i64> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(version)
}

/// Brings the store to the latest declared schema version.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    apply_versions(conn, VERSIONS)
}

/// Stops at `target` instead of the latest version. Used to stage stores at
/// historical versions.
pub fn migrate_to(conn: &mut Connection, target: i64) -> Result<()> {
    let upto: Vec<_> = VERSIONS.iter().filter(|v| v.version <= target).collect();
    apply_versions_ref(conn, &upto)
}

fn apply_versions(conn: &mut Connection, versions: &[SchemaVersion]) -> Result<()> {
    let refs: Vec<_> = versions.iter().collect();
    apply_versions_ref(conn, &refs)
}

fn apply_versions_ref(conn: &mut Connection, versions: &[&SchemaVersion]) -> Result<()> {
    let current = current_version(conn)?;

    for step in versions.iter().filter(|v| v.version > current) {
        let tx = conn.transaction()?;

        tx.execute_batch(step.ddl).map_err(|e| Error::Migration {
            version: step.version,
            message: format!("schema layout: {e}"),
        })?;

        if let Some(transform) = step.transform {
            transform(&tx).map_err(|e| Error::Migration {
                version: step.version,
                message: format!("data transform: {e}"),
            })?;
        }

        tx.pragma_update(None, "user_version", step.version)?;
        tx.commit()?;

        tracing::info!(version = step.version, "applied schema version");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::params;
    use tempfile::TempDir;

    use super::*;
    use crate::store::schema::LATEST_VERSION;
    use crate::templates;
    use crate::types::Provider;

    fn open(temp: &TempDir) -> Connection {
        Connection::open(temp.path().join("test.db")).unwrap()
    }

    fn insert_config(conn: &Connection, id: &str, provider: &str, model: &str, template: &str) {
        conn.execute(
            "INSERT INTO ai_configs (id, provider, name, api_key, model, content_template,
                                     created_by, created_at, updated_at)
             VALUES (?1, ?2, ?2, 'k', ?3, ?4, 'acct', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
            params![id, provider, model, template],
        )
        .unwrap();
    }

    #[test]
    fn test_fresh_store_reaches_latest() {
        let temp = TempDir::new().unwrap();
        let mut conn = open(&temp);

        migrate(&mut conn).unwrap();
        assert_eq!(current_version(&conn).unwrap(), LATEST_VERSION);

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        for table in ["accounts", "categories", "posts", "comments", "ai_configs", "sessions"] {
            assert!(tables.contains(&table.to_string()), "missing {table}");
        }
    }

    #[test]
    fn test_migrate_twice_is_noop() {
        let temp = TempDir::new().unwrap();
        let mut conn = open(&temp);

        migrate(&mut conn).unwrap();

        // Stage a row between the runs so the second run has data to chew on.
        conn.execute(
            "INSERT INTO accounts (id, email, name, role, status, password_hash, created_at, updated_at)
             VALUES ('acct', 'a@b.c', 'a', 'admin', 'active', 'h', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
            [],
        )
        .unwrap();
        insert_config(
            &conn,
            "cfg",
            "openai",
            "gpt-5-mini",
            templates::current_article_template(Provider::OpenAi),
        );

        migrate(&mut conn).unwrap();
        assert_eq!(current_version(&conn).unwrap(), LATEST_VERSION);

        let template: String = conn
            .query_row("SELECT content_template FROM ai_configs WHERE id = 'cfg'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(template, templates::current_article_template(Provider::OpenAi));
    }

    #[test]
    fn test_v3_refreshes_stale_defaults_only() {
        let temp = TempDir::new().unwrap();
        let mut conn = open(&temp);

        migrate_to(&mut conn, 2).unwrap();
        assert_eq!(current_version(&conn).unwrap(), 2);

        conn.execute(
            "INSERT INTO accounts (id, email, name, role, status, password_hash, created_at, updated_at)
             VALUES ('acct', 'a@b.c', 'a', 'admin', 'active', 'h', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
            [],
        )
        .unwrap();

        insert_config(
            &conn,
            "stale",
            "openai",
            "gpt-4o",
            templates::previous_article_template(Provider::OpenAi),
        );
        insert_config(&conn, "edited", "openai", "gpt-4o", "my own prompt");
        insert_config(
            &conn,
            "stale-pplx",
            "perplexity",
            "sonar",
            templates::previous_article_template(Provider::Perplexity),
        );

        migrate(&mut conn).unwrap();

        let get = |id: &str| -> String {
            conn.query_row(
                "SELECT content_template FROM ai_configs WHERE id = ?1",
                params![id],
                |r| r.get(0),
            )
            .unwrap()
        };
        assert_eq!(get("stale"), templates::current_article_template(Provider::OpenAi));
        assert_eq!(get("edited"), "my own prompt");
        assert_eq!(
            get("stale-pplx"),
            templates::current_article_template(Provider::Perplexity)
        );
    }

    #[test]
    fn test_v3_backfills_reasoning_fields_by_model() {
        let temp = TempDir::new().unwrap();
        let mut conn = open(&temp);

        migrate_to(&mut conn, 2).unwrap();
        conn.execute(
            "INSERT INTO accounts (id, email, name, role, status, password_hash, created_at, updated_at)
             VALUES ('acct', 'a@b.c', 'a', 'admin', 'active', 'h', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
            [],
        )
        .unwrap();

        insert_config(&conn, "reasoning", "openai", "gpt-5-mini", "p");
        insert_config(&conn, "o1", "openai", "o1-preview", "p");
        insert_config(&conn, "plain", "openai", "gpt-4o", "p");

        migrate(&mut conn).unwrap();

        let fields = |id: &str| -> (Option<String>, Option<String>) {
            conn.query_row(
                "SELECT verbosity, reasoning_effort FROM ai_configs WHERE id = ?1",
                params![id],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap()
        };
        assert_eq!(fields("reasoning"), (Some("medium".into()), Some("medium".into())));
        assert_eq!(fields("o1"), (Some("medium".into()), Some("medium".into())));
        assert_eq!(fields("plain"), (None, None));
    }

    #[test]
    fn test_failed_transform_leaves_last_good_version() {
        fn broken(_tx: &rusqlite::Transaction<'_>) -> crate::error::Result<()> {
            Err(crate::error::Error::Config("boom".to_string()))
        }

        let temp = TempDir::new().unwrap();
        let mut conn = open(&temp);
        migrate_to(&mut conn, 1).unwrap();

        let broken_step = SchemaVersion {
            version: 2,
            ddl: "CREATE TABLE IF NOT EXISTS scratch (id TEXT PRIMARY KEY);",
            transform: Some(broken),
        };

        let err = apply_versions_ref(&mut conn, &[&broken_step]).unwrap_err();
        assert!(matches!(err, Error::Migration { version: 2, .. }));
        assert_eq!(current_version(&conn).unwrap(), 1);

        // The step's DDL must not have leaked out of the rolled-back transaction.
        let scratch: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='scratch'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(scratch, 0);
    }
}
