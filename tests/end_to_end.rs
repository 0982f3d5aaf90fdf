//! End-to-end flows through the public library API: seed, publish, moderate,
//! configure providers, back up and restore.

use chrono::{Duration, Utc};
use tempfile::TempDir;
use uuid::Uuid;

use pressbase::auth::{self, NewAccount, PasswordHasher};
use pressbase::backup;
use pressbase::config::AppConfig;
use pressbase::seed;
use pressbase::store::{SqliteStore, Store};
use pressbase::templates;
use pressbase::types::*;

fn seeded_store(temp: &TempDir) -> (SqliteStore, AppConfig) {
    let config = AppConfig::default();
    let store = SqliteStore::open(temp.path().join("e2e.db")).expect("open store");
    seed::run(&store, &PasswordHasher::new(), &config);
    (store, config)
}

fn admin_of(store: &dyn Store, config: &AppConfig) -> Account {
    store
        .get_account_by_email(&config.admin.email)
        .unwrap()
        .expect("seeded admin")
}

fn draft_post(id: &str, title: &str, category_id: &str, author_id: &str) -> Post {
    let now = Utc::now();
    Post {
        id: id.to_string(),
        title: title.to_string(),
        slug: pressbase::slug::slugify(title),
        content: format!("# {title}"),
        excerpt: "excerpt".to_string(),
        featured_image: None,
        status: PostStatus::Draft,
        category_id: category_id.to_string(),
        author_id: author_id.to_string(),
        tags: vec!["tag".to_string()],
        seo_title: None,
        seo_description: None,
        seo_keywords: Vec::new(),
        scheduled_for: None,
        published_at: None,
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn test_author_registration_to_published_post() {
    let temp = TempDir::new().unwrap();
    let (store, _config) = seeded_store(&temp);
    let hasher = PasswordHasher::new();

    // Self-service registration lands inactive; login is refused.
    let author = auth::register(
        &store,
        &hasher,
        &NewAccount {
            email: "writer@site.com".to_string(),
            name: "Writer".to_string(),
            password: "long-enough-pass".to_string(),
        },
    )
    .unwrap();
    assert!(auth::login(&store, &hasher, "writer@site.com", "long-enough-pass").is_err());

    // An admin activates the account; login now works.
    store
        .update_account(
            &author.id,
            &AccountPatch {
                status: Some(AccountStatus::Active),
                ..Default::default()
            },
        )
        .unwrap();
    let session = auth::login(&store, &hasher, "writer@site.com", "long-enough-pass").unwrap();
    let me = auth::current_account(&store, &session.token).unwrap().unwrap();
    assert_eq!(me.id, author.id);

    // Draft, then publish. The publish timestamp is stamped once.
    let category = &store.list_categories().unwrap()[0];
    store
        .add_post(&draft_post("post-e2e", "Meu primeiro post", &category.id, &author.id))
        .unwrap();

    let published = store
        .update_post(
            "post-e2e",
            &PostPatch {
                status: Some(PostStatus::Published),
                ..Default::default()
            },
        )
        .unwrap();
    let first_published_at = published.published_at.expect("stamped on publish");

    let republished = store
        .update_post(
            "post-e2e",
            &PostPatch {
                status: Some(PostStatus::Archived),
                ..Default::default()
            },
        )
        .and_then(|_| {
            store.update_post(
                "post-e2e",
                &PostPatch {
                    status: Some(PostStatus::Published),
                    ..Default::default()
                },
            )
        })
        .unwrap();
    assert_eq!(republished.published_at, Some(first_published_at));

    // The new post joins the seeded ones, newest first.
    let posts = store.list_posts_by_status(PostStatus::Published).unwrap();
    assert_eq!(posts.len(), 3);
    assert_eq!(posts[0].id, "post-e2e");
}

#[test]
fn test_comment_moderation_flow() {
    let temp = TempDir::new().unwrap();
    let (store, config) = seeded_store(&temp);
    let admin = admin_of(&store, &config);
    let post = &store.list_posts().unwrap()[0];

    let now = Utc::now();
    let comment = Comment {
        id: Uuid::new_v4().to_string(),
        post_id: post.id.clone(),
        author_id: None,
        parent_id: None,
        content: "Ótimo artigo!".to_string(),
        author_name: "Visitante".to_string(),
        author_email: "visitor@mail.com".to_string(),
        status: CommentStatus::Pending,
        ip_address: Some("203.0.113.9".to_string()),
        user_agent: None,
        approved_at: None,
        approved_by: None,
        created_at: now,
        updated_at: now,
    };
    store.add_comment(&comment).unwrap();

    // Pending comments stay out of the public view.
    let visible = store
        .list_comments_for_post(&post.id, Some(CommentStatus::Approved))
        .unwrap();
    assert!(visible.is_empty());

    let approved = store
        .update_comment(
            &comment.id,
            &CommentPatch {
                status: Some(CommentStatus::Approved),
                approved_by: Some(admin.id.clone()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(approved.approved_by.as_deref(), Some(admin.id.as_str()));
    assert!(approved.approved_at.is_some());

    let visible = store
        .list_comments_for_post(&post.id, Some(CommentStatus::Approved))
        .unwrap();
    assert_eq!(visible.len(), 1);
}

#[test]
fn test_provider_default_swap() {
    let temp = TempDir::new().unwrap();
    let (store, config) = seeded_store(&temp);
    let admin = admin_of(&store, &config);

    let now = Utc::now();
    let make = |id: &str, is_default: bool| AiConfig {
        id: id.to_string(),
        provider: Provider::OpenAi,
        name: id.to_string(),
        api_key: "sk-test".to_string(),
        model: "gpt-5-mini".to_string(),
        temperature: 0.7,
        max_tokens: 4096,
        top_p: 1.0,
        verbosity: Some("medium".to_string()),
        reasoning_effort: Some("medium".to_string()),
        image_size: None,
        image_quality: None,
        content_template: templates::current_article_template(Provider::OpenAi).to_string(),
        image_template: None,
        enabled: true,
        is_default,
        created_by: admin.id.clone(),
        created_at: now,
        updated_at: now,
    };

    store.add_ai_config(&make("cfg-a", true)).unwrap();
    store.add_ai_config(&make("cfg-b", false)).unwrap();

    store.set_default_ai_config("cfg-b").unwrap();

    let default = store.get_default_ai_config(Provider::OpenAi).unwrap().unwrap();
    assert_eq!(default.id, "cfg-b");
    // Exactly one default per provider, always.
    let defaults: Vec<_> = store
        .list_ai_configs_by_provider(Provider::OpenAi)
        .unwrap()
        .into_iter()
        .filter(|c| c.is_default)
        .collect();
    assert_eq!(defaults.len(), 1);
}

#[test]
fn test_backup_restore_preserves_logins() {
    let temp = TempDir::new().unwrap();
    let (store, config) = seeded_store(&temp);
    let hasher = PasswordHasher::new();
    let admin = admin_of(&store, &config);

    let snapshot = backup::create(&store).unwrap();
    let json = backup::to_json(&snapshot).unwrap();

    // Content drifts after the snapshot.
    let category = &store.list_categories().unwrap()[0];
    store
        .add_post(&draft_post("drift", "Post efêmero", &category.id, &admin.id))
        .unwrap();

    let parsed = backup::from_json(&json).unwrap();
    let summary = backup::restore(&store, &parsed, &admin.id).unwrap();
    assert!(summary.all_ok());

    assert!(store.get_post("drift").unwrap().is_none());
    assert_eq!(store.count_posts().unwrap(), 2);

    // The restored password hash still verifies the seeded password.
    let session = auth::login(&store, &hasher, &config.admin.email, &config.admin.password).unwrap();
    assert!(auth::current_account(&store, &session.token).unwrap().is_some());
}

#[test]
fn test_expired_sessions_are_purged() {
    let temp = TempDir::new().unwrap();
    let (store, config) = seeded_store(&temp);
    let admin = admin_of(&store, &config);

    let now = Utc::now();
    let expired = Session {
        token: auth::generate_token(),
        account_id: admin.id.clone(),
        created_at: now - Duration::days(10),
        expires_at: now - Duration::days(3),
    };
    store.add_session(&expired).unwrap();
    let live = auth::issue_session(&store, &admin.id).unwrap();

    assert!(store.get_session(&expired.token).unwrap().is_none());
    assert_eq!(store.purge_expired_sessions(now).unwrap(), 0);
    assert!(store.get_session(&live.token).unwrap().is_some());
}
