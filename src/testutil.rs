//! Fixtures shared by the unit tests.

use chrono::{DateTime, Utc};

use crate::slug::slugify;
use crate::store::Store;
use crate::templates;
use crate::types::*;

pub fn account(id: &str, email: &str, role: Role, status: AccountStatus) -> Account {
    let now = Utc::now();
    Account {
        id: id.to_string(),
        email: email.to_string(),
        name: "Test Account".to_string(),
        role,
        status,
        password_hash: "$argon2id$fixture".to_string(),
        created_at: now,
        updated_at: now,
    }
}

pub fn category(id: &str, name: &str) -> Category {
    let now = Utc::now();
    Category {
        id: id.to_string(),
        name: name.to_string(),
        slug: slugify(name),
        description: None,
        created_by: "author".to_string(),
        created_at: now,
        updated_at: now,
    }
}

pub fn post(
    id: &str,
    title: &str,
    status: PostStatus,
    published_at: Option<DateTime<Utc>>,
) -> Post {
    let now = Utc::now();
    Post {
        id: id.to_string(),
        title: title.to_string(),
        slug: slugify(title),
        content: format!("Body of {title}."),
        excerpt: format!("Excerpt of {title}."),
        featured_image: None,
        status,
        category_id: "cat-1".to_string(),
        author_id: "author".to_string(),
        tags: vec!["test".to_string()],
        seo_title: None,
        seo_description: None,
        seo_keywords: Vec::new(),
        scheduled_for: None,
        published_at,
        created_at: now,
        updated_at: now,
    }
}

pub fn comment(id: &str, post_id: &str, status: CommentStatus) -> Comment {
    let now = Utc::now();
    Comment {
        id: id.to_string(),
        post_id: post_id.to_string(),
        author_id: None,
        parent_id: None,
        content: "Nice article!".to_string(),
        author_name: "Visitor".to_string(),
        author_email: "visitor@example.com".to_string(),
        status,
        ip_address: None,
        user_agent: None,
        approved_at: None,
        approved_by: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn ai_config(id: &str, provider: Provider, is_default: bool) -> AiConfig {
    let now = Utc::now();
    let tunables = templates::default_tunables(provider);
    AiConfig {
        id: id.to_string(),
        provider,
        name: format!("{provider} config"),
        api_key: "sk-test".to_string(),
        model: tunables.model.to_string(),
        temperature: tunables.temperature,
        max_tokens: tunables.max_tokens,
        top_p: tunables.top_p,
        verbosity: None,
        reasoning_effort: None,
        image_size: None,
        image_quality: None,
        content_template: templates::current_article_template(provider).to_string(),
        image_template: None,
        enabled: true,
        is_default,
        created_by: "author".to_string(),
        created_at: now,
        updated_at: now,
    }
}

/// Author account plus one category, the minimum graph posts hang off of.
pub fn seed_post_graph(store: &dyn Store) {
    store
        .add_account(&account("author", "author@example.com", Role::Admin, AccountStatus::Active))
        .unwrap();
    store.add_category(&category("cat-1", "Tecnologia")).unwrap();
}
