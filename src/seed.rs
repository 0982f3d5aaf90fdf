//! Bootstrap seeding: guarantees the store is usable after every start.
//!
//! Every step is idempotent (create-if-absent) and best-effort: a failing
//! step is logged and the rest still run, so a broken seed never stops the
//! application from coming up.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::PasswordHasher;
use crate::config::{AdminDefaults, AppConfig};
use crate::error::{Error, Result};
use crate::slug::slugify;
use crate::store::Store;
use crate::templates;
use crate::types::*;

const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("Tecnologia", "Novidades e análises do mundo da tecnologia"),
    ("Inteligência Artificial", "Aplicações práticas de IA nos negócios"),
    ("Automação", "Processos automatizados do atendimento ao backoffice"),
];

/// Runs every bootstrap step. Safe to call on every start.
pub fn run(store: &dyn Store, hasher: &PasswordHasher, config: &AppConfig) {
    let admin = match ensure_admin(store, hasher, &config.admin) {
        Ok(admin) => Some(admin),
        Err(e) => {
            warn!("admin bootstrap failed: {e}");
            // A previous run may still have left one behind.
            store.get_account_by_email(&config.admin.email).ok().flatten()
        }
    };

    let categories = match ensure_categories(store, admin.as_ref()) {
        Ok(categories) => categories,
        Err(e) => {
            warn!("category bootstrap failed: {e}");
            Vec::new()
        }
    };

    if let Err(e) = ensure_posts(store, admin.as_ref(), &categories) {
        warn!("post bootstrap failed: {e}");
    }

    if let Err(e) = ensure_ai_configs(store, admin.as_ref(), config) {
        warn!("ai config bootstrap failed: {e}");
    }
}

/// Guarantees an active administrator under the reserved email.
///
/// Recovery path: if the reserved email is absent but some admin account
/// exists, that account is rewritten to the reserved identity (email, name
/// and password included). Destructive on purpose, and loud about it.
fn ensure_admin(
    store: &dyn Store,
    hasher: &PasswordHasher,
    defaults: &AdminDefaults,
) -> Result<Account> {
    if let Some(existing) = store.get_account_by_email(&defaults.email)? {
        if existing.role == Role::Admin && existing.status == AccountStatus::Active {
            return Ok(existing);
        }
        info!("correcting role/status on reserved admin account");
        return store.update_account(
            &existing.id,
            &AccountPatch {
                role: Some(Role::Admin),
                status: Some(AccountStatus::Active),
                ..Default::default()
            },
        );
    }

    if let Some(other_admin) = store.find_admin_account()? {
        warn!(
            account_id = %other_admin.id,
            "rewriting existing admin account to the reserved identity"
        );
        return store.update_account(
            &other_admin.id,
            &AccountPatch {
                email: Some(defaults.email.clone()),
                name: Some(defaults.name.clone()),
                password_hash: Some(hasher.hash(&defaults.password)?),
                role: Some(Role::Admin),
                status: Some(AccountStatus::Active),
            },
        );
    }

    let now = Utc::now();
    let admin = Account {
        id: Uuid::new_v4().to_string(),
        email: defaults.email.clone(),
        name: defaults.name.clone(),
        role: Role::Admin,
        status: AccountStatus::Active,
        password_hash: hasher.hash(&defaults.password)?,
        created_at: now,
        updated_at: now,
    };
    store.add_account(&admin)?;
    info!(email = %admin.email, "created default administrator");
    Ok(admin)
}

fn ensure_categories(store: &dyn Store, admin: Option<&Account>) -> Result<Vec<Category>> {
    if store.count_categories()? > 0 {
        return store.list_categories();
    }

    let admin = admin.ok_or_else(|| {
        Error::Validation("no admin account to attribute default categories to".to_string())
    })?;

    let now = Utc::now();
    let defaults: Vec<Category> = DEFAULT_CATEGORIES
        .iter()
        .map(|(name, description)| Category {
            id: Uuid::new_v4().to_string(),
            name: (*name).to_string(),
            slug: slugify(name),
            description: Some((*description).to_string()),
            created_by: admin.id.clone(),
            created_at: now,
            updated_at: now,
        })
        .collect();

    let result = store.bulk_add_categories(&defaults)?;
    for failure in &result.failed {
        warn!(id = %failure.id, "default category not created: {}", failure.error);
    }
    info!(count = result.inserted, "seeded default categories");

    store.list_categories()
}

fn ensure_posts(store: &dyn Store, admin: Option<&Account>, categories: &[Category]) -> Result<()> {
    if store.count_posts()? > 0 {
        return Ok(());
    }
    let (Some(admin), Some(category)) = (admin, categories.first()) else {
        // Nothing to hang the examples off of; not an error on a cold start.
        return Ok(());
    };

    let now = Utc::now();
    let examples = [
        example_post(
            admin,
            category,
            "Como a IA está transformando pequenas empresas",
            "Casos reais de automação com inteligência artificial e o que eles \
             ensinam sobre produtividade.",
            &["inteligência artificial", "negócios", "produtividade"],
            now,
        ),
        example_post(
            admin,
            category,
            "5 processos que você pode automatizar hoje",
            "Do atendimento ao financeiro: cinco automações de baixo esforço \
             com retorno imediato.",
            &["automação", "processos", "eficiência"],
            now - Duration::days(7),
        ),
    ];

    // Newest published first, so a newest-first listing starts correct.
    let result = store.bulk_add_posts(&examples)?;
    for failure in &result.failed {
        warn!(id = %failure.id, "example post not created: {}", failure.error);
    }
    info!(count = result.inserted, "seeded example posts");
    Ok(())
}

fn example_post(
    admin: &Account,
    category: &Category,
    title: &str,
    excerpt: &str,
    tags: &[&str],
    published_at: chrono::DateTime<Utc>,
) -> Post {
    Post {
        id: Uuid::new_v4().to_string(),
        title: title.to_string(),
        slug: slugify(title),
        content: format!("## {title}\n\n{excerpt}\n\nConteúdo completo em breve."),
        excerpt: excerpt.to_string(),
        featured_image: Some(placeholder_image()),
        status: PostStatus::Published,
        category_id: category.id.clone(),
        author_id: admin.id.clone(),
        tags: tags.iter().map(|t| (*t).to_string()).collect(),
        seo_title: Some(title.to_string()),
        seo_description: Some(excerpt.to_string()),
        seo_keywords: tags.iter().map(|t| (*t).to_string()).collect(),
        scheduled_for: None,
        published_at: Some(published_at),
        created_at: published_at,
        updated_at: published_at,
    }
}

/// Inline data-URL placeholder, same transport the backup format uses for
/// real featured images.
fn placeholder_image() -> String {
    let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="1200" height="630"><rect width="1200" height="630" fill="#0f172a"/><text x="600" y="330" font-size="48" fill="#e2e8f0" text-anchor="middle" font-family="sans-serif">pressbase</text></svg>"##;
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg))
}

fn ensure_ai_configs(store: &dyn Store, admin: Option<&Account>, config: &AppConfig) -> Result<()> {
    if store.count_ai_configs()? > 0 {
        return Ok(());
    }

    let created_by = admin.map_or_else(|| "system".to_string(), |a| a.id.clone());
    let mut seeded = 0usize;

    if let Some(key) = &config.openai_api_key {
        store.add_ai_config(&default_text_config(Provider::OpenAi, "OpenAI", key, &created_by))?;
        store.add_ai_config(&default_image_config(key, &created_by))?;
        seeded += 2;
    }
    if let Some(key) = &config.perplexity_api_key {
        store.add_ai_config(&default_text_config(
            Provider::Perplexity,
            "Perplexity",
            key,
            &created_by,
        ))?;
        seeded += 1;
    }

    if seeded > 0 {
        info!(count = seeded, "seeded default ai configs from environment keys");
    }
    Ok(())
}

fn default_text_config(provider: Provider, name: &str, api_key: &str, created_by: &str) -> AiConfig {
    let now = Utc::now();
    let tunables = templates::default_tunables(provider);
    let reasoning = templates::is_reasoning_model(tunables.model);
    AiConfig {
        id: Uuid::new_v4().to_string(),
        provider,
        name: name.to_string(),
        api_key: api_key.to_string(),
        model: tunables.model.to_string(),
        temperature: tunables.temperature,
        max_tokens: tunables.max_tokens,
        top_p: tunables.top_p,
        verbosity: reasoning.then(|| "medium".to_string()),
        reasoning_effort: reasoning.then(|| "medium".to_string()),
        image_size: None,
        image_quality: None,
        content_template: templates::current_article_template(provider).to_string(),
        image_template: None,
        enabled: true,
        is_default: true,
        created_by: created_by.to_string(),
        created_at: now,
        updated_at: now,
    }
}

/// Image generation reuses the OpenAI key family.
fn default_image_config(api_key: &str, created_by: &str) -> AiConfig {
    let now = Utc::now();
    let tunables = templates::default_tunables(Provider::Image);
    AiConfig {
        id: Uuid::new_v4().to_string(),
        provider: Provider::Image,
        name: "Geração de imagens".to_string(),
        api_key: api_key.to_string(),
        model: tunables.model.to_string(),
        temperature: tunables.temperature,
        max_tokens: tunables.max_tokens,
        top_p: tunables.top_p,
        verbosity: None,
        reasoning_effort: None,
        image_size: Some(templates::DEFAULT_IMAGE_SIZE.to_string()),
        image_quality: Some(templates::DEFAULT_IMAGE_QUALITY.to_string()),
        content_template: templates::current_article_template(Provider::OpenAi).to_string(),
        image_template: Some(templates::template(templates::TemplateKey::ImagePromptV1).to_string()),
        enabled: true,
        is_default: true,
        created_by: created_by.to_string(),
        created_at: now,
        updated_at: now,
    }
}
