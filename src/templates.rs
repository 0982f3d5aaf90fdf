//! Versioned prompt-template assets and placeholder substitution.
//!
//! Schema migrations reference templates by key instead of capturing the text
//! inline, so "what the default text is" lives here and "when it changed"
//! lives in the schema registry.
//!
//! Text templates recognize `{theme}`, `{category}`, `{tone}`, `{length}` and
//! `{language}`; image templates recognize `{title}`, `{excerpt}`,
//! `{category}` and `{content}`. Substitution is literal; a placeholder with
//! no binding renders as the empty string.

use crate::types::Provider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKey {
    OpenAiArticleV1,
    OpenAiArticleV2,
    PerplexityArticleV1,
    PerplexityArticleV2,
    ImagePromptV1,
}

const OPENAI_ARTICLE_V1: &str = "\
Write a blog article about {theme} for the {category} section.
Tone: {tone}. Length: {length}. Language: {language}.
Return the article as markdown.";

const OPENAI_ARTICLE_V2: &str = "\
Write a complete blog article about {theme} for the {category} section.
Tone: {tone}. Target length: {length}. Language: {language}.

Respond with a JSON object containing the keys \"title\", \"excerpt\",
\"content\" (markdown body), \"seo_title\", \"seo_description\" and
\"tags\" (array of strings). Do not wrap the JSON in a code fence.";

const PERPLEXITY_ARTICLE_V1: &str = "\
Research and write a blog article about {theme} for the {category} section.
Tone: {tone}. Length: {length}. Language: {language}.
Cite current sources inline and return markdown.";

const PERPLEXITY_ARTICLE_V2: &str = "\
Research current sources and write a blog article about {theme} for the
{category} section. Tone: {tone}. Target length: {length}.
Language: {language}.

Respond with a JSON object containing the keys \"title\", \"excerpt\",
\"content\" (markdown body with inline citations), \"seo_title\",
\"seo_description\" and \"tags\" (array of strings). Do not wrap the JSON
in a code fence.";

const IMAGE_PROMPT_V1: &str = "\
Editorial illustration for a blog post titled \"{title}\" in the {category}
section. Summary: {excerpt}. Clean, modern, no embedded text.";

#[must_use]
pub fn template(key: TemplateKey) -> &'static str {
    match key {
        TemplateKey::OpenAiArticleV1 => OPENAI_ARTICLE_V1,
        TemplateKey::OpenAiArticleV2 => OPENAI_ARTICLE_V2,
        TemplateKey::PerplexityArticleV1 => PERPLEXITY_ARTICLE_V1,
        TemplateKey::PerplexityArticleV2 => PERPLEXITY_ARTICLE_V2,
        TemplateKey::ImagePromptV1 => IMAGE_PROMPT_V1,
    }
}

/// Current default article template for a text provider.
#[must_use]
pub fn current_article_template(provider: Provider) -> &'static str {
    match provider {
        Provider::OpenAi | Provider::Image => template(TemplateKey::OpenAiArticleV2),
        Provider::Perplexity => template(TemplateKey::PerplexityArticleV2),
    }
}

/// The template a pre-upgrade row would still carry, used by the migration
/// transform to tell "stale default" apart from "operator-edited".
#[must_use]
pub fn previous_article_template(provider: Provider) -> &'static str {
    match provider {
        Provider::OpenAi | Provider::Image => template(TemplateKey::OpenAiArticleV1),
        Provider::Perplexity => template(TemplateKey::PerplexityArticleV1),
    }
}

/// Default sampling tunables for a freshly seeded provider config.
#[derive(Debug, Clone, Copy)]
pub struct DefaultTunables {
    pub model: &'static str,
    pub temperature: f64,
    pub max_tokens: i64,
    pub top_p: f64,
}

#[must_use]
pub fn default_tunables(provider: Provider) -> DefaultTunables {
    match provider {
        Provider::OpenAi => DefaultTunables {
            model: "gpt-5-mini",
            temperature: 0.7,
            max_tokens: 4096,
            top_p: 1.0,
        },
        Provider::Perplexity => DefaultTunables {
            model: "sonar",
            temperature: 0.6,
            max_tokens: 4096,
            top_p: 0.9,
        },
        Provider::Image => DefaultTunables {
            model: "gpt-image-1",
            temperature: 1.0,
            max_tokens: 0,
            top_p: 1.0,
        },
    }
}

pub const DEFAULT_IMAGE_SIZE: &str = "1024x1024";
pub const DEFAULT_IMAGE_QUALITY: &str = "high";

/// Matches the models that accept `verbosity`/`reasoning_effort`.
#[must_use]
pub fn is_reasoning_model(model: &str) -> bool {
    model.starts_with("gpt-5") || matches!(model, "o1" | "o1-preview" | "o1-mini")
}

/// Renders `{placeholder}` variables by literal replacement. Unknown or
/// unbound placeholders render as empty; braces without a well-formed
/// identifier pass through untouched.
#[must_use]
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        match after.find('}') {
            Some(close) if after[..close].chars().all(|c| c.is_ascii_alphanumeric() || c == '_') => {
                let name = &after[..close];
                if let Some((_, value)) = vars.iter().find(|(k, _)| *k == name) {
                    out.push_str(value);
                }
                rest = &after[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
