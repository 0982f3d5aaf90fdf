use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Reserved administrator identity the seeder guarantees exists.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdminDefaults {
    pub email: String,
    pub name: String,
    pub password: String,
}

impl Default for AdminDefaults {
    fn default() -> Self {
        Self {
            email: "admin@agencia.ai".to_string(),
            name: "Administrador".to_string(),
            password: "admin123!".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub admin: AdminDefaults,
    /// Optional provider keys; their presence gates AI-config seeding.
    pub openai_api_key: Option<String>,
    pub perplexity_api_key: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            admin: AdminDefaults::default(),
            openai_api_key: None,
            perplexity_api_key: None,
        }
    }
}

impl AppConfig {
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("pressbase.db")
    }

    /// Loads a TOML config file, then lets the environment override it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| Error::Config(format!("bad config file: {e}")))?;
        Ok(config.with_env_overrides())
    }

    /// Defaults plus environment overrides; used when no config file exists.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var("PRESSBASE_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Ok(email) = std::env::var("PRESSBASE_ADMIN_EMAIL") {
            self.admin.email = email;
        }
        if let Ok(name) = std::env::var("PRESSBASE_ADMIN_NAME") {
            self.admin.name = name;
        }
        if let Ok(password) = std::env::var("PRESSBASE_ADMIN_PASSWORD") {
            self.admin.password = password;
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                self.openai_api_key = Some(key);
            }
        }
        if let Ok(key) = std::env::var("PERPLEXITY_API_KEY") {
            if !key.is_empty() {
                self.perplexity_api_key = Some(key);
            }
        }
        self
    }
}
