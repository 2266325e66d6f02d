// ⚙️ Configuration - bestcard.toml
//
// Example:
//   catalog_path = "data/cards.json"
//   database_path = "bestcard.db"
//   result_limit = 5
//
//   [server]
//   bind = "127.0.0.1:3000"
//
//   [synonyms]
//   hawker = ["dining", "food"]

use crate::ranking::RESULT_LIMIT;
use crate::search::SUGGESTION_LIMIT;
use crate::synonyms::SynonymTable;
use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable pointing at the config file
pub const CONFIG_ENV: &str = "BESTCARD_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "bestcard.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub catalog_path: PathBuf,
    pub database_path: PathBuf,
    pub result_limit: usize,
    pub suggestion_limit: usize,
    pub server: ServerConfig,

    /// Extra synonym entries; replace built-ins with the same term
    pub synonyms: IndexMap<String, Vec<String>>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            catalog_path: PathBuf::from("data/cards.json"),
            database_path: PathBuf::from("bestcard.db"),
            result_limit: RESULT_LIMIT,
            suggestion_limit: SUGGESTION_LIMIT,
            server: ServerConfig::default(),
            synonyms: IndexMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "0.0.0.0:3000".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from `$BESTCARD_CONFIG`, else `./bestcard.toml`, else defaults
    pub fn load() -> Result<Self> {
        let path = env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        if path.exists() {
            Self::from_file(&path)
        } else {
            tracing::info!(
                "No config file found at {}. Using AppConfig::default().",
                path.display()
            );
            Ok(Self::default())
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let mut cfg = Self::from_toml_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;

        // Relative paths are relative to the config file
        if let Some(root) = path.parent() {
            cfg.catalog_path = absolutize(root, &cfg.catalog_path);
            cfg.database_path = absolutize(root, &cfg.database_path);
        }
        Ok(cfg)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let cfg: AppConfig = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.result_limit == 0 {
            bail!("result_limit must be at least 1");
        }
        for (term, categories) in &self.synonyms {
            if categories.iter().all(|c| c.trim().is_empty()) {
                bail!("synonym '{}' must list at least one category", term);
            }
        }
        Ok(())
    }

    /// Built-in synonyms plus the configured extras
    pub fn synonym_table(&self) -> Result<SynonymTable> {
        let mut table = SynonymTable::builtin();
        for (term, categories) in &self.synonyms {
            table
                .insert(term, categories.iter().cloned())
                .with_context(|| format!("invalid synonym entry '{}'", term))?;
        }
        Ok(table)
    }
}

fn absolutize(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() || root.as_os_str().is_empty() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
