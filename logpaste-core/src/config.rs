use crate::ai_provider::gemini::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use crate::ai_provider::API_KEY_PLACEHOLDER;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Environment variable naming the TOML configuration file.
pub const CONFIG_PATH_ENV: &str = "LOGPASTE_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub urls: UrlConfig,
    pub ai: AiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_url: String,
    /// Seconds a log is kept after its last access.
    pub storage_time: u64,
    /// Characters kept from a submission.
    pub max_length: usize,
    /// Lines kept from a submission.
    pub max_lines: usize,
    pub purge_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlConfig {
    pub base_url: String,
    pub api_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub gemini_api_key: String,
    pub model: String,
    pub endpoint: String,
    /// What kind of log the analyzer is told it is reading.
    pub log_subject: String,
    pub response_language: String,
}

/// Limits reported by `GET /1/limits`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageLimits {
    pub storage_time: u64,
    pub max_length: usize,
    pub max_lines: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_upload_size: 50 * 1024 * 1024, // 50MB
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://data/logpaste.db".to_string(),
            storage_time: 90 * 24 * 60 * 60, // 90 days
            max_length: 10 * 1024 * 1024,
            max_lines: 25_000,
            purge_interval_secs: 600,
        }
    }
}

impl Default for UrlConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            api_base_url: "http://localhost:3000".to_string(),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: API_KEY_PLACEHOLDER.to_string(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            log_subject: "Minecraft server".to_string(),
            response_language: "simplified Chinese".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn storage_duration(&self) -> Duration {
        Duration::from_secs(self.storage_time)
    }

    pub fn limits(&self) -> StorageLimits {
        StorageLimits {
            storage_time: self.storage_time,
            max_length: self.max_length,
            max_lines: self.max_lines,
        }
    }
}

impl AppConfig {
    /// Loads configuration.
    ///
    /// Priority: environment variables > TOML file > defaults. The file is
    /// `path` when given, otherwise `$LOGPASTE_CONFIG` if set.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path: Option<PathBuf> = path
            .map(Path::to_path_buf)
            .or_else(|| env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from));

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Applies `LOGPASTE_*` / `GEMINI_API_KEY` style overrides from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("LOGPASTE_HOST") {
            self.server.host = host;
        }
        override_parsed(&lookup, "LOGPASTE_PORT", &mut self.server.port)?;
        override_parsed(&lookup, "LOGPASTE_MAX_UPLOAD_SIZE", &mut self.server.max_upload_size)?;

        if let Some(url) = lookup("LOGPASTE_DATABASE_URL") {
            self.storage.database_url = url;
        }
        override_parsed(&lookup, "LOGPASTE_STORAGE_TIME", &mut self.storage.storage_time)?;
        override_parsed(&lookup, "LOGPASTE_MAX_LENGTH", &mut self.storage.max_length)?;
        override_parsed(&lookup, "LOGPASTE_MAX_LINES", &mut self.storage.max_lines)?;
        override_parsed(&lookup, "LOGPASTE_PURGE_INTERVAL", &mut self.storage.purge_interval_secs)?;

        if let Some(url) = lookup("LOGPASTE_BASE_URL") {
            self.urls.base_url = url;
        }
        if let Some(url) = lookup("LOGPASTE_API_BASE_URL") {
            self.urls.api_base_url = url;
        }

        if let Some(key) = lookup("GEMINI_API_KEY") {
            self.ai.gemini_api_key = key;
        }
        if let Some(model) = lookup("LOGPASTE_AI_MODEL") {
            self.ai.model = model;
        }
        if let Some(endpoint) = lookup("LOGPASTE_AI_ENDPOINT") {
            self.ai.endpoint = endpoint;
        }
        if let Some(subject) = lookup("LOGPASTE_AI_SUBJECT") {
            self.ai.log_subject = subject;
        }
        if let Some(language) = lookup("LOGPASTE_AI_LANGUAGE") {
            self.ai.response_language = language;
        }

        Ok(())
    }
}

fn override_parsed<F, T>(lookup: &F, key: &str, target: &mut T) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if let Some(raw) = lookup(key) {
        *target = raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {}", key, raw))?;
    }
    Ok(())
}
