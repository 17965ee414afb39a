// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration file support for paperdex
//!
//! Loads configuration from .paperdexrc.toml in current directory or
//! ~/.config/paperdex/config.toml, then applies `PAPERDEX_*` environment
//! overrides. Read once at startup.

use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::embedding::chunker::DEFAULT_MAX_CHARS;
use crate::embedding::provider::{
    ProviderSelection, RemoteConfig, DEFAULT_LOCAL_DIMENSIONS, DEFAULT_REMOTE_ENDPOINT,
    DEFAULT_REMOTE_MODEL, DEFAULT_REMOTE_TIMEOUT,
};
use crate::errors::{Result, RetrievalError};
use crate::ranking::{check_threshold, DEFAULT_LIMIT, DEFAULT_THRESHOLD};
use crate::utils::get_db_path;

/// Embedding provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderType {
    /// Remote when the API key is present, local otherwise
    #[default]
    Auto,
    Remote,
    Local,
}

impl std::str::FromStr for EmbeddingProviderType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "remote" | "openai" => Ok(Self::Remote),
            "local" | "hash" => Ok(Self::Local),
            other => Err(format!("Unknown embedding provider: {}", other)),
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider type (auto, remote, local)
    pub provider: Option<EmbeddingProviderType>,
    /// Remote model identifier
    pub model: Option<String>,
    /// Remote base URL
    pub endpoint: Option<String>,
    /// Name of the environment variable holding the API key
    pub api_key_env: Option<String>,
    /// Local fallback dimension
    pub dimensions: Option<usize>,
    /// Dimension requested from the remote endpoint
    pub remote_dimensions: Option<usize>,
    /// Remote request timeout in seconds
    pub timeout_secs: Option<u64>,
}

impl EmbeddingConfig {
    /// Get provider type (defaults to Auto)
    pub fn provider(&self) -> EmbeddingProviderType {
        self.provider.unwrap_or_default()
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_REMOTE_MODEL)
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_REMOTE_ENDPOINT)
    }

    /// Get API key variable name (defaults to OPENAI_API_KEY)
    pub fn api_key_env(&self) -> &str {
        self.api_key_env.as_deref().unwrap_or("OPENAI_API_KEY")
    }

    /// Get local dimension (defaults to 384)
    pub fn dimensions(&self) -> usize {
        self.dimensions.unwrap_or(DEFAULT_LOCAL_DIMENSIONS)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REMOTE_TIMEOUT)
    }
}

/// Chunking configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub max_chars: Option<usize>,
}

impl ChunkingConfig {
    /// Get max chunk length (defaults to 900)
    pub fn max_chars(&self) -> usize {
        self.max_chars.unwrap_or(DEFAULT_MAX_CHARS)
    }
}

/// Search configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Default number of results
    pub limit: Option<usize>,
    /// Default minimum score
    pub threshold: Option<f32>,
}

impl SearchConfig {
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    pub fn threshold(&self) -> f32 {
        self.threshold.unwrap_or(DEFAULT_THRESHOLD)
    }
}

/// Storage configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    /// Get database path (defaults to the nearest .paperdex/embeddings.sqlite
    /// at or above `cwd`)
    pub fn path(&self, cwd: &Path) -> PathBuf {
        self.path.clone().unwrap_or_else(|| get_db_path(cwd))
    }
}

/// Configuration loaded from .paperdexrc.toml or ~/.config/paperdex/config.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(default)]
    pub embeddings: EmbeddingConfig,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from files, then apply environment overrides
    ///
    /// Precedence (highest to lowest):
    /// 1. PAPERDEX_* environment variables
    /// 2. .paperdexrc.toml in current directory
    /// 3. ~/.config/paperdex/config.toml
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_files();
        config.apply_env_overrides()?;
        Ok(config)
    }

    fn load_files() -> Self {
        if let Some(config) = Self::load_from_path(Path::new(".paperdexrc.toml")) {
            return config;
        }

        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".config").join("paperdex").join("config.toml");
            if let Some(config) = Self::load_from_path(&config_path) {
                return config;
            }
        }

        Self::default()
    }

    /// Parses a config file; unreadable or invalid files are skipped with a warning.
    pub fn load_from_path(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("Failed to parse {}: {}", path.display(), e);
                None
            }
        }
    }

    fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        if let Some(raw) = env_string("PAPERDEX_PROVIDER")? {
            self.embeddings.provider = Some(raw.parse().map_err(anyhow::Error::msg)?);
        }
        if let Some(model) = env_string("PAPERDEX_MODEL")? {
            self.embeddings.model = Some(model);
        }
        if let Some(dimensions) = parse_usize_env("PAPERDEX_DIMENSIONS")? {
            self.embeddings.dimensions = Some(dimensions);
        }
        Ok(())
    }

    /// Resolves the provider using the process environment for the API key.
    pub fn resolve_provider(&self) -> Result<ProviderSelection> {
        self.resolve_provider_with(|name| env::var(name).ok())
    }

    /// Resolves the provider, looking the API key up through `lookup`.
    pub fn resolve_provider_with<F>(&self, lookup: F) -> Result<ProviderSelection>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.validate()?;

        let embeddings = &self.embeddings;
        let api_key = lookup(embeddings.api_key_env()).filter(|key| !key.trim().is_empty());

        let use_remote = match embeddings.provider() {
            EmbeddingProviderType::Local => false,
            EmbeddingProviderType::Auto => api_key.is_some(),
            EmbeddingProviderType::Remote => {
                if api_key.is_none() {
                    return Err(RetrievalError::Configuration(format!(
                        "remote embedding provider selected but {} is not set",
                        embeddings.api_key_env()
                    )));
                }
                true
            }
        };

        match api_key {
            Some(api_key) if use_remote => Ok(ProviderSelection::Remote(RemoteConfig {
                api_key,
                endpoint: embeddings.endpoint().to_string(),
                model: embeddings.model().to_string(),
                dimensions: embeddings.remote_dimensions,
                timeout: embeddings.timeout(),
            })),
            _ => Ok(ProviderSelection::local(embeddings.dimensions())),
        }
    }

    /// Rejects settings the core cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.embeddings.dimensions() == 0 {
            return Err(RetrievalError::config("embeddings.dimensions must be greater than 0"));
        }
        if self.embeddings.remote_dimensions == Some(0) {
            return Err(RetrievalError::config(
                "embeddings.remote_dimensions must be greater than 0",
            ));
        }
        if self.chunking.max_chars() == 0 {
            return Err(RetrievalError::config("chunking.max_chars must be greater than 0"));
        }
        let threshold = self.search.threshold();
        check_threshold(threshold).map_err(|_| {
            RetrievalError::config(format!(
                "search.threshold must be within [-1, 1], got {}",
                threshold
            ))
        })?;
        Ok(())
    }
}

fn env_string(name: &str) -> anyhow::Result<Option<String>> {
    match env::var(name) {
        Ok(raw) => {
            let value = raw.trim();
            if value.is_empty() {
                Ok(None)
            } else {
                Ok(Some(value.to_string()))
            }
        }
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(anyhow::Error::new(err).context(format!("Failed to read {}", name))),
    }
}

fn parse_usize_env(name: &str) -> anyhow::Result<Option<usize>> {
    match env_string(name)? {
        Some(value) => value
            .parse::<usize>()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("Invalid {} value: {}", name, value)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.chunking.max_chars(), 900);
        assert_eq!(config.search.limit(), 10);
        assert_eq!(config.search.threshold(), 0.0);
        assert_eq!(config.embeddings.dimensions(), 384);
        assert_eq!(config.embeddings.api_key_env(), "OPENAI_API_KEY");
    }

    #[test]
    fn test_parse_toml() {
        let config: Config = toml::from_str(
            r#"
[embeddings]
provider = "local"
dimensions = 8

[chunking]
max_chars = 40

[search]
limit = 3
threshold = 0.2
"#,
        )
        .unwrap();
        assert_eq!(config.embeddings.provider(), EmbeddingProviderType::Local);
        assert_eq!(config.chunking.max_chars(), 40);
        assert_eq!(config.search.limit(), 3);
        assert!((config.search.threshold() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_auto_without_key_is_local() {
        let selection = Config::default().resolve_provider_with(no_env).unwrap();
        assert!(matches!(selection, ProviderSelection::Local { dimensions: 384 }));
    }

    #[test]
    fn test_auto_with_key_is_remote() {
        let selection = Config::default()
            .resolve_provider_with(|name| (name == "OPENAI_API_KEY").then(|| "sk-1".to_string()))
            .unwrap();
        match selection {
            ProviderSelection::Remote(remote) => {
                assert_eq!(remote.model, DEFAULT_REMOTE_MODEL);
                assert_eq!(remote.api_key, "sk-1");
            }
            other => panic!("expected remote, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_key_counts_as_absent() {
        let selection = Config::default()
            .resolve_provider_with(|_| Some("   ".to_string()))
            .unwrap();
        assert!(!selection.is_remote());
    }

    #[test]
    fn test_forced_remote_without_key_fails() {
        let mut config = Config::default();
        config.embeddings.provider = Some(EmbeddingProviderType::Remote);
        assert!(matches!(
            config.resolve_provider_with(no_env),
            Err(RetrievalError::Configuration(_))
        ));
    }

    #[test]
    fn test_forced_local_ignores_key() {
        let mut config = Config::default();
        config.embeddings.provider = Some(EmbeddingProviderType::Local);
        config.embeddings.dimensions = Some(8);
        let selection = config
            .resolve_provider_with(|_| Some("sk-1".to_string()))
            .unwrap();
        assert!(matches!(selection, ProviderSelection::Local { dimensions: 8 }));
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut config = Config::default();
        config.embeddings.dimensions = Some(0);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.search.threshold = Some(1.5);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.chunking.max_chars = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_provider_type_from_str() {
        assert_eq!("REMOTE".parse::<EmbeddingProviderType>(), Ok(EmbeddingProviderType::Remote));
        assert_eq!("hash".parse::<EmbeddingProviderType>(), Ok(EmbeddingProviderType::Local));
        assert!("cohere".parse::<EmbeddingProviderType>().is_err());
    }

    #[test]
    fn test_load_from_missing_path() {
        assert!(Config::load_from_path(Path::new("/nonexistent/paperdex.toml")).is_none());
    }
}
