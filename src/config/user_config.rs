//! User-level configuration for advisor-lens
//!
//! Supports loading config from:
//! - Environment variables
//! - ~/.config/advisor-lens/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

pub const DEFAULT_BASE_API_URL: &str = "https://api.snyk.io";
pub const DEFAULT_ADVISOR_URL: &str = "https://snyk.io/advisor";
pub const DEFAULT_SCORE_THRESHOLD: f64 = 0.7;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "SNYK_API";
/// Environment variable holding the API token
pub const TOKEN_ENV: &str = "SNYK_TOKEN";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UserConfig {
    #[serde(default)]
    pub advisor: AdvisorSection,
}

/// `[advisor]` table as written in config.toml; every key is optional
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AdvisorSection {
    /// Base URL of the scoring API
    pub base_api_url: Option<String>,

    /// API token sent as `Authorization: token <token>`
    pub token: Option<String>,

    /// Base URL for "More Details" links
    pub advisor_url: Option<String>,

    /// Scores below this are annotated
    pub score_threshold: Option<f64>,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Resolved settings used by the client and decorator
#[derive(Debug, Clone, PartialEq)]
pub struct AdvisorConfig {
    pub base_api_url: String,
    pub token: Option<String>,
    pub advisor_url: String,
    pub score_threshold: f64,
    pub timeout_secs: u64,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            base_api_url: DEFAULT_BASE_API_URL.to_string(),
            token: None,
            advisor_url: DEFAULT_ADVISOR_URL.to_string(),
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Config handle shared between the CLI and the API client.
///
/// The client reads through it on every request, so a reload is picked up
/// by the next call without rebuilding anything.
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<AdvisorConfig>>,
}

impl SharedConfig {
    pub fn new(config: AdvisorConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Copy of the current settings
    pub fn snapshot(&self) -> AdvisorConfig {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn replace(&self, config: AdvisorConfig) {
        match self.inner.write() {
            Ok(mut guard) => *guard = config,
            Err(poisoned) => *poisoned.into_inner() = config,
        }
    }
}

impl UserConfig {
    /// Load config from all sources, with priority:
    /// 1. Environment variables (highest)
    /// 2. User config (~/.config/advisor-lens/config.toml)
    pub fn load() -> Result<Self> {
        let mut config = UserConfig::default();

        if let Some(path) = Self::user_config_path().filter(|p| p.exists()) {
            match Self::from_file(&path) {
                Ok(user_config) => config.merge(user_config),
                Err(e) => warn!("Ignoring {}: {:#}", path.display(), e),
            }
        }

        // Environment variables override everything
        if let Ok(url) = std::env::var(API_URL_ENV) {
            config.advisor.base_api_url = Some(url);
        }
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            config.advisor.token = Some(token);
        }

        Ok(config)
    }

    /// Parse a config.toml file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = toml::from_str::<UserConfig>(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        debug!("Loaded user config from {}", path.display());
        Ok(config)
    }

    /// Get the user config directory path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("advisor-lens").join("config.toml"))
    }

    /// Merge another config into this one (other takes priority)
    fn merge(&mut self, other: UserConfig) {
        if other.advisor.base_api_url.is_some() {
            self.advisor.base_api_url = other.advisor.base_api_url;
        }
        if other.advisor.token.is_some() {
            self.advisor.token = other.advisor.token;
        }
        if other.advisor.advisor_url.is_some() {
            self.advisor.advisor_url = other.advisor.advisor_url;
        }
        if other.advisor.score_threshold.is_some() {
            self.advisor.score_threshold = other.advisor.score_threshold;
        }
        if other.advisor.timeout_secs.is_some() {
            self.advisor.timeout_secs = other.advisor.timeout_secs;
        }
    }

    /// Check if an API token is available
    pub fn has_token(&self) -> bool {
        self.advisor.token.as_deref().is_some_and(|t| !t.trim().is_empty())
    }

    /// Resolve into the settings the pipeline runs with
    pub fn resolve(&self) -> AdvisorConfig {
        let defaults = AdvisorConfig::default();
        let threshold = self
            .advisor
            .score_threshold
            .filter(|t| (0.0..=1.0).contains(t))
            .unwrap_or(defaults.score_threshold);

        AdvisorConfig {
            base_api_url: self
                .advisor
                .base_api_url
                .clone()
                .unwrap_or(defaults.base_api_url),
            token: self.advisor.token.clone().filter(|t| !t.trim().is_empty()),
            advisor_url: self
                .advisor
                .advisor_url
                .clone()
                .unwrap_or(defaults.advisor_url),
            score_threshold: threshold,
            timeout_secs: self.advisor.timeout_secs.unwrap_or(defaults.timeout_secs),
        }
    }

    /// Initialize user config directory and create example config
    pub fn init_user_config() -> Result<PathBuf> {
        let config_path = Self::user_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if !config_path.exists() {
            let example = r#"# advisor-lens User Configuration

[advisor]
# Scores API base URL (env: SNYK_API)
# base_api_url = "https://api.snyk.io"

# API token (env: SNYK_TOKEN)
# token = "..."

# Where "More Details" links point
# advisor_url = "https://snyk.io/advisor"

# Packages scoring below this are annotated (0.0 - 1.0)
# score_threshold = 0.7

# Request timeout in seconds
# timeout_secs = 30
"#;
            std::fs::write(&config_path, example)?;
        }

        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = UserConfig::default();
        assert!(!config.has_token());
        let resolved = config.resolve();
        assert_eq!(resolved.base_api_url, "https://api.snyk.io");
        assert_eq!(resolved.advisor_url, "https://snyk.io/advisor");
        assert_eq!(resolved.score_threshold, 0.7);
        assert_eq!(resolved.timeout_secs, 30);
        assert!(resolved.token.is_none());
    }

    #[test]
    fn test_toml_parsing() {
        let toml_str = r#"
[advisor]
base_api_url = "https://api.eu.snyk.io"
token = "abc-123"
score_threshold = 0.5
"#;
        let config: UserConfig = toml::from_str(toml_str).unwrap();
        assert!(config.has_token());
        let resolved = config.resolve();
        assert_eq!(resolved.base_api_url, "https://api.eu.snyk.io");
        assert_eq!(resolved.token.as_deref(), Some("abc-123"));
        assert_eq!(resolved.score_threshold, 0.5);
        assert_eq!(resolved.advisor_url, DEFAULT_ADVISOR_URL);
    }

    #[test]
    fn test_out_of_range_threshold_falls_back() {
        let config: UserConfig = toml::from_str("[advisor]\nscore_threshold = 7.0\n").unwrap();
        assert_eq!(config.resolve().score_threshold, DEFAULT_SCORE_THRESHOLD);
    }

    #[test]
    fn test_blank_token_is_ignored() {
        let config: UserConfig = toml::from_str("[advisor]\ntoken = \"  \"\n").unwrap();
        assert!(!config.has_token());
        assert!(config.resolve().token.is_none());
    }

    #[test]
    fn test_merge_prefers_other() {
        let mut base: UserConfig = toml::from_str("[advisor]\ntoken = \"old\"\ntimeout_secs = 5\n").unwrap();
        let other: UserConfig = toml::from_str("[advisor]\ntoken = \"new\"\n").unwrap();
        base.merge(other);
        assert_eq!(base.advisor.token.as_deref(), Some("new"));
        assert_eq!(base.advisor.timeout_secs, Some(5));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[advisor]\nadvisor_url = \"http://localhost/advisor\"\n").unwrap();
        let config = UserConfig::from_file(&path).unwrap();
        assert_eq!(config.resolve().advisor_url, "http://localhost/advisor");

        std::fs::write(&path, "[advisor\n").unwrap();
        assert!(UserConfig::from_file(&path).is_err());
    }

    #[test]
    fn test_shared_config_sees_replacement() {
        let shared = SharedConfig::new(AdvisorConfig::default());
        let reader = shared.clone();
        shared.replace(AdvisorConfig {
            token: Some("t".to_string()),
            ..AdvisorConfig::default()
        });
        assert_eq!(reader.snapshot().token.as_deref(), Some("t"));
    }
}
