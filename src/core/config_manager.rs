// src/core/config_manager.rs
//! Client configuration: optional YAML file, environment overrides, CLI overrides

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_STATE_PATH: &str = ".talentscout/state.toml";
pub const DEFAULT_LOG_PATH: &str = "/tmp/talentscout.log";

const DEFAULT_CONFIG_FILE: &str = "talentscout.yaml";

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigManager {
    pub environment: String,
    pub service: ServiceConfig,
    pub state_path: PathBuf,
    pub log_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub api_url: String,
    pub poll_interval: Duration,
    pub timeout_seconds: u64,
}

/// One environment section of `talentscout.yaml`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
struct EnvironmentSection {
    api_url: Option<String>,
    poll_interval_ms: Option<u64>,
    request_timeout_secs: Option<u64>,
    state_path: Option<PathBuf>,
    log_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    local: EnvironmentSection,
    #[serde(default)]
    production: EnvironmentSection,
}

impl ConfigManager {
    /// Load configuration for the current environment
    pub fn load() -> Result<Self> {
        let environment = Self::get_environment();
        info!("Loading configuration for environment: {}", environment);

        let config_path = std::env::var("TALENTSCOUT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        let section = Self::load_section(&config_path, &environment)?;
        let mut config = Self::from_section(environment, section);

        if let Ok(url) = std::env::var("TALENTSCOUT_API_URL") {
            config = config.with_api_url(url);
        }
        if let Ok(path) = std::env::var("TALENTSCOUT_STATE_PATH") {
            config.state_path = PathBuf::from(path);
        }

        Ok(config)
    }

    fn get_environment() -> String {
        std::env::var("TALENTSCOUT_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "local".to_string())
    }

    /// The config file is optional; a missing file yields defaults
    fn load_section(path: &Path, environment: &str) -> Result<EnvironmentSection> {
        if !path.exists() {
            return Ok(EnvironmentSection::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse_section(&content, environment)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    fn parse_section(content: &str, environment: &str) -> Result<EnvironmentSection> {
        let config_file: ConfigFile = serde_yaml::from_str(content)?;
        Ok(match environment {
            "production" => config_file.production,
            _ => config_file.local,
        })
    }

    fn from_section(environment: String, section: EnvironmentSection) -> Self {
        Self {
            environment,
            service: ServiceConfig {
                api_url: normalize_url(section.api_url.as_deref().unwrap_or(DEFAULT_API_URL)),
                poll_interval: Duration::from_millis(
                    section
                        .poll_interval_ms
                        .filter(|ms| *ms > 0)
                        .unwrap_or(DEFAULT_POLL_INTERVAL_MS),
                ),
                timeout_seconds: section
                    .request_timeout_secs
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            },
            state_path: section
                .state_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_PATH)),
            log_path: section
                .log_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH)),
        }
    }

    pub fn with_api_url(mut self, url: impl AsRef<str>) -> Self {
        self.service.api_url = normalize_url(url.as_ref());
        self
    }

    pub fn with_state_path(mut self, path: PathBuf) -> Self {
        self.state_path = path;
        self
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::from_section("local".to_string(), EnvironmentSection::default())
    }
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
