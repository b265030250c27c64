//! Configuration management for the bridge.
//!
//! Only non-secret settings live here. Slack credentials are read straight
//! from the environment by `credential-resolver` and never touch the config
//! file.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default Slack Web API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://slack.com/api";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default page size for directory pagination.
pub const DEFAULT_PAGE_SIZE: u32 = 200;

/// Slack rejects `limit` values above this.
const MAX_PAGE_SIZE: u32 = 1000;

/// Main bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Slack Web API base URL.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Raw `conversations_add_message` policy (`true`, a channel list, or
    /// `!`-prefixed exclusions). Unset keeps the tool disabled.
    #[serde(default)]
    pub add_message_tool: Option<String>,
    /// Upper bound for the whole scope detection round, in seconds.
    #[serde(default)]
    pub detection_timeout_secs: Option<u64>,
    /// Page size used when populating the directory cache.
    #[serde(default = "default_page_size")]
    pub directory_page_size: u32,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            api_base_url: default_api_base_url(),
            add_message_tool: None,
            detection_timeout_secs: None,
            directory_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Config {
    /// Load configuration from the config file (if any), then apply
    /// environment overrides and validate.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    fn load_from_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply `SLACK_MCP_*` overrides from an arbitrary lookup.
    ///
    /// Blank values are ignored; unparsable numbers keep the current value.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(level) = get("SLACK_MCP_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(url) = get("SLACK_MCP_API_URL") {
            self.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(policy) = get("SLACK_MCP_ADD_MESSAGE_TOOL") {
            self.add_message_tool = Some(policy);
        }
        if let Some(secs) = get("SLACK_MCP_DETECTION_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.detection_timeout_secs = Some(secs);
        }
        if let Some(size) = get("SLACK_MCP_PAGE_SIZE").and_then(|s| s.parse().ok()) {
            self.directory_page_size = size;
        }
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> CoreResult<()> {
        self.api_base_url()?;
        if self.directory_page_size == 0 || self.directory_page_size > MAX_PAGE_SIZE {
            return Err(CoreError::Config(format!(
                "directory_page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.directory_page_size
            )));
        }
        if self.detection_timeout_secs == Some(0) {
            return Err(CoreError::Config(
                "detection_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the Slack API base URL as a parsed URL.
    pub fn api_base_url(&self) -> CoreResult<Url> {
        Url::parse(&self.api_base_url).map_err(CoreError::from)
    }

    /// Detection timeout as a Duration, if configured.
    pub fn detection_timeout(&self) -> Option<Duration> {
        self.detection_timeout_secs.map(Duration::from_secs)
    }
}
