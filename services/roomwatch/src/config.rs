//! Configuration types for the roomwatch service

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub rooms: Vec<RoomGroup>,
    #[serde(default)]
    pub filters: Vec<InclusionFilter>,
    #[serde(default)]
    pub notifiers: Vec<NotifierConfig>,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// A named, ordered group of room identities to monitor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomGroup {
    pub name: String,
    #[serde(default)]
    pub members: Vec<String>,
}

/// Initialization-time inclusion rule.
///
/// A room whose identity matches `identity_pattern` is kept only if its
/// fetched display name contains `require_name_contains`. Rooms that match
/// no filter are always kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InclusionFilter {
    pub identity_pattern: String,
    pub require_name_contains: String,
}

/// Notifier configuration with tagged enum for extensibility
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NotifierConfig {
    #[serde(rename = "discord_webhook")]
    DiscordWebhook {
        webhook_url: String,
        #[serde(default = "default_webhook_username")]
        username: String,
    },
}

impl NotifierConfig {
    pub fn type_name(&self) -> &str {
        match self {
            NotifierConfig::DiscordWebhook { .. } => "discord_webhook",
        }
    }
}

/// Status API and polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_base_url")]
    pub base_url: String,
    #[serde(default = "default_page_base_url")]
    pub page_base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_polling_interval")]
    pub polling_interval_seconds: u64,
    /// When set, a room whose fetches hit this many consecutive domain
    /// not-found outcomes is evicted from polling. Unset means never evict.
    #[serde(default)]
    pub evict_after_consecutive_not_found: Option<u32>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            page_base_url: default_page_base_url(),
            timeout_seconds: default_timeout(),
            polling_interval_seconds: default_polling_interval(),
            evict_after_consecutive_not_found: None,
        }
    }
}

/// Dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_dashboard_port(),
            history_size: default_history_size(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://public-api.showroom-cdn.com/room".to_string()
}

fn default_page_base_url() -> String {
    "https://www.showroom-live.com".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_polling_interval() -> u64 {
    15
}

fn default_webhook_username() -> String {
    "roomwatch".to_string()
}

fn default_true() -> bool {
    true
}

fn default_dashboard_port() -> u16 {
    8980
}

fn default_history_size() -> usize {
    100
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::WatchError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
