use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{FoodtruckError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub broadcast: BroadcastConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Prefixed onto each truck's `featured_photo` path.
    #[serde(default = "default_photo_base_url")]
    pub photo_base_url: String,
}

fn default_base_url() -> String {
    "https://www.seattlefoodtruck.com".to_string()
}

fn default_photo_base_url() -> String {
    "https://s3-us-west-2.amazonaws.com/seattlefoodtruck-uploads-prod/".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            photo_base_url: default_photo_base_url(),
        }
    }
}

/// Daily truck broadcast. Disabled unless both `channel` and `location_ids` are set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastConfig {
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub location_ids: Vec<String>,
    /// `"HH:MM <recurrence>"`, local time. Recurrence is `daily`, `weekdays`,
    /// `custom(mon,wed)` or `weekly(fri)`.
    #[serde(default = "default_schedule")]
    pub schedule: String,
}

fn default_schedule() -> String {
    "08:00 custom(mon,tue,wed,thu,fri)".to_string()
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            channel: String::new(),
            location_ids: Vec::new(),
            schedule: default_schedule(),
        }
    }
}

impl BroadcastConfig {
    pub fn is_enabled(&self) -> bool {
        !self.channel.is_empty() && !self.location_ids.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Optional append-only log file, written in addition to stdout.
    #[serde(default)]
    pub file: String,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            file: String::new(),
        }
    }
}

/// Split a comma-separated id list, dropping blanks.
pub fn parse_id_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Load config: defaults → foodtruck.toml → env vars (env wins).
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| FoodtruckError::InvalidConfig(format!("failed to read config: {e}")))?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| FoodtruckError::InvalidConfig(format!("failed to parse config: {e}")))
    }

    /// Apply overrides from an env-style lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("FOODTRUCK_TELEGRAM_TOKEN") {
            self.telegram.token = v;
        }
        if let Some(v) = lookup("FOODTRUCK_API_URL") {
            self.api.base_url = v;
        }
        if let Some(v) = lookup("FOODTRUCK_PHOTO_URL") {
            self.api.photo_base_url = v;
        }
        if let Some(v) = lookup("FOODTRUCK_CHANNEL") {
            self.broadcast.channel = v.trim().to_string();
        }
        if let Some(v) = lookup("FOODTRUCK_LOCATION_IDS") {
            self.broadcast.location_ids = parse_id_list(&v);
        }
        if let Some(v) = lookup("FOODTRUCK_SCHEDULE") {
            self.broadcast.schedule = v;
        }
    }
}
