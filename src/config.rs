use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Environment variable holding the Telegram bot token.
pub const TOKEN_ENV: &str = "BOT_TOKEN";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub giveaway: GiveawayConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Never read from the file, only from the environment.
    #[serde(skip)]
    bot_token: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    /// Delete any webhook and drop pending updates before polling.
    #[serde(default = "default_true")]
    pub clear_webhook: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GiveawayConfig {
    /// How long closed giveaways stay in memory; 0 keeps them forever.
    #[serde(default = "default_retain_closed_hours")]
    pub retain_closed_hours: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerConfig {
    #[serde(default = "default_heartbeat_cron")]
    pub heartbeat_cron: String,
    #[serde(default = "default_housekeeping_cron")]
    pub housekeeping_cron: String,
}

fn default_true() -> bool {
    true
}

fn default_retain_closed_hours() -> u64 {
    24
}

fn default_heartbeat_cron() -> String {
    "0 0 * * * *".to_string()
}

fn default_housekeeping_cron() -> String {
    "0 */10 * * * *".to_string()
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            clear_webhook: default_true(),
        }
    }
}

impl Default for GiveawayConfig {
    fn default() -> Self {
        Self {
            retain_closed_hours: default_retain_closed_hours(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            heartbeat_cron: default_heartbeat_cron(),
            housekeeping_cron: default_housekeeping_cron(),
        }
    }
}

impl GiveawayConfig {
    pub fn retention(&self) -> Option<chrono::Duration> {
        if self.retain_closed_hours == 0 {
            return None;
        }
        i64::try_from(self.retain_closed_hours)
            .ok()
            .and_then(chrono::Duration::try_hours)
    }
}

impl Config {
    pub fn bot_token(&self) -> &str {
        &self.bot_token
    }

    /// Load settings from `path` (optional unless `required`) and the token
    /// from the environment.
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        let content = if path.exists() || required {
            Some(
                std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?,
            )
        } else {
            None
        };

        Self::from_parts(content.as_deref(), std::env::var(TOKEN_ENV).ok())
    }

    pub fn from_parts(content: Option<&str>, token: Option<String>) -> Result<Self> {
        let mut config: Config = match content {
            Some(content) => toml::from_str(content).context("Failed to parse config file")?,
            None => Config::default(),
        };

        config.bot_token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .with_context(|| format!("Environment variable {} is not set", TOKEN_ENV))?;

        Ok(config)
    }
}
