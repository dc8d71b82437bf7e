// Startup configuration.
//
// Values come from an optional JSON file (same keys the bot has always used)
// and environment variables, with the environment taking precedence.

use crate::core::moderation::{ModerationConfig, DEFAULT_ALBUM_WINDOW};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Missing required setting {0}")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Shape of `config.json`.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(rename = "BotToken")]
    bot_token: Option<String>,
    #[serde(rename = "AdminChatID")]
    admin_chat_id: Option<i64>,
    #[serde(rename = "GroupChatID")]
    group_chat_id: Option<i64>,
    #[serde(rename = "AlbumWindowSecs")]
    album_window_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bot_token: String,
    pub moderation: ModerationConfig,
}

impl AppConfig {
    /// Load from the process environment and the file named by
    /// `BOT_CONFIG_PATH` (default `config.json`, skipped if absent).
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("BOT_CONFIG_PATH")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path), |key| std::env::var(key).ok())
    }

    /// Load with an explicit file path and variable lookup.
    pub fn load_from(
        path: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let file = if path.exists() {
            let reader = std::fs::File::open(path)?;
            serde_json::from_reader(reader)?
        } else {
            FileConfig::default()
        };

        let bot_token = env("TELEGRAM_BOT_TOKEN")
            .or(file.bot_token)
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?;

        let moderator_chat_id = parse_env(&env, "ADMIN_CHAT_ID")?
            .or(file.admin_chat_id)
            .ok_or(ConfigError::Missing("ADMIN_CHAT_ID"))?;

        let public_chat_id = parse_env(&env, "GROUP_CHAT_ID")?
            .or(file.group_chat_id)
            .ok_or(ConfigError::Missing("GROUP_CHAT_ID"))?;

        let album_window = parse_env::<u64>(&env, "ALBUM_WINDOW_SECS")?
            .or(file.album_window_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_ALBUM_WINDOW);

        Ok(Self {
            bot_token,
            moderation: ModerationConfig {
                moderator_chat_id,
                public_chat_id,
                album_window,
            },
        })
    }
}

fn parse_env<T: std::str::FromStr>(
    env: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match env(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(None),
    }
}
