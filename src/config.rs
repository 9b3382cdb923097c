//! # Feature: Configuration System
//!
//! Loads bot configuration from a YAML file (with `${VAR}` interpolation) or
//! straight from environment variables. The bot token is the only required
//! value; its absence is fatal at startup.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: YAML configuration file with environment variable interpolation
//! - 1.0.0: Initial environment variable configuration

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Discord bot token (required)
    pub discord_token: String,

    /// Prefix that marks a message as a command
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,

    /// Key for the chat completion API; AI commands are disabled without it
    #[serde(default)]
    pub openai_api_key: Option<String>,

    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    #[serde(default = "default_database_path")]
    pub database_path: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Users that always have the admin role
    #[serde(default)]
    pub admin_ids: Vec<u64>,

    /// Port for the keep-alive HTTP endpoint; disabled when unset
    #[serde(default)]
    pub health_port: Option<u16>,

    /// URL hit by the self-ping job (defaults to the local health endpoint)
    #[serde(default)]
    pub ping_url: Option<String>,

    #[serde(default = "default_backup_dir")]
    pub backup_dir: String,

    /// Day the birthday check celebrates, as `MM-DD`
    #[serde(default)]
    pub birthday: Option<String>,

    #[serde(default = "default_birthday_message")]
    pub birthday_message: String,

    /// Conversation turns kept per user for AI context
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    #[serde(default = "default_vip_history_limit")]
    pub vip_history_limit: usize,
}

// Default value functions for serde
fn default_command_prefix() -> String {
    "!".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_system_prompt() -> String {
    "You are a friendly, concise assistant living in a Discord bot. \
     Answer in the language the user writes in."
        .to_string()
}

fn default_database_path() -> String {
    "bot.db".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_backup_dir() -> String {
    "backups".to_string()
}

fn default_birthday_message() -> String {
    "🎂 Today is my birthday! Thanks for keeping me company all year.".to_string()
}

fn default_history_limit() -> usize {
    10
}

fn default_vip_history_limit() -> usize {
    30
}

impl Default for Config {
    fn default() -> Self {
        Config {
            discord_token: String::new(),
            command_prefix: default_command_prefix(),
            openai_api_key: None,
            openai_model: default_openai_model(),
            openai_base_url: default_openai_base_url(),
            system_prompt: default_system_prompt(),
            database_path: default_database_path(),
            log_level: default_log_level(),
            admin_ids: Vec::new(),
            health_port: None,
            ping_url: None,
            backup_dir: default_backup_dir(),
            birthday: None,
            birthday_message: default_birthday_message(),
            history_limit: default_history_limit(),
            vip_history_limit: default_vip_history_limit(),
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Parse a comma separated id list, skipping anything that is not a number
fn parse_id_list(raw: &str) -> Vec<u64> {
    raw.split(',')
        .filter_map(|part| part.trim().parse().ok())
        .collect()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let config = Config {
            discord_token: env::var("DISCORD_TOKEN")
                .map_err(|_| anyhow::anyhow!("DISCORD_TOKEN environment variable not set"))?,
            command_prefix: env::var("COMMAND_PREFIX").unwrap_or_else(|_| default_command_prefix()),
            openai_api_key: env::var("OPENAI_API_KEY").ok(),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| default_openai_model()),
            openai_base_url: env::var("OPENAI_BASE_URL").unwrap_or_else(|_| default_openai_base_url()),
            system_prompt: env::var("SYSTEM_PROMPT").unwrap_or_else(|_| default_system_prompt()),
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| default_database_path()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| default_log_level()),
            admin_ids: env::var("ADMIN_IDS")
                .map(|v| parse_id_list(&v))
                .unwrap_or_default(),
            health_port: env::var("PORT").ok().and_then(|p| p.trim().parse().ok()),
            ping_url: env::var("PING_URL").ok(),
            backup_dir: env::var("BACKUP_DIR").unwrap_or_else(|_| default_backup_dir()),
            birthday: env::var("BOT_BIRTHDAY").ok(),
            birthday_message: env::var("BIRTHDAY_MESSAGE")
                .unwrap_or_else(|_| default_birthday_message()),
            history_limit: env_or("HISTORY_LIMIT", default_history_limit()),
            vip_history_limit: env_or("VIP_HISTORY_LIMIT", default_vip_history_limit()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable interpolation
    ///
    /// Supports `${VAR_NAME}` syntax for environment variable substitution.
    /// Example: `discord_token: "${DISCORD_TOKEN}"`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let interpolated = interpolate_env_vars(&content)?;

        let config: Config = serde_yaml::from_str(&interpolated)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;

        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Auto-detect and load configuration
    ///
    /// Priority order:
    /// 1. If CONFIG_FILE env var is set, load from that file
    /// 2. If config.yaml exists in current directory, load from it
    /// 3. Fall back to environment variables
    pub fn auto_load() -> Result<Self> {
        if let Ok(config_path) = env::var("CONFIG_FILE") {
            return Self::from_file(&config_path);
        }

        let default_config_path = "config.yaml";
        if Path::new(default_config_path).exists() {
            return Self::from_file(default_config_path);
        }

        Self::from_env()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.discord_token.trim().is_empty() {
            anyhow::bail!("discord_token is required");
        }

        if self.command_prefix.is_empty() || self.command_prefix.chars().any(char::is_whitespace) {
            anyhow::bail!("command_prefix must be non-empty and contain no whitespace");
        }

        if let Some(ref birthday) = self.birthday {
            if parse_birthday(birthday).is_none() {
                anyhow::bail!("Invalid birthday '{}'. Use MM-DD, e.g. 04-17", birthday);
            }
        }

        if self.history_limit == 0 || self.vip_history_limit == 0 {
            anyhow::bail!("history limits must be at least 1");
        }

        Ok(())
    }

    /// Whether this id is configured as an admin
    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admin_ids.contains(&user_id)
    }

    /// URL for the self-ping job, if there is anything to ping
    pub fn effective_ping_url(&self) -> Option<String> {
        self.ping_url.clone().or_else(|| {
            self.health_port
                .map(|port| format!("http://127.0.0.1:{port}/health"))
        })
    }

    /// Configured birthday as (month, day)
    pub fn birthday_date(&self) -> Option<(u32, u32)> {
        self.birthday.as_deref().and_then(parse_birthday)
    }
}

/// Parse `MM-DD`; Feb 29 is accepted
pub fn parse_birthday(value: &str) -> Option<(u32, u32)> {
    let (month, day) = value.trim().split_once('-')?;
    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    // 2024 is a leap year so every real calendar day validates
    NaiveDate::from_ymd_opt(2024, month, day)?;
    Some((month, day))
}

// ============================================================================
// Environment Variable Interpolation
// ============================================================================

static ENV_VAR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").expect("Invalid regex")
});

/// Interpolate environment variables in a string
///
/// Supports `${VAR_NAME}` syntax. If a variable is not set, returns an error.
/// Use `${VAR_NAME:-default}` for default values.
fn interpolate_env_vars(content: &str) -> Result<String> {
    let mut errors = Vec::new();

    let result = ENV_VAR_PATTERN.replace_all(content, |cap: &regex::Captures| {
        let var_name = &cap[1];
        match env::var(var_name) {
            Ok(v) => v,
            Err(_) => match cap.get(2) {
                Some(default) => default.as_str().to_string(),
                None => {
                    errors.push(format!("Environment variable '{}' is not set", var_name));
                    String::new()
                }
            },
        }
    });

    if !errors.is_empty() {
        anyhow::bail!("Missing environment variables:\n  - {}", errors.join("\n  - "));
    }

    Ok(result.into_owned())
}

// ============================================================================
// Tests
// ============================================================================
