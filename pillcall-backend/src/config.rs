//! Startup configuration, read once from `config.toml`.
//!
//! The resulting `Config` is immutable and handed to every component that
//! needs it. A missing `config.toml` is generated from `config-default.toml`
//! and the process exits so the user can fill in the token.

use crate::ai::AiProvider;
use crate::error::ConfigError;
use adherence_types::TriggerTime;
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};
use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
pub const TEMPLATE_CONFIG_FILE: &str = "config-default.toml";
pub const PLACEHOLDER_TOKEN: &str = "YOUR_DISCORD_BOT_TOKEN";

#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub channel_id: u64,
    /// Registered user ids, in the order notifications mention them.
    pub registered_users: Vec<String>,
    pub message: String,
    pub status_message: String,
    pub notify_times: BTreeSet<TriggerTime>,
    pub log_path: PathBuf,
    pub ai: AiConfig,
    pub media_urls: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Optional system-level priming text.
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: String::new(),
            model: None,
            endpoint: None,
            system_prompt: None,
            prompt: default_prompt(),
        }
    }
}

fn default_provider() -> String {
    "claude".to_string()
}

fn default_prompt() -> String {
    "Write one short, warm sentence encouraging a friend to take today's medication.".to_string()
}

fn default_message() -> String {
    "Time to take your medication!".to_string()
}

fn default_log_path() -> PathBuf {
    PathBuf::from("taken_log.json")
}

#[derive(Debug, Clone, Default, Deserialize)]
struct MediaConfig {
    #[serde(default)]
    urls: Vec<String>,
}

/// TOML allows ids as either integers or strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum IdValue {
    Number(u64),
    Text(String),
}

impl IdValue {
    fn as_snowflake(&self) -> Option<u64> {
        match self {
            IdValue::Number(n) => Some(*n),
            IdValue::Text(s) => s.trim().parse().ok(),
        }
        .filter(|n| *n != 0)
    }

    fn raw(&self) -> String {
        match self {
            IdValue::Number(n) => n.to_string(),
            IdValue::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    token: String,
    #[serde(default)]
    channel_id: Option<IdValue>,
    #[serde(default)]
    user_ids: Vec<IdValue>,
    #[serde(default = "default_message")]
    message: String,
    #[serde(default)]
    status_message: String,
    #[serde(default)]
    notify_times: Vec<String>,
    #[serde(default = "default_log_path")]
    log_path: PathBuf,
    #[serde(default)]
    ai: AiConfig,
    #[serde(default)]
    media: MediaConfig,
}

/// Path of the config file: `PILLCALL_CONFIG` or `./config.toml`.
pub fn config_path_from_env() -> PathBuf {
    env::var("PILLCALL_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE))
}

impl Config {
    /// Load and validate the config file, creating it from the template
    /// next to it on first run.
    ///
    /// `token_override` (from `DISCORD_TOKEN`) replaces the file's token.
    pub fn load(path: &Path, token_override: Option<String>) -> Result<Self, ConfigError> {
        if !path.exists() {
            let template = path
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join(TEMPLATE_CONFIG_FILE);
            log::warn!("Config file {} not found", path.display());
            return Err(create_from_template(path, &template));
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path, token_override)
    }

    pub fn from_toml_str(
        content: &str,
        path: &Path,
        token_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::validate(raw, token_override)
    }

    fn validate(raw: RawConfig, token_override: Option<String>) -> Result<Self, ConfigError> {
        let token = token_override
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(raw.token)
            .trim()
            .to_string();
        if token.is_empty() || token == PLACEHOLDER_TOKEN {
            return Err(ConfigError::MissingToken);
        }

        let channel_id = raw
            .channel_id
            .as_ref()
            .and_then(IdValue::as_snowflake)
            .ok_or(ConfigError::InvalidChannel)?;

        if raw.user_ids.is_empty() {
            return Err(ConfigError::NoRegisteredUsers);
        }
        let registered_users = raw
            .user_ids
            .iter()
            .map(|id| {
                id.as_snowflake()
                    .map(|n| n.to_string())
                    .ok_or_else(|| ConfigError::MalformedUserId(id.raw()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let registered_users = dedupe_ids(registered_users);

        if AiProvider::from_str(&raw.ai.provider).is_none() {
            return Err(ConfigError::UnknownProvider(raw.ai.provider));
        }

        let notify_times = parse_notify_times(&raw.notify_times);

        let media_urls = raw
            .media
            .urls
            .into_iter()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();

        Ok(Self {
            token,
            channel_id,
            registered_users,
            message: raw.message,
            status_message: raw.status_message,
            notify_times,
            log_path: raw.log_path,
            ai: raw.ai,
            media_urls,
        })
    }
}

/// Keep the first occurrence of each id, preserving order.
fn dedupe_ids(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| {
            let first = seen.insert(id.clone());
            if !first {
                log::warn!("Ignoring duplicate user id {}", id);
            }
            first
        })
        .collect()
}

/// Parse `"HH:MM"` entries. Invalid ones are logged and dropped.
pub fn parse_notify_times(entries: &[String]) -> BTreeSet<TriggerTime> {
    entries
        .iter()
        .filter_map(|entry| match entry.parse::<TriggerTime>() {
            Ok(t) => Some(t),
            Err(e) => {
                log::warn!("Ignoring notify time: {}", e);
                None
            }
        })
        .collect()
}

fn create_from_template(path: &Path, template: &Path) -> ConfigError {
    match std::fs::copy(template, path) {
        Ok(_) => {
            log::info!("Created {} from {}", path.display(), template.display());
            ConfigError::TemplateCreated {
                created: path.to_path_buf(),
                template: template.to_path_buf(),
            }
        }
        Err(e) => {
            log::error!("Could not copy {}: {}", template.display(), e);
            ConfigError::TemplateMissing(template.to_path_buf())
        }
    }
}
