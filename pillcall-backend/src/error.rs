//! Error taxonomy for the reminder engine.
//!
//! Only `ConfigError` is fatal, and only at startup. Everything else is
//! logged and either skipped, replaced by a fallback or reported back to
//! the invoking command.

use std::path::PathBuf;
use thiserror::Error;

/// Invalid or missing configuration. The process exits before scheduling.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Created {created} from {template}; edit it and start again")]
    TemplateCreated { created: PathBuf, template: PathBuf },

    #[error("Template {0} not found, cannot create a config file")]
    TemplateMissing(PathBuf),

    #[error("Discord bot token is not set")]
    MissingToken,

    #[error("No users are registered in user_ids")]
    NoRegisteredUsers,

    #[error("Registered user id '{0}' is not a Discord user id")]
    MalformedUserId(String),

    #[error("channel_id must be a non-zero Discord channel id")]
    InvalidChannel,

    #[error("Unknown text provider '{0}'")]
    UnknownProvider(String),
}

/// Failure writing the adherence log. Reads never fail; see `LogStore::load`.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize adherence log: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failures at the chat platform boundary.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// The platform does not know this user id.
    #[error("Could not resolve user {user_id}: {reason}")]
    Resolution { user_id: String, reason: String },

    /// A message could not be delivered.
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Failure from the external text generator.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Text provider is not configured")]
    NotConfigured,

    #[error("Text provider request failed: {0}")]
    Request(String),

    #[error("Text provider returned no content")]
    EmptyResponse,
}

impl From<String> for ProviderError {
    fn from(s: String) -> Self {
        ProviderError::Request(s)
    }
}
