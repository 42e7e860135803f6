//! Seams between the engine and the chat platform.

use crate::error::PlatformError;
use crate::notify::Notice;
use async_trait::async_trait;

/// A registered user id that the platform could turn into a display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUser {
    pub id: String,
    pub display_name: String,
}

impl ResolvedUser {
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn resolve(&self, user_id: &str) -> Result<ResolvedUser, PlatformError>;
}

/// Delivers a composed notice to the notification channel.
#[async_trait]
pub trait NoticeSink: Send + Sync {
    async fn deliver(&self, notice: &Notice) -> Result<(), PlatformError>;
}
