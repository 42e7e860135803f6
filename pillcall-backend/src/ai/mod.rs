pub mod claude;
pub mod llama;

pub use claude::ClaudeClient;
pub use llama::LlamaClient;

use crate::config::AiConfig;
use crate::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Supported text providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    Claude,
    Llama,
}

impl AiProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiProvider::Claude => "claude",
            AiProvider::Llama => "llama",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "claude" | "anthropic" => Some(AiProvider::Claude),
            "llama" | "ollama" => Some(AiProvider::Llama),
            _ => None,
        }
    }
}

impl std::fmt::Display for AiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let role = match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
        };
        write!(f, "{}", role)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

/// Unified AI client that works with any configured provider
pub enum AiClient {
    Claude(ClaudeClient),
    Llama(LlamaClient),
}

impl AiClient {
    /// Create a client from the `[ai]` config section.
    ///
    /// Returns `Ok(None)` when the provider needs an API key and none is set.
    pub fn from_config(config: &AiConfig) -> Result<Option<Self>, String> {
        let provider = AiProvider::from_str(&config.provider)
            .ok_or_else(|| format!("Unknown provider: {}", config.provider))?;

        match provider {
            AiProvider::Claude => {
                if config.api_key.trim().is_empty() {
                    return Ok(None);
                }
                let client = ClaudeClient::new(
                    config.api_key.trim(),
                    config.endpoint.as_deref(),
                    config.model.as_deref(),
                )?;
                Ok(Some(AiClient::Claude(client)))
            }
            AiProvider::Llama => {
                let client = LlamaClient::new(config.endpoint.as_deref(), config.model.as_deref())?;
                Ok(Some(AiClient::Llama(client)))
            }
        }
    }

    /// Generate text using the configured provider
    pub async fn generate_text(&self, messages: Vec<Message>) -> Result<String, String> {
        match self {
            AiClient::Claude(client) => client.generate_text(messages).await,
            AiClient::Llama(client) => client.generate_text(messages).await,
        }
    }
}

/// Source of the decorative line appended to reminders.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self) -> Result<String, ProviderError>;
}

/// Sends the configured prompt (plus optional system priming) to the provider.
pub struct PromptedGenerator {
    client: Option<AiClient>,
    system_prompt: Option<String>,
    prompt: String,
}

impl PromptedGenerator {
    pub fn from_config(config: &AiConfig) -> Self {
        let client = match AiClient::from_config(config) {
            Ok(Some(client)) => Some(client),
            Ok(None) => {
                log::warn!(
                    "No API key for text provider '{}', reminders will use the fallback line",
                    config.provider
                );
                None
            }
            Err(e) => {
                log::warn!("Text provider disabled: {}", e);
                None
            }
        };

        Self {
            client,
            system_prompt: config
                .system_prompt
                .clone()
                .filter(|s| !s.trim().is_empty()),
            prompt: config.prompt.clone(),
        }
    }

    fn messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system_prompt {
            messages.push(Message {
                role: MessageRole::System,
                content: system.clone(),
            });
        }
        messages.push(Message {
            role: MessageRole::User,
            content: self.prompt.clone(),
        });
        messages
    }
}

#[async_trait]
impl TextGenerator for PromptedGenerator {
    async fn generate(&self) -> Result<String, ProviderError> {
        let client = self.client.as_ref().ok_or(ProviderError::NotConfigured)?;
        let text = client.generate_text(self.messages()).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}
