use crate::ai::{Message, MessageRole};
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const MAX_RETRIES: u32 = 2;
const BASE_DELAY_MS: u64 = 1000;

#[derive(Clone)]
pub struct ClaudeClient {
    client: Client,
    auth_headers: header::HeaderMap,
    endpoint: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ClaudeCompletionRequest {
    model: String,
    messages: Vec<SimpleClaudeMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Debug, Serialize)]
struct SimpleClaudeMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ClaudeCompletionResponse {
    content: Vec<ClaudeResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponseContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClaudeErrorResponse {
    error: ClaudeError,
}

#[derive(Debug, Deserialize)]
struct ClaudeError {
    message: String,
}

impl ClaudeClient {
    pub fn new(api_key: &str, endpoint: Option<&str>, model: Option<&str>) -> Result<Self, String> {
        let mut auth_headers = header::HeaderMap::new();
        auth_headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let auth_value = header::HeaderValue::from_str(api_key)
            .map_err(|e| format!("Invalid API key format: {}", e))?;
        auth_headers.insert("x-api-key", auth_value);
        auth_headers.insert(
            "anthropic-version",
            header::HeaderValue::from_static("2023-06-01"),
        );

        Ok(Self {
            client: crate::http::shared_client().clone(),
            auth_headers,
            endpoint: endpoint
                .unwrap_or("https://api.anthropic.com/v1/messages")
                .to_string(),
            model: model.unwrap_or("claude-sonnet-4-20250514").to_string(),
        })
    }

    fn build_request(&self, messages: Vec<Message>) -> ClaudeCompletionRequest {
        // The system prompt travels outside the message list
        let mut system_message = None;
        let api_messages: Vec<SimpleClaudeMessage> = messages
            .into_iter()
            .filter_map(|m| {
                if m.role == MessageRole::System {
                    system_message = Some(m.content);
                    None
                } else {
                    Some(SimpleClaudeMessage {
                        role: m.role.to_string(),
                        content: m.content,
                    })
                }
            })
            .collect();

        ClaudeCompletionRequest {
            model: self.model.clone(),
            messages: api_messages,
            max_tokens: 256,
            system: system_message,
        }
    }

    pub async fn generate_text(&self, messages: Vec<Message>) -> Result<String, String> {
        let request = self.build_request(messages);
        log::debug!("Sending request to Claude API: {:?}", request);

        let mut last_error: Option<String> = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay_ms = BASE_DELAY_MS * (1 << (attempt - 1));
                log::warn!(
                    "[CLAUDE] Retry attempt {}/{} after {}ms delay",
                    attempt,
                    MAX_RETRIES,
                    delay_ms
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }

            let response = match self
                .client
                .post(&self.endpoint)
                .headers(self.auth_headers.clone())
                .json(&request)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    log::warn!("[CLAUDE] Request failed (attempt {}): {}", attempt + 1, e);
                    last_error = Some(format!("Claude API request failed: {}", e));
                    continue;
                }
            };

            let status = response.status();
            if !status.is_success() {
                let error_text = response.text().await.unwrap_or_default();

                if matches!(status.as_u16(), 429 | 502 | 503 | 504) {
                    log::warn!(
                        "[CLAUDE] Received retryable status {} (attempt {})",
                        status,
                        attempt + 1
                    );
                    last_error = Some(format!("HTTP {}: {}", status, error_text));
                    continue;
                }

                if let Ok(error_response) = serde_json::from_str::<ClaudeErrorResponse>(&error_text) {
                    return Err(format!("Claude API error: {}", error_response.error.message));
                }
                return Err(format!(
                    "Claude API returned error status: {}, body: {}",
                    status, error_text
                ));
            }

            let response_data: ClaudeCompletionResponse = response
                .json()
                .await
                .map_err(|e| format!("Failed to parse Claude response: {}", e))?;

            // Concatenate all text content from response
            let content: String = response_data
                .content
                .into_iter()
                .filter(|c| c.content_type == "text")
                .filter_map(|c| c.text)
                .collect();

            if content.is_empty() {
                return Err("Claude API returned no content".to_string());
            }
            return Ok(content);
        }

        Err(last_error.unwrap_or_else(|| "Max retries exceeded".to_string()))
    }
}
