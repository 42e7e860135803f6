use crate::ai::Message;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Llama client for the Ollama chat API
#[derive(Clone)]
pub struct LlamaClient {
    client: Client,
    auth_headers: header::HeaderMap,
    endpoint: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaErrorResponse {
    error: String,
}

impl LlamaClient {
    pub fn new(endpoint: Option<&str>, model: Option<&str>) -> Result<Self, String> {
        let mut auth_headers = header::HeaderMap::new();
        auth_headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        Ok(Self {
            client: crate::http::shared_client().clone(),
            auth_headers,
            endpoint: endpoint
                .unwrap_or("http://localhost:11434/api/chat")
                .to_string(),
            model: model.unwrap_or("llama3.3").to_string(),
        })
    }

    pub async fn generate_text(&self, messages: Vec<Message>) -> Result<String, String> {
        // Ollama accepts the system role inline
        let api_messages: Vec<OllamaMessage> = messages
            .into_iter()
            .map(|m| OllamaMessage {
                role: m.role.to_string(),
                content: m.content,
            })
            .collect();

        let request = OllamaChatRequest {
            model: self.model.clone(),
            messages: api_messages,
            stream: false,
        };

        log::debug!("Sending request to Ollama API: {:?}", request);

        const MAX_RETRIES: u32 = 2;
        const BASE_DELAY_MS: u64 = 1000;

        let mut last_error: Option<String> = None;
        let mut response_data_opt: Option<OllamaChatResponse> = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay_ms = BASE_DELAY_MS * (1 << (attempt - 1));
                log::warn!(
                    "[OLLAMA] Retry attempt {}/{} after {}ms delay",
                    attempt,
                    MAX_RETRIES,
                    delay_ms
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }

            let request_result = self
                .client
                .post(&self.endpoint)
                .headers(self.auth_headers.clone())
                .json(&request)
                .send()
                .await;

            let response = match request_result {
                Ok(r) => r,
                Err(e) => {
                    log::warn!("[OLLAMA] Request failed (attempt {}): {}", attempt + 1, e);
                    last_error = Some(format!("Ollama API request failed: {}", e));
                    continue;
                }
            };

            let status = response.status();
            if !status.is_success() {
                let error_text = response.text().await.unwrap_or_default();

                if matches!(status.as_u16(), 429 | 502 | 503 | 504) && attempt < MAX_RETRIES {
                    log::warn!(
                        "[OLLAMA] Received retryable status {} (attempt {}), will retry",
                        status,
                        attempt + 1
                    );
                    last_error = Some(format!("HTTP {}: {}", status, error_text));
                    continue;
                }

                if let Ok(error_response) = serde_json::from_str::<OllamaErrorResponse>(&error_text) {
                    return Err(format!("Ollama API error: {}", error_response.error));
                }

                return Err(format!(
                    "Ollama API returned error status: {}, body: {}",
                    status, error_text
                ));
            }

            response_data_opt = Some(
                response
                    .json()
                    .await
                    .map_err(|e| format!("Failed to parse Ollama response: {}", e))?,
            );
            break;
        }

        let response_data = response_data_opt
            .ok_or_else(|| last_error.unwrap_or_else(|| "Max retries exceeded".to_string()))?;

        if response_data.message.content.is_empty() {
            return Err("Ollama API returned no content".to_string());
        }

        Ok(response_data.message.content)
    }
}
