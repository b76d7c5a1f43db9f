//! Ollama chat backend.

use crate::backend::prompt::{build_prompt, SYSTEM_PROMPT};
use crate::backend::{AnalysisBackend, BackendError};
use crate::models::PaperMeta;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration for the Ollama backend.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub ollama_url: String,
    pub model_name: String,
    pub temperature: f32,
    pub max_tokens: Option<usize>,
    pub timeout_seconds: u64,
    /// Extra attempts after a transient failure.
    pub retries: usize,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434".to_string(),
            model_name: "llama3.2:latest".to_string(),
            temperature: 0.1,
            max_tokens: Some(1500),
            timeout_seconds: 120,
            retries: 2,
        }
    }
}

/// Message in the chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<usize>,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

/// Sends one analysis prompt per paper to an Ollama server.
pub struct OllamaBackend {
    config: OllamaConfig,
    http_client: reqwest::Client,
}

impl OllamaBackend {
    /// Create a backend with its own HTTP client.
    pub fn new(config: OllamaConfig) -> Result<Self, BackendError> {
        info!(
            "Initializing Ollama backend with model {} at {}",
            config.model_name, config.ollama_url
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| BackendError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Send one prompt, retrying transient failures.
    async fn send_with_retries(&self, prompt: &str) -> Result<String, BackendError> {
        let mut attempt = 0;
        loop {
            match self.send_prompt(prompt).await {
                Ok(content) => return Ok(content),
                Err(e) if e.is_transient() && attempt < self.config.retries => {
                    attempt += 1;
                    warn!(
                        "Analysis request failed ({}), retry {}/{}",
                        e, attempt, self.config.retries
                    );
                    tokio::time::sleep(Duration::from_millis(500 * attempt as u64)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Send a single prompt and return the response text.
    async fn send_prompt(&self, prompt: &str) -> Result<String, BackendError> {
        let url = format!("{}/api/chat", self.config.ollama_url.trim_end_matches('/'));

        let request = OllamaChatRequest {
            model: self.config.model_name.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens,
            },
        };

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout(self.config.timeout_seconds)
                } else if e.is_connect() {
                    BackendError::Connect(self.config.ollama_url.clone())
                } else {
                    BackendError::Request(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status { status, body });
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        Ok(chat_response.message.content)
    }
}

impl AnalysisBackend for OllamaBackend {
    fn describe(&self) -> String {
        self.config.model_name.clone()
    }

    async fn analyze(&self, compound: &str, paper: &PaperMeta) -> Result<String, BackendError> {
        debug!("Requesting analysis for paper {}", paper.identifier);
        let prompt = build_prompt(compound, paper);
        self.send_with_retries(&prompt).await
    }
}
