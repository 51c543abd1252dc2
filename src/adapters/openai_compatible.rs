//! `/chat/completions` backend. Groq, OpenRouter and local OpenAI-style
//! servers all speak this shape.

use crate::config::toml_config::ProviderConfig;
use crate::domain::ports::LlmBackend;
use crate::utils::error::{CouncilError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct OpenAiCompatibleBackend {
    name: String,
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    extra_headers: HashMap<String, String>,
}

impl OpenAiCompatibleBackend {
    pub fn new(name: &str, config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs()))
            .build()?;

        Ok(Self {
            name: name.to_string(),
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key: config.resolved_api_key().map(str::to_string),
            extra_headers: config.headers.clone().unwrap_or_default(),
        })
    }
}

#[async_trait]
impl LlmBackend for OpenAiCompatibleBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let payload = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        tracing::debug!(
            "Sending {} chars to {} ({})",
            prompt.len(),
            self.name,
            self.model
        );

        let mut request = self.client.post(&self.endpoint).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        for (header, value) in &self.extra_headers {
            request = request.header(header.as_str(), value.as_str());
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("{} response status: {}", self.name, status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CouncilError::ApiError {
                backend: self.name.clone(),
                status: status.as_u16(),
                body: error_message(&body),
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| CouncilError::EmptyResponse {
                backend: self.name.clone(),
            })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// OpenAI-style error bodies carry `{"error": {"message": ...}}`; fall back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.to_string())
}
