use crate::{status_error, transport_error, LlmProvider};
use async_trait::async_trait;
use redscribe_core::{CoreError, LlmError, LlmSettings};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const PROVIDER: &str = "Anthropic";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct ClaudeProvider {
    http_client: Client,
    api_key: String,
    model: String,
    api_base: String,
    max_tokens: u32,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl ClaudeProvider {
    pub fn new(api_key: String, settings: &LlmSettings) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            api_key,
            model: settings.model_name().to_string(),
            api_base: settings.base_url().to_string(),
            max_tokens: settings.max_tokens,
        })
    }
}

#[async_trait]
impl LlmProvider for ClaudeProvider {
    async fn complete(&self, prompt: &str) -> Result<String, CoreError> {
        let url = format!("{}/v1/messages", self.api_base);
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        debug!("Sending {} character prompt to {} ({})", prompt.len(), PROVIDER, self.model);
        let response = self
            .http_client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        if !response.status().is_success() {
            return Err(status_error(PROVIDER, &self.model, response).await);
        }

        let message: MessagesResponse =
            response.json().await.map_err(|e| LlmError::InvalidResponseFormat {
                provider: PROVIDER.to_string(),
                details: e.to_string(),
            })?;

        let text: String = message
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text.as_str())
            .collect();

        if text.is_empty() {
            return Err(LlmError::InvalidResponseFormat {
                provider: PROVIDER.to_string(),
                details: "response contained no text blocks".to_string(),
            }
            .into());
        }
        Ok(text)
    }

    fn name(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }
}
