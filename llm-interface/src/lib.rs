pub mod claude;
pub mod openai;
pub mod prompt;
pub mod synthesizer;

use async_trait::async_trait;
use redscribe_core::{CoreError, LlmError};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use tracing::error;

pub use claude::ClaudeProvider;
pub use openai::OpenAiProvider;
pub use prompt::{render_blog_prompt, BLOG_POST_TEMPLATE};
pub use synthesizer::{synthesize_with, BlogSynthesizer};

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Sends one prompt and returns the completion text unmodified.
    async fn complete(&self, prompt: &str) -> Result<String, CoreError>;

    fn name(&self) -> &str;

    fn model(&self) -> &str;
}

/// Error envelope shared by the OpenAI and Anthropic APIs.
#[derive(Debug, Default, Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    error: ProviderErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

pub(crate) fn transport_error(provider: &str, e: reqwest::Error) -> CoreError {
    error!("{} request failed: {}", provider, e);
    if e.is_timeout() {
        LlmError::RequestTimeout {
            provider: provider.to_string(),
        }
        .into()
    } else {
        CoreError::Network(e)
    }
}

pub(crate) async fn status_error(provider: &str, model: &str, response: Response) -> CoreError {
    let status = response.status();
    let retry_after = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(60);
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ProviderErrorBody>(&body)
        .unwrap_or_default()
        .error;

    error!("{} responded {}: {}", provider, status, body);
    classify_status(provider, model, status, retry_after, detail).into()
}

fn classify_status(
    provider: &str,
    model: &str,
    status: StatusCode,
    retry_after: u64,
    detail: ProviderErrorDetail,
) -> LlmError {
    let provider = provider.to_string();
    let quota_exhausted = [detail.code.as_deref(), detail.kind.as_deref()]
        .into_iter()
        .flatten()
        .any(|tag| tag == "insufficient_quota");

    match status.as_u16() {
        401 => LlmError::InvalidApiKey { provider },
        403 => LlmError::AuthenticationFailed { provider },
        404 => LlmError::ModelNotAvailable {
            model: model.to_string(),
        },
        429 if quota_exhausted => LlmError::InsufficientCredits { provider },
        429 => LlmError::RateLimitExceeded {
            provider,
            retry_after,
        },
        _ if status.is_server_error() => LlmError::ServiceUnavailable { provider },
        code => LlmError::RequestRejected {
            provider,
            status_code: code,
            message: detail
                .message
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string()),
        },
    }
}
