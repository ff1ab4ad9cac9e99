use crate::{render_blog_prompt, ClaudeProvider, LlmProvider, OpenAiProvider};
use async_trait::async_trait;
use redscribe_core::{
    CoreError, GeneratedPost, GenerationRequest, LlmError, LlmSettings, PostSynthesizer,
    ProviderKind,
};
use tracing::{info, instrument};

/// Turns fetched Reddit text into a blog post using the configured provider.
///
/// The API key arrives with each request, so a provider client is built per
/// call and dropped afterwards.
pub struct BlogSynthesizer {
    settings: LlmSettings,
}

impl BlogSynthesizer {
    pub fn new(settings: &LlmSettings) -> Self {
        Self {
            settings: settings.clone(),
        }
    }

    fn provider_for(&self, api_key: &str) -> Result<Box<dyn LlmProvider>, CoreError> {
        let provider: Box<dyn LlmProvider> = match self.settings.provider {
            ProviderKind::OpenAi => {
                Box::new(OpenAiProvider::new(api_key.to_string(), &self.settings)?)
            }
            ProviderKind::Anthropic => {
                Box::new(ClaudeProvider::new(api_key.to_string(), &self.settings)?)
            }
        };
        Ok(provider)
    }
}

#[async_trait]
impl PostSynthesizer for BlogSynthesizer {
    #[instrument(skip_all, fields(keyword = %request.keyword))]
    async fn synthesize(&self, request: GenerationRequest) -> Result<GeneratedPost, CoreError> {
        if request.api_key.trim().is_empty() {
            return Err(LlmError::InvalidApiKey {
                provider: self.settings.provider.to_string(),
            }
            .into());
        }

        let provider = self.provider_for(request.api_key.trim())?;
        synthesize_with(provider.as_ref(), &request).await
    }
}

/// Renders the blog prompt for `request` and returns the provider's completion verbatim.
pub async fn synthesize_with(
    provider: &dyn LlmProvider,
    request: &GenerationRequest,
) -> Result<GeneratedPost, CoreError> {
    let prompt = render_blog_prompt(request);
    info!(
        "Generating blog post about '{}' with {} ({}), prompt is {} characters",
        request.keyword,
        provider.name(),
        provider.model(),
        prompt.len()
    );

    let completion = provider.complete(&prompt).await?;
    info!("Received {} character blog post", completion.len());
    Ok(GeneratedPost::new(completion))
}
