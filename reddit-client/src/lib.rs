pub mod api;
pub mod auth;


use api::RedditApiClient;
use async_trait::async_trait;
use auth::AppOnlyAuthenticator;
use redscribe_core::{
    ContentFetcher, CoreError, Document, FetchedContent, RedditApiError, RedditSettings,
    SearchQuery,
};
use std::time::Duration;
use tracing::{info, instrument};

pub use api::{permalink_url, REDDIT_WEB_BASE};

/// Fetches keyword search results from Reddit as combined text plus citations.
pub struct RedditClient {
    settings: RedditSettings,
}

impl RedditClient {
    pub fn new(settings: &RedditSettings) -> Self {
        Self {
            settings: settings.clone(),
        }
    }

    fn api_client(&self, user_agent: &str) -> Result<RedditApiClient, CoreError> {
        RedditApiClient::new(
            user_agent,
            &self.settings.api_base,
            Duration::from_secs(self.settings.timeout_secs),
        )
    }
}

#[async_trait]
impl ContentFetcher for RedditClient {
    #[instrument(skip(self), fields(keyword = %query.keyword, channel = %query.channel, limit = query.limit))]
    async fn fetch(&self, query: &SearchQuery) -> Result<FetchedContent, CoreError> {
        let credentials =
            self.settings
                .credentials()
                .map_err(|e| RedditApiError::AuthenticationFailed {
                    reason: e.to_string(),
                })?;

        let api = self.api_client(&credentials.user_agent)?;
        let authenticator = AppOnlyAuthenticator::new(
            &credentials,
            &self.settings.token_url,
            api.http_client().clone(),
        )?;
        let access_token = authenticator.fetch_token().await?;

        let listing = api
            .search_posts(&access_token, &query.channel, &query.keyword, query.limit)
            .await?;

        let mut content = FetchedContent::default();
        for child in listing.data.children.iter().take(query.limit as usize) {
            let post = &child.data;
            content.push(&Document::from(post), post.reference());
        }

        info!("Fetched {} Reddit posts", content.document_count());
        Ok(content)
    }
}
