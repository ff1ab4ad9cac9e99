use redscribe_core::{ConfigError, CoreError, Document, RedditApiError, Reference};
use reqwest::{Client, Method, Response, StatusCode};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use url::Url;

/// Permalinks returned by the API are relative to this origin.
pub const REDDIT_WEB_BASE: &str = "https://www.reddit.com";

#[derive(Debug, Clone, Deserialize)]
pub struct RedditListing<T> {
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditListingChild<T> {
    pub data: T,
}

/// The parts of a search hit that end up in the prompt and the citations.
#[derive(Debug, Clone, Deserialize)]
pub struct RedditPostData {
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    pub permalink: String,
}

impl RedditPostData {
    pub fn reference(&self) -> Reference {
        Reference {
            title: self.title.clone(),
            url: permalink_url(&self.permalink),
        }
    }
}

impl From<&RedditPostData> for Document {
    fn from(post_data: &RedditPostData) -> Self {
        Self {
            title: post_data.title.clone(),
            body: post_data.selftext.clone(),
        }
    }
}

/// Joins a relative permalink onto the public Reddit origin without touching it.
pub fn permalink_url(permalink: &str) -> String {
    format!("{}{}", REDDIT_WEB_BASE, permalink)
}

#[derive(Debug)]
pub struct RedditApiClient {
    http_client: Client,
    api_base: Url,
    user_agent: String,
}

impl RedditApiClient {
    pub fn new(user_agent: &str, api_base: &str, timeout: Duration) -> Result<Self, CoreError> {
        let api_base = Url::parse(api_base).map_err(|e| ConfigError::InvalidValue {
            field: "reddit.api_base".to_string(),
            value: format!("{}: {}", api_base, e),
        })?;
        if api_base.cannot_be_a_base() {
            return Err(ConfigError::InvalidValue {
                field: "reddit.api_base".to_string(),
                value: api_base.to_string(),
            }
            .into());
        }

        let http_client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http_client,
            api_base,
            user_agent: user_agent.to_string(),
        })
    }

    pub fn http_client(&self) -> &Client {
        &self.http_client
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    fn endpoint_url(&self, segments: &[&str]) -> Result<Url, CoreError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| ConfigError::InvalidValue {
                field: "reddit.api_base".to_string(),
                value: self.api_base.to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn make_request(
        &self,
        method: Method,
        url: Url,
        access_token: &str,
        query_params: Option<&[(&str, &str)]>,
    ) -> Result<Response, CoreError> {
        let endpoint = url.path().to_string();
        let start_time = Instant::now();

        let mut request_builder = self
            .http_client
            .request(method.clone(), url)
            .bearer_auth(access_token);

        if let Some(params) = query_params {
            request_builder = request_builder.query(params);
        }

        info!("Making Reddit API request: {} {}", method, endpoint);
        let response = match request_builder.send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Network error for {} {}: {}", method, endpoint, e);
                if e.is_timeout() {
                    return Err(CoreError::RedditApi(RedditApiError::RequestTimeout));
                }
                return Err(CoreError::Network(e));
            }
        };

        let status = response.status();
        debug!(
            "Reddit responded {} for {} in {:?}",
            status,
            endpoint,
            start_time.elapsed()
        );

        if status.is_success() {
            return Ok(response);
        }

        error!("Request failed with status: {} for {}", status, endpoint);
        Err(CoreError::RedditApi(status_error(status, &endpoint, &response)))
    }

    /// Runs one keyword search, restricted to `channel` unless it is empty.
    pub async fn search_posts(
        &self,
        access_token: &str,
        channel: &str,
        keyword: &str,
        limit: u32,
    ) -> Result<RedditListing<RedditPostData>, CoreError> {
        let url = if channel.is_empty() {
            self.endpoint_url(&["search"])?
        } else {
            self.endpoint_url(&["r", channel, "search"])?
        };

        let limit_str = limit.to_string();
        let mut params = vec![
            ("q", keyword),
            ("limit", limit_str.as_str()),
            ("sort", "relevance"),
            ("type", "link"),
            ("raw_json", "1"),
        ];
        if !channel.is_empty() {
            params.push(("restrict_sr", "true"));
        }

        let response = self
            .make_request(Method::GET, url, access_token, Some(params.as_slice()))
            .await?;

        let listing: RedditListing<RedditPostData> = response.json().await.map_err(|e| {
            error!("Failed to parse search results: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse search results for '{}'", keyword),
            })
        })?;

        info!(
            "Search for '{}' in {} returned {} posts",
            keyword,
            if channel.is_empty() { "all of Reddit" } else { channel },
            listing.data.children.len()
        );
        Ok(listing)
    }
}

fn status_error(status: StatusCode, endpoint: &str, response: &Response) -> RedditApiError {
    match status.as_u16() {
        401 => RedditApiError::InvalidToken,
        403 => RedditApiError::Forbidden {
            resource: endpoint.to_string(),
        },
        404 => match subreddit_from_endpoint(endpoint) {
            Some(subreddit) => RedditApiError::SubredditNotFound { subreddit },
            None => RedditApiError::InvalidResponse {
                details: "Resource not found".to_string(),
            },
        },
        429 => {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<f64>().ok())
                .map(|secs| secs.ceil() as u64)
                .unwrap_or(60);
            warn!("Rate limited, retry after {} seconds", retry_after);
            RedditApiError::RateLimitExceeded { retry_after }
        }
        code if status.is_server_error() => RedditApiError::ServerError { status_code: code },
        code => RedditApiError::InvalidResponse {
            details: format!("Unexpected status {} for {}", code, endpoint),
        },
    }
}

fn subreddit_from_endpoint(endpoint: &str) -> Option<String> {
    endpoint
        .strip_prefix("/r/")
        .and_then(|rest| rest.split('/').next())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use redscribe_core::{ErrorCategory, ErrorExt};

    fn post_data(title: &str, permalink: &str) -> RedditPostData {
        RedditPostData {
            title: title.to_string(),
            selftext: "This is test content".to_string(),
            permalink: permalink.to_string(),
        }
    }

    #[test]
    fn test_api_client_creation() {
        let client = RedditApiClient::new(
            "test-user-agent/1.0",
            "https://oauth.reddit.com",
            Duration::from_secs(30),
        )
        .unwrap();
        assert_eq!(client.user_agent(), "test-user-agent/1.0");
    }

    #[test]
    fn test_api_client_rejects_bad_base() {
        for base in ["not a url", "mailto:someone@example.com"] {
            let error = RedditApiClient::new("ua/1.0", base, Duration::from_secs(5)).unwrap_err();
            match &error {
                CoreError::Config(ConfigError::InvalidValue { field, .. }) => {
                    assert_eq!(field, "reddit.api_base")
                }
                other => panic!("Expected invalid api_base for {}, got {:?}", base, other),
            }
            assert_eq!(error.category(), ErrorCategory::Validation);
        }
    }

    #[test]
    fn test_endpoint_url_encodes_channel() {
        let client =
            RedditApiClient::new("ua/1.0", "https://oauth.reddit.com", Duration::from_secs(5))
                .unwrap();

        let url = client.endpoint_url(&["r", "Baking", "search"]).unwrap();
        assert_eq!(url.as_str(), "https://oauth.reddit.com/r/Baking/search");

        let url = client.endpoint_url(&["r", "a b", "search"]).unwrap();
        assert_eq!(url.as_str(), "https://oauth.reddit.com/r/a%20b/search");

        let url = client.endpoint_url(&["search"]).unwrap();
        assert_eq!(url.as_str(), "https://oauth.reddit.com/search");
    }

    #[test]
    fn test_document_and_reference_from_post() {
        let post = post_data("Test Post", "/r/test/comments/test123/test_post/");

        let document = Document::from(&post);
        assert_eq!(document.title, "Test Post");
        assert_eq!(document.body, "This is test content");

        let reference = post.reference();
        assert_eq!(reference.title, "Test Post");
        assert_eq!(
            reference.url,
            "https://www.reddit.com/r/test/comments/test123/test_post/"
        );
    }

    #[test]
    fn test_permalink_is_not_transformed() {
        assert_eq!(
            permalink_url("/r/Baking/comments/x1/Tip%20A/?utm=1"),
            "https://www.reddit.com/r/Baking/comments/x1/Tip%20A/?utm=1"
        );
    }

    #[test]
    fn test_subreddit_from_endpoint() {
        assert_eq!(
            subreddit_from_endpoint("/r/Baking/search"),
            Some("Baking".to_string())
        );
        assert_eq!(subreddit_from_endpoint("/search"), None);
    }

    #[test]
    fn test_listing_deserializes_sparse_posts() {
        let raw = r#"{
            "kind": "Listing",
            "data": {
                "after": null,
                "children": [
                    {"kind": "t3", "data": {"id": "a1", "title": "Link post", "permalink": "/r/x/comments/a1/"}}
                ]
            }
        }"#;

        let listing: RedditListing<RedditPostData> = serde_json::from_str(raw).unwrap();
        assert_eq!(listing.data.children.len(), 1);
        let post = &listing.data.children[0].data;
        assert_eq!(post.title, "Link post");
        assert_eq!(post.selftext, "");
    }
}
