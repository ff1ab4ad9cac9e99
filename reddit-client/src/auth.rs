//! App-only OAuth2 for Reddit.
//!
//! Searching public content needs no user consent, so the client-credentials
//! grant is enough. A token is requested per fetch and never stored.

use oauth2::basic::BasicClient;
use oauth2::{
    AuthType, AuthUrl, ClientId, ClientSecret, HttpRequest, HttpResponse, RequestTokenError,
    TokenResponse, TokenUrl,
};
use redscribe_core::{ConfigError, CoreError, RedditApiError, RedditCredentials};
use reqwest::Client;
use tracing::{debug, error};

/// The client-credentials grant never visits this URL, but `BasicClient` requires one.
const REDDIT_AUTHORIZE_URL: &str = "https://www.reddit.com/api/v1/authorize";

pub struct AppOnlyAuthenticator {
    oauth_client: BasicClient,
    http_client: Client,
}

impl AppOnlyAuthenticator {
    pub fn new(
        credentials: &RedditCredentials,
        token_url: &str,
        http_client: Client,
    ) -> Result<Self, CoreError> {
        let auth_url = AuthUrl::new(REDDIT_AUTHORIZE_URL.to_string()).map_err(|e| {
            ConfigError::InvalidValue {
                field: "reddit.authorize_url".to_string(),
                value: e.to_string(),
            }
        })?;
        let token_url =
            TokenUrl::new(token_url.to_string()).map_err(|e| ConfigError::InvalidValue {
                field: "reddit.token_url".to_string(),
                value: e.to_string(),
            })?;

        let oauth_client = BasicClient::new(
            ClientId::new(credentials.client_id.clone()),
            Some(ClientSecret::new(credentials.client_secret.clone())),
            auth_url,
            Some(token_url),
        )
        .set_auth_type(AuthType::BasicAuth);

        Ok(Self {
            oauth_client,
            http_client,
        })
    }

    /// Exchanges the client id and secret for a bearer token.
    pub async fn fetch_token(&self) -> Result<String, CoreError> {
        debug!("Requesting app-only Reddit access token");
        let http_client = self.http_client.clone();

        let result = self
            .oauth_client
            .exchange_client_credentials()
            .request_async(|request| send_token_request(http_client, request))
            .await;

        match result {
            Ok(token) => {
                debug!("Obtained Reddit access token");
                Ok(token.access_token().secret().to_string())
            }
            Err(RequestTokenError::ServerResponse(response)) => {
                error!("Reddit rejected token request: {}", response);
                Err(RedditApiError::AuthenticationFailed {
                    reason: response.error().to_string(),
                }
                .into())
            }
            Err(RequestTokenError::Request(e)) => {
                error!("Token request failed: {}", e);
                if e.is_timeout() {
                    Err(RedditApiError::RequestTimeout.into())
                } else {
                    Err(CoreError::Network(e))
                }
            }
            Err(RequestTokenError::Parse(e, _body)) => {
                error!("Unexpected token response: {}", e);
                Err(RedditApiError::AuthenticationFailed {
                    reason: "token endpoint did not return an access token".to_string(),
                }
                .into())
            }
            Err(RequestTokenError::Other(message)) => {
                error!("Token request failed: {}", message);
                Err(RedditApiError::AuthenticationFailed { reason: message }.into())
            }
        }
    }
}

/// Sends the token request through our own client so Reddit sees the configured user agent.
async fn send_token_request(
    http_client: Client,
    request: HttpRequest,
) -> Result<HttpResponse, reqwest::Error> {
    let response = http_client
        .request(request.method, request.url.as_str())
        .headers(request.headers)
        .body(request.body)
        .send()
        .await?;

    let status_code = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?.to_vec();

    Ok(HttpResponse {
        status_code,
        headers,
        body,
    })
}
