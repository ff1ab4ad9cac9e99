use reddit_client::RedditClient;
use redscribe_core::{format_references, ContentFetcher, RedditSettings, Reference, SearchQuery};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn post(title: &str, body: &str, permalink: &str) -> serde_json::Value {
    json!({
        "kind": "t3",
        "data": {
            "id": permalink.rsplit('/').next().unwrap_or_default(),
            "title": title,
            "selftext": body,
            "author": "baker",
            "subreddit": "Baking",
            "permalink": permalink,
            "url": format!("https://www.reddit.com{}", permalink),
            "created_utc": 1700000000.0,
            "score": 12,
            "num_comments": 3,
            "is_self": true
        }
    })
}

async fn reddit_with_posts(channel_path: &str, posts: Vec<serde_json::Value>) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "token",
            "token_type": "bearer",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(channel_path))
        .and(query_param("q", "sourdough"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "Listing",
            "data": {"after": null, "before": null, "dist": posts.len(), "children": posts}
        })))
        .expect(1)
        .mount(&server)
        .await;

    server
}

fn settings(server: &MockServer) -> RedditSettings {
    RedditSettings {
        client_id: Some("id".to_string()),
        client_secret: Some("secret".to_string()),
        user_agent: Some("redscribe-test/0.1".to_string()),
        api_base: server.uri(),
        token_url: format!("{}/api/v1/access_token", server.uri()),
        timeout_secs: 5,
    }
}

#[tokio::test]
async fn sourdough_round_trip() {
    let server = reddit_with_posts(
        "/r/Baking/search",
        vec![
            post("Tip A", "text A", "/r/Baking/a"),
            post("Tip B", "text B", "/r/Baking/b"),
        ],
    )
    .await;

    let client = RedditClient::new(&settings(&server));
    let query = SearchQuery::new("sourdough", "Baking", 2, 50).unwrap();
    let content = client.fetch(&query).await.unwrap();

    assert_eq!(
        content.combined_text,
        "Title: Tip A\nText: text A\n\nTitle: Tip B\nText: text B\n\n"
    );
    assert_eq!(
        content.references,
        vec![
            Reference {
                title: "Tip A".to_string(),
                url: "https://www.reddit.com/r/Baking/a".to_string(),
            },
            Reference {
                title: "Tip B".to_string(),
                url: "https://www.reddit.com/r/Baking/b".to_string(),
            },
        ]
    );
    assert_eq!(
        format_references(&content.references),
        "1. [Tip A](https://www.reddit.com/r/Baking/a)\n2. [Tip B](https://www.reddit.com/r/Baking/b)"
    );
}

#[tokio::test]
async fn fewer_results_than_limit() {
    let server = reddit_with_posts(
        "/r/Baking/search",
        vec![post("Only one", "crumb shot", "/r/Baking/comments/one/")],
    )
    .await;

    let client = RedditClient::new(&settings(&server));
    let query = SearchQuery::new("sourdough", "Baking", 10, 50).unwrap();
    let content = client.fetch(&query).await.unwrap();

    assert_eq!(content.document_count(), 1);
    assert_eq!(content.combined_text.matches("Title: ").count(), 1);
}

#[tokio::test]
async fn never_more_than_limit() {
    let posts = (0..5)
        .map(|i| post(&format!("Post {}", i), "body", &format!("/r/Baking/comments/{}/", i)))
        .collect();
    let server = reddit_with_posts("/search", posts).await;

    let client = RedditClient::new(&settings(&server));
    let query = SearchQuery::new("sourdough", "", 3, 50).unwrap();
    let content = client.fetch(&query).await.unwrap();

    assert_eq!(content.document_count(), 3);
    let titles: Vec<&str> = content.references.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Post 0", "Post 1", "Post 2"]);
    assert_eq!(content.combined_text.matches("Title: ").count(), 3);
}
