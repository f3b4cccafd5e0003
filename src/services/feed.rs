//! Top-news feed client
//!
//! Fetches the upstream listing (by default `https://www.reddit.com/r/news/top.json`)
//! with a fixed user agent. One attempt per call, bounded by the configured timeout.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;

/// Why the upstream listing could not be relayed
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to reach feed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("feed returned status {0}")]
    Status(StatusCode),

    #[error("failed to parse feed body: {0}")]
    Decode(#[source] reqwest::Error),
}

/// HTTP client for the upstream listing
pub struct FeedClient {
    client: Client,
    url: String,
}

impl FeedClient {
    pub fn new(url: impl Into<String>, user_agent: &str, timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, url: url.into() })
    }

    pub fn from_config(config: &Config) -> reqwest::Result<Self> {
        Self::new(&config.feed_url, &config.feed_user_agent, config.feed_timeout)
    }

    /// Fetch the listing and return its JSON body unchanged
    pub async fn top_listing(&self) -> Result<JsonValue, FeedError> {
        info!(url = %self.url, "Fetching top news listing");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(FeedError::Transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FeedError::Status(status));
        }

        let body: JsonValue = response.json().await.map_err(FeedError::Decode)?;

        debug!("Feed listing received");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer) -> FeedClient {
        FeedClient::new(
            format!("{}/r/news/top.json", server.uri()),
            "newsletter-tests",
            Duration::from_secs(2),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_relays_json_body() {
        let server = MockServer::start().await;
        let listing = json!({ "kind": "Listing", "data": { "children": [] } });
        Mock::given(method("GET"))
            .and(path("/r/news/top.json"))
            .and(header("user-agent", "newsletter-tests"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let body = client_for(&server).top_listing().await.unwrap();
        assert_eq!(body, listing);
    }

    #[tokio::test]
    async fn test_non_ok_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&server)
            .await;

        assert_matches!(
            client_for(&server).top_listing().await,
            Err(FeedError::Status(StatusCode::TOO_MANY_REQUESTS))
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        assert_matches!(client_for(&server).top_listing().await, Err(FeedError::Decode(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client = FeedClient::new(
            format!("{}/r/news/top.json", server.uri()),
            "newsletter-tests",
            Duration::from_millis(50),
        )
        .unwrap();

        assert_matches!(client.top_listing().await, Err(FeedError::Transport(_)));
    }
}
