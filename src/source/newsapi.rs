//! HTTP news source for newsapi.org-style endpoints.
//!
//! The body looks like
//! `{"status": "ok", "totalResults": 2, "articles": [...]}` on success and
//! `{"status": "error", "code": "...", "message": "..."}` on failure.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{Article, NewsSource};
use crate::error::FetchError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    total_results: Option<u64>,
    #[serde(default)]
    articles: Option<Vec<Article>>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl FeedResponse {
    fn error(&self) -> Option<FetchError> {
        (self.status.as_deref() == Some("error")).then(|| {
            FetchError::Transport(format!(
                "feed error {}: {}",
                self.code.as_deref().unwrap_or("unknown"),
                self.message.as_deref().unwrap_or("no message"),
            ))
        })
    }
}

/// Parse a feed response body into its articles.
///
/// This is a pure function (no I/O) so that tests can exercise the parsing
/// logic without hitting the network.  A missing or `null` `articles` array
/// yields an empty `Vec`.
pub fn parse_response(body: &str) -> Result<Vec<Article>, FetchError> {
    let response: FeedResponse = serde_json::from_str(body)?;

    if let Some(err) = response.error() {
        return Err(err);
    }

    let articles = response.articles.unwrap_or_default();
    debug!(
        total_results = response.total_results,
        returned = articles.len(),
        "parsed feed response"
    );
    Ok(articles)
}

/// Fetches articles over HTTP with a blocking [`reqwest`] client.
pub struct HttpNewsSource {
    client: reqwest::blocking::Client,
}

impl HttpNewsSource {
    /// Create a source whose every request is bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("livescroll-news/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl NewsSource for HttpNewsSource {
    fn fetch(&self, uri: &Url, headers: &[(&str, &str)]) -> Result<Vec<Article>, FetchError> {
        let mut request = self.client.get(uri.clone());
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send()?;
        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            // The feed usually explains itself in the body.
            let explained = serde_json::from_str::<FeedResponse>(&body)
                .ok()
                .and_then(|r| r.error());
            return Err(explained.unwrap_or_else(|| {
                FetchError::Transport(format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                ))
            }));
        }

        parse_response(&body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_response_extracts_articles_in_order() {
        let body = r#"{
            "status": "ok",
            "totalResults": 2,
            "articles": [
                {
                    "source": {"id": null, "name": "The Hindu"},
                    "author": "Staff",
                    "title": "First",
                    "description": "First description",
                    "url": "https://example.com/1",
                    "urlToImage": null,
                    "publishedAt": "2024-01-01T00:00:00Z",
                    "content": "..."
                },
                {
                    "source": {"id": "reuters", "name": "Reuters"},
                    "author": null,
                    "title": "Second",
                    "description": null,
                    "url": "https://example.com/2",
                    "urlToImage": "https://example.com/2.png",
                    "publishedAt": "2024-01-02T12:00:00Z",
                    "content": null
                }
            ]
        }"#;

        let articles = parse_response(body).unwrap();

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "First");
        assert_eq!(articles[0].source_name(), Some("The Hindu"));
        assert_eq!(articles[1].title, "Second");
        assert_eq!(articles[1].url_to_image, "https://example.com/2.png");
        assert!(articles[1].author.is_none());
    }

    #[test]
    fn missing_articles_is_empty_not_an_error() {
        let articles = parse_response(r#"{"status": "ok", "totalResults": 0}"#).unwrap();
        assert!(articles.is_empty());

        let articles = parse_response(r#"{"status": "ok", "articles": null}"#).unwrap();
        assert!(articles.is_empty());
    }

    #[test]
    fn error_status_is_transport_error_with_message() {
        let body = r#"{"status": "error", "code": "apiKeyInvalid", "message": "Your API key is invalid."}"#;
        let err = parse_response(body).unwrap_err();
        assert_eq!(
            err,
            FetchError::Transport("feed error apiKeyInvalid: Your API key is invalid.".into())
        );
    }

    #[test]
    fn malformed_body_is_transport_error() {
        let err = parse_response("<html>gateway timeout</html>").unwrap_err();
        assert!(matches!(err, FetchError::Transport(msg) if msg.starts_with("invalid feed body")));
    }

    #[test]
    fn client_builds_with_timeout() {
        assert!(HttpNewsSource::new(Duration::from_secs(1)).is_ok());
    }
}
