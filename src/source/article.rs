//! The article type delivered by every news source.
//!
//! `Article` mirrors one element of the feed's `articles` array.  It is
//! produced only by a [`NewsSource`](super::NewsSource) and never mutated
//! afterwards; the history, the publisher and the UI all hold clones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The publisher an article came from (`{"id": .., "name": ..}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSource {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A single news article as returned by the feed.
///
/// Every field except `url` may be `null` in real responses, so text fields
/// default to empty strings and the rest are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default)]
    pub source: Option<ArticleSource>,

    #[serde(default)]
    pub author: Option<String>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,

    /// Canonical link to the article.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub url_to_image: String,

    /// Publication timestamp as sent by the feed (RFC 3339).
    #[serde(default, deserialize_with = "null_as_empty")]
    pub published_at: String,

    /// Body text (usually truncated by the feed).
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
}

impl Article {
    /// Name of the publishing source, if the feed supplied one.
    pub fn source_name(&self) -> Option<&str> {
        self.source.as_ref().and_then(|s| s.name.as_deref())
    }

    /// Parsed publication time; `None` when missing or malformed.
    pub fn published(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.published_at)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
