//! Query URI construction.
//!
//! Every keyword becomes its own `q` pair, in insertion order, followed by a
//! fixed `language=en`.  Many feed backends treat a repeated `q` as "last
//! value wins" rather than an OR of keywords; the pairs are kept literally
//! regardless.

use url::Url;

use crate::error::AdapterError;

/// Accumulates keywords and turns them into a feed query URI.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    base_uri: String,
    keywords: Vec<String>,
}

impl QueryBuilder {
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            keywords: Vec::new(),
        }
    }

    /// Append a keyword.  Duplicates are kept.  Blank keywords are accepted
    /// too; they produce an empty `q=` pair.
    pub fn add_query_param(&mut self, keyword: impl Into<String>) {
        self.keywords.push(keyword.into());
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Build `{base_uri}?q=<k1>&q=<k2>&...&language=en` from the current
    /// keywords.
    pub fn build_uri(&self) -> Result<Url, AdapterError> {
        if self.keywords.is_empty() {
            return Err(AdapterError::EmptyQueryParams);
        }

        let mut uri = Url::parse(&self.base_uri).map_err(|e| AdapterError::EmptyApiQueryUri {
            reason: format!("{}: {e}", self.base_uri),
        })?;
        if uri.cannot_be_a_base() {
            return Err(AdapterError::EmptyApiQueryUri {
                reason: format!("{} is not a hierarchical URL", self.base_uri),
            });
        }

        {
            let mut pairs = uri.query_pairs_mut();
            for keyword in &self.keywords {
                pairs.append_pair("q", keyword);
            }
            pairs.append_pair("language", "en");
        }

        Ok(uri)
    }
}
