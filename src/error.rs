//! Error types for the adapter library.
//!
//! Configuration-time failures ([`AdapterError`], [`ConfigError`]) are
//! returned to the caller.  Per-tick failures ([`FetchError`]) never escape
//! the scheduler; they are logged and stored in
//! [`FetchState::last_error`](crate::job::FetchState::last_error).

use thiserror::Error;

/// Errors surfaced synchronously by [`NewsAdapter`](crate::NewsAdapter).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    /// No keywords were added before building the query or starting.
    #[error("empty query parameters: add at least one keyword")]
    EmptyQueryParams,

    /// The base URI could not be turned into a query URI.
    #[error("empty API query URI: {reason}")]
    EmptyApiQueryUri { reason: String },

    /// `start_stream` was called while a session is already running.
    #[error("news stream is already running")]
    AlreadyStreaming,

    /// A one-shot fetch failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error("failed to spawn publisher thread: {0}")]
    Spawn(String),
}

/// Failure of a single polling cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Network, HTTP status or body-decoding failure.
    #[error("feed transport error: {0}")]
    Transport(String),

    /// The feed answered successfully but returned no articles.
    #[error("no articles present in the response")]
    EmptyArticles,
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Transport(format!("invalid feed body: {e}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("scheduler has already been started")]
    AlreadyStarted,

    #[error("failed to spawn scheduler thread: {0}")]
    Spawn(String),
}

/// Problems loading [`FeedConfig`](crate::config::FeedConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no API key configured (use --api-key, NEWSAPI_KEY or api_key in the config file)")]
    MissingApiKey,

    #[error("{key} must be greater than zero")]
    ZeroDuration { key: &'static str },

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}
