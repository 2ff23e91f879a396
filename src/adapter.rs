//! The facade that ties query building, scheduling, fetching and fan-out
//! together.
//!
//! ```text
//! add_query_param ─► QueryBuilder ──build_uri()──► FetchJob ◄── Scheduler ticks
//!                                                     │
//!                                  FetchState ◄───────┤
//!                                                     ▼
//!                          subscribe() ─────────► Publisher ──► Subscription
//! ```
//!
//! A *session* lives from `start_stream` to `stop_stream`.  Each session gets
//! a fresh URI, [`FetchState`] and [`Scheduler`]; the publisher and its
//! subscribers outlive sessions.

use std::sync::Arc;

use tracing::info;

use crate::config::FeedConfig;
use crate::error::{AdapterError, FetchError};
use crate::job::{FetchJob, FetchState};
use crate::publisher::{Publisher, PublisherConfig, PublisherStats, Subscription, SubscriptionId};
use crate::query::QueryBuilder;
use crate::scheduler::{Scheduler, SchedulerState, SchedulerStats};
use crate::source::{Article, HttpNewsSource, NewsSource, API_KEY_HEADER};

struct Session {
    job: Arc<FetchJob>,
    scheduler: Scheduler,
}

/// Polls the feed for the configured keywords and republishes new articles.
///
/// Dropping the adapter stops a running stream and waits for the in-flight
/// fetch.
pub struct NewsAdapter {
    config: FeedConfig,
    query: QueryBuilder,
    source: Arc<dyn NewsSource>,
    publisher: Arc<Publisher>,
    session: Option<Session>,
}

impl NewsAdapter {
    pub fn new(config: FeedConfig, source: Arc<dyn NewsSource>) -> Result<Self, AdapterError> {
        let publisher = Publisher::new(PublisherConfig {
            subscriber_capacity: config.subscriber_capacity,
            ..PublisherConfig::default()
        })
        .map_err(|e| AdapterError::Spawn(e.to_string()))?;

        Ok(Self {
            query: QueryBuilder::new(config.base_uri.clone()),
            config,
            source,
            publisher: Arc::new(publisher),
            session: None,
        })
    }

    /// Adapter backed by the blocking HTTP source, with the configured
    /// per-fetch timeout.
    pub fn with_http(config: FeedConfig) -> Result<Self, AdapterError> {
        let source = HttpNewsSource::new(config.fetch_timeout)?;
        Self::new(config, Arc::new(source))
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Add a keyword.  Takes effect at the next `start_stream`.
    pub fn add_query_param(&mut self, keyword: impl Into<String>) {
        self.query.add_query_param(keyword);
    }

    pub fn keywords(&self) -> &[String] {
        self.query.keywords()
    }

    /// Build the query URI and start polling.
    ///
    /// URI problems are reported before anything is scheduled.  Calling this
    /// while a session is running returns [`AdapterError::AlreadyStreaming`];
    /// after `stop_stream` it starts a new session with fresh state.
    pub fn start_stream(&mut self) -> Result<(), AdapterError> {
        if self.is_streaming() {
            return Err(AdapterError::AlreadyStreaming);
        }

        let uri = self.query.build_uri()?;
        let job = Arc::new(FetchJob::new(
            Arc::clone(&self.source),
            uri,
            self.config.api_key.clone(),
            Arc::clone(&self.publisher),
        ));

        let mut scheduler = Scheduler::new(self.config.poll_interval);
        scheduler.start(Arc::clone(&job))?;

        info!(
            uri = %job.uri(),
            keywords = self.query.keywords().len(),
            "news stream started"
        );
        self.session = Some(Session { job, scheduler });
        Ok(())
    }

    /// Stop polling, waiting for an in-flight fetch to commit.  The final
    /// state stays readable through [`state`](Self::state) until the next
    /// start.  No-op when not streaming.
    pub fn stop_stream(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if session.scheduler.state() == SchedulerState::Running {
                session.scheduler.stop();
                info!(
                    calls = session.job.snapshot().call_count,
                    "news stream stopped"
                );
            }
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.scheduler.state() == SchedulerState::Running)
    }

    /// Snapshot of the current (or last) session's state.
    pub fn state(&self) -> Option<FetchState> {
        self.session.as_ref().map(|s| s.job.snapshot())
    }

    pub fn scheduler_stats(&self) -> Option<SchedulerStats> {
        self.session.as_ref().map(|s| s.scheduler.stats())
    }

    pub fn publisher_stats(&self) -> PublisherStats {
        self.publisher.stats()
    }

    pub fn subscribe(&self) -> Subscription {
        self.publisher.subscribe()
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.publisher.unsubscribe(id);
    }

    /// Fetch once for the current keywords, bypassing the session state and
    /// the subscribers.
    pub fn fetch_once(&self) -> Result<Vec<Article>, AdapterError> {
        let uri = self.query.build_uri()?;
        let headers = [(API_KEY_HEADER, self.config.api_key.as_str())];
        let articles = self.source.fetch(&uri, &headers)?;
        if articles.is_empty() {
            return Err(FetchError::EmptyArticles.into());
        }
        Ok(articles)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
