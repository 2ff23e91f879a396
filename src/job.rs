//! One polling cycle: fetch, validate, record, publish.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};
use url::Url;

use crate::error::FetchError;
use crate::publisher::Publisher;
use crate::source::{Article, NewsSource, API_KEY_HEADER};

/// State accumulated across ticks for one streaming session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchState {
    /// Successful fetches so far.
    pub call_count: u64,
    /// Every article ever fetched in this session, in arrival order.
    /// Repeats across ticks are kept.
    pub history: Vec<Article>,
    /// Most recent tick failure; cleared by the next successful tick.
    pub last_error: Option<FetchError>,
}

/// The unit of work the scheduler runs on every tick.
pub struct FetchJob {
    source: Arc<dyn NewsSource>,
    uri: Url,
    api_key: String,
    publisher: Arc<Publisher>,
    state: Mutex<FetchState>,
}

impl FetchJob {
    pub fn new(
        source: Arc<dyn NewsSource>,
        uri: Url,
        api_key: impl Into<String>,
        publisher: Arc<Publisher>,
    ) -> Self {
        Self {
            source,
            uri,
            api_key: api_key.into(),
            publisher,
            state: Mutex::new(FetchState::default()),
        }
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    /// Run one cycle.  On success returns the size of the committed batch.
    ///
    /// A failed cycle only records `last_error`; history and the call count
    /// are untouched.
    pub fn run(&self) -> Result<usize, FetchError> {
        let headers = [(API_KEY_HEADER, self.api_key.as_str())];
        let outcome = self.source.fetch(&self.uri, &headers).and_then(|articles| {
            if articles.is_empty() {
                Err(FetchError::EmptyArticles)
            } else {
                Ok(articles)
            }
        });

        let articles = match outcome {
            Ok(articles) => articles,
            Err(e) => {
                warn!(error = %e, uri = %self.uri, "fetch cycle failed");
                self.lock_state().last_error = Some(e.clone());
                return Err(e);
            }
        };

        let count = articles.len();
        let calls = {
            let mut state = self.lock_state();
            state.history.extend(articles.iter().cloned());
            state.call_count += 1;
            state.last_error = None;
            state.call_count
        };
        info!(calls, batch = count, "fetched articles");

        self.publisher.publish(articles);
        Ok(count)
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> FetchState {
        self.lock_state().clone()
    }

    // A panic inside a fetch never leaves the state half-written, so a
    // poisoned lock is still safe to use.
    fn lock_state(&self) -> MutexGuard<'_, FetchState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::publisher::PublisherConfig;
    use std::collections::VecDeque;
    use std::time::Duration;

    /// Source that replays a script of responses and records the headers it
    /// was called with.
    pub(crate) struct ScriptedSource {
        responses: Mutex<VecDeque<Result<Vec<Article>, FetchError>>>,
        pub(crate) seen_headers: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedSource {
        pub(crate) fn new(responses: Vec<Result<Vec<Article>, FetchError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                seen_headers: Mutex::new(Vec::new()),
            }
        }
    }

    impl NewsSource for ScriptedSource {
        fn fetch(&self, _uri: &Url, headers: &[(&str, &str)]) -> Result<Vec<Article>, FetchError> {
            self.seen_headers.lock().unwrap().extend(
                headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string())),
            );
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(FetchError::EmptyArticles))
        }
    }

    pub(crate) fn articles(prefix: &str, n: usize) -> Vec<Article> {
        (0..n)
            .map(|i| Article {
                title: format!("{prefix}-{i}"),
                url: format!("https://example.com/{prefix}/{i}"),
                ..Article::default()
            })
            .collect()
    }

    fn job(source: ScriptedSource) -> (FetchJob, Arc<Publisher>, Arc<ScriptedSource>) {
        let source = Arc::new(source);
        let publisher = Arc::new(Publisher::new(PublisherConfig::default()).unwrap());
        let uri = Url::parse("https://newsapi.org/v2/everything?q=india&language=en").unwrap();
        let job = FetchJob::new(source.clone(), uri, "secret", Arc::clone(&publisher));
        (job, publisher, source)
    }

    #[test]
    fn successful_cycle_commits_and_publishes() {
        let (job, publisher, source) = job(ScriptedSource::new(vec![Ok(articles("a", 3))]));
        let sub = publisher.subscribe();

        assert_eq!(job.run(), Ok(3));

        let state = job.snapshot();
        assert_eq!(state.call_count, 1);
        assert_eq!(state.history, articles("a", 3));
        assert!(state.last_error.is_none());

        for expected in articles("a", 3) {
            assert_eq!(sub.recv_timeout(Duration::from_secs(2)), Some(expected));
        }

        let headers = source.seen_headers.lock().unwrap().clone();
        assert_eq!(headers, [("X-Api-Key".to_string(), "secret".to_string())]);
    }

    #[test]
    fn empty_response_leaves_state_unchanged() {
        let (job, publisher, _) = job(ScriptedSource::new(vec![Ok(Vec::new())]));
        let sub = publisher.subscribe();

        assert_eq!(job.run(), Err(FetchError::EmptyArticles));

        let state = job.snapshot();
        assert_eq!(state.call_count, 0);
        assert!(state.history.is_empty());
        assert_eq!(state.last_error, Some(FetchError::EmptyArticles));
        assert!(sub.recv_timeout(Duration::from_millis(50)).is_none());
    }

    #[test]
    fn transport_error_leaves_state_unchanged() {
        let err = FetchError::Transport("connection refused".into());
        let (job, _publisher, _) = job(ScriptedSource::new(vec![Err(err.clone())]));

        assert_eq!(job.run(), Err(err.clone()));

        let state = job.snapshot();
        assert_eq!(state.call_count, 0);
        assert!(state.history.is_empty());
        assert_eq!(state.last_error, Some(err));
    }

    #[test]
    fn history_accumulates_repeats_without_dedup() {
        let (job, _publisher, _) = job(ScriptedSource::new(vec![
            Ok(articles("same", 2)),
            Ok(articles("same", 2)),
        ]));

        job.run().unwrap();
        job.run().unwrap();

        let state = job.snapshot();
        assert_eq!(state.call_count, 2);
        assert_eq!(state.history.len(), 4);
        assert_eq!(state.history[0], state.history[2]);
    }

    #[test]
    fn success_clears_previous_error() {
        let (job, _publisher, _) = job(ScriptedSource::new(vec![
            Err(FetchError::Transport("timeout".into())),
            Ok(articles("b", 1)),
        ]));

        assert!(job.run().is_err());
        assert!(job.snapshot().last_error.is_some());

        job.run().unwrap();
        let state = job.snapshot();
        assert!(state.last_error.is_none());
        assert_eq!(state.call_count, 1);
    }

    #[test]
    fn snapshot_is_detached_from_live_state() {
        let (job, _publisher, _) = job(ScriptedSource::new(vec![
            Ok(articles("a", 1)),
            Ok(articles("b", 1)),
        ]));

        job.run().unwrap();
        let before = job.snapshot();
        job.run().unwrap();

        assert_eq!(before.history.len(), 1);
        assert_eq!(job.snapshot().history.len(), 2);
    }
}
