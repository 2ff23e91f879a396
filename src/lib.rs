//! livescroll-news — poll a news API on a timer and fan new articles out to
//! subscribers.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌────────────┐ build_uri ┌───────────┐  tick   ┌───────────┐ fetch ┌────────────┐
//! │ query.rs   │ ────────► │ adapter.rs│ ──────► │ job.rs    │ ────► │ source/    │
//! │ (keywords) │           │ (facade)  │         │ (1 cycle) │       │ (HTTP)     │
//! └────────────┘           └───────────┘         └───────────┘       └────────────┘
//!                               │  ▲                   │ publish(batch)
//!                   start/stop  │  │ subscribe()       ▼
//!                          ┌──────────────┐      ┌──────────────┐
//!                          │ scheduler.rs │      │ publisher.rs │ ──► Subscription
//!                          │ (timer+guard)│      │ (fan-out)    │
//!                          └──────────────┘      └──────────────┘
//! ```
//!
//! * **`query`** — turns keywords into the feed query URI.
//! * **`source`** — the `NewsSource` trait, the `Article` type and the
//!   blocking HTTP implementation.
//! * **`job`** — one polling cycle and the state it accumulates.
//! * **`scheduler`** — fixed-rate ticks on a background thread, skipping a
//!   tick when the previous one is still running.
//! * **`publisher`** — per-subscriber bounded queues fed by a dispatcher
//!   thread.
//! * **`adapter`** — wires everything together behind `NewsAdapter`.
//! * **`config`** / **`error`** — configuration loading and error types.
//!
//! ```no_run
//! use livescroll_news::{FeedConfig, NewsAdapter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = FeedConfig {
//!     api_key: "0123456789abcdef".into(),
//!     ..FeedConfig::default()
//! };
//! let mut adapter = NewsAdapter::with_http(config)?;
//! adapter.add_query_param("india");
//!
//! let subscription = adapter.subscribe();
//! adapter.start_stream()?;
//! while let Some(article) = subscription.recv() {
//!     println!("{}", article.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod config;
pub mod error;
pub mod job;
pub mod publisher;
pub mod query;
pub mod scheduler;
pub mod source;

pub use adapter::NewsAdapter;
pub use config::FeedConfig;
pub use error::{AdapterError, ConfigError, FetchError, SchedulerError};
pub use job::FetchState;
pub use publisher::{PublisherStats, Subscription, SubscriptionId};
pub use scheduler::SchedulerStats;
pub use source::{Article, ArticleSource, HttpNewsSource, NewsSource};
