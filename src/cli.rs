//! Command-line interface definitions.
//!
//! Every feed setting can come from a flag, an environment variable or the
//! YAML config file; flags and env vars win over the file.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use livescroll_news::{ConfigError, FeedConfig};

/// Live-scrolling news feed for the terminal.
///
/// # Examples
///
/// ```sh
/// # Follow two keywords, key from the environment
/// NEWSAPI_KEY=... livescroll-news -k india -k monsoon
///
/// # Print one batch as JSON and exit
/// livescroll-news -k india --once --api-key ...
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Keyword to search for (repeat for more; each becomes its own `q` parameter)
    #[arg(short = 'k', long = "keyword", required = true)]
    pub keywords: Vec<String>,

    /// Feed API key, sent as the X-Api-Key header
    #[arg(long, env = "NEWSAPI_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Feed base URI (defaults to https://newsapi.org/v2/everything)
    #[arg(long, env = "NEWSAPI_BASE_URI")]
    pub base_uri: Option<String>,

    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Seconds between polls
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Fetch once, print the articles as JSON and exit
    #[arg(long)]
    pub once: bool,

    /// Write logs to this file (the TUI otherwise discards them)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Resolve the feed configuration: defaults, then the config file, then
    /// flags and env vars.
    pub fn feed_config(&self) -> Result<FeedConfig, ConfigError> {
        let mut cfg = match &self.config {
            Some(path) => FeedConfig::from_yaml_file(path)?,
            None => FeedConfig::default(),
        };

        if let Some(key) = &self.api_key {
            cfg.api_key = key.clone();
        }
        if let Some(uri) = &self.base_uri {
            cfg.base_uri = uri.clone();
        }
        if let Some(secs) = self.interval {
            cfg.poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = self.timeout {
            cfg.fetch_timeout = Duration::from_secs(secs);
        }

        cfg.validate()?;
        Ok(cfg)
    }
}
