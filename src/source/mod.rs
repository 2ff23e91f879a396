//! News source abstraction layer.
//!
//! This module defines the [`NewsSource`] trait, the [`Article`] type and
//! the HTTP implementation that talks to a newsapi.org-style endpoint.
//!
//! ## For contributors — adding a new source
//!
//! 1. Create a new file in this directory.
//! 2. Define a struct and implement [`NewsSource`] for it.
//! 3. Add `mod` below and re-export it in the `pub use` block.
//!
//! The scheduler, fetch job and publisher are all source-agnostic.

mod article;
mod newsapi;

pub use article::{Article, ArticleSource};
pub use newsapi::{parse_response, HttpNewsSource};

use url::Url;

use crate::error::FetchError;

/// Header carrying the static API token.
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Capability to fetch one batch of articles.
///
/// The fetch job calls [`fetch()`](NewsSource::fetch) from the scheduler's
/// worker thread, so implementations must be [`Send`] + [`Sync`].  The call
/// is blocking; implementations should bound it with a timeout.
pub trait NewsSource: Send + Sync {
    /// Perform `GET uri` with the given headers and return the articles in
    /// feed order.  An empty `Vec` is a valid answer; the fetch job decides
    /// what that means.
    fn fetch(&self, uri: &Url, headers: &[(&str, &str)]) -> Result<Vec<Article>, FetchError>;
}
