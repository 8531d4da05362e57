//! Core types for provider requests and search results.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// How thoroughly the provider searches for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    /// Fast, surface-level search.
    Shallow,
    /// Deeper search with richer snippets; slower and costlier.
    Advanced,
}

impl SearchDepth {
    /// Returns the value the provider's wire protocol expects.
    ///
    /// The provider calls the shallow tier "basic".
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Shallow => "basic",
            Self::Advanced => "advanced",
        }
    }
}

impl Default for SearchDepth {
    fn default() -> Self {
        Self::Shallow
    }
}

impl fmt::Display for SearchDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shallow => f.write_str("shallow"),
            Self::Advanced => f.write_str("advanced"),
        }
    }
}

/// A single search operation against the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Query text. Must be non-empty; the gateway rejects blank queries.
    pub query: String,
    /// Domains to restrict the search to. Empty means unscoped.
    pub site_scope: Vec<String>,
    /// Maximum number of results the provider should return.
    pub max_results: usize,
    /// Search depth tier.
    pub depth: SearchDepth,
}

impl SearchRequest {
    /// Create an unscoped shallow request with a default result limit.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            site_scope: Vec::new(),
            max_results: 10,
            depth: SearchDepth::default(),
        }
    }

    /// Restrict the search to the given domains.
    pub fn scoped_to(mut self, domains: Vec<String>) -> Self {
        self.site_scope = domains;
        self
    }

    /// Set the maximum number of results.
    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Set the search depth.
    pub fn depth(mut self, depth: SearchDepth) -> Self {
        self.depth = depth;
        self
    }
}

/// A single crawl operation against the provider.
///
/// Same credential-selection and failover contract as search; only the
/// remote endpoint differs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlRequest {
    /// Page URL to crawl.
    pub url: String,
    /// Maximum number of extracted entries the provider should return.
    pub max_results: usize,
    /// Crawl depth tier.
    pub depth: SearchDepth,
}

impl CrawlRequest {
    /// Create a shallow crawl request with a default result limit.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_results: 10,
            depth: SearchDepth::default(),
        }
    }
}

/// A single result returned from the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The title of the result page.
    pub title: String,
    /// The result URL. Deduplication compares this field verbatim.
    pub url: String,
    /// A text snippet summarising the page content.
    pub content: String,
    /// Provider-supplied relevance score (higher is better).
    pub score: f64,
    /// Publication date if the provider reported one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    /// Host of the result URL, derived when the provider omits it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_domain: Option<String>,
}

/// One batch of results from a single provider call.
pub type ResultBatch = Vec<SearchResult>;

/// Extract the host from a result URL.
///
/// Returns `None` for unparseable or hostless URLs rather than failing
/// the whole result.
pub(crate) fn source_domain_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
}
