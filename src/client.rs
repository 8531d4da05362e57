//! Provider call wrapper: the transport seam, the HTTP implementation,
//! and rate-limit classification.
//!
//! [`ProviderTransport`] is the trait boundary between the gateway's
//! credential-rotation logic and the wire. The production implementation
//! is [`HttpTransport`] over `reqwest`; tests substitute their own.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::types::{source_domain_of, CrawlRequest, ResultBatch, SearchRequest, SearchResult};

/// One remote operation, bound to a credential at execution time.
#[derive(Debug, Clone)]
pub enum ProviderCall {
    /// Query the provider's search endpoint.
    Search(SearchRequest),
    /// Ask the provider to crawl a specific page.
    Crawl(CrawlRequest),
}

impl ProviderCall {
    /// Endpoint path relative to the provider base URL.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Search(_) => "search",
            Self::Crawl(_) => "crawl",
        }
    }
}

/// A pluggable provider transport.
///
/// Implementors execute one call with one credential and translate
/// provider failures into the gateway error taxonomy:
///
/// - HTTP 429, or an error body carrying a rate-limit/quota indicator,
///   becomes [`GatewayError::RateLimited`]
/// - everything else (network failure, timeout, malformed response,
///   non-quota 4xx/5xx) becomes [`GatewayError::Transport`]
///
/// All implementations must be `Send + Sync`; the gateway is shared
/// across concurrent request handlers.
pub trait ProviderTransport: Send + Sync {
    /// Execute `call` with the given credential secret.
    fn execute(
        &self,
        secret: &str,
        call: &ProviderCall,
    ) -> impl Future<Output = Result<ResultBatch>> + Send;
}

/// Production transport over the provider's JSON API.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    /// Build a transport from gateway configuration.
    ///
    /// The per-call timeout comes from `config.timeout_seconds`; a timeout
    /// surfaces as a transport failure and never deactivates a credential.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] for an unparseable base URL and
    /// [`GatewayError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| GatewayError::Config(format!("base_url is not a valid URL: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| GatewayError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, base_url })
    }
}

impl ProviderTransport for HttpTransport {
    async fn execute(&self, secret: &str, call: &ProviderCall) -> Result<ResultBatch> {
        let endpoint = self
            .base_url
            .join(call.endpoint())
            .map_err(|e| GatewayError::Transport(format!("bad endpoint URL: {e}")))?;

        tracing::trace!(endpoint = call.endpoint(), "provider request");

        let response = self
            .client
            .post(endpoint)
            .json(&WireRequest::new(secret, call))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Transport(format!("provider request timed out: {e}"))
                } else {
                    GatewayError::Transport(format!("provider request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_http_failure(status.as_u16(), &body));
        }

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(format!("provider response parse failed: {e}")))?;

        let results = wire.into_results();
        tracing::debug!(
            endpoint = call.endpoint(),
            count = results.len(),
            "provider results received"
        );
        Ok(results)
    }
}

/// Classify a non-success HTTP response into the gateway error taxonomy.
pub(crate) fn classify_http_failure(status: u16, body: &str) -> GatewayError {
    let snippet: String = body.chars().take(200).collect();
    if status == 429 || is_rate_limit_message(body) {
        GatewayError::RateLimited(format!("HTTP {status}: {snippet}"))
    } else {
        GatewayError::Transport(format!("provider returned HTTP {status}: {snippet}"))
    }
}

/// Does a provider error message indicate quota or rate-limit rejection?
pub(crate) fn is_rate_limit_message(message: &str) -> bool {
    const INDICATORS: &[&str] = &[
        "rate limit",
        "rate-limit",
        "too many requests",
        "quota",
        "usage limit",
    ];
    let lower = message.to_ascii_lowercase();
    INDICATORS.iter().any(|needle| lower.contains(needle))
}

/// Request envelope for both provider endpoints. Fields that do not apply
/// to the call at hand are omitted from the JSON body.
#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    api_key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
    search_depth: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    include_domains: Vec<&'a str>,
    max_results: usize,
}

impl<'a> WireRequest<'a> {
    fn new(secret: &'a str, call: &'a ProviderCall) -> Self {
        match call {
            ProviderCall::Search(req) => Self {
                api_key: secret,
                query: Some(&req.query),
                url: None,
                search_depth: req.depth.as_wire(),
                include_domains: req.site_scope.iter().map(String::as_str).collect(),
                max_results: req.max_results,
            },
            ProviderCall::Crawl(req) => Self {
                api_key: secret,
                query: None,
                url: Some(&req.url),
                search_depth: req.depth.as_wire(),
                include_domains: Vec::new(),
                max_results: req.max_results,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    results: Vec<WireResult>,
}

#[derive(Debug, Deserialize)]
struct WireResult {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    score: f64,
    #[serde(default)]
    published_date: Option<String>,
}

impl WireResponse {
    fn into_results(self) -> ResultBatch {
        self.results
            .into_iter()
            .map(|r| {
                let source_domain = source_domain_of(&r.url);
                SearchResult {
                    title: r.title,
                    url: r.url,
                    content: r.content,
                    score: r.score,
                    published_date: r.published_date,
                    source_domain,
                }
            })
            .collect()
    }
}
