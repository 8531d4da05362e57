//! Provider gateway: credential-rotation failover around one downstream
//! search/crawl provider.
//!
//! A [`Gateway`] is an explicit service object constructed once at process
//! start and shared (by `Arc`) with request handlers; there is no
//! module-level singleton. A second downstream provider is simply a second
//! `Gateway` built from its own [`GatewayConfig`].

use serde::Serialize;

use crate::client::{HttpTransport, ProviderCall, ProviderTransport};
use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::pool::{KeyPool, PoolStatus};
use crate::types::{CrawlRequest, ResultBatch, SearchRequest};

/// Operational snapshot of one gateway instance.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayStatus {
    /// Provider label from the configuration.
    pub provider: String,
    #[serde(flatten)]
    pub pool: PoolStatus,
}

/// A multi-credential gateway to one search/crawl provider.
///
/// Owns the credential pool and a transport. `search` and `crawl` share
/// the same contract: select a credential, execute, and on a rate-limit
/// rejection deactivate that credential and retry with the next one,
/// until the pool is exhausted.
#[derive(Debug)]
pub struct Gateway<T = HttpTransport> {
    provider: String,
    pool: KeyPool,
    transport: T,
}

impl Gateway<HttpTransport> {
    /// Build a gateway with the production HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] for an invalid configuration.
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        Self::with_transport(config, transport)
    }
}

impl<T: ProviderTransport> Gateway<T> {
    /// Build a gateway over a custom transport. Used by tests and by
    /// callers that wrap the wire layer.
    pub fn with_transport(config: &GatewayConfig, transport: T) -> Result<Self> {
        config.validate()?;
        let pool = KeyPool::new(config.api_keys.clone(), config.quota_limit)?;
        Ok(Self {
            provider: config.provider.clone(),
            pool,
            transport,
        })
    }

    /// The configured provider label.
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Search the provider, rotating credentials on rate-limit rejections.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::Config`] for a blank query
    /// - [`GatewayError::NoAvailableCredentials`] when every configured
    ///   credential has been exhausted
    /// - [`GatewayError::Transport`] for non-quota failures, propagated
    ///   immediately without consuming another credential
    pub async fn search(&self, request: SearchRequest) -> Result<ResultBatch> {
        if request.query.trim().is_empty() {
            return Err(GatewayError::Config("query must not be empty".into()));
        }
        self.call(ProviderCall::Search(request)).await
    }

    /// Crawl a page through the provider. Same credential-selection and
    /// failover contract as [`Gateway::search`].
    ///
    /// # Errors
    ///
    /// Same as [`Gateway::search`], with a blank URL as the config case.
    pub async fn crawl(&self, request: CrawlRequest) -> Result<ResultBatch> {
        if request.url.trim().is_empty() {
            return Err(GatewayError::Config("url must not be empty".into()));
        }
        self.call(ProviderCall::Crawl(request)).await
    }

    /// Execute one call with bounded credential rotation.
    ///
    /// The pool lock is only held inside `select`/`report_*`; never across
    /// the network await. At most one attempt per configured key: selection
    /// can keep handing out slot 0 after a fruitless monthly reset pass, so
    /// the bound, not selection, is what guarantees termination.
    async fn call(&self, call: ProviderCall) -> Result<ResultBatch> {
        let attempts = self.pool.key_count().max(1);
        for _ in 0..attempts {
            let lease = match self.pool.select() {
                Some(lease) => lease,
                None => break,
            };
            match self.transport.execute(lease.secret(), &call).await {
                Ok(batch) => {
                    self.pool.report_success(&lease);
                    return Ok(batch);
                }
                Err(GatewayError::RateLimited(reason)) => {
                    tracing::warn!(
                        provider = %self.provider,
                        slot = lease.slot,
                        %reason,
                        "credential rate limited, rotating"
                    );
                    self.pool.report_failure(&lease);
                }
                Err(other) => return Err(other),
            }
        }
        tracing::warn!(provider = %self.provider, "credential pool exhausted");
        Err(GatewayError::NoAvailableCredentials)
    }

    /// Read-only operational snapshot. Never exposes credential secrets.
    pub fn status(&self) -> GatewayStatus {
        GatewayStatus {
            provider: self.provider.clone(),
            pool: self.pool.status(),
        }
    }

    /// Administrative reset of every credential, used by the operator
    /// "reset" action. Not time-gated, unlike the automatic monthly pass.
    pub fn reset_failed_keys(&self) {
        tracing::info!(provider = %self.provider, "administrative credential reset");
        self.pool.reset_all();
    }
}
