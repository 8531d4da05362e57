//! Gateway and aggregator configuration with explicit validation.
//!
//! Credential secrets are supplied as an ordered list at construction time
//! (the order is also the rotation order) and validated once at startup.

use url::Url;

use crate::aggregator::plan::RESULT_CAP;
use crate::error::GatewayError;

/// Default monthly call quota per credential.
pub const DEFAULT_QUOTA_LIMIT: u32 = 100;

/// Default per-call HTTP timeout in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// Configuration for one provider gateway instance.
///
/// A second downstream provider is a second `GatewayConfig` with its own
/// label, base URL, and credential list, not a special case.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Human-readable provider label, carried on status snapshots so two
    /// gateway instances are distinguishable at the operational endpoint.
    pub provider: String,
    /// Base URL of the provider's API. The `search` and `crawl` endpoints
    /// are resolved relative to it.
    pub base_url: String,
    /// Ordered credential secrets. The order is the rotation order.
    pub api_keys: Vec<String>,
    /// Monthly call quota per credential.
    pub quota_limit: u32,
    /// Per-call HTTP timeout in seconds. Timeouts classify as transport
    /// failures, not rate limits.
    pub timeout_seconds: u64,
}

impl GatewayConfig {
    /// Build a config with default quota and timeout.
    pub fn new(
        provider: impl Into<String>,
        base_url: impl Into<String>,
        api_keys: Vec<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            base_url: base_url.into(),
            api_keys,
            quota_limit: DEFAULT_QUOTA_LIMIT,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `api_keys` must be non-empty, with no blank and no duplicate secrets
    /// - `quota_limit` must be greater than 0
    /// - `timeout_seconds` must be greater than 0
    /// - `base_url` must parse as an http(s) URL
    pub fn validate(&self) -> Result<(), GatewayError> {
        validate_secrets(&self.api_keys)?;
        if self.quota_limit == 0 {
            return Err(GatewayError::Config(
                "quota_limit must be greater than 0".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(GatewayError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        let parsed = Url::parse(&self.base_url)
            .map_err(|e| GatewayError::Config(format!("base_url is not a valid URL: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(GatewayError::Config(
                "base_url must use http or https".into(),
            ));
        }
        Ok(())
    }
}

/// Validate an ordered credential list: non-empty, no blank secrets, no
/// duplicates. Error messages never echo the secrets themselves.
pub(crate) fn validate_secrets(secrets: &[String]) -> Result<(), GatewayError> {
    if secrets.is_empty() {
        return Err(GatewayError::Config("api_keys must not be empty".into()));
    }
    let mut seen = std::collections::HashSet::with_capacity(secrets.len());
    for (slot, secret) in secrets.iter().enumerate() {
        if secret.trim().is_empty() {
            return Err(GatewayError::Config(format!(
                "api_keys[{slot}] is blank"
            )));
        }
        if !seen.insert(secret.as_str()) {
            return Err(GatewayError::Config(format!(
                "api_keys[{slot}] duplicates an earlier secret"
            )));
        }
    }
    Ok(())
}

/// Configuration for the multi-stage search aggregator.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Named high-priority news domains, searched one call per domain in
    /// the first stage.
    pub priority_domains: Vec<String>,
    /// Curated domain list for the single group-scoped second stage.
    pub curated_domains: Vec<String>,
    /// Maximum number of deduplicated results to return.
    pub result_cap: usize,
    /// How long to cache aggregated results in seconds. 0 disables caching.
    pub cache_ttl_seconds: u64,
}

impl AggregatorConfig {
    /// Build a config for the given domain lists with default cap and TTL.
    pub fn new(priority_domains: Vec<String>, curated_domains: Vec<String>) -> Self {
        Self {
            priority_domains,
            curated_domains,
            ..Default::default()
        }
    }

    /// Validates this configuration.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.result_cap == 0 {
            return Err(GatewayError::Config(
                "result_cap must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            priority_domains: Vec::new(),
            curated_domains: Vec::new(),
            result_cap: RESULT_CAP,
            cache_ttl_seconds: 600,
        }
    }
}
