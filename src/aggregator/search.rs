//! Staged search aggregation for fact-check queries.
//!
//! Runs the plan's stages in order, accumulating raw result batches until
//! each stage's sufficiency threshold says enough has been collected. The
//! per-site calls inside the first stage have no ordering dependency and
//! fan out concurrently with [`futures::future::join_all`]; stages
//! themselves are sequential because each threshold depends on the
//! previous stage's outcome.
//!
//! Aggregation never fails: every per-call error (a dead domain, a
//! transport fault, even a fully exhausted credential pool) is logged at
//! warn level and skipped, and the caller gets whatever the surviving
//! calls produced.

use std::sync::Arc;

use crate::cache::QueryCache;
use crate::client::ProviderTransport;
use crate::config::AggregatorConfig;
use crate::error::Result;
use crate::gateway::Gateway;
use crate::types::{SearchRequest, SearchResult};

use super::dedup::dedupe;
use super::plan::{AggregationPlan, Stage, StageScope};

/// Multi-stage search aggregator over one gateway.
pub struct SearchAggregator<T: ProviderTransport> {
    gateway: Arc<Gateway<T>>,
    plan: AggregationPlan,
    cache: Option<QueryCache>,
}

impl<T: ProviderTransport> SearchAggregator<T> {
    /// Build an aggregator running the fact-check plan from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GatewayError::Config`] for an invalid configuration.
    pub fn new(gateway: Arc<Gateway<T>>, config: &AggregatorConfig) -> Result<Self> {
        config.validate()?;
        let mut plan = AggregationPlan::fact_check(
            config.priority_domains.clone(),
            config.curated_domains.clone(),
        );
        plan.result_cap = config.result_cap;
        let cache = (config.cache_ttl_seconds > 0)
            .then(|| QueryCache::new(config.cache_ttl_seconds));
        Ok(Self {
            gateway,
            plan,
            cache,
        })
    }

    /// Build an aggregator with an explicit plan and no cache.
    pub fn with_plan(gateway: Arc<Gateway<T>>, plan: AggregationPlan) -> Self {
        Self {
            gateway,
            plan,
            cache: None,
        }
    }

    /// Run the staged plan for `query` and return the deduplicated,
    /// capped result set. Never errors; the worst case is empty output.
    pub async fn aggregate(&self, query: &str) -> Vec<SearchResult> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(query).await {
                tracing::debug!(count = hit.len(), "aggregation cache hit");
                return hit;
            }
        }

        let mut collected: Vec<SearchResult> = Vec::new();
        for (stage_index, stage) in self.plan.stages.iter().enumerate() {
            if let Some(threshold) = stage.sufficiency_threshold {
                // Each threshold is checked against the running total at
                // the moment its stage is reached. The checks are
                // independent, not branches of one decision, so the general
                // stage's check still runs after the group stage did.
                // Possibly redundant; preserved deliberately rather than
                // folded into a single branch.
                if collected.len() >= threshold {
                    tracing::debug!(
                        stage = stage_index,
                        collected = collected.len(),
                        threshold,
                        "stage skipped, sufficient results"
                    );
                    continue;
                }
            }
            let batch = self.run_stage(query, stage, stage_index).await;
            collected.extend(batch);
        }

        let finals = dedupe(collected, self.plan.result_cap);
        tracing::debug!(count = finals.len(), "aggregation complete");

        if let Some(cache) = &self.cache {
            cache.insert(query, finals.clone()).await;
        }
        finals
    }

    /// Execute one stage, swallowing per-call failures.
    async fn run_stage(&self, query: &str, stage: &Stage, stage_index: usize) -> Vec<SearchResult> {
        match &stage.scope {
            StageScope::EachSite(domains) => {
                let futures: Vec<_> = domains
                    .iter()
                    .map(|domain| {
                        let request = SearchRequest::new(query)
                            .scoped_to(vec![domain.clone()])
                            .max_results(stage.max_results)
                            .depth(stage.depth);
                        async move { (domain.as_str(), self.gateway.search(request).await) }
                    })
                    .collect();

                let mut results = Vec::new();
                for (domain, outcome) in futures::future::join_all(futures).await {
                    match outcome {
                        Ok(batch) => {
                            tracing::debug!(domain, count = batch.len(), "site search returned");
                            results.extend(batch);
                        }
                        Err(err) => {
                            tracing::warn!(domain, error = %err, "site search failed, skipping");
                        }
                    }
                }
                results
            }
            StageScope::SiteGroup(domains) => {
                let request = SearchRequest::new(query)
                    .scoped_to(domains.clone())
                    .max_results(stage.max_results)
                    .depth(stage.depth);
                self.single_call(request, stage_index).await
            }
            StageScope::Unscoped => {
                let request = SearchRequest::new(query)
                    .max_results(stage.max_results)
                    .depth(stage.depth);
                self.single_call(request, stage_index).await
            }
        }
    }

    async fn single_call(&self, request: SearchRequest, stage_index: usize) -> Vec<SearchResult> {
        match self.gateway.search(request).await {
            Ok(batch) => {
                tracing::debug!(stage = stage_index, count = batch.len(), "stage returned");
                batch
            }
            Err(err) => {
                tracing::warn!(stage = stage_index, error = %err, "stage failed, skipping");
                Vec::new()
            }
        }
    }
}
