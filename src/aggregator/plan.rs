//! Aggregation plans: the ordered stages a fact-check query runs through.

use crate::types::SearchDepth;

/// Per-domain result limit in the per-site stage.
pub const PER_SITE_RESULTS: usize = 5;

/// Skip the priority-group stage once this many results are collected.
pub const GROUP_STAGE_THRESHOLD: usize = 8;

/// Result limit for the single priority-group call.
pub const GROUP_RESULTS: usize = 15;

/// Skip the general stage once this many results are collected.
pub const GENERAL_STAGE_THRESHOLD: usize = 5;

/// Result limit for the single general web call.
pub const GENERAL_RESULTS: usize = 10;

/// Final cap on the deduplicated result set.
pub const RESULT_CAP: usize = 20;

/// What a stage's provider calls are scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageScope {
    /// One call per listed domain, issued concurrently and merged.
    EachSite(Vec<String>),
    /// One call scoped to the whole domain group.
    SiteGroup(Vec<String>),
    /// One unscoped call against the general web index.
    Unscoped,
}

/// One stage of an aggregation plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub scope: StageScope,
    /// Result limit for each provider call this stage issues.
    pub max_results: usize,
    /// Skip the stage when the running total has already reached this
    /// count. `None` means the stage always runs.
    pub sufficiency_threshold: Option<usize>,
    /// Depth tier for this stage's calls.
    pub depth: SearchDepth,
}

/// An ordered list of stages plus the final result cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationPlan {
    pub stages: Vec<Stage>,
    pub result_cap: usize,
}

impl AggregationPlan {
    /// The fixed three-stage fact-checking plan.
    ///
    /// 1. Per-site: one advanced call per priority news domain, always run.
    /// 2. Priority group: one advanced call over the curated list, skipped
    ///    at 8 or more collected results.
    /// 3. General: one unscoped advanced call, skipped at 5 or more.
    pub fn fact_check(priority_domains: Vec<String>, curated_domains: Vec<String>) -> Self {
        Self {
            stages: vec![
                Stage {
                    scope: StageScope::EachSite(priority_domains),
                    max_results: PER_SITE_RESULTS,
                    sufficiency_threshold: None,
                    depth: SearchDepth::Advanced,
                },
                Stage {
                    scope: StageScope::SiteGroup(curated_domains),
                    max_results: GROUP_RESULTS,
                    sufficiency_threshold: Some(GROUP_STAGE_THRESHOLD),
                    depth: SearchDepth::Advanced,
                },
                Stage {
                    scope: StageScope::Unscoped,
                    max_results: GENERAL_RESULTS,
                    sufficiency_threshold: Some(GENERAL_STAGE_THRESHOLD),
                    depth: SearchDepth::Advanced,
                },
            ],
            result_cap: RESULT_CAP,
        }
    }
}
