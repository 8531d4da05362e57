//! Multi-stage search aggregation: per-site, priority-group, and general
//! web stages blended into one deduplicated result set.

pub mod dedup;
pub mod plan;
pub mod search;
