//! # veritas-gateway
//!
//! Multi-credential search provider gateway for the Veritas fact-checker.
//!
//! The crate fronts an external search/crawl provider with a pool of
//! interchangeable credentials and a staged aggregation pipeline that
//! blends per-site, priority-group, and general web search into one
//! deduplicated result set for a fact-checking query.
//!
//! ## Design
//!
//! - [`pool::KeyPool`] rotates an ordered credential list, deactivates
//!   rate-limited keys, and revives them on a monthly cycle or by
//!   operator reset
//! - [`Gateway`] wraps one provider: `search`/`crawl` transparently retry
//!   with the next credential on rate-limit rejections, bounded by pool
//!   exhaustion
//! - [`SearchAggregator`] runs the fixed three-stage fact-check plan with
//!   threshold-based escalation and graceful per-call degradation
//! - A second downstream provider is a second [`Gateway`] instance built
//!   from its own [`GatewayConfig`]
//!
//! ## Security
//!
//! - Credential secrets never appear in error messages, logs, or status
//!   snapshots
//! - Queries are logged only at trace level
//!
//! ## Examples
//!
//! ```no_run
//! # async fn example() -> veritas_gateway::Result<()> {
//! use std::sync::Arc;
//! use veritas_gateway::{AggregatorConfig, Gateway, GatewayConfig, SearchAggregator};
//!
//! let config = GatewayConfig::new(
//!     "tavily",
//!     "https://api.tavily.com/",
//!     vec!["tvly-first".into(), "tvly-second".into()],
//! );
//! let gateway = Arc::new(Gateway::new(&config)?);
//!
//! let aggregator = SearchAggregator::new(
//!     Arc::clone(&gateway),
//!     &AggregatorConfig::new(
//!         vec!["reuters.com".into(), "apnews.com".into()],
//!         vec!["bbc.com".into(), "npr.org".into()],
//!     ),
//! )?;
//!
//! let results = aggregator.aggregate("did the event actually happen").await;
//! for result in &results {
//!     println!("{}: {}", result.title, result.url);
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod pool;
pub mod types;

pub use aggregator::dedup::dedupe;
pub use aggregator::plan::{AggregationPlan, Stage, StageScope};
pub use aggregator::search::SearchAggregator;
pub use client::{HttpTransport, ProviderCall, ProviderTransport};
pub use config::{AggregatorConfig, GatewayConfig};
pub use error::{GatewayError, Result};
pub use gateway::{Gateway, GatewayStatus};
pub use pool::{KeyLease, KeyPool, KeyStatus, PoolStatus};
pub use types::{CrawlRequest, ResultBatch, SearchDepth, SearchRequest, SearchResult};
