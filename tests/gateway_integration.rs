//! Integration tests for the gateway and aggregation pipeline.
//!
//! These tests exercise credential rotation, pool exhaustion, staged
//! aggregation, and concurrent quota accounting end to end over a
//! scripted transport (no network calls).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use veritas_gateway::{
    AggregatorConfig, Gateway, GatewayConfig, GatewayError, ProviderCall, ProviderTransport,
    ResultBatch, Result, SearchAggregator, SearchRequest, SearchResult,
};

fn make_result(url: &str) -> SearchResult {
    SearchResult {
        title: format!("Title for {url}"),
        url: url.to_string(),
        content: format!("Snippet for {url}"),
        score: 0.8,
        published_date: None,
        source_domain: None,
    }
}

fn make_results(prefix: &str, count: usize) -> Vec<SearchResult> {
    (0..count)
        .map(|i| make_result(&format!("https://{prefix}.example/{i}")))
        .collect()
}

fn gateway_config(keys: usize) -> GatewayConfig {
    GatewayConfig::new(
        "tavily",
        "https://api.tavily.com/",
        (0..keys).map(|i| format!("tvly-{i}")).collect(),
    )
}

/// Transport driven by a closure, recording per-secret success counts.
struct ScriptedTransport<F>
where
    F: Fn(&str, &ProviderCall) -> Result<ResultBatch> + Send + Sync,
{
    script: F,
    served: Mutex<HashMap<String, u32>>,
}

impl<F> ScriptedTransport<F>
where
    F: Fn(&str, &ProviderCall) -> Result<ResultBatch> + Send + Sync,
{
    fn new(script: F) -> Self {
        Self {
            script,
            served: Mutex::new(HashMap::new()),
        }
    }

    fn served_by(&self, secret: &str) -> u32 {
        *self
            .served
            .lock()
            .expect("served map")
            .get(secret)
            .unwrap_or(&0)
    }
}

impl<F> ProviderTransport for ScriptedTransport<F>
where
    F: Fn(&str, &ProviderCall) -> Result<ResultBatch> + Send + Sync,
{
    async fn execute(&self, secret: &str, call: &ProviderCall) -> Result<ResultBatch> {
        let outcome = (self.script)(secret, call);
        if outcome.is_ok() {
            *self
                .served
                .lock()
                .expect("served map")
                .entry(secret.to_string())
                .or_insert(0) += 1;
        }
        outcome
    }
}

// ── Credential rotation and exhaustion ─────────────────────────────────

#[tokio::test]
async fn rate_limited_credential_never_selected_again() {
    // Key 0 always rate limited; key 1 always succeeds.
    let transport = ScriptedTransport::new(|secret: &str, _call: &ProviderCall| {
        if secret == "tvly-0" {
            Err(GatewayError::RateLimited("HTTP 429".into()))
        } else {
            Ok(make_results("ok", 1))
        }
    });
    let gateway = Gateway::with_transport(&gateway_config(2), transport).expect("gateway");

    for _ in 0..5 {
        let results = gateway
            .search(SearchRequest::new("claim"))
            .await
            .expect("key 1 serves");
        assert_eq!(results.len(), 1);
    }

    // Key 0 was deactivated on the first call and served nothing after.
    assert_eq!(gateway.transport().served_by("tvly-0"), 0);
    assert_eq!(gateway.transport().served_by("tvly-1"), 5);

    let status = gateway.status();
    assert!(!status.pool.keys[0].active);
    assert_eq!(status.pool.keys[1].monthly_usage, 5);
}

#[tokio::test]
async fn two_key_pool_exhaustion_is_terminal_not_infinite() {
    let transport = ScriptedTransport::new(|_secret: &str, _call: &ProviderCall| {
        Err(GatewayError::RateLimited("monthly quota exceeded".into()))
    });
    let gateway = Gateway::with_transport(&gateway_config(2), transport).expect("gateway");

    // First search burns both credentials.
    let first = gateway.search(SearchRequest::new("claim")).await;
    assert!(matches!(first, Err(GatewayError::NoAvailableCredentials)));
    assert_eq!(gateway.status().pool.active_keys, 0);

    // Second search must terminate with the same error, not loop.
    let second = gateway.search(SearchRequest::new("claim")).await;
    assert!(matches!(second, Err(GatewayError::NoAvailableCredentials)));
}

#[tokio::test]
async fn usage_counts_only_successful_serving_key() {
    let transport = ScriptedTransport::new(|secret: &str, _call: &ProviderCall| {
        if secret == "tvly-0" {
            Err(GatewayError::RateLimited("HTTP 429".into()))
        } else {
            Ok(make_results("ok", 2))
        }
    });
    let gateway = Gateway::with_transport(&gateway_config(3), transport).expect("gateway");

    for _ in 0..3 {
        gateway
            .search(SearchRequest::new("claim"))
            .await
            .expect("search succeeds");
    }

    let status = gateway.status();
    // Key 0 was forced to quota by deactivation, not by successful use.
    assert_eq!(status.pool.keys[0].monthly_usage, 100);
    assert!(!status.pool.keys[0].active);
    // Key 1 served every successful call; key 2 was never touched.
    assert_eq!(status.pool.keys[1].monthly_usage, 3);
    assert_eq!(status.pool.keys[2].monthly_usage, 0);
    assert_eq!(
        gateway.transport().served_by("tvly-1"),
        status.pool.keys[1].monthly_usage
    );
}

#[tokio::test]
async fn administrative_reset_revives_exhausted_pool() {
    let broken = std::sync::atomic::AtomicBool::new(true);
    let transport = ScriptedTransport::new(move |_secret: &str, _call: &ProviderCall| {
        if broken.swap(false, Ordering::SeqCst) {
            Err(GatewayError::RateLimited("HTTP 429".into()))
        } else {
            Ok(make_results("ok", 1))
        }
    });
    let gateway = Gateway::with_transport(&gateway_config(1), transport).expect("gateway");

    let first = gateway.search(SearchRequest::new("claim")).await;
    assert!(matches!(first, Err(GatewayError::NoAvailableCredentials)));

    gateway.reset_failed_keys();
    let results = gateway
        .search(SearchRequest::new("claim"))
        .await
        .expect("revived key serves");
    assert_eq!(results.len(), 1);
}

// ── Concurrency: no lost quota updates ─────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_searches_lose_no_usage_updates() {
    let transport = ScriptedTransport::new(|_secret: &str, _call: &ProviderCall| Ok(make_results("ok", 1)));
    let gateway = Arc::new(
        Gateway::with_transport(&gateway_config(3), transport).expect("gateway"),
    );

    let mut handles = Vec::new();
    for _ in 0..50 {
        let gateway = Arc::clone(&gateway);
        handles.push(tokio::spawn(async move {
            gateway
                .search(SearchRequest::new("concurrent claim"))
                .await
                .expect("ample quota")
        }));
    }
    for handle in handles {
        handle.await.expect("task");
    }

    let status = gateway.status();
    let total_usage: u32 = status.pool.keys.iter().map(|k| k.monthly_usage).sum();
    assert_eq!(total_usage, 50);

    // Each key's recorded usage matches the calls it actually served.
    for (slot, key) in status.pool.keys.iter().enumerate() {
        let served = gateway.transport().served_by(&format!("tvly-{slot}"));
        assert_eq!(
            key.monthly_usage, served,
            "slot {slot}: usage {} != served {served}",
            key.monthly_usage
        );
    }
}

// ── Staged aggregation ─────────────────────────────────────────────────

fn aggregator_config(priority: usize) -> AggregatorConfig {
    AggregatorConfig {
        priority_domains: (0..priority).map(|i| format!("news{i}.example")).collect(),
        curated_domains: vec!["curated-a.example".into(), "curated-b.example".into()],
        cache_ttl_seconds: 0,
        ..Default::default()
    }
}

#[tokio::test]
async fn empty_sites_plus_productive_group_skips_general() {
    // 8 priority domains return nothing, the group call returns 10, and
    // the general stage is skipped because 10 >= 5.
    let general_called = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&general_called);
    let transport = ScriptedTransport::new(move |_secret: &str, call: &ProviderCall| {
        let request = match call {
            ProviderCall::Search(req) => req,
            ProviderCall::Crawl(_) => unreachable!("aggregator never crawls"),
        };
        match request.site_scope.len() {
            0 => {
                flag.store(true, Ordering::SeqCst);
                Ok(make_results("general", 10))
            }
            1 => Ok(vec![]),
            _ => Ok(make_results("group", 10)),
        }
    });
    let gateway = Arc::new(
        Gateway::with_transport(&gateway_config(2), transport).expect("gateway"),
    );
    let aggregator =
        SearchAggregator::new(Arc::clone(&gateway), &aggregator_config(8)).expect("aggregator");

    let results = aggregator.aggregate("disputed claim").await;
    assert_eq!(results.len(), 10);
    assert!(!general_called.load(Ordering::SeqCst));
}

#[tokio::test]
async fn all_stages_failing_yields_empty_not_error() {
    let transport = ScriptedTransport::new(|_secret: &str, _call: &ProviderCall| {
        Err(GatewayError::Transport("connection reset".into()))
    });
    let gateway = Arc::new(
        Gateway::with_transport(&gateway_config(2), transport).expect("gateway"),
    );
    let aggregator =
        SearchAggregator::new(Arc::clone(&gateway), &aggregator_config(3)).expect("aggregator");

    let results = aggregator.aggregate("claim").await;
    assert!(results.is_empty());
    // Transport failures never deactivate credentials.
    assert_eq!(gateway.status().pool.active_keys, 2);
}

#[tokio::test]
async fn exhausted_pool_mid_aggregation_degrades_gracefully() {
    // The per-site stage succeeds for every domain with key 0, then the
    // provider starts rejecting: the group and general stages fail with
    // pool exhaustion but the aggregation still returns the site results.
    let calls = std::sync::atomic::AtomicU32::new(0);
    let transport = ScriptedTransport::new(move |_secret: &str, call: &ProviderCall| {
        let request = match call {
            ProviderCall::Search(req) => req,
            ProviderCall::Crawl(_) => unreachable!("aggregator never crawls"),
        };
        if request.site_scope.len() == 1 {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![make_result(&format!("https://site.example/{n}"))])
        } else {
            Err(GatewayError::RateLimited("HTTP 429".into()))
        }
    });
    let gateway = Arc::new(
        Gateway::with_transport(&gateway_config(2), transport).expect("gateway"),
    );
    let aggregator =
        SearchAggregator::new(Arc::clone(&gateway), &aggregator_config(3)).expect("aggregator");

    let results = aggregator.aggregate("claim").await;
    assert_eq!(results.len(), 3);
    assert_eq!(gateway.status().pool.active_keys, 0);
}

#[tokio::test]
async fn aggregated_results_deduplicated_and_capped() {
    // Every per-site call returns the same 3 URLs; the group call returns
    // 25 distinct URLs. Dedup keeps the first-seen site URLs, then caps
    // the total at 20.
    let transport = ScriptedTransport::new(|_secret: &str, call: &ProviderCall| {
        let request = match call {
            ProviderCall::Search(req) => req,
            ProviderCall::Crawl(_) => unreachable!("aggregator never crawls"),
        };
        match request.site_scope.len() {
            1 => Ok(make_results("shared", 3)),
            _ => Ok(make_results("group", 25)),
        }
    });
    let gateway = Arc::new(
        Gateway::with_transport(&gateway_config(2), transport).expect("gateway"),
    );
    let aggregator =
        SearchAggregator::new(Arc::clone(&gateway), &aggregator_config(2)).expect("aggregator");

    let results = aggregator.aggregate("claim").await;
    assert_eq!(results.len(), 20);

    // First-seen order: the shared site URLs lead, group URLs follow.
    assert_eq!(results[0].url, "https://shared.example/0");
    assert_eq!(results[3].url, "https://group.example/0");

    let unique: std::collections::HashSet<&str> =
        results.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(unique.len(), results.len());
}

// ── Dedup contract at the public surface ───────────────────────────────

#[test]
fn dedupe_preserves_first_seen_order() {
    let results = vec![
        make_result("https://a.com"),
        make_result("https://b.com"),
        make_result("https://a.com"),
        make_result("https://c.com"),
    ];
    let deduped = veritas_gateway::dedupe(results, 20);
    let urls: Vec<&str> = deduped.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(urls, vec!["https://a.com", "https://b.com", "https://c.com"]);
}

#[test]
fn dedupe_is_idempotent() {
    let results: Vec<SearchResult> = (0..40)
        .map(|i| make_result(&format!("https://site{}.com", i % 25)))
        .collect();
    let once = veritas_gateway::dedupe(results, 20);
    let twice = veritas_gateway::dedupe(once.clone(), 20);
    assert_eq!(
        once.iter().map(|r| &r.url).collect::<Vec<_>>(),
        twice.iter().map(|r| &r.url).collect::<Vec<_>>()
    );
}
