use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use jobmesh_aggregator::{
    AdapterError, AdapterRegistry, AggregateError, AggregationRequest, FailureKind,
    ScrapeOrchestrator, SourceAdapter,
};
use jobmesh_compliance::{ComplianceEngine, DomainPolicy, DomainPolicyStore, PoliteFetcher};
use jobmesh_core::{init_tracing, parse_salary, Posting, RemotePolicy};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

enum Behavior {
    Return(Vec<Posting>),
    Sleep(Duration),
    Fail,
    Panic,
}

struct FakeAdapter {
    name: &'static str,
    behavior: Behavior,
}

impl FakeAdapter {
    fn new(name: &'static str, behavior: Behavior) -> Arc<dyn SourceAdapter> {
        Arc::new(Self { name, behavior })
    }
}

#[async_trait]
impl SourceAdapter for FakeAdapter {
    fn platform_name(&self) -> &str {
        self.name
    }

    async fn scrape(
        &self,
        _keywords: &str,
        _max_pages: u32,
        _cancel: &CancellationToken,
    ) -> Result<Vec<Posting>, AdapterError> {
        match &self.behavior {
            Behavior::Return(postings) => Ok(postings.clone()),
            Behavior::Sleep(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(vec![Posting::new(self.name, "Too Late", "Slow Inc")])
            }
            Behavior::Fail => Err(AdapterError::Parse("unexpected markup".to_string())),
            Behavior::Panic => panic!("adapter bug"),
        }
    }

    async fn scrape_detail(
        &self,
        url: &str,
        _cancel: &CancellationToken,
    ) -> Result<Option<Posting>, AdapterError> {
        match &self.behavior {
            Behavior::Return(postings) => Ok(postings.iter().find(|p| p.url == url).cloned()),
            Behavior::Sleep(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(None)
            }
            Behavior::Fail => Err(AdapterError::Transport("connection reset".to_string())),
            Behavior::Panic => panic!("adapter bug"),
        }
    }
}

fn postings(source: &str, count: usize) -> Vec<Posting> {
    (0..count)
        .map(|i| {
            let mut p = Posting::new(source, format!("Rust Engineer {i}"), "Acme");
            p.url = format!("https://{source}.example/jobs/{i}");
            p
        })
        .collect()
}

fn orchestrator(adapters: Vec<Arc<dyn SourceAdapter>>) -> ScrapeOrchestrator {
    let mut registry = AdapterRegistry::new();
    for adapter in adapters {
        registry.register(adapter).expect("register adapter");
    }
    ScrapeOrchestrator::new(Arc::new(registry)).with_adapter_timeout(Duration::from_secs(30))
}

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

#[tokio::test(start_paused = true)]
async fn test_timeout_partitions_results() {
    let fast = FakeAdapter::new("A", Behavior::Return(postings("a", 3)));
    let slow = FakeAdapter::new("B", Behavior::Sleep(Duration::from_secs(3600)));
    let orchestrator = orchestrator(vec![fast, slow]);

    let started = Instant::now();
    let result = orchestrator
        .scrape_all(&AggregationRequest::default(), &CancellationToken::new())
        .await
        .expect("aggregate");

    assert_eq!(result.jobs_by_source["A"], 3);
    assert_eq!(result.jobs_by_source["B"], 0);
    assert_eq!(result.all_postings.len(), 3);
    assert!(result.all_postings.iter().all(|p| p.source_platform == "a"));

    assert_eq!(result.failed_sources.len(), 1);
    assert_eq!(result.failed_sources[0].source, "B");
    assert_eq!(result.failed_sources[0].kind, FailureKind::TimedOut);

    // Bounded by the per-adapter timeout, not by the slow adapter.
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(30));
    assert!(elapsed < Duration::from_secs(31));
}

#[tokio::test]
async fn test_failing_and_panicking_sources_are_isolated() {
    let good = FakeAdapter::new("Good", Behavior::Return(postings("good", 2)));
    let failing = FakeAdapter::new("Failing", Behavior::Fail);
    let panicking = FakeAdapter::new("Panicking", Behavior::Panic);
    let orchestrator = orchestrator(vec![failing, good, panicking]);

    let result = orchestrator
        .scrape_all(&AggregationRequest::default(), &CancellationToken::new())
        .await
        .expect("aggregate");

    assert_eq!(result.jobs_by_source.len(), 3);
    assert_eq!(result.jobs_by_source["Good"], 2);
    assert_eq!(result.jobs_by_source["Failing"], 0);
    assert_eq!(result.jobs_by_source["Panicking"], 0);
    assert_eq!(result.total_jobs(), 2);

    assert!(result.is_failed("Failing"));
    assert!(result.is_failed("Panicking"));
    assert!(!result.is_failed("Good"));

    let kinds: Vec<_> = result.failed_sources.iter().map(|f| f.kind).collect();
    assert_eq!(kinds, vec![FailureKind::Error, FailureKind::Panicked]);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_fails_the_whole_run() {
    let slow = FakeAdapter::new("Slow", Behavior::Sleep(Duration::from_secs(20)));
    let fast = FakeAdapter::new("Fast", Behavior::Return(postings("fast", 1)));
    let orchestrator = orchestrator(vec![slow, fast]);

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        canceller.cancel();
    });

    let started = Instant::now();
    let result = orchestrator
        .scrape_all(&AggregationRequest::default(), &cancel)
        .await;

    assert!(matches!(result, Err(AggregateError::Cancelled)));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_filtered_postings_are_ranked() {
    let mut low = Posting::new("Board", "Rust Developer", "Acme");
    low.salary_min = Some(5000);
    low.country = Some("Germany".to_string());
    let mut high = low.clone();
    high.salary_min = Some(9000);
    let mut remote = Posting::new("Board", "Senior Rust Engineer", "Globex");
    remote.remote_policy = RemotePolicy::FullyRemote;
    remote.posted_date = Some(fixed_now() - chrono::Duration::days(2));
    let mut underpaid = Posting::new("Board", "Rust Intern", "Initech");
    underpaid.salary_min = Some(1000);
    let java = Posting::new("Board", "Java Developer", "Hooli");

    let adapter = FakeAdapter::new(
        "Board",
        Behavior::Return(vec![low, high, remote, underpaid, java]),
    );
    let orchestrator = orchestrator(vec![adapter]);

    let request = AggregationRequest {
        preferred_stacks: vec!["Rust".to_string()],
        preferred_locations: vec!["Germany".to_string()],
        min_salary: 3000,
        ..AggregationRequest::default()
    };
    let result = orchestrator
        .scrape_all_at(&request, fixed_now(), &CancellationToken::new())
        .await
        .expect("aggregate");

    assert_eq!(result.all_postings.len(), 5);
    let ranked: Vec<_> = result
        .filtered_postings
        .iter()
        .map(|p| (p.title.as_str(), p.salary_min))
        .collect();
    assert_eq!(
        ranked,
        vec![
            ("Senior Rust Engineer", None),
            ("Rust Developer", Some(9000)),
            ("Rust Developer", Some(5000)),
        ]
    );
}

#[tokio::test]
async fn test_scrape_detail_routes_by_platform() {
    let board = FakeAdapter::new("Board", Behavior::Return(postings("board", 2)));
    let failing = FakeAdapter::new("Failing", Behavior::Fail);
    let orchestrator = orchestrator(vec![board, failing]);
    let cancel = CancellationToken::new();

    let found = orchestrator
        .scrape_detail("board", "https://board.example/jobs/1", &cancel)
        .await
        .expect("detail");
    assert_eq!(found.map(|p| p.title), Some("Rust Engineer 1".to_string()));

    let failed = orchestrator
        .scrape_detail("Failing", "https://failing.example/jobs/1", &cancel)
        .await
        .expect("detail");
    assert!(failed.is_none());

    let unknown = orchestrator
        .scrape_detail("Nowhere", "https://nowhere.example", &cancel)
        .await;
    assert!(matches!(unknown, Err(AggregateError::UnknownAdapter { .. })));
}

#[tokio::test]
async fn test_result_serializes_for_reporting() {
    let orchestrator = orchestrator(vec![
        FakeAdapter::new("A", Behavior::Return(postings("a", 1))),
        FakeAdapter::new("B", Behavior::Fail),
    ]);
    let result = orchestrator
        .scrape_all(&AggregationRequest::default(), &CancellationToken::new())
        .await
        .expect("aggregate");

    let json = serde_json::to_value(&result).expect("serialize result");
    assert_eq!(json["jobs_by_source"]["A"], 1);
    assert_eq!(json["failed_sources"][0]["kind"], "error");
}

/// Adapter reading one posting title per line through a polite fetcher.
struct LineFeedAdapter {
    base_url: String,
    fetcher: PoliteFetcher,
}

#[async_trait]
impl SourceAdapter for LineFeedAdapter {
    fn platform_name(&self) -> &str {
        "LineFeed"
    }

    async fn scrape(
        &self,
        keywords: &str,
        max_pages: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<Posting>, AdapterError> {
        let mut found = Vec::new();
        for page in 1..=max_pages {
            let url = format!("{}/jobs?q={keywords}&page={page}", self.base_url);
            let Some(body) = self.fetcher.get_text(&url, cancel).await? else {
                break;
            };
            for line in body.lines().filter(|line| !line.trim().is_empty()) {
                let (title, pay) = line.split_once('|').unwrap_or((line, ""));
                let mut posting = Posting::new("LineFeed", title.trim(), "Feed Co");
                if let Some(range) = parse_salary(pay) {
                    posting.salary_min = Some(range.min);
                    posting.salary_max = Some(range.max);
                    posting.salary_currency = range.currency;
                }
                found.push(posting);
            }
        }
        Ok(found)
    }

    async fn scrape_detail(
        &self,
        _url: &str,
        _cancel: &CancellationToken,
    ) -> Result<Option<Posting>, AdapterError> {
        Ok(None)
    }
}

#[tokio::test]
async fn test_adapter_over_polite_fetcher_stops_at_rate_limit() {
    use httpmock::prelude::*;
    init_tracing(Some("jobmesh_compliance=debug"));

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/robots.txt");
        then.status(404);
    });
    let pages = server.mock(|when, then| {
        when.method(GET).path("/jobs").query_param("q", "rust");
        then.status(200).body("Rust Engineer | €60k - €80k\nRust Developer\n");
    });

    let mut store = DomainPolicyStore::with_builtin();
    store.set_policy(DomainPolicy::new("127.0.0.1", 2, 0, true));
    let engine = Arc::new(ComplianceEngine::new(store));

    let adapter: Arc<dyn SourceAdapter> = Arc::new(LineFeedAdapter {
        base_url: server.base_url(),
        fetcher: PoliteFetcher::new(
            reqwest::Client::new(),
            Some(Arc::clone(&engine)),
            Duration::ZERO,
        ),
    });
    let orchestrator = orchestrator(vec![adapter]);

    let request = AggregationRequest {
        keywords: Some("rust".to_string()),
        max_pages: Some(5),
        ..AggregationRequest::default()
    };
    let result = orchestrator
        .scrape_all(&request, &CancellationToken::new())
        .await
        .expect("aggregate");

    // Two pages fit the budget; the third is rate limited and ends the scrape.
    assert_eq!(result.jobs_by_source["LineFeed"], 4);
    let paid = result
        .all_postings
        .iter()
        .filter(|p| p.salary_min == Some(60_000) && p.salary_max == Some(80_000))
        .count();
    assert_eq!(paid, 2);
    pages.assert_hits(2);
    assert_eq!(engine.get_domain_statistics()["127.0.0.1"].blocked_requests, 1);
}

#[test]
fn test_builtin_catalog_prefers_eu_boards_for_eu_dotnet_request() {
    let orchestrator = orchestrator(Vec::new());
    let names = |boards: Vec<jobmesh_aggregator::BoardProfile>| -> Vec<String> {
        boards.into_iter().map(|b| b.name).collect()
    };

    let neutral = names(orchestrator.recommended_boards(&[], &[]));
    let targeted = names(
        orchestrator.recommended_boards(&["Germany".to_string()], &[".NET".to_string()]),
    );

    assert_eq!(targeted.len(), 10);
    assert!(!neutral.contains(&"EuroDotnetJobs".to_string()));
    assert!(targeted.contains(&"EuroDotnetJobs".to_string()));
    assert_eq!(targeted[1], "StepStone");
}
