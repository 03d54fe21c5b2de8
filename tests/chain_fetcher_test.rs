//! Chain Fetcher Tests - Concurrent Dispatch, Merge, Timeout, Fatal Path
//!
//! Drives the fetcher through a stub transport with per-route delays so
//! the joint-timeout and abandonment behaviour can be observed. The fatal
//! credential hook is a mockall mock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use mockall::mock;
use serde_json::{Value, json};

use sleet_api::domain::ContractSide;
use sleet_api::error::{ChainError, SlotSide, TransportError};
use sleet_api::ports::fatal::{FatalSignal, LogFatal};
use sleet_api::ports::transport::{HttpRequest, HttpResponse, Transport};
use sleet_api::usecases::{ChainFetcher, ChainRequest, FailurePolicy};
use sleet_api::{BrokerClient, ClientConfig, Credentials};

// ---- Mock Definitions ----

mock! {
    pub Fatal {}

    impl FatalSignal for Fatal {
        fn credential_rejected(&self, detail: &str);
    }
}

// ---- Stub Transport ----

struct Route {
    needle: &'static str,
    delay: Duration,
    status: u16,
    body: String,
}

/// Answers by the first route whose needle occurs in the URL.
#[derive(Default)]
struct StubTransport {
    routes: Vec<Route>,
    seen: Mutex<Vec<HttpRequest>>,
    completed: AtomicUsize,
}

impl StubTransport {
    fn route(mut self, needle: &'static str, delay_ms: u64, status: u16, body: &Value) -> Self {
        self.routes.push(Route {
            needle,
            delay: Duration::from_millis(delay_ms),
            status,
            body: body.to_string(),
        });
        self
    }

    fn raw_route(mut self, needle: &'static str, status: u16, body: &str) -> Self {
        self.routes.push(Route {
            needle,
            delay: Duration::ZERO,
            status,
            body: body.to_string(),
        });
        self
    }

    fn seen_urls(&self) -> Vec<String> {
        self.seen.lock().unwrap().iter().map(|r| r.url.clone()).collect()
    }
}

#[async_trait::async_trait]
impl Transport for StubTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.seen.lock().unwrap().push(request.clone());
        let route = self
            .routes
            .iter()
            .find(|r| request.url.contains(r.needle))
            .ok_or_else(|| TransportError::Request(format!("no route for {}", request.url)))?;
        tokio::time::sleep(route.delay).await;
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(HttpResponse::new(route.status, route.body.clone()))
    }
}

// ---- Fixtures ----

fn side_map(put_call: &str, strike: f64) -> Value {
    let strike_key = format!("{strike:.1}");
    let delta = if put_call == "CALL" { 0.45 } else { -0.55 };
    json!({
        "2024-09-20:5": {
            (strike_key): [{
                "putCall": put_call,
                "symbol": format!("SPY_092024{}{strike}", &put_call[..1]),
                "strikePrice": strike,
                "bid": 1.20,
                "ask": 1.30,
                "mark": 1.25,
                "delta": delta,
                "openInterest": 1200,
                "daysToExpiration": 5
            }]
        }
    })
}

fn chain_body(calls: Value, puts: Value) -> Value {
    json!({
        "symbol": "SPY",
        "status": "SUCCESS",
        "underlyingPrice": 550.12,
        "interestRate": 4.5,
        "volatility": 29.0,
        "callExpDateMap": calls,
        "putExpDateMap": puts
    })
}

fn fetcher(transport: StubTransport, timeout_ms: u64) -> (ChainFetcher, Arc<StubTransport>) {
    fetcher_with_signal(transport, timeout_ms, Arc::new(LogFatal))
}

fn fetcher_with_signal(
    transport: StubTransport,
    timeout_ms: u64,
    signal: Arc<dyn FatalSignal>,
) -> (ChainFetcher, Arc<StubTransport>) {
    let transport = Arc::new(transport);
    let markers = ClientConfig::default().credential_error_markers;
    let fetcher = ChainFetcher::new(
        Arc::clone(&transport) as Arc<dyn Transport>,
        Arc::new(FailurePolicy::new(markers, signal)),
        Duration::from_millis(timeout_ms),
    );
    (fetcher, transport)
}

fn untagged(url: &str) -> ChainRequest {
    ChainRequest::untagged(HttpRequest::get(url))
}

fn tagged(side: ContractSide, url: &str) -> ChainRequest {
    ChainRequest::tagged(side, HttpRequest::get(url))
}

// ---- Merge ----

#[tokio::test]
async fn test_two_sided_fetch_populates_both_sides() {
    let transport = StubTransport::default()
        .route("contractType=CALL", 20, 200, &chain_body(side_map("CALL", 560.0), json!({})))
        .route("contractType=PUT", 5, 200, &chain_body(json!({}), side_map("PUT", 540.0)));
    let transport = Arc::new(transport);

    let config = ClientConfig::default().with_base_url("https://api.example.com/");
    let client = BrokerClient::with_transport(
        config,
        Credentials::new("KEY", "SECRET"),
        Arc::clone(&transport) as Arc<dyn Transport>,
        Arc::new(LogFatal),
    )
    .unwrap();

    let chain = client.quotes().option_chain("SPY", None).await.unwrap();

    assert!(chain.is_complete());
    assert_eq!(chain.symbol.as_deref(), Some("SPY"));
    assert!(chain.calls()["2024-09-20:5"].contains_key("560.0"));
    assert!(chain.puts()["2024-09-20:5"].contains_key("540.0"));
    assert_eq!(chain.contract_count(), 2);

    let urls = transport.seen_urls();
    assert_eq!(urls.len(), 2);
    assert!(urls.iter().all(|u| u.contains("symbol=SPY") && u.contains("strikeCount=100")));
    assert!(urls.iter().any(|u| u.ends_with("contractType=CALL")));
    assert!(urls.iter().any(|u| u.ends_with("contractType=PUT")));
}

#[tokio::test]
async fn test_tagged_merge_does_not_depend_on_slot_order() {
    let transport = StubTransport::default()
        .route("side=put", 0, 200, &chain_body(json!({}), side_map("PUT", 540.0)))
        .route("side=call", 30, 200, &chain_body(side_map("CALL", 560.0), json!({})));
    let (fetcher, _) = fetcher(transport, 1000);

    let chain = fetcher
        .fetch(vec![
            tagged(ContractSide::Put, "https://stub/chains?side=put"),
            tagged(ContractSide::Call, "https://stub/chains?side=call"),
        ])
        .await
        .unwrap();

    assert_eq!(chain.contracts_for(ContractSide::Call).count(), 1);
    assert_eq!(chain.contracts_for(ContractSide::Put).count(), 1);
}

#[tokio::test]
async fn test_inferred_merge_with_empty_base_calls_and_null_puts() {
    // {calls: {}, puts: null} + {calls: null, puts: {...}}
    let transport = StubTransport::default()
        .route("slot=0", 0, 200, &chain_body(json!({}), Value::Null))
        .route("slot=1", 0, 200, &chain_body(Value::Null, side_map("PUT", 540.0)));
    let (fetcher, _) = fetcher(transport, 1000);

    let chain = fetcher
        .fetch(vec![
            untagged("https://stub/chains?slot=0"),
            untagged("https://stub/chains?slot=1"),
        ])
        .await
        .unwrap();

    // Base calls were empty, so the other slot's call map was assigned and
    // its put data was dropped.
    assert!(chain.is_complete());
    assert!(chain.calls().is_empty());
    assert!(chain.puts().is_empty());
    assert_eq!(chain.symbol.as_deref(), Some("SPY"));
}

#[tokio::test]
async fn test_inferred_merge_with_populated_base_calls_takes_other_puts() {
    let transport = StubTransport::default()
        .route("slot=0", 0, 200, &chain_body(side_map("CALL", 560.0), Value::Null))
        .route("slot=1", 0, 200, &chain_body(Value::Null, side_map("PUT", 540.0)));
    let (fetcher, _) = fetcher(transport, 1000);

    let chain = fetcher
        .fetch(vec![
            untagged("https://stub/chains?slot=0"),
            untagged("https://stub/chains?slot=1"),
        ])
        .await
        .unwrap();

    assert!(chain.is_complete());
    assert!(chain.calls()["2024-09-20:5"].contains_key("560.0"));
    assert!(chain.puts()["2024-09-20:5"].contains_key("540.0"));
}

#[tokio::test]
async fn test_single_request_defaults_missing_side() {
    let transport = StubTransport::default().route(
        "chains",
        0,
        200,
        &json!({"symbol": "SPY", "callExpDateMap": side_map("CALL", 560.0)}),
    );
    let (fetcher, _) = fetcher(transport, 1000);

    let chain = fetcher
        .fetch_single(HttpRequest::get("https://stub/chains?symbol=SPY"))
        .await
        .unwrap();

    assert!(chain.is_complete());
    assert!(chain.puts().is_empty());
    assert_eq!(chain.contract_count(), 1);
}

// ---- Failure ----

#[tokio::test]
async fn test_timeout_reports_failure_and_abandons_outstanding_slot() {
    let transport = StubTransport::default()
        .route("contractType=CALL", 0, 200, &chain_body(side_map("CALL", 560.0), json!({})))
        .route("contractType=PUT", 300, 200, &chain_body(json!({}), side_map("PUT", 540.0)));
    let (fetcher, transport) = fetcher(transport, 50);

    let started = Instant::now();
    let result = fetcher
        .fetch(vec![
            tagged(ContractSide::Call, "https://stub/chains?contractType=CALL"),
            tagged(ContractSide::Put, "https://stub/chains?contractType=PUT"),
        ])
        .await;

    assert_eq!(result, Err(ChainError::TimedOut { timeout_ms: 50 }));
    assert!(started.elapsed() < Duration::from_millis(250));

    // The PUT slot was aborted; its response never lands.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(transport.completed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_non_200_slot_makes_chain_unavailable() {
    let transport = StubTransport::default()
        .route("contractType=CALL", 0, 200, &chain_body(side_map("CALL", 560.0), json!({})))
        .raw_route("contractType=PUT", 503, "Service Unavailable");
    let (fetcher, _) = fetcher(transport, 1000);

    let err = fetcher
        .fetch(vec![
            tagged(ContractSide::Call, "https://stub/chains?contractType=CALL"),
            tagged(ContractSide::Put, "https://stub/chains?contractType=PUT"),
        ])
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ChainError::Unavailable {
            slot: 1,
            side: SlotSide::Tagged(ContractSide::Put),
        }
    );
    assert!(!err.is_fatal());
}

#[tokio::test]
async fn test_undecodable_base_slot_makes_chain_unavailable() {
    let transport = StubTransport::default()
        .raw_route("slot=0", 200, "<html>maintenance</html>")
        .route("slot=1", 0, 200, &chain_body(Value::Null, side_map("PUT", 540.0)));
    let (fetcher, _) = fetcher(transport, 1000);

    let err = fetcher
        .fetch(vec![
            untagged("https://stub/chains?slot=0"),
            untagged("https://stub/chains?slot=1"),
        ])
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ChainError::Unavailable {
            slot: 0,
            side: SlotSide::Untagged,
        }
    );
}

#[tokio::test]
async fn test_transport_failure_makes_chain_unavailable() {
    // No route for PUT: the stub returns a transport error.
    let transport = StubTransport::default()
        .route("contractType=CALL", 0, 200, &chain_body(side_map("CALL", 560.0), json!({})));
    let (fetcher, _) = fetcher(transport, 1000);

    let err = fetcher
        .fetch(vec![
            tagged(ContractSide::Call, "https://stub/chains?contractType=CALL"),
            tagged(ContractSide::Put, "https://stub/chains?contractType=PUT"),
        ])
        .await
        .unwrap_err();

    assert!(matches!(err, ChainError::Unavailable { slot: 1, .. }));
}

#[tokio::test]
async fn test_invalid_credential_raises_fatal_signal_once() {
    let mut fatal = MockFatal::new();
    fatal
        .expect_credential_rejected()
        .withf(|detail| detail.contains("InvalidApiKey"))
        .times(1)
        .return_const(());

    let transport = StubTransport::default()
        .route("contractType=CALL", 0, 200, &chain_body(side_map("CALL", 560.0), json!({})))
        .raw_route(
            "contractType=PUT",
            500,
            r#"{"fault":{"faultstring":"Invalid ApiKey","detail":{"errorcode":"InvalidApiKey"}}}"#,
        );
    let (fetcher, _) = fetcher_with_signal(transport, 1000, Arc::new(fatal));

    let err = fetcher
        .fetch(vec![
            tagged(ContractSide::Call, "https://stub/chains?contractType=CALL"),
            tagged(ContractSide::Put, "https://stub/chains?contractType=PUT"),
        ])
        .await
        .unwrap_err();

    assert!(matches!(err, ChainError::InvalidCredential(_)));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_undecodable_200_with_marker_is_fatal() {
    let mut fatal = MockFatal::new();
    fatal
        .expect_credential_rejected()
        .withf(|detail| detail.starts_with("status 200") && detail.contains("InvalidApiKey"))
        .times(1)
        .return_const(());

    let transport = StubTransport::default()
        .route("contractType=CALL", 0, 200, &chain_body(side_map("CALL", 560.0), json!({})))
        .raw_route("contractType=PUT", 200, "InvalidApiKey: expired");
    let (fetcher, _) = fetcher_with_signal(transport, 1000, Arc::new(fatal));

    let err = fetcher
        .fetch(vec![
            tagged(ContractSide::Call, "https://stub/chains?contractType=CALL"),
            tagged(ContractSide::Put, "https://stub/chains?contractType=PUT"),
        ])
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ChainError::InvalidCredential("status 200: InvalidApiKey: expired".into())
    );
}

#[tokio::test]
async fn test_credential_failure_does_not_wait_for_other_slot() {
    let mut fatal = MockFatal::new();
    fatal.expect_credential_rejected().times(1).return_const(());

    let transport = StubTransport::default()
        .route("contractType=CALL", 2000, 200, &chain_body(side_map("CALL", 560.0), json!({})))
        .raw_route("contractType=PUT", 401, "");
    let (fetcher, transport) = fetcher_with_signal(transport, 5000, Arc::new(fatal));

    let started = Instant::now();
    let err = fetcher
        .fetch(vec![
            tagged(ContractSide::Call, "https://stub/chains?contractType=CALL"),
            tagged(ContractSide::Put, "https://stub/chains?contractType=PUT"),
        ])
        .await
        .unwrap_err();

    assert!(err.is_fatal());
    assert!(started.elapsed() < Duration::from_millis(1000));
    assert_eq!(transport.completed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_request_count_is_validated() {
    let (fetcher, transport) = fetcher(StubTransport::default(), 1000);

    assert_eq!(fetcher.fetch(vec![]).await, Err(ChainError::InvalidRequestCount(0)));

    let three = vec![
        untagged("https://stub/a"),
        untagged("https://stub/b"),
        untagged("https://stub/c"),
    ];
    assert_eq!(fetcher.fetch(three).await, Err(ChainError::InvalidRequestCount(3)));
    assert!(transport.seen_urls().is_empty());
}

// ---- Handles ----

#[tokio::test]
async fn test_spawned_fetch_is_awaitable() {
    let transport = StubTransport::default()
        .route("contractType=CALL", 10, 200, &chain_body(side_map("CALL", 560.0), json!({})))
        .route("contractType=PUT", 10, 200, &chain_body(json!({}), side_map("PUT", 540.0)));
    let (fetcher, _) = fetcher(transport, 1000);

    let handle = fetcher.spawn(vec![
        tagged(ContractSide::Call, "https://stub/chains?contractType=CALL"),
        tagged(ContractSide::Put, "https://stub/chains?contractType=PUT"),
    ]);

    let chain = handle.await.unwrap();
    assert!(chain.is_complete());
    assert_eq!(chain.contract_count(), 2);
}

#[tokio::test]
async fn test_cancelled_handle_aborts_outstanding_requests() {
    let transport = StubTransport::default()
        .route("contractType=CALL", 150, 200, &chain_body(side_map("CALL", 560.0), json!({})))
        .route("contractType=PUT", 150, 200, &chain_body(json!({}), side_map("PUT", 540.0)));
    let (fetcher, transport) = fetcher(transport, 1000);

    let handle = fetcher.spawn(vec![
        tagged(ContractSide::Call, "https://stub/chains?contractType=CALL"),
        tagged(ContractSide::Put, "https://stub/chains?contractType=PUT"),
    ]);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!handle.is_finished());

    handle.cancel();
    assert_eq!(handle.await, Err(ChainError::Aborted));

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(transport.completed.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_concurrent_fetches_share_one_transport() {
    let transport = StubTransport::default()
        .route("contractType=CALL", 20, 200, &chain_body(side_map("CALL", 560.0), json!({})))
        .route("contractType=PUT", 20, 200, &chain_body(json!({}), side_map("PUT", 540.0)));
    let (fetcher, transport) = fetcher(transport, 1000);

    let requests = || {
        vec![
            tagged(ContractSide::Call, "https://stub/chains?contractType=CALL"),
            tagged(ContractSide::Put, "https://stub/chains?contractType=PUT"),
        ]
    };
    let handles: Vec<_> = (0..8).map(|_| fetcher.spawn(requests())).collect();

    for handle in handles {
        assert!(handle.await.unwrap().is_complete());
    }
    assert_eq!(transport.completed.load(Ordering::SeqCst), 16);
}
