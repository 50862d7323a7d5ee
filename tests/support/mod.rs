//! Shared stub transport for behavior tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use spotlink_core::{
    ActivityLog, CancellationToken, ClientConfig, HttpClient, HttpError, HttpRequest,
    HttpResponse, ManualClock, MarketDataClient, MemoryActivityLog,
};
use tokio::time::Instant;

pub const PRIMARY: &str = "https://primary.test";
pub const DATA: &str = "https://data.test";

type Reply = Result<HttpResponse, HttpError>;

/// One request as the transport saw it.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub url: String,
    pub params: Vec<(String, String)>,
    pub at: Instant,
}

#[derive(Default)]
struct Route {
    scripted: VecDeque<Reply>,
    sticky: Option<Reply>,
}

/// Scripted transport keyed by URL path suffix.
///
/// Scripted replies are consumed in order; once exhausted the sticky reply
/// (if any) repeats, otherwise 404.
#[derive(Default)]
pub struct StubTransport {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl StubTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, path: &str, replies: Vec<Reply>) -> &Self {
        self.routes
            .lock()
            .expect("routes lock")
            .entry(path.to_owned())
            .or_default()
            .scripted
            .extend(replies);
        self
    }

    pub fn always(&self, path: &str, reply: Reply) -> &Self {
        self.routes
            .lock()
            .expect("routes lock")
            .entry(path.to_owned())
            .or_default()
            .sticky = Some(reply);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.url.ends_with(path))
            .collect()
    }

    /// Time between consecutive calls.
    pub fn gaps(&self) -> Vec<Duration> {
        self.calls()
            .windows(2)
            .map(|pair| pair[1].at - pair[0].at)
            .collect()
    }

    fn reply_for(&self, url: &str) -> Reply {
        let mut routes = self.routes.lock().expect("routes lock");
        let route = routes
            .iter_mut()
            .find(|(path, _)| url.ends_with(path.as_str()))
            .map(|(_, route)| route);

        match route {
            Some(route) => route
                .scripted
                .pop_front()
                .or_else(|| route.sticky.clone())
                .unwrap_or_else(|| Ok(HttpResponse::new(404, "not found"))),
            None => Ok(HttpResponse::new(404, "not found")),
        }
    }
}

impl HttpClient for StubTransport {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Reply> + Send + 'a>> {
        Box::pin(async move {
            self.calls.lock().expect("calls lock").push(RecordedCall {
                url: request.url.clone(),
                params: request.params.clone(),
                at: Instant::now(),
            });
            self.reply_for(&request.url)
        })
    }
}

pub fn exchange_info(symbols: &[&str]) -> Reply {
    let entries = symbols
        .iter()
        .map(|symbol| serde_json::json!({ "symbol": symbol, "status": "TRADING" }))
        .collect::<Vec<_>>();
    Ok(HttpResponse::ok_json(
        serde_json::json!({ "timezone": "UTC", "symbols": entries }).to_string(),
    ))
}

pub fn price(value: &str) -> Reply {
    Ok(HttpResponse::ok_json(
        serde_json::json!({ "symbol": "IGNORED", "price": value }).to_string(),
    ))
}

pub fn status(code: u16) -> Reply {
    Ok(HttpResponse::new(code, format!("status {code}")))
}

pub struct Harness {
    pub client: MarketDataClient,
    pub transport: Arc<StubTransport>,
    pub log: Arc<MemoryActivityLog>,
    pub clock: Arc<ManualClock>,
    pub cancel: CancellationToken,
}

/// Client pointed at the stub hosts, with a manual clock and in-memory log.
pub fn harness(transport: Arc<StubTransport>) -> Harness {
    let log = Arc::new(MemoryActivityLog::new());
    let clock = Arc::new(ManualClock::new());
    let activity: Arc<dyn ActivityLog> = log.clone();
    let client = MarketDataClient::builder(ClientConfig::default().with_base_urls(PRIMARY, DATA))
        .http_client(transport.clone())
        .activity_log(activity)
        .clock(clock.clone())
        .build();

    Harness {
        client,
        transport,
        log,
        clock,
        cancel: CancellationToken::new(),
    }
}

/// Paused-clock gaps land on the millisecond timer grid.
pub fn assert_wait(actual: Duration, expected: Duration) {
    assert!(
        actual >= expected && actual <= expected + Duration::from_millis(1),
        "expected a wait of {expected:?}, got {actual:?}"
    );
}
