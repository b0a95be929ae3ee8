//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use futures_util::future::BoxFuture;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use capture_filter::publish::{EventWriter, PublishError};

/// One POST received by the mock collector.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct ReceivedBatch {
    pub topic: String,
    pub content_type: String,
    pub values: Vec<String>,
}

#[derive(Clone, Default)]
pub struct MockCollector {
    batches: Arc<Mutex<Vec<ReceivedBatch>>>,
    requests: Arc<AtomicUsize>,
    fail_first: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl MockCollector {
    pub fn batches(&self) -> Vec<ReceivedBatch> {
        self.batches.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<String> {
        self.batches().into_iter().flat_map(|b| b.values).collect()
    }

    /// Every POST, including rejected ones.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Poll until `count` events arrived or `timeout` passes.
    pub async fn wait_for_events(&self, count: usize, timeout: Duration) -> Vec<String> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let events = self.events();
            if events.len() >= count || tokio::time::Instant::now() >= deadline {
                return events;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

async fn produce(
    State(collector): State<MockCollector>,
    Path(topic): Path<String>,
    headers: HeaderMap,
    body: String,
) -> StatusCode {
    collector.requests.fetch_add(1, Ordering::SeqCst);

    let remaining = collector.fail_first.load(Ordering::SeqCst);
    if remaining > 0 {
        collector.fail_first.store(remaining - 1, Ordering::SeqCst);
        return StatusCode::SERVICE_UNAVAILABLE;
    }

    let payload: serde_json::Value = match serde_json::from_str(&body) {
        Ok(v) => v,
        Err(_) => return StatusCode::BAD_REQUEST,
    };
    let values = payload["records"]
        .as_array()
        .map(|records| {
            records
                .iter()
                .filter_map(|r| r["value"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    collector.batches.lock().unwrap().push(ReceivedBatch { topic, content_type, values });
    StatusCode::OK
}

/// Start a Kafka-REST style collector on an ephemeral port.
/// The first `fail_first` requests are answered with 503.
#[allow(dead_code)]
pub async fn start_collector(fail_first: usize) -> (SocketAddr, MockCollector) {
    let collector = MockCollector {
        fail_first: Arc::new(AtomicUsize::new(fail_first)),
        ..Default::default()
    };

    let app = Router::new()
        .route("/topics/{topic}", post(produce))
        .with_state(collector.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, collector)
}

/// Writer that forwards every message to a channel.
#[allow(dead_code)]
pub struct RecordingWriter {
    tx: mpsc::UnboundedSender<String>,
}

#[allow(dead_code)]
impl RecordingWriter {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

impl EventWriter for RecordingWriter {
    fn write(&self, message: String) -> BoxFuture<'_, Result<(), PublishError>> {
        let result = self.tx.send(message).map_err(|_| PublishError::QueueClosed);
        Box::pin(async move { result })
    }
}

/// Drain everything currently buffered in a recording channel.
#[allow(dead_code)]
pub fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
    let mut out = Vec::new();
    while let Ok(message) = rx.try_recv() {
        out.push(message);
    }
    out
}
