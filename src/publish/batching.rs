//! Batching writer delivering events to the collector.
//!
//! # Responsibilities
//! - Accept events from many concurrent emit tasks through a bounded queue
//! - Group events into batches by size or linger interval
//! - POST each batch to the collector's topic endpoint, retrying with backoff
//! - Drain and flush the queue on shutdown
//!
//! # Wire Format
//! Batches use the Kafka REST JSON embedded format:
//! `POST {endpoint}/topics/{topic}` with body `{"records":[{"value":"..."}]}`.

use std::time::Duration;

use futures_util::future::BoxFuture;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use url::Url;

use crate::config::PublisherConfig;
use crate::observability::metrics;
use crate::publish::backoff::RetryPolicy;
use crate::publish::writer::{EventWriter, PublishError};

/// Content type of the Kafka REST JSON embedded format.
pub const KAFKA_JSON_V2: &str = "application/vnd.kafka.json.v2+json";

#[derive(Debug, Serialize)]
struct Record {
    value: String,
}

#[derive(Debug, Serialize)]
struct ProduceRequest {
    records: Vec<Record>,
}

/// Build `{endpoint}/topics/{topic}`.
pub fn publish_url(endpoint: &str, topic: &str) -> Result<Url, PublishError> {
    let mut base =
        Url::parse(endpoint).map_err(|e| PublishError::InvalidEndpoint(e.to_string()))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(&format!("topics/{}", topic))
        .map_err(|e| PublishError::InvalidEndpoint(e.to_string()))
}

/// Shared writer handle, used behind an `Arc` by every emit task.
pub struct BatchingWriter {
    tx: mpsc::Sender<String>,
}

impl BatchingWriter {
    /// Start the background worker on `runtime`.
    ///
    /// The worker runs until `shutdown` fires or every writer handle is
    /// dropped, then flushes what is queued and exits.
    pub fn spawn(
        config: &PublisherConfig,
        runtime: &Handle,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(Self, JoinHandle<()>), PublishError> {
        let url = publish_url(&config.endpoint, &config.topic)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let worker = BatchWorker {
            rx,
            client,
            url,
            batch_size: config.batch_size.max(1),
            linger: Duration::from_secs(config.linger_secs.max(1)),
            retry: RetryPolicy::from_config(config),
        };

        tracing::info!(
            url = %worker.url,
            batch_size = worker.batch_size,
            linger_secs = worker.linger.as_secs(),
            queue_capacity = config.queue_capacity,
            "Batching writer starting"
        );

        let handle = runtime.spawn(worker.run(shutdown));
        Ok((Self { tx }, handle))
    }
}

impl EventWriter for BatchingWriter {
    /// Waits for queue space; backpressure stays inside the emit task.
    fn write(&self, message: String) -> BoxFuture<'_, Result<(), PublishError>> {
        Box::pin(async move {
            self.tx
                .send(message)
                .await
                .map_err(|_| PublishError::QueueClosed)
        })
    }
}

struct BatchWorker {
    rx: mpsc::Receiver<String>,
    client: reqwest::Client,
    url: Url,
    batch_size: usize,
    linger: Duration,
    retry: RetryPolicy,
}

impl BatchWorker {
    async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        let mut batch = Vec::with_capacity(self.batch_size);
        let mut ticker = time::interval(self.linger);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                message = self.rx.recv() => match message {
                    Some(message) => {
                        batch.push(message);
                        if batch.len() >= self.batch_size {
                            self.flush(&mut batch).await;
                        }
                    }
                    None => break,
                },
                _ = ticker.tick() => {
                    if !batch.is_empty() {
                        self.flush(&mut batch).await;
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!(queued = batch.len(), "Batching writer draining queue");
                    self.rx.close();
                    while let Some(message) = self.rx.recv().await {
                        batch.push(message);
                        if batch.len() >= self.batch_size {
                            self.flush(&mut batch).await;
                        }
                    }
                    break;
                }
            }
        }

        if !batch.is_empty() {
            self.flush(&mut batch).await;
        }
        tracing::info!("Batching writer stopped");
    }

    async fn flush(&self, batch: &mut Vec<String>) {
        let count = batch.len();
        let request = ProduceRequest {
            records: batch.drain(..).map(|value| Record { value }).collect(),
        };

        let mut retry = 0;
        loop {
            match self.send(&request).await {
                Ok(()) => {
                    tracing::debug!(events = count, "Batch published");
                    metrics::record_batch_published("ok", count);
                    return;
                }
                Err(e) if self.retry.allows(retry) => {
                    retry += 1;
                    let delay = self.retry.delay(retry);
                    tracing::warn!(
                        events = count,
                        retry,
                        delay = ?delay,
                        error = %e,
                        "Batch publish failed, retrying"
                    );
                    time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!(
                        events = count,
                        retries = retry,
                        error = %e,
                        "Batch publish failed, dropping batch"
                    );
                    metrics::record_batch_published("failed", count);
                    return;
                }
            }
        }
    }

    async fn send(&self, request: &ProduceRequest) -> Result<(), PublishError> {
        let response = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, KAFKA_JSON_V2)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(PublishError::Rejected { status: status.as_u16() })
        }
    }
}
