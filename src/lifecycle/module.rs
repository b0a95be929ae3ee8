//! Module instance: the root context the host drives.
//!
//! # Responsibilities
//! - Build the shared writer and emitter at start
//! - Hand every new exchange its own capture context with the shared emitter
//! - On done, let in-flight emits reach the writer, then stop it and flush

use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::capture::ExchangeCapture;
use crate::config::FilterConfig;
use crate::host::RootContext;
use crate::lifecycle::Shutdown;
use crate::publish::{BatchingWriter, Emitter, EventWriter};

/// One loaded instance of the capture filter.
pub struct CaptureModule {
    config: FilterConfig,
    runtime: Handle,
    shutdown: Arc<Shutdown>,
    stopping: bool,
    injected_writer: Option<Arc<dyn EventWriter>>,
    emitter: Option<Emitter>,
    worker: Option<JoinHandle<()>>,
}

impl CaptureModule {
    /// Module that publishes through a [`BatchingWriter`] built at start.
    pub fn new(config: FilterConfig, runtime: Handle) -> Self {
        Self {
            config,
            runtime,
            shutdown: Arc::new(Shutdown::new()),
            stopping: false,
            injected_writer: None,
            emitter: None,
            worker: None,
        }
    }

    /// Module that publishes through a caller-provided writer.
    pub fn with_writer(
        config: FilterConfig,
        runtime: Handle,
        writer: Arc<dyn EventWriter>,
    ) -> Self {
        Self {
            injected_writer: Some(writer),
            ..Self::new(config, runtime)
        }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// The shared emitter, once started.
    pub fn emitter(&self) -> Option<&Emitter> {
        self.emitter.as_ref()
    }

    /// Wait until no emit is in flight.
    ///
    /// Exchanges may keep completing meanwhile; their emits are accepted and
    /// waited for too.
    pub async fn quiesce(&self) {
        if let Some(emitter) = &self.emitter {
            emitter.quiesce().await;
        }
    }

    /// Wait for the batching worker to finish its final flush after `on_done`.
    pub async fn drained(&mut self) {
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                tracing::error!(error = %e, "Batching writer task failed");
            }
        }
    }
}

impl RootContext for CaptureModule {
    type Http = ExchangeCapture;

    fn on_start(&mut self, context_id: u32) -> bool {
        if self.emitter.is_some() {
            tracing::warn!(context_id, "Module already started");
            return true;
        }

        let writer: Arc<dyn EventWriter> = match self.injected_writer.take() {
            Some(writer) => writer,
            None => {
                let spawned = BatchingWriter::spawn(
                    &self.config.publisher,
                    &self.runtime,
                    self.shutdown.subscribe(),
                );
                match spawned {
                    Ok((writer, worker)) => {
                        self.worker = Some(worker);
                        Arc::new(writer)
                    }
                    Err(e) => {
                        tracing::error!(context_id, error = %e, "Failed to start batching writer");
                        return false;
                    }
                }
            }
        };

        self.emitter = Some(Emitter::new(
            writer,
            self.runtime.clone(),
            self.config.publisher.max_in_flight,
        ));

        tracing::info!(
            context_id,
            topic = %self.config.publisher.topic,
            max_in_flight = self.config.publisher.max_in_flight,
            "Capture module started"
        );
        true
    }

    fn create_http_context(&self, context_id: u32) -> Option<ExchangeCapture> {
        let Some(emitter) = &self.emitter else {
            tracing::warn!(context_id, "Exchange opened before module start, not capturing");
            return None;
        };
        tracing::debug!(context_id, "New exchange context");
        Some(ExchangeCapture::new(context_id, emitter.clone(), self.config.capture.account_id))
    }

    /// Starts the stop sequence in the background and returns at once.
    ///
    /// Emits already in flight are waited for before the writer queue closes.
    /// Exchanges completing after that are not delivered. Use
    /// [`CaptureModule::drained`] to wait for the final flush.
    fn on_done(&mut self) -> bool {
        if self.stopping {
            return true;
        }
        self.stopping = true;
        tracing::info!("Capture module stopping");

        let emitter = self.emitter.clone();
        let shutdown = Arc::clone(&self.shutdown);
        self.runtime.spawn(async move {
            if let Some(emitter) = emitter {
                emitter.quiesce().await;
            }
            shutdown.trigger();
        });
        true
    }
}
