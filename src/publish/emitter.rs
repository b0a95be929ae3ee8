//! Fire-and-forget event hand-off.

use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{Notify, Semaphore};

use crate::observability::metrics;
use crate::publish::writer::EventWriter;

/// Cheap-to-clone handle every exchange context uses to publish its event.
///
/// Each call to [`Emitter::emit`] spawns one detached task on the module's
/// runtime. At most `max_in_flight` such tasks exist at once; beyond that,
/// events are dropped so the calling callback never waits.
#[derive(Clone)]
pub struct Emitter {
    writer: Arc<dyn EventWriter>,
    runtime: Handle,
    permits: Arc<Semaphore>,
    idle: Arc<Notify>,
    max_in_flight: usize,
}

impl Emitter {
    pub fn new(writer: Arc<dyn EventWriter>, runtime: Handle, max_in_flight: usize) -> Self {
        let max_in_flight = max_in_flight.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            writer,
            runtime,
            permits: Arc::new(Semaphore::new(max_in_flight)),
            idle: Arc::new(Notify::new()),
            max_in_flight,
        }
    }

    /// Hand an event to the writer without blocking.
    ///
    /// Returns `false` if the event was dropped because too many emits are
    /// already in flight.
    pub fn emit(&self, context_id: u32, message: String) -> bool {
        let permit = match Arc::clone(&self.permits).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                tracing::warn!(
                    context_id,
                    max_in_flight = self.max_in_flight,
                    "Too many events in flight, dropping event"
                );
                metrics::record_event_dropped("in_flight_limit");
                return false;
            }
        };

        let writer = Arc::clone(&self.writer);
        let idle = Arc::clone(&self.idle);
        self.runtime.spawn(async move {
            match writer.write(message).await {
                Ok(()) => metrics::record_event_emitted(),
                Err(e) => {
                    tracing::debug!(context_id, error = %e, "Event not accepted by writer");
                    metrics::record_event_dropped("writer");
                }
            }
            drop(permit);
            idle.notify_waiters();
        });
        true
    }

    /// Number of emit tasks that have not finished yet.
    pub fn in_flight(&self) -> usize {
        self.max_in_flight - self.permits.available_permits()
    }

    /// Wait until no emit task is in flight.
    ///
    /// Holds no permits while waiting, so emits from other exchanges are
    /// still accepted and are waited for as well.
    pub async fn quiesce(&self) {
        loop {
            let finished = self.idle.notified();
            if self.in_flight() == 0 {
                return;
            }
            finished.await;
        }
    }
}
