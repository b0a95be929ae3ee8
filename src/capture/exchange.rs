//! Per-exchange capture context.

use crate::capture::accumulator::BodyAccumulator;
use crate::capture::assembler::{self, AssemblyInput};
use crate::host::{Action, Direction, Host, HttpContext};
use crate::observability::metrics;
use crate::publish::Emitter;

/// State for one intercepted exchange.
///
/// Created by the module when the host opens an exchange and dropped when the
/// host tears it down. If it is dropped before [`HttpContext::on_stream_done`],
/// the partial capture is discarded without emitting anything.
pub struct ExchangeCapture {
    id: u32,
    request: BodyAccumulator,
    response: BodyAccumulator,
    emitter: Emitter,
    account_id: u64,
    completed: bool,
}

impl ExchangeCapture {
    pub fn new(id: u32, emitter: Emitter, account_id: u64) -> Self {
        Self {
            id,
            request: BodyAccumulator::new(Direction::Request),
            response: BodyAccumulator::new(Direction::Response),
            emitter,
            account_id,
            completed: false,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn request_body(&self) -> &BodyAccumulator {
        &self.request
    }

    pub fn response_body(&self) -> &BodyAccumulator {
        &self.response
    }

    /// Whether the completion event has already been produced.
    pub fn is_completed(&self) -> bool {
        self.completed
    }
}

impl HttpContext for ExchangeCapture {
    fn on_request_headers(
        &mut self,
        _host: &dyn Host,
        num_headers: usize,
        end_of_stream: bool,
    ) -> Action {
        tracing::trace!(context_id = self.id, num_headers, end_of_stream, "Request headers");
        Action::Continue
    }

    fn on_request_body(
        &mut self,
        host: &dyn Host,
        body_size: usize,
        end_of_stream: bool,
    ) -> Action {
        self.request.on_body(host, self.id, body_size, end_of_stream);
        Action::Continue
    }

    fn on_response_headers(
        &mut self,
        _host: &dyn Host,
        num_headers: usize,
        end_of_stream: bool,
    ) -> Action {
        tracing::trace!(context_id = self.id, num_headers, end_of_stream, "Response headers");
        Action::Continue
    }

    fn on_response_body(
        &mut self,
        host: &dyn Host,
        body_size: usize,
        end_of_stream: bool,
    ) -> Action {
        self.response.on_body(host, self.id, body_size, end_of_stream);
        Action::Continue
    }

    fn on_stream_done(&mut self, host: &dyn Host) {
        if self.completed {
            tracing::warn!(context_id = self.id, "Stream done signalled twice, ignoring");
            return;
        }
        self.completed = true;

        let event = assembler::assemble(
            host,
            AssemblyInput {
                context_id: self.id,
                request_body: &self.request,
                response_body: &self.response,
                account_id: self.account_id,
                timestamp: assembler::unix_now(),
            },
        );

        match event.to_json() {
            Ok(blob) => {
                tracing::debug!(
                    context_id = self.id,
                    bytes = blob.len(),
                    "Handing event to emitter"
                );
                self.emitter.emit(self.id, blob);
            }
            Err(e) => {
                tracing::error!(
                    context_id = self.id,
                    error = %e,
                    "Failed to serialize event, skipping"
                );
                metrics::record_event_dropped("serialization");
            }
        }
    }
}
