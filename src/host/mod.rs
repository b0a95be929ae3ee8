//! Host interface subsystem.
//!
//! # Data Flow
//! ```text
//! Proxy runtime
//!     → RootContext (module start/stop, per-exchange context creation)
//!     → HttpContext (header / body / completion callbacks per exchange)
//!     ↔ Host (fallible reads of headers, body slices, exchange properties)
//! ```
//!
//! # Design Decisions
//! - Lifecycle traits have no default methods; every implementor handles
//!   every callback explicitly
//! - The host is passed into each callback rather than looked up globally
//! - Handlers return an `Action`; capture never alters traffic disposition

pub mod memory;
pub mod properties;

use thiserror::Error;

pub use memory::InMemoryHost;

/// Direction of an HTTP message within an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Request,
    Response,
}

impl Direction {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Request => "request",
            Direction::Response => "response",
        }
    }
}

/// Disposition returned to the host after a callback.
///
/// Capture is observe-only, so the only disposition is to let the exchange
/// proceed toward its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
}

/// Errors surfaced by host calls.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
    /// The requested value does not exist for this exchange.
    #[error("not found")]
    NotFound,

    /// The call was made with arguments the host rejected.
    #[error("bad argument")]
    BadArgument,

    /// The host failed internally.
    #[error("host failure: {0}")]
    Internal(String),

    /// A property exists but could not be decoded.
    #[error("invalid property {path}: {reason}")]
    InvalidProperty { path: String, reason: String },
}

/// Calls the module makes into the proxy runtime.
///
/// Every call is fallible. Body reads may return fewer or more bytes than
/// requested.
pub trait Host {
    /// Current header snapshot for one direction, in wire order.
    fn headers(&self, direction: Direction) -> Result<Vec<(String, String)>, HostError>;

    /// Up to `size` body bytes starting at `offset`.
    fn body_chunk(
        &self,
        direction: Direction,
        offset: usize,
        size: usize,
    ) -> Result<Vec<u8>, HostError>;

    /// Raw property bytes. `Ok(None)` means the property is known but unset.
    fn property(&self, path: &[&str]) -> Result<Option<Vec<u8>>, HostError>;
}

/// Per-exchange callbacks.
pub trait HttpContext {
    fn on_request_headers(
        &mut self,
        host: &dyn Host,
        num_headers: usize,
        end_of_stream: bool,
    ) -> Action;

    /// `body_size` is the cumulative number of bytes buffered so far.
    fn on_request_body(&mut self, host: &dyn Host, body_size: usize, end_of_stream: bool) -> Action;

    fn on_response_headers(
        &mut self,
        host: &dyn Host,
        num_headers: usize,
        end_of_stream: bool,
    ) -> Action;

    /// `body_size` is the cumulative number of bytes buffered so far.
    fn on_response_body(
        &mut self,
        host: &dyn Host,
        body_size: usize,
        end_of_stream: bool,
    ) -> Action;

    /// The exchange finished. Called at most once by a well-behaved host.
    fn on_stream_done(&mut self, host: &dyn Host);
}

/// Module-level callbacks.
pub trait RootContext {
    type Http: HttpContext;

    /// Module configured and starting. Returns `false` if start failed.
    fn on_start(&mut self, context_id: u32) -> bool;

    /// A new exchange began.
    fn create_http_context(&self, context_id: u32) -> Option<Self::Http>;

    /// Module shutting down. Returns `true` once it is safe to unload.
    fn on_done(&mut self) -> bool;
}

/// Host-side no-op exchange handler, used when no module claims an exchange.
#[derive(Debug, Default)]
pub struct PassthroughContext;

impl HttpContext for PassthroughContext {
    fn on_request_headers(
        &mut self,
        _host: &dyn Host,
        _num_headers: usize,
        _end_of_stream: bool,
    ) -> Action {
        Action::Continue
    }

    fn on_request_body(
        &mut self,
        _host: &dyn Host,
        _body_size: usize,
        _end_of_stream: bool,
    ) -> Action {
        Action::Continue
    }

    fn on_response_headers(
        &mut self,
        _host: &dyn Host,
        _num_headers: usize,
        _end_of_stream: bool,
    ) -> Action {
        Action::Continue
    }

    fn on_response_body(
        &mut self,
        _host: &dyn Host,
        _body_size: usize,
        _end_of_stream: bool,
    ) -> Action {
        Action::Continue
    }

    fn on_stream_done(&mut self, _host: &dyn Host) {}
}
