//! Transaction capture subsystem.
//!
//! # Data Flow
//! ```text
//! Body callbacks (0..N per direction)
//!     → accumulator.rs (pull new bytes, append)
//!
//! Stream done
//!     → assembler.rs
//!         → headers.rs (fresh snapshots, last-write-wins)
//!         → host properties (path, method, status, addresses)
//!         → partition.rs (bucket from local address)
//!     → event.rs (flat record, JSON)
//!     → publish::Emitter
//! ```
//!
//! # Design Decisions
//! - Header callbacks carry no data; headers are read once at completion
//! - End of stream on a body never triggers emission, only stream done does
//! - Every host read degrades to an empty value instead of failing

pub mod accumulator;
pub mod assembler;
pub mod event;
pub mod exchange;
pub mod headers;
pub mod partition;

pub use accumulator::BodyAccumulator;
pub use event::TransactionEvent;
pub use exchange::ExchangeCapture;
