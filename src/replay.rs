//! Replay of recorded exchanges through the capture pipeline.
//!
//! Each input line is one JSON-encoded [`RecordedExchange`]. Replay feeds it
//! to a module through an [`InMemoryHost`] the same way a proxy would: header
//! callbacks, one body callback per recorded chunk, then stream done.

use std::io::BufRead;

use serde::{Deserialize, Serialize};

use crate::host::properties::{self, encode_string, encode_u64};
use crate::host::{Direction, HttpContext, InMemoryHost, RootContext};

/// One exchange as captured on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordedExchange {
    pub id: u32,
    pub request_headers: Vec<(String, String)>,
    pub response_headers: Vec<(String, String)>,
    /// Request body as delivered, one entry per chunk.
    pub request_chunks: Vec<String>,
    pub response_chunks: Vec<String>,
    pub path: String,
    pub method: String,
    pub protocol: String,
    pub status: u64,
    /// Downstream remote address.
    pub source: String,
    pub upstream: String,
    /// Downstream local address.
    pub local: String,
}

impl RecordedExchange {
    /// Host pre-loaded with this exchange's headers and properties. Bodies
    /// start empty and are pushed chunk by chunk during replay.
    pub fn host(&self) -> InMemoryHost {
        let mut host = InMemoryHost::new();
        host.set_headers(Direction::Request, self.request_headers.clone());
        host.set_headers(Direction::Response, self.response_headers.clone());
        host.set_property(properties::REQUEST_PATH, encode_string(&self.path));
        host.set_property(properties::REQUEST_METHOD, encode_string(&self.method));
        host.set_property(properties::REQUEST_PROTOCOL, encode_string(&self.protocol));
        host.set_property(properties::RESPONSE_CODE, encode_u64(self.status));
        host.set_property(properties::SOURCE_ADDRESS, encode_string(&self.source));
        host.set_property(properties::UPSTREAM_ADDRESS, encode_string(&self.upstream));
        host.set_property(properties::DESTINATION_ADDRESS, encode_string(&self.local));
        host
    }
}

/// Read exchanges from JSON lines. Malformed lines are skipped with a warning.
pub fn load_exchanges<R: BufRead>(reader: R) -> std::io::Result<Vec<RecordedExchange>> {
    let mut exchanges = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<RecordedExchange>(&line) {
            Ok(exchange) => exchanges.push(exchange),
            Err(e) => {
                tracing::warn!(
                    line = index + 1,
                    error = %e,
                    "Failed to parse recorded exchange, skipping"
                );
            }
        }
    }
    Ok(exchanges)
}

fn replay_body<C: HttpContext>(
    ctx: &mut C,
    host: &mut InMemoryHost,
    direction: Direction,
    chunks: &[String],
) {
    let last = chunks.len().saturating_sub(1);
    for (i, chunk) in chunks.iter().enumerate() {
        let available = host.push_body(direction, chunk.as_bytes());
        match direction {
            Direction::Request => ctx.on_request_body(&*host, available, i == last),
            Direction::Response => ctx.on_response_body(&*host, available, i == last),
        };
    }
}

/// Drive one exchange through `module`. Returns `false` if the module
/// declined to capture it.
pub fn replay_exchange<M: RootContext>(module: &M, exchange: &RecordedExchange) -> bool {
    let Some(mut ctx) = module.create_http_context(exchange.id) else {
        return false;
    };
    let mut host = exchange.host();

    ctx.on_request_headers(
        &host,
        exchange.request_headers.len(),
        exchange.request_chunks.is_empty(),
    );
    replay_body(&mut ctx, &mut host, Direction::Request, &exchange.request_chunks);

    ctx.on_response_headers(
        &host,
        exchange.response_headers.len(),
        exchange.response_chunks.is_empty(),
    );
    replay_body(&mut ctx, &mut host, Direction::Response, &exchange.response_chunks);

    ctx.on_stream_done(&host);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Host;

    #[test]
    fn test_load_skips_bad_lines() {
        let input = concat!(
            r#"{"id":1,"method":"GET","path":"/a","status":200}"#,
            "\n",
            "not json\n",
            "\n",
            r#"{"id":2,"request_chunks":["x","y"]}"#,
            "\n",
        );
        let exchanges = load_exchanges(input.as_bytes()).unwrap();
        assert_eq!(exchanges.len(), 2);
        assert_eq!(exchanges[0].path, "/a");
        assert_eq!(exchanges[1].request_chunks, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_recorded_host_properties() {
        let exchange = RecordedExchange {
            status: 503,
            upstream: "10.0.0.3:80".into(),
            ..Default::default()
        };
        let host = exchange.host();
        assert_eq!(properties::response_code(&host).unwrap(), 503);
        assert_eq!(properties::upstream_address(&host).unwrap(), "10.0.0.3:80");
        assert!(host.headers(Direction::Request).unwrap().is_empty());
    }
}
