//! Transaction assembly at stream completion.
//!
//! Pulls fresh header snapshots and exchange properties from the host,
//! combines them with the accumulated bodies and produces one
//! [`TransactionEvent`]. Every host read may fail independently; a failed
//! read contributes an empty or zero value and assembly carries on.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::capture::accumulator::BodyAccumulator;
use crate::capture::event::TransactionEvent;
use crate::capture::headers::{self, HeaderMap};
use crate::capture::partition::partition;
use crate::host::{properties, Direction, Host, HostError};
use crate::observability::metrics;

/// Header carrying the proxy-assigned request id, used for log correlation.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Everything the assembler needs besides the host.
pub struct AssemblyInput<'a> {
    pub context_id: u32,
    pub request_body: &'a BodyAccumulator,
    pub response_body: &'a BodyAccumulator,
    pub account_id: u64,
    /// Unix seconds stamped on the event.
    pub timestamp: u64,
}

/// Current wall-clock time in unix seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Unwrap a host result, logging and substituting the default on failure.
fn or_default<T: Default>(context_id: u32, what: &'static str, result: Result<T, HostError>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(
                context_id,
                field = what,
                error = %e,
                "Host read failed, using empty value"
            );
            metrics::record_host_failure(what);
            T::default()
        }
    }
}

fn header_snapshot(host: &dyn Host, context_id: u32, direction: Direction) -> HeaderMap {
    let what = match direction {
        Direction::Request => "request_headers",
        Direction::Response => "response_headers",
    };
    headers::normalize(or_default(context_id, what, host.headers(direction)))
}

fn header_text(context_id: u32, headers: &HeaderMap) -> String {
    headers::to_json(headers).unwrap_or_else(|e| {
        tracing::error!(context_id, error = %e, "Failed to serialize headers");
        String::new()
    })
}

/// Build the event for a finished exchange. Never fails.
pub fn assemble(host: &dyn Host, input: AssemblyInput<'_>) -> TransactionEvent {
    let id = input.context_id;

    let request_headers = header_snapshot(host, id, Direction::Request);
    let response_headers = header_snapshot(host, id, Direction::Response);

    let path = or_default(id, "path", properties::request_path(host));
    let method = or_default(id, "method", properties::request_method(host));
    let protocol = or_default(id, "protocol", properties::request_protocol(host));
    let status_code = or_default(id, "status_code", properties::response_code(host));
    let source = or_default(id, "source_address", properties::downstream_remote_address(host));
    let destination = or_default(id, "upstream_address", properties::upstream_address(host));
    let local = or_default(id, "local_address", properties::downstream_local_address(host));

    tracing::info!(
        context_id = id,
        request_id = request_headers.get(REQUEST_ID_HEADER).map(String::as_str).unwrap_or("-"),
        method = %method,
        path = %path,
        status_code,
        request_bytes = input.request_body.total_read(),
        request_chunks = input.request_body.chunk_count(),
        response_bytes = input.response_body.total_read(),
        response_chunks = input.response_body.chunk_count(),
        "Exchange complete"
    );

    TransactionEvent {
        path,
        request_headers: header_text(id, &request_headers),
        response_headers: header_text(id, &response_headers),
        method,
        request_payload: input.request_body.to_text(),
        response_payload: input.response_body.to_text(),
        ip: destination,
        time: input.timestamp.to_string(),
        status_code: status_code.to_string(),
        protocol,
        akto_account_id: input.account_id.to_string(),
        akto_vxlan_id: partition(&local).to_string(),
        is_pending: "false".to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::properties::{encode_string, encode_u64};
    use crate::host::InMemoryHost;

    fn exchange_host() -> InMemoryHost {
        let mut host = InMemoryHost::new();
        host.set_headers(
            Direction::Request,
            vec![
                ("content-type".into(), "application/json".into()),
                ("x-request-id".into(), "abc-123".into()),
            ],
        );
        host.set_headers(Direction::Response, vec![("server".into(), "envoy".into())]);
        host.set_property(properties::REQUEST_PATH, encode_string("/login"));
        host.set_property(properties::REQUEST_METHOD, encode_string("POST"));
        host.set_property(properties::REQUEST_PROTOCOL, encode_string("HTTP/1.1"));
        host.set_property(properties::RESPONSE_CODE, encode_u64(201));
        host.set_property(properties::SOURCE_ADDRESS, encode_string("192.168.1.4:40000"));
        host.set_property(properties::UPSTREAM_ADDRESS, encode_string("10.1.0.3:8080"));
        host.set_property(properties::DESTINATION_ADDRESS, encode_string("10.1.0.2:15001"));
        host
    }

    fn input<'a>(req: &'a BodyAccumulator, res: &'a BodyAccumulator) -> AssemblyInput<'a> {
        AssemblyInput {
            context_id: 7,
            request_body: req,
            response_body: res,
            account_id: 1_000_000,
            timestamp: 1_700_000_000,
        }
    }

    #[test]
    fn test_full_assembly() {
        let mut host = exchange_host();
        let mut req = BodyAccumulator::new(Direction::Request);
        let res = BodyAccumulator::new(Direction::Response);
        let n = host.push_body(Direction::Request, b"user=a");
        req.on_body(&host, 7, n, true);

        let event = assemble(&host, input(&req, &res));

        assert_eq!(event.path, "/login");
        assert_eq!(event.method, "POST");
        assert_eq!(event.protocol, "HTTP/1.1");
        assert_eq!(event.status_code, "201");
        assert_eq!(event.source, "192.168.1.4:40000");
        assert_eq!(event.ip, "10.1.0.3:8080");
        assert_eq!(event.akto_vxlan_id, partition("10.1.0.2:15001").to_string());
        assert_eq!(event.akto_account_id, "1000000");
        assert_eq!(event.time, "1700000000");
        assert_eq!(event.is_pending, "false");
        assert_eq!(event.request_payload, "user=a");
        assert_eq!(event.response_payload, "");
        assert_eq!(
            event.request_headers,
            r#"{"content-type":"application/json","x-request-id":"abc-123"}"#
        );
        assert_eq!(event.response_headers, r#"{"server":"envoy"}"#);
    }

    #[test]
    fn test_response_header_failure_keeps_rest() {
        let mut host = exchange_host();
        host.fail_headers(Direction::Response);
        let req = BodyAccumulator::new(Direction::Request);
        let res = BodyAccumulator::new(Direction::Response);

        let event = assemble(&host, input(&req, &res));

        assert_eq!(event.response_headers, "{}");
        assert!(event.request_headers.contains("application/json"));
        assert_eq!(event.path, "/login");
        assert_eq!(event.method, "POST");
    }

    #[test]
    fn test_failed_properties_become_empty() {
        let mut host = exchange_host();
        host.fail_property(properties::RESPONSE_CODE);
        host.fail_property(properties::UPSTREAM_ADDRESS);
        host.fail_property(properties::DESTINATION_ADDRESS);
        let req = BodyAccumulator::new(Direction::Request);
        let res = BodyAccumulator::new(Direction::Response);

        let event = assemble(&host, input(&req, &res));

        assert_eq!(event.status_code, "0");
        assert_eq!(event.ip, "");
        assert_eq!(event.akto_vxlan_id, partition("").to_string());
        assert_eq!(event.method, "POST");
    }

    #[test]
    fn test_bare_host_still_assembles() {
        let host = InMemoryHost::new();
        let req = BodyAccumulator::new(Direction::Request);
        let res = BodyAccumulator::new(Direction::Response);

        let event = assemble(&host, input(&req, &res));

        assert_eq!(event.path, "");
        assert_eq!(event.request_headers, "{}");
        assert_eq!(event.is_pending, "false");
    }
}
