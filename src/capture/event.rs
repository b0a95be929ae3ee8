//! Canonical transaction record shipped to the collector.

use serde::Serialize;

/// One completed exchange, flattened to string fields.
///
/// Integer fields are carried as decimal strings because the collector
/// consumes a flat string-to-string mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionEvent {
    pub path: String,
    #[serde(rename = "requestHeaders")]
    pub request_headers: String,
    #[serde(rename = "responseHeaders")]
    pub response_headers: String,
    pub method: String,
    #[serde(rename = "requestPayload")]
    pub request_payload: String,
    #[serde(rename = "responsePayload")]
    pub response_payload: String,
    /// Upstream address.
    pub ip: String,
    /// Unix seconds at emission.
    pub time: String,
    #[serde(rename = "statusCode")]
    pub status_code: String,
    /// Request protocol, e.g. `HTTP/1.1`.
    #[serde(rename = "type")]
    pub protocol: String,
    pub akto_account_id: String,
    /// Partition value derived from the downstream local address.
    pub akto_vxlan_id: String,
    pub is_pending: String,
    /// Downstream remote address.
    pub source: String,
}

impl TransactionEvent {
    /// Serialize to the single-line JSON blob handed to the emitter.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
