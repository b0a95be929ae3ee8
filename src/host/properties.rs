//! Typed accessors for exchange properties.
//!
//! Hosts expose properties as raw bytes keyed by a path. Strings are UTF-8,
//! integers are 8-byte little-endian.

use crate::host::{Host, HostError};

pub const REQUEST_PATH: &[&str] = &["request", "path"];
pub const REQUEST_METHOD: &[&str] = &["request", "method"];
pub const REQUEST_PROTOCOL: &[&str] = &["request", "protocol"];
pub const RESPONSE_CODE: &[&str] = &["response", "code"];
/// Downstream remote address (the client).
pub const SOURCE_ADDRESS: &[&str] = &["source", "address"];
pub const UPSTREAM_ADDRESS: &[&str] = &["upstream", "address"];
/// Downstream local address (the listener the client connected to).
pub const DESTINATION_ADDRESS: &[&str] = &["destination", "address"];

/// Encode a string property the way hosts store it.
pub fn encode_string(value: &str) -> Vec<u8> {
    value.as_bytes().to_vec()
}

/// Encode an integer property the way hosts store it.
pub fn encode_u64(value: u64) -> Vec<u8> {
    value.to_le_bytes().to_vec()
}

fn joined(path: &[&str]) -> String {
    path.join(".")
}

/// Fetch a string property. An unset property reads as empty.
pub fn get_string(host: &dyn Host, path: &[&str]) -> Result<String, HostError> {
    match host.property(path)? {
        Some(bytes) => String::from_utf8(bytes).map_err(|e| HostError::InvalidProperty {
            path: joined(path),
            reason: e.to_string(),
        }),
        None => Ok(String::new()),
    }
}

/// Fetch an integer property. An unset property reads as zero.
pub fn get_u64(host: &dyn Host, path: &[&str]) -> Result<u64, HostError> {
    match host.property(path)? {
        Some(bytes) => {
            let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| HostError::InvalidProperty {
                path: joined(path),
                reason: format!("expected 8 bytes, got {}", bytes.len()),
            })?;
            Ok(u64::from_le_bytes(raw))
        }
        None => Ok(0),
    }
}

pub fn request_path(host: &dyn Host) -> Result<String, HostError> {
    get_string(host, REQUEST_PATH)
}

pub fn request_method(host: &dyn Host) -> Result<String, HostError> {
    get_string(host, REQUEST_METHOD)
}

pub fn request_protocol(host: &dyn Host) -> Result<String, HostError> {
    get_string(host, REQUEST_PROTOCOL)
}

pub fn response_code(host: &dyn Host) -> Result<u64, HostError> {
    get_u64(host, RESPONSE_CODE)
}

pub fn downstream_remote_address(host: &dyn Host) -> Result<String, HostError> {
    get_string(host, SOURCE_ADDRESS)
}

pub fn upstream_address(host: &dyn Host) -> Result<String, HostError> {
    get_string(host, UPSTREAM_ADDRESS)
}

pub fn downstream_local_address(host: &dyn Host) -> Result<String, HostError> {
    get_string(host, DESTINATION_ADDRESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::InMemoryHost;

    #[test]
    fn test_response_code_decoding() {
        let mut host = InMemoryHost::new();
        host.set_property(RESPONSE_CODE, encode_u64(404));
        assert_eq!(response_code(&host).unwrap(), 404);
    }

    #[test]
    fn test_response_code_wrong_width() {
        let mut host = InMemoryHost::new();
        host.set_property(RESPONSE_CODE, vec![200, 0]);
        let err = response_code(&host).unwrap_err();
        assert!(matches!(
            err,
            HostError::InvalidProperty { ref path, .. } if path == "response.code"
        ));
    }

    #[test]
    fn test_missing_property_is_not_found() {
        let host = InMemoryHost::new();
        assert_eq!(request_path(&host), Err(HostError::NotFound));
    }

    #[test]
    fn test_string_properties() {
        let mut host = InMemoryHost::new();
        host.set_property(REQUEST_METHOD, encode_string("POST"));
        host.set_property(DESTINATION_ADDRESS, encode_string("10.0.0.5:8080"));
        assert_eq!(request_method(&host).unwrap(), "POST");
        assert_eq!(downstream_local_address(&host).unwrap(), "10.0.0.5:8080");
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let mut host = InMemoryHost::new();
        host.set_property(REQUEST_PATH, vec![0xff, 0xfe]);
        assert!(matches!(request_path(&host), Err(HostError::InvalidProperty { .. })));
    }
}
