//! Partition key derivation.
//!
//! Events are bucketed by the listener address they arrived on without
//! shipping the address itself. The hash is FNV-1a (32-bit): stable across
//! runs and processes, not collision resistant.

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Partition value for a connection-identifying string.
pub fn partition(local_address: &str) -> u32 {
    local_address.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    })
}
