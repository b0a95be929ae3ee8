//! Per-direction body accumulation.
//!
//! The host reports the cumulative number of buffered body bytes on every
//! body callback. The accumulator pulls only the bytes it has not seen yet and
//! appends them, so the buffer length always equals `total_read`.

use crate::host::{Direction, Host};
use crate::observability::metrics;

/// Body bytes collected so far for one direction of an exchange.
#[derive(Debug)]
pub struct BodyAccumulator {
    direction: Direction,
    buffer: Vec<u8>,
    total_read: usize,
    chunk_count: usize,
}

impl BodyAccumulator {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            buffer: Vec::new(),
            total_read: 0,
            chunk_count: 0,
        }
    }

    /// Handle one "body available" notification.
    ///
    /// Never fails: host errors and size mismatches are logged and the
    /// notification is skipped or applied with whatever the host returned.
    pub fn on_body(
        &mut self,
        host: &dyn Host,
        context_id: u32,
        available: usize,
        end_of_stream: bool,
    ) {
        if end_of_stream {
            tracing::debug!(
                context_id,
                direction = self.direction.as_str(),
                total_read = self.total_read,
                "Body end of stream"
            );
        }

        let delta = match available.checked_sub(self.total_read) {
            Some(delta) if delta > 0 => delta,
            _ => return,
        };

        self.chunk_count += 1;
        let chunk = match host.body_chunk(self.direction, self.total_read, delta) {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::error!(
                    context_id,
                    direction = self.direction.as_str(),
                    offset = self.total_read,
                    size = delta,
                    error = %e,
                    "Failed to read body chunk"
                );
                metrics::record_host_failure("body");
                return;
            }
        };

        if chunk.len() != delta {
            tracing::warn!(
                context_id,
                direction = self.direction.as_str(),
                expected = delta,
                actual = chunk.len(),
                "Body chunk size mismatch"
            );
            metrics::record_chunk_mismatch(self.direction.as_str());
        }

        self.total_read += chunk.len();
        self.buffer.extend_from_slice(&chunk);
    }

    pub fn total_read(&self) -> usize {
        self.total_read
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Body as text; invalid UTF-8 sequences become U+FFFD.
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(&self.buffer).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::InMemoryHost;

    #[test]
    fn test_chunks_are_concatenated() {
        let mut host = InMemoryHost::new();
        let mut acc = BodyAccumulator::new(Direction::Request);

        let n = host.push_body(Direction::Request, b"{\"");
        acc.on_body(&host, 1, n, false);
        let n = host.push_body(Direction::Request, b"a\":1}");
        acc.on_body(&host, 1, n, true);

        assert_eq!(acc.bytes(), b"{\"a\":1}");
        assert_eq!(acc.total_read(), 7);
        assert_eq!(acc.chunk_count(), 2);
        assert_eq!(acc.bytes().len(), acc.total_read());
    }

    #[test]
    fn test_no_new_bytes_skips_host_call() {
        let mut host = InMemoryHost::new();
        let mut acc = BodyAccumulator::new(Direction::Response);

        let n = host.push_body(Direction::Response, b"abc");
        acc.on_body(&host, 1, n, false);
        acc.on_body(&host, 1, n, false);
        acc.on_body(&host, 1, n, true);
        acc.on_body(&host, 1, 0, true);

        assert_eq!(host.body_calls(Direction::Response), 1);
        assert_eq!(acc.chunk_count(), 1);
        assert_eq!(acc.bytes(), b"abc");
    }

    #[test]
    fn test_zero_length_body() {
        let host = InMemoryHost::new();
        let mut acc = BodyAccumulator::new(Direction::Request);
        acc.on_body(&host, 1, 0, true);
        assert_eq!(host.body_calls(Direction::Request), 0);
        assert_eq!(acc.to_text(), "");
    }

    #[test]
    fn test_failed_read_is_skipped() {
        let mut host = InMemoryHost::new();
        host.fail_body_reads(Direction::Request);
        let mut acc = BodyAccumulator::new(Direction::Request);

        let n = host.push_body(Direction::Request, b"payload");
        acc.on_body(&host, 1, n, true);

        assert_eq!(host.body_calls(Direction::Request), 1);
        assert_eq!(acc.total_read(), 0);
        assert!(acc.bytes().is_empty());
    }

    #[test]
    fn test_short_read_advances_by_actual_bytes() {
        let mut host = InMemoryHost::new();
        host.short_reads(1);
        let mut acc = BodyAccumulator::new(Direction::Response);

        let n = host.push_body(Direction::Response, b"abcd");
        acc.on_body(&host, 1, n, false);
        assert_eq!(acc.bytes(), b"abc");
        assert_eq!(acc.total_read(), 3);

        // The next notification resumes from the real offset.
        let n = host.push_body(Direction::Response, b"efg");
        acc.on_body(&host, 1, n, true);
        assert_eq!(acc.bytes(), b"abcdef");
        assert_eq!(acc.total_read(), acc.bytes().len());
    }

    #[test]
    fn test_long_read_runs_ahead_of_notifications() {
        let mut host = InMemoryHost::new();
        host.push_body(Direction::Request, b"abcdefghij");
        host.long_reads(2);
        let mut acc = BodyAccumulator::new(Direction::Request);

        acc.on_body(&host, 1, 3, false);
        assert_eq!(acc.bytes(), b"abcde");
        assert_eq!(acc.total_read(), 5);
        assert_eq!(host.body_calls(Direction::Request), 1);

        // Already read past this size, so the host is not asked again.
        acc.on_body(&host, 1, 4, false);
        assert_eq!(acc.bytes(), b"abcde");
        assert_eq!(acc.chunk_count(), 1);
        assert_eq!(host.body_calls(Direction::Request), 1);

        acc.on_body(&host, 1, 10, true);
        assert_eq!(acc.bytes(), b"abcdefghij");
        assert_eq!(acc.total_read(), 10);
        assert_eq!(acc.bytes().len(), acc.total_read());
        assert_eq!(host.body_calls(Direction::Request), 2);
        assert_eq!(acc.chunk_count(), 2);
    }

    #[test]
    fn test_many_chunks_reach_final_size() {
        let mut host = InMemoryHost::new();
        let mut acc = BodyAccumulator::new(Direction::Request);
        let mut expected = Vec::new();
        for i in 0..50u8 {
            let chunk = vec![b'a' + (i % 26); (i as usize % 7) + 1];
            expected.extend_from_slice(&chunk);
            let n = host.push_body(Direction::Request, &chunk);
            acc.on_body(&host, 9, n, i == 49);
        }
        assert_eq!(acc.total_read(), host.body_len(Direction::Request));
        assert_eq!(acc.bytes(), expected.as_slice());
        assert_eq!(acc.chunk_count(), 50);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut host = InMemoryHost::new();
        let mut acc = BodyAccumulator::new(Direction::Request);
        let n = host.push_body(Direction::Request, &[b'o', b'k', 0xff]);
        acc.on_body(&host, 1, n, true);
        assert_eq!(acc.to_text(), "ok\u{fffd}");
    }
}
