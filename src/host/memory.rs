//! In-memory host used by the replay command and by tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::host::{Direction, Host, HostError};

/// A host whose exchange state lives in plain buffers.
///
/// Supports fault injection: header, body and property reads can be made to
/// fail, and body reads can be shortened or lengthened by a fixed number of
/// bytes.
#[derive(Debug, Default)]
pub struct InMemoryHost {
    request_headers: Vec<(String, String)>,
    response_headers: Vec<(String, String)>,
    request_body: Vec<u8>,
    response_body: Vec<u8>,
    properties: HashMap<String, Option<Vec<u8>>>,
    failing_headers: HashSet<Direction>,
    failing_bodies: HashSet<Direction>,
    failing_properties: HashSet<String>,
    short_read: usize,
    long_read: usize,
    request_body_calls: AtomicUsize,
    response_body_calls: AtomicUsize,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_headers(&mut self, direction: Direction, headers: Vec<(String, String)>) {
        match direction {
            Direction::Request => self.request_headers = headers,
            Direction::Response => self.response_headers = headers,
        }
    }

    /// Append bytes to the host-side body buffer. Returns the new cumulative size.
    pub fn push_body(&mut self, direction: Direction, bytes: &[u8]) -> usize {
        let body = self.body_mut(direction);
        body.extend_from_slice(bytes);
        body.len()
    }

    pub fn body_len(&self, direction: Direction) -> usize {
        self.body(direction).len()
    }

    pub fn set_property(&mut self, path: &[&str], value: Vec<u8>) {
        self.properties.insert(path.join("."), Some(value));
    }

    /// Mark a property as known to the host but carrying no value.
    pub fn unset_property(&mut self, path: &[&str]) {
        self.properties.insert(path.join("."), None);
    }

    pub fn fail_headers(&mut self, direction: Direction) {
        self.failing_headers.insert(direction);
    }

    pub fn fail_body_reads(&mut self, direction: Direction) {
        self.failing_bodies.insert(direction);
    }

    pub fn fail_property(&mut self, path: &[&str]) {
        self.failing_properties.insert(path.join("."));
    }

    /// Every body read returns `bytes` fewer bytes than requested.
    pub fn short_reads(&mut self, bytes: usize) {
        self.short_read = bytes;
    }

    /// Every body read returns up to `bytes` more than requested, bounded by
    /// what is buffered.
    pub fn long_reads(&mut self, bytes: usize) {
        self.long_read = bytes;
    }

    /// Number of body reads issued for a direction.
    pub fn body_calls(&self, direction: Direction) -> usize {
        self.calls(direction).load(Ordering::Relaxed)
    }

    fn body(&self, direction: Direction) -> &Vec<u8> {
        match direction {
            Direction::Request => &self.request_body,
            Direction::Response => &self.response_body,
        }
    }

    fn body_mut(&mut self, direction: Direction) -> &mut Vec<u8> {
        match direction {
            Direction::Request => &mut self.request_body,
            Direction::Response => &mut self.response_body,
        }
    }

    fn calls(&self, direction: Direction) -> &AtomicUsize {
        match direction {
            Direction::Request => &self.request_body_calls,
            Direction::Response => &self.response_body_calls,
        }
    }
}

impl Host for InMemoryHost {
    fn headers(&self, direction: Direction) -> Result<Vec<(String, String)>, HostError> {
        if self.failing_headers.contains(&direction) {
            return Err(HostError::Internal(format!(
                "{} headers unavailable",
                direction.as_str()
            )));
        }
        Ok(match direction {
            Direction::Request => self.request_headers.clone(),
            Direction::Response => self.response_headers.clone(),
        })
    }

    fn body_chunk(
        &self,
        direction: Direction,
        offset: usize,
        size: usize,
    ) -> Result<Vec<u8>, HostError> {
        self.calls(direction).fetch_add(1, Ordering::Relaxed);

        if self.failing_bodies.contains(&direction) {
            return Err(HostError::Internal(format!(
                "{} body unavailable",
                direction.as_str()
            )));
        }

        let body = self.body(direction);
        if offset > body.len() {
            return Err(HostError::BadArgument);
        }
        let wanted = size
            .saturating_sub(self.short_read)
            .saturating_add(self.long_read);
        let end = offset.saturating_add(wanted).min(body.len());
        Ok(body[offset..end].to_vec())
    }

    fn property(&self, path: &[&str]) -> Result<Option<Vec<u8>>, HostError> {
        let key = path.join(".");
        if self.failing_properties.contains(&key) {
            return Err(HostError::Internal(format!("property {} unavailable", key)));
        }
        self.properties.get(&key).cloned().ok_or(HostError::NotFound)
    }
}
