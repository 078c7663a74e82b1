//! Subscription frame scanning.
//!
//! # Design
//! - Frames are `data: <json>` lines; only an envelope whose `data` member is truthy
//!   matters, everything else (keep-alives, completion markers, comments) is skipped.
//! - Bytes are buffered until a full line is available, so chunk boundaries may fall
//!   anywhere, including inside a multi-byte character.

use futures_util::StreamExt;
use reqwest::Response;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{PortalError, PortalResult};

/// Incremental scanner over an event stream body.
#[derive(Debug, Default)]
pub struct FrameScanner {
    pending: Vec<u8>,
}

impl FrameScanner {
    /// Empty scanner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a chunk; returns the first data payload completed by it.
    pub fn feed(&mut self, chunk: &[u8]) -> Option<Value> {
        self.pending.extend_from_slice(chunk);
        while let Some(position) = self.pending.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=position).collect();
            if let Some(payload) = scan_line(&String::from_utf8_lossy(&line)) {
                return Some(payload);
            }
        }
        None
    }

    /// Flush a trailing line that was not newline-terminated.
    pub fn finish(&mut self) -> Option<Value> {
        if self.pending.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.pending);
        scan_line(&String::from_utf8_lossy(&line))
    }
}

#[cfg(test)]
fn first_data_frame(body: &str) -> Option<Value> {
    let mut scanner = FrameScanner::new();
    scanner
        .feed(body.as_bytes())
        .or_else(|| scanner.finish())
}

/// Read a streaming response until the first data-bearing frame arrives.
pub(crate) async fn read_first_data_frame(
    operation: &'static str,
    url: &str,
    response: Response,
) -> PortalResult<Value> {
    let mut scanner = FrameScanner::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|source| PortalError::Http {
            operation,
            url: url.to_string(),
            source,
        })?;
        if let Some(payload) = scanner.feed(&chunk) {
            debug!(operation, "data frame received");
            return Ok(payload);
        }
    }
    scanner
        .finish()
        .ok_or(PortalError::EmptyResponse { operation })
}

fn scan_line(line: &str) -> Option<Value> {
    let line = line.trim_end_matches(['\n', '\r']);
    let body = line.strip_prefix("data:")?.trim_start();
    let envelope: Value = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(err) => {
            warn!(error = %err, "skipping malformed stream frame");
            return None;
        }
    };
    match envelope {
        Value::Object(mut members) => members.remove("data").filter(is_truthy),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(members) => !members.is_empty(),
    }
}
