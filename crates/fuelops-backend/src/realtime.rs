//! Realtime change feed for `driver_tasks`
//!
//! The backend streams row changes as server-sent events: `data: {json}`
//! lines terminated by a blank line. Two frame shapes are in use depending
//! on the transport version:
//!
//! ```text
//! {"type": "UPDATE", "table": "driver_tasks", "record": {..}, "old_record": {..}}
//! {"eventType": "update", "new": {..}, "old": {..}}
//! ```
//!
//! Either may be wrapped in a `payload` object. [`decode_frame`] accepts all
//! of them; [`HttpRealtimeFeed`] keeps a stream open, reconnecting with
//! exponential backoff, and forwards decoded events over a bounded channel.

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{header::ACCEPT, Method};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use fuelops_core::{
    domain::DriverProfile,
    ports::{IRealtimeFeed, TaskEvent},
};

use crate::{client::BackendClient, provider::driver_filter, rows, BackendError};

const TASKS_TABLE: &str = "driver_tasks";

/// First reconnect delay
pub const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Reconnect delay cap
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

// ============================================================================
// SSE line decoder
// ============================================================================

/// Longest unterminated line the decoder buffers before discarding it
pub const MAX_PENDING_LINE: usize = 1024 * 1024;

/// Incremental server-sent-event decoder
///
/// Feed it raw chunks in arrival order; it returns the `data` payload of
/// every event completed by the chunk. Multi-line `data` fields are joined
/// with `\n`. Comments and other fields are ignored.
#[derive(Debug)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
    max_line: usize,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_line_limit(MAX_PENDING_LINE)
    }
}

impl SseDecoder {
    /// Decoder that drops any line longer than `max_line` bytes
    pub fn with_line_limit(max_line: usize) -> Self {
        Self {
            buffer: Vec::new(),
            data: Vec::new(),
            max_line,
        }
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);

            if line.is_empty() {
                if !self.data.is_empty() {
                    events.push(self.data.join("\n"));
                    self.data.clear();
                }
            } else if let Some(value) = line.strip_prefix("data:") {
                self.data
                    .push(value.strip_prefix(' ').unwrap_or(value).to_string());
            }
        }

        if self.buffer.len() > self.max_line {
            warn!(
                pending = self.buffer.len(),
                limit = self.max_line,
                "Discarding oversized realtime line"
            );
            self.buffer.clear();
            self.data.clear();
        }

        events
    }
}

// ============================================================================
// Frame decoding
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "INSERT" => Some(ChangeKind::Insert),
            "UPDATE" => Some(ChangeKind::Update),
            "DELETE" => Some(ChangeKind::Delete),
            _ => None,
        }
    }
}

fn object<'a>(frame: &'a Value, keys: &[&str]) -> Option<&'a serde_json::Map<String, Value>> {
    keys.iter()
        .filter_map(|k| frame.get(*k).and_then(Value::as_object))
        .find(|m| !m.is_empty())
}

/// Decodes one change frame
///
/// Returns `Ok(None)` for frames that are not row changes of `driver_tasks`
/// (heartbeats, other tables, unknown event types).
pub fn decode_frame(value: &Value) -> Result<Option<TaskEvent>, BackendError> {
    let frame = match value.get("payload") {
        Some(inner @ Value::Object(_)) => inner,
        _ => value,
    };

    if let Some(table) = frame.get("table").and_then(Value::as_str) {
        if table != TASKS_TABLE {
            return Ok(None);
        }
    }

    let kind = ["type", "eventType", "event"]
        .iter()
        .filter_map(|k| frame.get(*k).and_then(Value::as_str))
        .find_map(ChangeKind::parse);
    let Some(kind) = kind else {
        return Ok(None);
    };

    let record = object(frame, &["record", "new"]);
    let old = object(frame, &["old_record", "old"]);

    match kind {
        ChangeKind::Insert | ChangeKind::Update => {
            let row = record.ok_or_else(|| {
                BackendError::InvalidResponse("change frame without a record".into())
            })?;
            let task = rows::task_from_row(row)?;
            Ok(Some(if kind == ChangeKind::Insert {
                TaskEvent::Inserted(task)
            } else {
                TaskEvent::Updated(task)
            }))
        }
        ChangeKind::Delete => {
            let row = old.or(record).ok_or_else(|| {
                BackendError::InvalidResponse("delete frame without an old record".into())
            })?;
            Ok(Some(TaskEvent::Deleted(rows::deleted_from_row(row)?)))
        }
    }
}

// ============================================================================
// HttpRealtimeFeed
// ============================================================================

/// Reconnecting SSE subscriber implementing [`IRealtimeFeed`]
pub struct HttpRealtimeFeed {
    client: Arc<BackendClient>,
    endpoint: String,
    buffer: usize,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl HttpRealtimeFeed {
    /// Creates a feed reading from `endpoint` with a channel of `buffer` events
    pub fn new(client: Arc<BackendClient>, endpoint: impl Into<String>, buffer: usize) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            buffer: buffer.max(1),
            initial_backoff: INITIAL_BACKOFF,
            max_backoff: MAX_BACKOFF,
        }
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max.max(initial);
        self
    }
}

#[async_trait]
impl IRealtimeFeed for HttpRealtimeFeed {
    async fn subscribe(
        &self,
        driver: &DriverProfile,
        shutdown: CancellationToken,
    ) -> Result<mpsc::Receiver<TaskEvent>> {
        let (tx, rx) = mpsc::channel(self.buffer);
        let subscription = Subscription {
            client: Arc::clone(&self.client),
            endpoint: self.endpoint.clone(),
            driver: driver.clone(),
            initial_backoff: self.initial_backoff,
            max_backoff: self.max_backoff,
        };
        tokio::spawn(subscription.run(tx, shutdown));
        Ok(rx)
    }
}

enum StreamEnd {
    Closed { delivered: usize },
    ReceiverDropped,
}

struct Subscription {
    client: Arc<BackendClient>,
    endpoint: String,
    driver: DriverProfile,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl Subscription {
    async fn run(self, tx: mpsc::Sender<TaskEvent>, shutdown: CancellationToken) {
        let mut backoff = self.initial_backoff;
        info!(driver = self.driver.name(), "Realtime subscription started");

        loop {
            let outcome = tokio::select! {
                _ = shutdown.cancelled() => break,
                outcome = self.stream_once(&tx) => outcome,
            };

            match outcome {
                Ok(StreamEnd::ReceiverDropped) => break,
                Ok(StreamEnd::Closed { delivered }) => {
                    if delivered > 0 {
                        backoff = self.initial_backoff;
                    }
                    debug!(delivered, "Realtime stream closed");
                }
                Err(e) => warn!(error = %e, "Realtime stream failed"),
            }

            if tx.is_closed() {
                break;
            }

            debug!(delay_ms = backoff.as_millis() as u64, "Reconnecting realtime stream");
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(backoff) => {}
            }
            backoff = (backoff * 2).min(self.max_backoff);
        }

        info!(driver = self.driver.name(), "Realtime subscription stopped");
    }

    async fn stream_once(&self, tx: &mpsc::Sender<TaskEvent>) -> Result<StreamEnd, BackendError> {
        let request = self
            .client
            .request_url(Method::GET, &self.endpoint)
            .header(ACCEPT, "text/event-stream")
            .query(&[
                ("table", TASKS_TABLE.to_string()),
                ("or", driver_filter(&self.driver)),
            ]);
        let response = self.client.execute_with_retry(request).await?;

        let mut stream = response.bytes_stream();
        let mut decoder = SseDecoder::default();
        let mut delivered = 0;

        while let Some(chunk) = stream.next().await {
            for data in decoder.push(&chunk?) {
                let value: Value = match serde_json::from_str(&data) {
                    Ok(value) => value,
                    Err(e) => {
                        warn!(error = %e, "Skipping malformed realtime frame");
                        continue;
                    }
                };
                match decode_frame(&value) {
                    Ok(Some(event)) => {
                        if tx.send(event).await.is_err() {
                            return Ok(StreamEnd::ReceiverDropped);
                        }
                        delivered += 1;
                    }
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "Skipping undecodable realtime frame"),
                }
            }
        }

        Ok(StreamEnd::Closed { delivered })
    }
}
