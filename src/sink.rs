//! Event sink trait and implementations
//!
//! The collector hands every successfully processed issue to an
//! [`EventSink`] exactly once per pass. Failures are per-call: the driver
//! skips the single record and continues.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

/// Sourcetype label stamped on every emitted event
pub const SOURCETYPE: &str = "jira:issue";

/// One emitted event: an issue plus its routing envelope
#[derive(Debug, Clone)]
pub struct Event {
    /// The full issue object
    pub payload: Value,
    /// Event time: the issue's updated timestamp, seconds since epoch
    pub time: f64,
    /// Destination index
    pub index: String,
    /// Source: the input name
    pub source: String,
    /// Event kind label
    pub sourcetype: String,
}

impl Event {
    /// Build an event for an issue collected by the given input
    pub fn new(payload: Value, time: f64, index: &str, source: &str) -> Self {
        Self {
            payload,
            time,
            index: index.to_string(),
            source: source.to_string(),
            sourcetype: SOURCETYPE.to_string(),
        }
    }

    /// The sink envelope: routing metadata plus the issue payload
    pub fn envelope(&self) -> Value {
        json!({
            "time": self.time,
            "index": self.index,
            "source": self.source,
            "sourcetype": self.sourcetype,
            "event": self.payload,
        })
    }
}

/// Downstream event sink
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emit one event; failures apply to this call only
    async fn emit(&self, event: &Event) -> Result<()>;
}

// ============================================================================
// JSON Lines Sink
// ============================================================================

/// Sink writing one envelope per line to stdout or a file
pub struct JsonLinesSink {
    writer: Mutex<Box<dyn AsyncWrite + Send + Unpin>>,
}

impl JsonLinesSink {
    /// Sink writing to stdout
    pub fn stdout() -> Self {
        Self {
            writer: Mutex::new(Box::new(tokio::io::stdout())),
        }
    }

    /// Sink appending to a file
    pub async fn file(path: impl AsRef<Path>) -> Result<Self> {
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())
            .await?;
        Ok(Self {
            writer: Mutex::new(Box::new(file)),
        })
    }
}

#[async_trait]
impl EventSink for JsonLinesSink {
    async fn emit(&self, event: &Event) -> Result<()> {
        let mut line = serde_json::to_string(&event.envelope())
            .map_err(|e| Error::emit(format!("Failed to serialize event: {e}")))?;
        line.push('\n');

        let mut writer = self.writer.lock().await;
        writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| Error::emit(format!("Failed to write event: {e}")))?;
        writer
            .flush()
            .await
            .map_err(|e| Error::emit(format!("Failed to flush event: {e}")))?;
        Ok(())
    }
}

impl std::fmt::Debug for JsonLinesSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLinesSink").finish_non_exhaustive()
    }
}

// ============================================================================
// Memory Sink (tests, dry runs)
// ============================================================================

/// Sink collecting events in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<Event>>>,
}

impl MemorySink {
    /// Create an empty memory sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Events emitted so far
    pub async fn events(&self) -> Vec<Event> {
        self.events.lock().await.clone()
    }

    /// Number of events emitted so far
    pub async fn len(&self) -> usize {
        self.events.lock().await.len()
    }

    /// Check if no events have been emitted
    pub async fn is_empty(&self) -> bool {
        self.events.lock().await.is_empty()
    }
}

#[async_trait]
impl EventSink for MemorySink {
    async fn emit(&self, event: &Event) -> Result<()> {
        self.events.lock().await.push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_envelope_shape() {
        let event = Event::new(
            json!({"key": "A-1", "fields": {"updated": "2024-03-01T10:00:00.000+0000"}}),
            1_709_287_200.0,
            "jira",
            "prod-bugs",
        );
        let envelope = event.envelope();
        assert_eq!(envelope["index"], "jira");
        assert_eq!(envelope["source"], "prod-bugs");
        assert_eq!(envelope["sourcetype"], SOURCETYPE);
        assert_eq!(envelope["event"]["key"], "A-1");
    }

    #[tokio::test]
    async fn test_memory_sink_collects() {
        let sink = MemorySink::new();
        assert!(sink.is_empty().await);

        let event = Event::new(json!({"key": "A-1"}), 0.0, "jira", "prod-bugs");
        sink.emit(&event).await.unwrap();
        sink.emit(&event).await.unwrap();

        assert_eq!(sink.len().await, 2);
        assert_eq!(sink.events().await[0].payload["key"], "A-1");
    }

    #[tokio::test]
    async fn test_json_lines_sink_writes_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");

        let sink = JsonLinesSink::file(&path).await.unwrap();
        let event = Event::new(json!({"key": "A-1"}), 1.5, "jira", "prod-bugs");
        sink.emit(&event).await.unwrap();
        sink.emit(&event).await.unwrap();
        drop(sink);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"]["key"], "A-1");
        assert_eq!(first["sourcetype"], SOURCETYPE);
    }
}
