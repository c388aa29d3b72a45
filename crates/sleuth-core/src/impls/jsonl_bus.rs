//! JsonLinesEventBus - ファイル追記型のイベントバス
//!
//! 1 record = 1 行の JSON（`{"topic","key","headers","value"}`）。
//! flush でファイルに書き出して `sync_data` する。

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;

use crate::domain::errors::PublishError;
use crate::ports::{BusRecord, EventTransport, TransportConnector};

pub struct JsonLinesEventBus {
    path: PathBuf,
}

impl JsonLinesEventBus {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TransportConnector for JsonLinesEventBus {
    async fn connect(&self) -> Result<Arc<dyn EventTransport>, PublishError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| PublishError::Connect(format!("{}: {e}", self.path.display())))?;
        Ok(Arc::new(JsonLinesTransport {
            writer: Mutex::new(BufWriter::new(file)),
        }))
    }
}

#[derive(Serialize)]
struct Line<'a> {
    topic: &'a str,
    key: &'a str,
    headers: BTreeMap<&'a str, &'a str>,
    value: serde_json::Value,
}

struct JsonLinesTransport {
    writer: Mutex<BufWriter<File>>,
}

#[async_trait]
impl EventTransport for JsonLinesTransport {
    async fn send(&self, record: BusRecord) -> Result<(), PublishError> {
        let line = Line {
            topic: &record.topic,
            key: &record.key,
            headers: record
                .headers
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect(),
            value: serde_json::from_slice(&record.value)?,
        };
        let mut bytes = serde_json::to_vec(&line)?;
        bytes.push(b'\n');

        self.writer
            .lock()
            .await
            .write_all(&bytes)
            .await
            .map_err(|e| PublishError::Send(e.to_string()))
    }

    async fn flush(&self) -> Result<(), PublishError> {
        let mut writer = self.writer.lock().await;
        writer
            .flush()
            .await
            .map_err(|e| PublishError::Flush(e.to_string()))?;
        writer
            .get_ref()
            .sync_data()
            .await
            .map_err(|e| PublishError::Flush(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: &str) -> BusRecord {
        BusRecord {
            topic: "debugging.timeline".to_string(),
            key: key.to_string(),
            value: br#"{"incident_id":"inc-1"}"#.to_vec(),
            headers: vec![("event-type".to_string(), "RootCauseProposed".to_string())],
        }
    }

    #[tokio::test]
    async fn test_appends_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timeline.jsonl");
        let bus = JsonLinesEventBus::new(&path);

        let transport = bus.connect().await.unwrap();
        transport.send(record("inc-1")).await.unwrap();
        transport.send(record("inc-2")).await.unwrap();
        transport.flush().await.unwrap();

        // reconnecting appends instead of truncating
        let transport = bus.connect().await.unwrap();
        transport.send(record("inc-3")).await.unwrap();
        transport.flush().await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<serde_json::Value> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["key"], "inc-1");
        assert_eq!(lines[2]["key"], "inc-3");
        assert_eq!(lines[0]["headers"]["event-type"], "RootCauseProposed");
        assert_eq!(lines[0]["value"]["incident_id"], "inc-1");
    }

    #[tokio::test]
    async fn test_connect_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let bus = JsonLinesEventBus::new(dir.path().join("missing").join("timeline.jsonl"));

        let err = bus.connect().await.err().unwrap();
        assert!(matches!(err, PublishError::Connect(_)));
    }
}
