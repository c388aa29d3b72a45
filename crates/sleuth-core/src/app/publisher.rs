//! EventPublisher - timeline イベントの publish
//!
//! # フロー
//! 1. 初回の publish で `TransportConnector::connect()`（以降は同じ接続を再利用）
//! 2. JSON に serialize して incident_id を key に send
//! 3. flush が成功するまで戻らない（成功 = transport が送信を確定した）
//!
//! `disconnect()` は残りを flush してから接続を手放す。プロセス終了時に呼ぶ。

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::errors::PublishError;
use crate::domain::idempotency::idempotency_key;
use crate::domain::timeline::TimelineEvent;
use crate::ports::{BusRecord, EventTransport, TransportConnector};

pub const EVENT_TYPE_HEADER: &str = "event-type";
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

pub struct EventPublisher {
    connector: Arc<dyn TransportConnector>,
    topic: String,
    connection: Mutex<Option<Arc<dyn EventTransport>>>,
}

impl EventPublisher {
    pub fn new(connector: Arc<dyn TransportConnector>, topic: impl Into<String>) -> Self {
        Self {
            connector,
            topic: topic.into(),
            connection: Mutex::new(None),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub async fn is_connected(&self) -> bool {
        self.connection.lock().await.is_some()
    }

    /// Serialize, send keyed by `incident_id`, then flush.
    pub async fn publish<P>(&self, event: &TimelineEvent<P>) -> Result<(), PublishError>
    where
        P: Serialize + Sync,
    {
        let value = serde_json::to_vec(event)?;
        let key = idempotency_key(
            &event.tenant_id,
            &event.incident_id,
            event.event_type,
            event.agent.as_ref().map(|a| a.version.as_str()),
        );
        let record = BusRecord {
            topic: self.topic.clone(),
            key: event.incident_id.to_string(),
            value,
            headers: vec![
                (EVENT_TYPE_HEADER.to_string(), event.event_type.to_string()),
                (IDEMPOTENCY_KEY_HEADER.to_string(), key),
            ],
        };

        let connection = self.connection().await?;
        connection.send(record).await?;
        connection.flush().await
    }

    /// Flush buffered sends and release the connection. No-op when never connected.
    pub async fn disconnect(&self) -> Result<(), PublishError> {
        let connection = self.connection.lock().await.take();
        if let Some(connection) = connection {
            connection.flush().await?;
            tracing::info!(topic = %self.topic, "disconnected from event bus");
        }
        Ok(())
    }

    async fn connection(&self) -> Result<Arc<dyn EventTransport>, PublishError> {
        let mut guard = self.connection.lock().await;
        if let Some(connection) = guard.as_ref() {
            return Ok(Arc::clone(connection));
        }
        let connection = self.connector.connect().await?;
        tracing::info!(topic = %self.topic, "connected to event bus");
        *guard = Some(Arc::clone(&connection));
        Ok(connection)
    }
}
