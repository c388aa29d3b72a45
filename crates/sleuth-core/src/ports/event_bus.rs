//! EventBus port - timeline イベントの送信先
//!
//! 接続（`EventTransport`）は `TransportConnector` から遅延生成される。
//! 接続の共有・再利用・切断は `app::publisher::EventPublisher` が受け持つ。

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::errors::PublishError;

/// One keyed record on a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusRecord {
    pub topic: String,
    /// Partition key; records with the same key keep their relative order.
    pub key: String,
    pub value: Vec<u8>,
    pub headers: Vec<(String, String)>,
}

impl BusRecord {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// An open connection to the event bus.
///
/// `send` may buffer; only a successful `flush` confirms delivery.
#[async_trait]
pub trait EventTransport: Send + Sync {
    async fn send(&self, record: BusRecord) -> Result<(), PublishError>;

    async fn flush(&self) -> Result<(), PublishError>;
}

/// Opens connections to the event bus.
#[async_trait]
pub trait TransportConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn EventTransport>, PublishError>;
}
