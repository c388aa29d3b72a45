//! InMemoryEventBus - 開発・テスト用のイベントバス
//!
//! send された record は接続ごとに buffer され、flush で committed に移る。
//! `records()` は committed だけを返す（flush していない record は見えない）。

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;

use crate::domain::errors::PublishError;
use crate::ports::{BusRecord, EventTransport, TransportConnector};

#[derive(Default)]
struct Shared {
    committed: Mutex<Vec<BusRecord>>,
    connects: AtomicUsize,
    unavailable: AtomicBool,
}

/// Clone は同じバスを指す（テストで publisher と検証側が共有する）
#[derive(Clone, Default)]
pub struct InMemoryEventBus {
    shared: Arc<Shared>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// `connect()` が呼ばれた回数
    pub fn connect_count(&self) -> usize {
        self.shared.connects.load(Ordering::SeqCst)
    }

    /// flush 済みの record（送信順）
    pub async fn records(&self) -> Vec<BusRecord> {
        self.shared.committed.lock().await.clone()
    }

    /// true の間は send / flush が失敗する
    pub fn set_unavailable(&self, unavailable: bool) {
        self.shared.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn is_unavailable(&self) -> bool {
        self.shared.unavailable.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransportConnector for InMemoryEventBus {
    async fn connect(&self) -> Result<Arc<dyn EventTransport>, PublishError> {
        self.shared.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(InMemoryTransport {
            bus: self.clone(),
            pending: Mutex::new(Vec::new()),
        }))
    }
}

struct InMemoryTransport {
    bus: InMemoryEventBus,
    pending: Mutex<Vec<BusRecord>>,
}

#[async_trait]
impl EventTransport for InMemoryTransport {
    async fn send(&self, record: BusRecord) -> Result<(), PublishError> {
        if self.bus.is_unavailable() {
            return Err(PublishError::Send("in-memory bus is unavailable".to_string()));
        }
        self.pending.lock().await.push(record);
        Ok(())
    }

    async fn flush(&self) -> Result<(), PublishError> {
        if self.bus.is_unavailable() {
            return Err(PublishError::Flush("in-memory bus is unavailable".to_string()));
        }
        let mut pending = self.pending.lock().await;
        self.bus.shared.committed.lock().await.append(&mut pending);
        Ok(())
    }
}
