//! InMemoryWorkQueue - 開発用の作業キュー
//!
//! # 学習ポイント
//! - tokio::sync::Mutex + Notify による long poll
//! - visibility timeout と receipt handle による at-least-once 配送
//! - 名前付きキューの管理と resolve
//!
//! # 実装詳細
//! - receive すると message は in-flight に移り、`visibility_timeout` 後に visible へ戻る
//! - 配送ごとに新しい receipt handle を払い出す（古い handle での delete は失敗）
//! - redrive policy があれば、受信回数を使い切った message は dead letter に移す

use async_trait::async_trait;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use ulid::Ulid;

use crate::domain::errors::QueueError;
use crate::domain::ids::{MessageId, ReceiptHandle};
use crate::ports::{QueueAddress, QueueMessage, ReceiveOptions, WorkQueue};

const ADDRESS_PREFIX: &str = "memory://queues/";

/// 受信回数の上限（キュー側のポリシー）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedrivePolicy {
    pub max_receive_count: u32,
}

/// キューごとの件数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub visible: usize,
    pub in_flight: usize,
    pub dead_lettered: usize,
}

#[derive(Debug, Clone)]
struct StoredMessage {
    message_id: MessageId,
    body: String,
    receive_count: u32,
}

#[derive(Debug)]
struct InFlight {
    message: StoredMessage,
    visible_at: Instant,
}

#[derive(Debug, Default)]
struct NamedQueue {
    visible: VecDeque<StoredMessage>,
    in_flight: HashMap<ReceiptHandle, InFlight>,
    dead_letters: Vec<StoredMessage>,
    redrive: Option<RedrivePolicy>,
}

impl NamedQueue {
    /// visibility timeout が切れた in-flight を visible（または dead letter）へ戻す
    fn release_expired(&mut self, now: Instant) {
        let mut expired: Vec<ReceiptHandle> = self
            .in_flight
            .iter()
            .filter(|(_, entry)| entry.visible_at <= now)
            .map(|(receipt, _)| receipt.clone())
            .collect();
        if expired.is_empty() {
            return;
        }
        expired.sort_by_key(|receipt| self.in_flight[receipt].visible_at);

        for receipt in expired {
            let Some(entry) = self.in_flight.remove(&receipt) else {
                continue;
            };
            let exhausted = self
                .redrive
                .is_some_and(|policy| entry.message.receive_count >= policy.max_receive_count);
            if exhausted {
                self.dead_letters.push(entry.message);
            } else {
                self.visible.push_back(entry.message);
            }
        }
    }

    fn take_visible(&mut self, max: usize, visible_at: Instant) -> Vec<QueueMessage> {
        let mut batch = Vec::new();
        while batch.len() < max {
            let Some(mut message) = self.visible.pop_front() else {
                break;
            };
            message.receive_count += 1;
            let receipt = ReceiptHandle::new(Ulid::new().to_string());
            batch.push(QueueMessage {
                message_id: message.message_id.clone(),
                receipt_handle: receipt.clone(),
                body: message.body.clone(),
            });
            self.in_flight.insert(
                receipt,
                InFlight {
                    message,
                    visible_at,
                },
            );
        }
        batch
    }

    fn next_expiry(&self) -> Option<Instant> {
        self.in_flight.values().map(|entry| entry.visible_at).min()
    }

    fn stats(&self) -> QueueStats {
        QueueStats {
            visible: self.visible.len(),
            in_flight: self.in_flight.len(),
            dead_lettered: self.dead_letters.len(),
        }
    }
}

/// InMemoryWorkQueue は開発・テスト用の作業キュー
///
/// # 使用例
/// ```ignore
/// let queue = InMemoryWorkQueue::new(Duration::from_secs(30));
/// queue.create_queue("rca-tasks").await;
/// queue.send_message("rca-tasks", body).await?;
/// ```
pub struct InMemoryWorkQueue {
    queues: Arc<Mutex<HashMap<String, NamedQueue>>>,
    /// send 時の通知用
    notify: Arc<Notify>,
    visibility_timeout: Duration,
}

impl InMemoryWorkQueue {
    pub fn new(visibility_timeout: Duration) -> Self {
        Self {
            queues: Arc::new(Mutex::new(HashMap::new())),
            notify: Arc::new(Notify::new()),
            visibility_timeout,
        }
    }

    /// キューを作成（既にあれば何もしない）
    pub async fn create_queue(&self, name: &str) {
        self.queues
            .lock()
            .await
            .entry(name.to_string())
            .or_default();
    }

    /// redrive policy 付きでキューを作成（既にあれば policy だけ更新）
    pub async fn create_queue_with_redrive(&self, name: &str, policy: RedrivePolicy) {
        self.queues
            .lock()
            .await
            .entry(name.to_string())
            .or_default()
            .redrive = Some(policy);
    }

    pub async fn send_message(
        &self,
        name: &str,
        body: impl Into<String>,
    ) -> Result<MessageId, QueueError> {
        let message_id = MessageId::new(Ulid::new().to_string());
        {
            let mut queues = self.queues.lock().await;
            let queue = queues
                .get_mut(name)
                .ok_or_else(|| QueueError::QueueNotFound(name.to_string()))?;
            queue.visible.push_back(StoredMessage {
                message_id: message_id.clone(),
                body: body.into(),
                receive_count: 0,
            });
        }
        // 待機中の receive を起こす
        self.notify.notify_waiters();
        Ok(message_id)
    }

    pub async fn send_json<T: Serialize + ?Sized>(
        &self,
        name: &str,
        body: &T,
    ) -> Result<MessageId, QueueError> {
        let body = serde_json::to_string(body)
            .map_err(|e| QueueError::Transport(format!("encode message body: {e}")))?;
        self.send_message(name, body).await
    }

    pub async fn stats(&self, name: &str) -> Option<QueueStats> {
        let mut queues = self.queues.lock().await;
        let queue = queues.get_mut(name)?;
        queue.release_expired(Instant::now());
        Some(queue.stats())
    }

    /// dead letter に移った message の本文
    pub async fn dead_letters(&self, name: &str) -> Vec<String> {
        let mut queues = self.queues.lock().await;
        let Some(queue) = queues.get_mut(name) else {
            return Vec::new();
        };
        queue.release_expired(Instant::now());
        queue.dead_letters.iter().map(|m| m.body.clone()).collect()
    }

    fn queue_name<'a>(&self, address: &'a QueueAddress) -> Result<&'a str, QueueError> {
        address
            .as_str()
            .strip_prefix(ADDRESS_PREFIX)
            .ok_or_else(|| QueueError::QueueNotFound(address.to_string()))
    }
}

#[async_trait]
impl WorkQueue for InMemoryWorkQueue {
    async fn resolve(&self, queue_name: &str) -> Result<QueueAddress, QueueError> {
        let queues = self.queues.lock().await;
        if !queues.contains_key(queue_name) {
            return Err(QueueError::QueueNotFound(queue_name.to_string()));
        }
        Ok(QueueAddress::new(format!("{ADDRESS_PREFIX}{queue_name}")))
    }

    /// # 実装
    /// 1. 期限切れの in-flight を戻す
    /// 2. visible から最大 `max_messages` 件を取り出して返す
    /// 3. 空なら send か次の期限切れまで待つ（最大 `wait_time`）
    async fn receive(
        &self,
        queue: &QueueAddress,
        options: ReceiveOptions,
    ) -> Result<Vec<QueueMessage>, QueueError> {
        let name = self.queue_name(queue)?;
        let deadline = Instant::now() + options.wait_time;

        loop {
            // lock を取る前に登録しておけば、その後の notify_waiters を取りこぼさない
            let notified = self.notify.notified();
            let wake_at = {
                let mut queues = self.queues.lock().await;
                let named = queues
                    .get_mut(name)
                    .ok_or_else(|| QueueError::QueueNotFound(name.to_string()))?;
                let now = Instant::now();
                named.release_expired(now);

                let batch = named.take_visible(options.max_messages, now + self.visibility_timeout);
                if !batch.is_empty() || now >= deadline {
                    return Ok(batch);
                }
                named
                    .next_expiry()
                    .map_or(deadline, |expiry| expiry.min(deadline))
            };
            let _ = tokio::time::timeout_at(wake_at, notified).await;
        }
    }

    async fn delete(
        &self,
        queue: &QueueAddress,
        receipt: &ReceiptHandle,
    ) -> Result<(), QueueError> {
        let name = self.queue_name(queue)?;
        let mut queues = self.queues.lock().await;
        let named = queues
            .get_mut(name)
            .ok_or_else(|| QueueError::QueueNotFound(name.to_string()))?;
        named.release_expired(Instant::now());
        named
            .in_flight
            .remove(receipt)
            .map(|_| ())
            .ok_or_else(|| QueueError::InvalidReceipt(receipt.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUEUE: &str = "rca-tasks";

    fn options(max_messages: usize, wait_ms: u64) -> ReceiveOptions {
        ReceiveOptions {
            max_messages,
            wait_time: Duration::from_millis(wait_ms),
        }
    }

    async fn queue_with(visibility: Duration, bodies: &[&str]) -> (InMemoryWorkQueue, QueueAddress) {
        let queue = InMemoryWorkQueue::new(visibility);
        queue.create_queue(QUEUE).await;
        for body in bodies {
            queue.send_message(QUEUE, *body).await.unwrap();
        }
        let address = queue.resolve(QUEUE).await.unwrap();
        (queue, address)
    }

    #[tokio::test]
    async fn test_send_receive_delete() {
        let (queue, address) = queue_with(Duration::from_secs(30), &["a"]).await;

        let messages = queue.receive(&address, options(10, 0)).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].body, "a");
        assert_eq!(queue.stats(QUEUE).await.unwrap().in_flight, 1);

        queue.delete(&address, &messages[0].receipt_handle).await.unwrap();
        assert_eq!(queue.stats(QUEUE).await.unwrap(), QueueStats::default());
    }

    #[tokio::test]
    async fn test_resolve_unknown_queue_fails() {
        let queue = InMemoryWorkQueue::new(Duration::from_secs(30));
        let err = queue.resolve("missing").await.unwrap_err();
        assert!(matches!(err, QueueError::QueueNotFound(name) if name == "missing"));
    }

    #[tokio::test]
    async fn test_receive_respects_max_messages_and_order() {
        let (queue, address) = queue_with(Duration::from_secs(30), &["1", "2", "3"]).await;

        let first = queue.receive(&address, options(2, 0)).await.unwrap();
        let bodies: Vec<_> = first.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["1", "2"]);

        let second = queue.receive(&address, options(2, 0)).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].body, "3");
    }

    #[tokio::test]
    async fn test_long_poll_times_out_empty() {
        let (queue, address) = queue_with(Duration::from_secs(30), &[]).await;
        let start = std::time::Instant::now();

        let messages = queue.receive(&address, options(10, 100)).await.unwrap();

        assert!(messages.is_empty());
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_send_wakes_long_poll() {
        let (queue, address) = queue_with(Duration::from_secs(30), &[]).await;
        let queue = Arc::new(queue);

        let receiver = tokio::spawn({
            let queue = queue.clone();
            async move { queue.receive(&address, options(10, 5_000)).await.unwrap() }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        queue.send_message(QUEUE, "late").await.unwrap();

        let messages = receiver.await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].body, "late");
    }

    #[tokio::test]
    async fn test_visibility_timeout_redelivers_with_new_receipt() {
        let (queue, address) = queue_with(Duration::from_millis(50), &["a"]).await;

        let first = queue.receive(&address, options(10, 0)).await.unwrap();
        assert_eq!(first.len(), 1);
        // hidden while in flight
        assert!(queue.receive(&address, options(10, 0)).await.unwrap().is_empty());

        // long poll wakes up when the visibility timeout expires
        let second = queue.receive(&address, options(10, 1_000)).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].message_id, first[0].message_id);
        assert_ne!(second[0].receipt_handle, first[0].receipt_handle);

        let err = queue
            .delete(&address, &first[0].receipt_handle)
            .await
            .unwrap_err();
        assert!(matches!(err, QueueError::InvalidReceipt(_)));
        queue.delete(&address, &second[0].receipt_handle).await.unwrap();
    }

    #[tokio::test]
    async fn test_redrive_moves_exhausted_messages_to_dead_letters() {
        let queue = InMemoryWorkQueue::new(Duration::from_millis(10));
        queue
            .create_queue_with_redrive(QUEUE, RedrivePolicy { max_receive_count: 2 })
            .await;
        queue.send_message(QUEUE, "poison").await.unwrap();
        let address = queue.resolve(QUEUE).await.unwrap();

        for _ in 0..2 {
            let messages = queue.receive(&address, options(10, 500)).await.unwrap();
            assert_eq!(messages.len(), 1);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(queue.receive(&address, options(10, 0)).await.unwrap().is_empty());
        assert_eq!(queue.dead_letters(QUEUE).await, vec!["poison".to_string()]);
        assert_eq!(queue.stats(QUEUE).await.unwrap().dead_lettered, 1);
    }
}
