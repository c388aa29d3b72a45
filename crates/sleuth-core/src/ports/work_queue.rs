//! WorkQueue port - at-least-once の作業キュー（SQS 互換のセマンティクス）
//!
//! # 設計原則
//! - receive したメッセージは visibility timeout の間だけ他の受信者から見えない
//! - delete（ack）しない限り、timeout 後に再配送される
//! - receipt handle は配送ごとに払い出され、次の配送で無効になる

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

use crate::domain::errors::{DecodeError, QueueError};
use crate::domain::ids::{MessageId, ReceiptHandle};
use crate::domain::task_event::Task;

/// `resolve` が返すキューの所在（URL など）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueueAddress(String);

impl QueueAddress {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueueAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// 1 回の receive の条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiveOptions {
    /// 1 回で受け取る最大件数
    pub max_messages: usize,
    /// 何も無いときに待つ最大時間（long poll）
    pub wait_time: Duration,
}

/// キューから受け取った 1 件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    pub message_id: MessageId,
    pub receipt_handle: ReceiptHandle,
    pub body: String,
}

impl QueueMessage {
    /// 本文を Task 型に decode
    pub fn decode<T: Task>(&self) -> Result<T, DecodeError> {
        serde_json::from_str(&self.body).map_err(|source| DecodeError {
            task_type: T::TYPE,
            source,
        })
    }
}

#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// キュー名から所在を解決する。存在しなければ `QueueError::QueueNotFound`。
    async fn resolve(&self, queue_name: &str) -> Result<QueueAddress, QueueError>;

    /// 最大 `max_messages` 件を受け取る。空なら最大 `wait_time` 待って空の Vec を返す。
    async fn receive(
        &self,
        queue: &QueueAddress,
        options: ReceiveOptions,
    ) -> Result<Vec<QueueMessage>, QueueError>;

    /// receipt handle でメッセージを削除（ack）する。
    async fn delete(&self, queue: &QueueAddress, receipt: &ReceiptHandle)
    -> Result<(), QueueError>;
}
