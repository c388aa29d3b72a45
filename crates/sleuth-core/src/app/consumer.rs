//! QueueConsumer - 作業キューの poll ループ
//!
//! # フロー（`running` の間くり返す）
//! 1. `WorkQueue::receive()` で最大 `max_messages` 件を受け取る（最大 `wait_time` 待つ）
//!    - 失敗したらログを出して即座に次の receive（遅延なし、回数制限なし）
//! 2. 受け取った順に 1 件ずつ:
//!    - 本文を Task に decode → Handler 実行
//!    - decode / handler の失敗はログのみ。削除しないので timeout 後に再配送される
//!    - 成功したら receipt handle で削除。削除の失敗もログのみ
//!
//! # 停止
//! `ShutdownToken` はループ先頭でだけ確認する。receive や handler の最中に
//! 停止要求が来ても中断せず、その処理が終わってから抜ける。

use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;

use super::handler::Handler;
use super::shutdown::ShutdownToken;
use super::status::ConsumerStats;
use crate::domain::errors::ConsumerError;
use crate::domain::task_event::Task;
use crate::observability::message_span;
use crate::ports::{QueueAddress, QueueMessage, ReceiveOptions, WorkQueue};

/// Poll の条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumerConfig {
    /// long poll で待つ最大時間
    pub wait_time: Duration,
    /// 1 回の receive で受け取る最大件数
    pub max_messages: usize,
}

impl ConsumerConfig {
    /// Longest long-poll wait a work queue accepts.
    pub const MAX_WAIT_TIME: Duration = Duration::from_secs(20);
    /// Largest batch a single receive may return.
    pub const MAX_MESSAGES: usize = 10;

    pub fn receive_options(&self) -> ReceiveOptions {
        ReceiveOptions {
            max_messages: self.max_messages,
            wait_time: self.wait_time,
        }
    }
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            wait_time: Duration::from_secs(5),
            max_messages: 10,
        }
    }
}

/// What happened to one received message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Handler succeeded and the message was deleted.
    Acked,
    /// Body did not decode; left in the queue.
    DecodeFailed,
    /// Handler returned an error; left in the queue.
    HandlerFailed,
    /// Handler succeeded but the delete call failed; may be redelivered.
    DeleteFailed,
}

pub struct QueueConsumer {
    queue: Arc<dyn WorkQueue>,
    config: ConsumerConfig,
}

impl QueueConsumer {
    pub fn new(queue: Arc<dyn WorkQueue>, config: ConsumerConfig) -> Self {
        Self { queue, config }
    }

    pub fn config(&self) -> &ConsumerConfig {
        &self.config
    }

    /// `shutdown` が立つまでキューを処理し続ける。
    ///
    /// キュー名の解決に失敗したら即座にエラーを返す（リトライしない）。
    /// それ以外のエラーはすべてループ内で握りつぶしてログに出す。
    pub async fn start<T, H>(
        &self,
        queue_name: &str,
        handler: &H,
        shutdown: ShutdownToken,
    ) -> Result<ConsumerStats, ConsumerError>
    where
        T: Task,
        H: Handler<T> + ?Sized,
    {
        let address =
            self.queue
                .resolve(queue_name)
                .await
                .map_err(|source| ConsumerError::Resolve {
                    queue: queue_name.to_string(),
                    source,
                })?;
        tracing::info!(queue = queue_name, address = %address, "polling queue");

        let options = self.config.receive_options();
        let mut stats = ConsumerStats::default();

        while !shutdown.is_stopped() {
            stats.polls += 1;
            let messages = match self.queue.receive(&address, options).await {
                Ok(messages) => messages,
                Err(e) => {
                    stats.receive_errors += 1;
                    tracing::error!(queue = queue_name, error = %e, "error receiving messages");
                    // retry right away, but give the signal task a chance to run
                    tokio::task::yield_now().await;
                    continue;
                }
            };
            stats.received += messages.len() as u64;

            for message in &messages {
                let span = message_span(message.message_id.as_str(), T::TYPE);
                let outcome = self
                    .process_message(&address, message, handler)
                    .instrument(span)
                    .await;
                match outcome {
                    MessageOutcome::Acked => stats.acked += 1,
                    MessageOutcome::DecodeFailed => stats.decode_failures += 1,
                    MessageOutcome::HandlerFailed => stats.handler_failures += 1,
                    MessageOutcome::DeleteFailed => stats.delete_failures += 1,
                }
            }
        }

        tracing::info!(
            queue = queue_name,
            polls = stats.polls,
            received = stats.received,
            acked = stats.acked,
            left_for_redelivery = stats.left_for_redelivery(),
            receive_errors = stats.receive_errors,
            "consumer stopped"
        );
        Ok(stats)
    }

    /// decode → handle → delete。失敗はここで止めて、呼び出し側には結果だけ返す。
    pub async fn process_message<T, H>(
        &self,
        address: &QueueAddress,
        message: &QueueMessage,
        handler: &H,
    ) -> MessageOutcome
    where
        T: Task,
        H: Handler<T> + ?Sized,
    {
        let task = match message.decode::<T>() {
            Ok(task) => task,
            Err(e) => {
                tracing::error!(
                    message_id = %message.message_id,
                    error = %e,
                    "failed to decode message, leaving it for redelivery"
                );
                return MessageOutcome::DecodeFailed;
            }
        };

        if let Err(e) = handler.handle(task).await {
            tracing::error!(
                message_id = %message.message_id,
                kind = ?e.kind(),
                error = %e,
                "handler failed, leaving message for redelivery"
            );
            return MessageOutcome::HandlerFailed;
        }

        match self.queue.delete(address, &message.receipt_handle).await {
            Ok(()) => MessageOutcome::Acked,
            Err(e) => {
                tracing::error!(
                    message_id = %message.message_id,
                    error = %e,
                    "failed to delete message"
                );
                MessageOutcome::DeleteFailed
            }
        }
    }
}
