//! WorkerBuilder - ワーカーの構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - 明示的に構築したオブジェクトを注入する（暗黙のグローバルを持たない）

use std::sync::Arc;

use super::consumer::{ConsumerConfig, QueueConsumer};
use super::handler::RcaTaskHandler;
use super::publisher::EventPublisher;
use super::shutdown::{ShutdownController, ShutdownToken, install_signal_handlers};
use super::status::ConsumerStats;
use crate::domain::constants::TIMELINE_TOPIC;
use crate::domain::errors::ConsumerError;
use crate::domain::task_event::InboundTaskEvent;
use crate::domain::timeline::AgentMeta;
use crate::ports::{Clock, RcaInvoker, SystemClock, TransportConnector, WorkQueue};

/// WorkerBuilder は RCA ワーカーを構築
///
/// # 使用例
/// ```ignore
/// let worker = WorkerBuilder::new()
///     .work_queue(queue)
///     .rca_invoker(rca)
///     .event_bus(bus)
///     .build()?;
/// worker.run_until_signal("rca-tasks").await?;
/// ```
///
/// # Fail-fast 設計
/// - build() 時に必須コンポーネントと設定値をチェック
/// - 不足・不正があれば BuildError を返す
pub struct WorkerBuilder {
    queue: Option<Arc<dyn WorkQueue>>,
    rca: Option<Arc<dyn RcaInvoker>>,
    connector: Option<Arc<dyn TransportConnector>>,
    clock: Arc<dyn Clock>,
    topic: String,
    config: ConsumerConfig,
    agent: Option<AgentMeta>,
}

/// BuildError はワーカー構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("missing component: {0}. Set it on the builder before build().")]
    MissingComponent(&'static str),

    #[error("invalid consumer config: {0}")]
    InvalidConfig(String),

    #[error("event topic must not be empty")]
    EmptyTopic,
}

impl WorkerBuilder {
    pub fn new() -> Self {
        Self {
            queue: None,
            rca: None,
            connector: None,
            clock: Arc::new(SystemClock),
            topic: TIMELINE_TOPIC.to_string(),
            config: ConsumerConfig::default(),
            agent: None,
        }
    }

    pub fn work_queue(mut self, queue: Arc<dyn WorkQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn rca_invoker(mut self, rca: Arc<dyn RcaInvoker>) -> Self {
        self.rca = Some(rca);
        self
    }

    pub fn event_bus(mut self, connector: Arc<dyn TransportConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    pub fn consumer_config(mut self, config: ConsumerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn agent(mut self, agent: AgentMeta) -> Self {
        self.agent = Some(agent);
        self
    }

    pub fn build(self) -> Result<Worker, BuildError> {
        validate_config(&self.config)?;
        if self.topic.trim().is_empty() {
            return Err(BuildError::EmptyTopic);
        }
        let queue = self
            .queue
            .ok_or(BuildError::MissingComponent("work_queue"))?;
        let rca = self.rca.ok_or(BuildError::MissingComponent("rca_invoker"))?;
        let connector = self
            .connector
            .ok_or(BuildError::MissingComponent("event_bus"))?;

        let publisher = Arc::new(EventPublisher::new(connector, self.topic));
        let mut handler = RcaTaskHandler::new(rca, Arc::clone(&publisher), self.clock);
        if let Some(agent) = self.agent {
            handler = handler.with_agent(agent);
        }

        Ok(Worker {
            consumer: QueueConsumer::new(queue, self.config),
            handler,
            publisher,
        })
    }
}

impl Default for WorkerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_config(config: &ConsumerConfig) -> Result<(), BuildError> {
    if config.max_messages == 0 || config.max_messages > ConsumerConfig::MAX_MESSAGES {
        return Err(BuildError::InvalidConfig(format!(
            "max_messages must be between 1 and {}, got {}",
            ConsumerConfig::MAX_MESSAGES,
            config.max_messages
        )));
    }
    if config.wait_time > ConsumerConfig::MAX_WAIT_TIME {
        return Err(BuildError::InvalidConfig(format!(
            "wait_time must be at most {:?}, got {:?}",
            ConsumerConfig::MAX_WAIT_TIME,
            config.wait_time
        )));
    }
    Ok(())
}

/// 構築済みのワーカー
///
/// consumer が止まったら（正常終了でもエラーでも）publisher を必ず切断する。
pub struct Worker {
    consumer: QueueConsumer,
    handler: RcaTaskHandler,
    publisher: Arc<EventPublisher>,
}

impl Worker {
    pub fn publisher(&self) -> &Arc<EventPublisher> {
        &self.publisher
    }

    pub fn consumer_config(&self) -> &ConsumerConfig {
        self.consumer.config()
    }

    /// `shutdown` が立つまで `queue_name` を処理する。
    pub async fn run(
        &self,
        queue_name: &str,
        shutdown: ShutdownToken,
    ) -> Result<ConsumerStats, ConsumerError> {
        let result = self
            .consumer
            .start::<InboundTaskEvent, _>(queue_name, &self.handler, shutdown)
            .await;

        if let Err(e) = self.publisher.disconnect().await {
            tracing::error!(error = %e, "failed to flush event bus on shutdown");
        }
        result
    }

    /// SIGTERM / SIGINT を登録してから `run` する。
    pub async fn run_until_signal(&self, queue_name: &str) -> Result<ConsumerStats, ConsumerError> {
        let controller = ShutdownController::new();
        let token = controller.token();
        let signals = install_signal_handlers(controller).map_err(ConsumerError::SignalSetup)?;

        let result = self.run(queue_name, token).await;
        signals.abort();
        result
    }
}
