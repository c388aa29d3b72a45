//! Handler trait と RCA タスクの Handler
//!
//! # 学習ポイント
//! - ジェネリック trait (Handler<T>)
//! - 依存（RCA 関数、publisher、時計）は Arc で注入する

use async_trait::async_trait;
use std::sync::Arc;

use super::publisher::EventPublisher;
use crate::domain::errors::HandlerError;
use crate::domain::rca::RcaRequest;
use crate::domain::task_event::{InboundTaskEvent, Task};
use crate::domain::timeline::{AgentMeta, RootCauseProposedEvent};
use crate::ports::{Clock, RcaInvoker};

/// Handler は decode 済みの Task を処理する
///
/// `Ok(())` を返したときだけ consumer はメッセージを削除（ack）する。
/// 同じメッセージが再配送されうるので、同じ Task で何度呼ばれても安全であること。
///
/// # 使用例
/// ```ignore
/// struct MyTaskHandler;
///
/// #[async_trait]
/// impl Handler<MyTask> for MyTaskHandler {
///     async fn handle(&self, task: MyTask) -> Result<(), HandlerError> {
///         println!("Processing: {}", task.message);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Handler<T: Task>: Send + Sync {
    async fn handle(&self, task: T) -> Result<(), HandlerError>;
}

/// ContextBuilt → RCA → RootCauseProposed
///
/// RCA が失敗したら publish はしない。publish は成功時にちょうど 1 回。
pub struct RcaTaskHandler {
    rca: Arc<dyn RcaInvoker>,
    publisher: Arc<EventPublisher>,
    clock: Arc<dyn Clock>,
    agent: Option<AgentMeta>,
}

impl RcaTaskHandler {
    pub fn new(
        rca: Arc<dyn RcaInvoker>,
        publisher: Arc<EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            rca,
            publisher,
            clock,
            agent: None,
        }
    }

    pub fn with_agent(mut self, agent: AgentMeta) -> Self {
        self.agent = Some(agent);
        self
    }
}

#[async_trait]
impl Handler<InboundTaskEvent> for RcaTaskHandler {
    async fn handle(&self, task: InboundTaskEvent) -> Result<(), HandlerError> {
        tracing::info!(
            tenant_id = %task.tenant_id,
            incident_id = %task.incident_id,
            "running rca"
        );

        let request = RcaRequest::for_task(&task);
        let result = self.rca.run_rca(request).await?.validate()?;
        let confidence = result.confidence;

        // time is taken after the RCA call has returned
        let mut event = RootCauseProposedEvent::root_cause_proposed(
            self.clock.now(),
            task.tenant_id,
            task.incident_id,
            result,
        );
        if let Some(agent) = &self.agent {
            event = event.with_agent(agent.clone());
        }

        self.publisher.publish(&event).await?;
        tracing::info!(
            incident_id = %event.incident_id,
            confidence = %format!("{confidence:.2}"),
            "rca complete"
        );
        Ok(())
    }
}
