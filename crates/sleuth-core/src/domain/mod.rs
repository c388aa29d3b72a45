//! Domain model (IDs, task events, timeline events, RCA contract, errors).

pub mod constants;
pub mod errors;
pub mod idempotency;
pub mod ids;
pub mod prompts;
pub mod rca;
pub mod task_event;
pub mod timeline;

pub use errors::{
    ConsumerError, DecodeError, ErrorKind, HandlerError, PublishError, QueueError, RcaError,
};
pub use idempotency::idempotency_key;
pub use ids::{IncidentId, MessageId, ReceiptHandle, TenantId};
pub use rca::{RcaRequest, RcaResult};
pub use task_event::{ContextPayload, InboundTaskEvent, Task};
pub use timeline::{
    AgentMeta, RootCauseProposedEvent, RootCauseProposedPayload, TimelineEvent,
    TimelineEventType,
};
