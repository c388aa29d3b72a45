//! Timeline events emitted on the event bus.
//!
//! Every event shares the same envelope (`time`, `tenant_id`, `incident_id`,
//! `event_type`, optional `agent`) and carries a type-specific `payload`.
//! This worker only produces `RootCauseProposed`; the other variants exist so
//! that the wire names stay in one place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{IncidentId, TenantId};
use super::rca::RcaResult;

/// All event types that appear on the incident timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimelineEventType {
    IncidentDetected,
    ContextBuilt,
    RootCauseProposed,
    FixProposed,
    FixApplied,
    InstrumentationProposed,
    EvaluationCompleted,
    IncidentResolved,
    IncidentSuppressed,
}

impl TimelineEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IncidentDetected => "IncidentDetected",
            Self::ContextBuilt => "ContextBuilt",
            Self::RootCauseProposed => "RootCauseProposed",
            Self::FixProposed => "FixProposed",
            Self::FixApplied => "FixApplied",
            Self::InstrumentationProposed => "InstrumentationProposed",
            Self::EvaluationCompleted => "EvaluationCompleted",
            Self::IncidentResolved => "IncidentResolved",
            Self::IncidentSuppressed => "IncidentSuppressed",
        }
    }
}

impl fmt::Display for TimelineEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies the agent that produced an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentMeta {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootCauseProposedPayload {
    pub hypothesis: String,
    pub confidence: f64,
    pub evidence_refs: Vec<String>,
}

impl From<RcaResult> for RootCauseProposedPayload {
    fn from(result: RcaResult) -> Self {
        Self {
            hypothesis: result.hypothesis,
            confidence: result.confidence,
            evidence_refs: result.evidence_refs,
        }
    }
}

/// One timeline event. Constructed once, then handed to the publisher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent<P> {
    pub time: DateTime<Utc>,
    pub tenant_id: TenantId,
    pub incident_id: IncidentId,
    pub event_type: TimelineEventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentMeta>,
    pub payload: P,
}

pub type RootCauseProposedEvent = TimelineEvent<RootCauseProposedPayload>;

impl RootCauseProposedEvent {
    pub fn root_cause_proposed(
        time: DateTime<Utc>,
        tenant_id: TenantId,
        incident_id: IncidentId,
        result: RcaResult,
    ) -> Self {
        Self {
            time,
            tenant_id,
            incident_id,
            event_type: TimelineEventType::RootCauseProposed,
            agent: None,
            payload: result.into(),
        }
    }
}

impl<P> TimelineEvent<P> {
    pub fn with_agent(mut self, agent: AgentMeta) -> Self {
        self.agent = Some(agent);
        self
    }
}
