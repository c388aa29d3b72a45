//! RCA collaborator contract (request / result).

use serde::{Deserialize, Serialize};

use super::errors::RcaError;
use super::ids::{IncidentId, TenantId};
use super::prompts::{SYSTEM_PROMPT, render_user_prompt};
use super::task_event::InboundTaskEvent;

/// Request sent to the remote RCA function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RcaRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub incident_id: IncidentId,
    pub tenant_id: TenantId,
}

impl RcaRequest {
    /// Render the fixed instruction template around the task's context summary.
    pub fn for_task(task: &InboundTaskEvent) -> Self {
        Self {
            system_prompt: SYSTEM_PROMPT.to_string(),
            user_prompt: render_user_prompt(&task.payload.context_summary),
            incident_id: task.incident_id.clone(),
            tenant_id: task.tenant_id.clone(),
        }
    }
}

/// Hypothesis / confidence / evidence triple returned by the RCA function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RcaResult {
    pub hypothesis: String,
    pub confidence: f64,
    pub evidence_refs: Vec<String>,
}

impl RcaResult {
    /// Reject results whose confidence is not a probability.
    pub fn validate(self) -> Result<Self, RcaError> {
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(RcaError::InvalidResult(format!(
                "confidence {} is outside [0.0, 1.0]",
                self.confidence
            )));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task_event::ContextPayload;
    use rstest::rstest;

    #[test]
    fn test_request_embeds_context_summary_in_user_prompt() {
        let task = InboundTaskEvent {
            tenant_id: TenantId::parse("t1").unwrap(),
            incident_id: IncidentId::parse("inc-42").unwrap(),
            payload: ContextPayload {
                context_summary: "OOM in billing-worker".to_string(),
            },
        };

        let request = RcaRequest::for_task(&task);
        assert_eq!(request.system_prompt, SYSTEM_PROMPT);
        assert!(request.user_prompt.ends_with("OOM in billing-worker"));
        assert_eq!(request.incident_id, task.incident_id);
        assert_eq!(request.tenant_id, task.tenant_id);
    }

    #[rstest]
    #[case(0.0, true)]
    #[case(0.82, true)]
    #[case(1.0, true)]
    #[case(-0.1, false)]
    #[case(1.5, false)]
    #[case(f64::NAN, false)]
    fn test_validate_checks_confidence_range(#[case] confidence: f64, #[case] ok: bool) {
        let result = RcaResult {
            hypothesis: "h".to_string(),
            confidence,
            evidence_refs: vec![],
        };
        assert_eq!(result.validate().is_ok(), ok);
    }
}
