//! Idempotency keys for emitted events.
//!
//! 同じメッセージが再配送されると同じ event が二度 publish されうるので、
//! 下流が重複を捨てられるようにキーを付ける。

use super::ids::{IncidentId, TenantId};
use super::timeline::TimelineEventType;

/// `tenant:incident:event_type[:agent_version]`
pub fn idempotency_key(
    tenant_id: &TenantId,
    incident_id: &IncidentId,
    event_type: TimelineEventType,
    agent_version: Option<&str>,
) -> String {
    let mut parts = vec![tenant_id.as_str(), incident_id.as_str(), event_type.as_str()];
    if let Some(version) = agent_version.filter(|v| !v.is_empty()) {
        parts.push(version);
    }
    parts.join(":")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_joins_parts_with_colon() {
        let tenant = TenantId::parse("t1").unwrap();
        let incident = IncidentId::parse("inc-42").unwrap();

        assert_eq!(
            idempotency_key(&tenant, &incident, TimelineEventType::RootCauseProposed, None),
            "t1:inc-42:RootCauseProposed"
        );
        assert_eq!(
            idempotency_key(
                &tenant,
                &incident,
                TimelineEventType::RootCauseProposed,
                Some("0.1.0")
            ),
            "t1:inc-42:RootCauseProposed:0.1.0"
        );
        // empty version is treated as absent
        assert_eq!(
            idempotency_key(&tenant, &incident, TimelineEventType::RootCauseProposed, Some("")),
            "t1:inc-42:RootCauseProposed"
        );
    }
}
