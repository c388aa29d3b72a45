//! Task trait と RCA タスクの入力イベント
//!
//! # 学習ポイント
//! - Associated Constants (`const TYPE`)
//! - serde の必須フィールドで「欠落 = decode エラー」を表現する

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::ids::{IncidentId, TenantId};

/// Task はキューのメッセージ本文を型に対応付ける
///
/// # 使用例
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct MyTask {
///     message: String,
/// }
///
/// impl Task for MyTask {
///     const TYPE: &'static str = "my_namespace.my_task.v1";
/// }
/// ```
///
/// # Trait Bounds
/// - `DeserializeOwned`: メッセージ本文からの復元のため
/// - `Serialize`: テストや seed 投入でキューに積むため
/// - `Send + Sync + 'static`: async handler に渡すため
pub trait Task: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// task_type の定義
    ///
    /// # 命名規約
    /// - `{namespace}.{domain}.{action}.v{major}`
    const TYPE: &'static str;
}

/// ContextBuilt の payload のうち RCA に必要な部分
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextPayload {
    pub context_summary: String,
}

/// InboundTaskEvent は 1 件の RCA 依頼
///
/// `tenant_id` / `incident_id` / `payload.context_summary` のどれかが欠けていれば
/// decode に失敗し、メッセージは ack されずに残る。
/// payload の他のフィールド（error_count など）は読み捨てる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundTaskEvent {
    pub tenant_id: TenantId,
    pub incident_id: IncidentId,
    pub payload: ContextPayload,
}

impl Task for InboundTaskEvent {
    const TYPE: &'static str = "premortem.rca.context_built.v1";
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_decodes_context_built_event() {
        let body = json!({
            "tenant_id": "t1",
            "incident_id": "inc-42",
            "event_type": "ContextBuilt",
            "payload": {
                "context_summary": "NullPointerException in OrderService after deploy abc123",
                "error_count": 17,
                "services": ["order-service"]
            }
        });

        let event: InboundTaskEvent = serde_json::from_value(body).unwrap();
        assert_eq!(event.tenant_id.as_str(), "t1");
        assert_eq!(event.incident_id.as_str(), "inc-42");
        assert!(event.payload.context_summary.starts_with("NullPointerException"));
    }

    #[rstest]
    #[case::missing_tenant(json!({"incident_id": "i", "payload": {"context_summary": "s"}}), "tenant_id")]
    #[case::missing_incident(json!({"tenant_id": "t", "payload": {"context_summary": "s"}}), "incident_id")]
    #[case::missing_payload(json!({"tenant_id": "t", "incident_id": "i"}), "payload")]
    #[case::missing_summary(json!({"tenant_id": "t", "incident_id": "i", "payload": {}}), "context_summary")]
    fn test_rejects_malformed_events(#[case] body: serde_json::Value, #[case] field: &str) {
        let err = serde_json::from_value::<InboundTaskEvent>(body).unwrap_err();
        assert!(
            err.to_string().contains(field),
            "expected error mentioning {field}, got: {err}"
        );
    }

    /// 欠落だけが malformed。空文字列の id はそのまま通す
    #[rstest]
    #[case::empty_tenant(json!({"tenant_id": "", "incident_id": "inc-1", "payload": {"context_summary": "s"}}))]
    #[case::blank_incident(json!({"tenant_id": "t", "incident_id": " ", "payload": {"context_summary": "s"}}))]
    #[case::empty_summary(json!({"tenant_id": "t", "incident_id": "i", "payload": {"context_summary": ""}}))]
    fn test_accepts_present_but_empty_strings(#[case] body: serde_json::Value) {
        let event = serde_json::from_value::<InboundTaskEvent>(body.clone()).unwrap();
        assert_eq!(event.tenant_id.as_str(), body["tenant_id"]);
        assert_eq!(event.incident_id.as_str(), body["incident_id"]);
    }
}
