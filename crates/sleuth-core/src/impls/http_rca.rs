//! HttpRcaInvoker - HTTP 越しの RCA 関数呼び出し
//!
//! `POST {endpoint}` に `RcaRequest` を JSON で送り、`RcaResult` を受け取る。
//! 呼び出しにタイムアウトは付けない（RCA 関数側の実行時間に従う）。

use async_trait::async_trait;

use crate::domain::errors::RcaError;
use crate::domain::rca::{RcaRequest, RcaResult};
use crate::ports::RcaInvoker;

pub struct HttpRcaInvoker {
    client: reqwest::Client,
    endpoint: String,
    api_token: Option<String>,
}

impl HttpRcaInvoker {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_token: None,
        }
    }

    /// Sent as `Authorization: Bearer <token>`.
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RcaInvoker for HttpRcaInvoker {
    async fn run_rca(&self, request: RcaRequest) -> Result<RcaResult, RcaError> {
        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(token) = self.api_token.as_deref() {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| RcaError::Unavailable(format!("request to {} failed: {e}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RcaError::Remote {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<RcaResult>()
            .await
            .map_err(|e| RcaError::InvalidResult(format!("failed to parse rca response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::{IncidentId, TenantId};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> RcaRequest {
        RcaRequest {
            system_prompt: "system".to_string(),
            user_prompt: "user".to_string(),
            incident_id: IncidentId::parse("inc-42").unwrap(),
            tenant_id: TenantId::parse("t1").unwrap(),
        }
    }

    #[tokio::test]
    async fn test_run_rca_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rca"))
            .and(header("authorization", "Bearer secret"))
            .and(body_partial_json(json!({"incident_id": "inc-42", "tenant_id": "t1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hypothesis": "bad deploy",
                "confidence": 0.82,
                "evidence_refs": ["deploy:abc123", "log:oom"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let invoker =
            HttpRcaInvoker::new(format!("{}/rca", server.uri())).with_api_token("secret");
        let result = invoker.run_rca(request()).await.unwrap();

        assert_eq!(result.hypothesis, "bad deploy");
        assert_eq!(result.confidence, 0.82);
        assert_eq!(result.evidence_refs, vec!["deploy:abc123", "log:oom"]);
    }

    #[tokio::test]
    async fn test_run_rca_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("cold start"))
            .mount(&server)
            .await;

        let err = HttpRcaInvoker::new(server.uri())
            .run_rca(request())
            .await
            .unwrap_err();

        match err {
            RcaError::Remote { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "cold start");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_rca_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hypothesis": "x"})))
            .mount(&server)
            .await;

        let err = HttpRcaInvoker::new(server.uri())
            .run_rca(request())
            .await
            .unwrap_err();
        assert!(matches!(err, RcaError::InvalidResult(_)));
    }

    #[tokio::test]
    async fn test_run_rca_unreachable() {
        // port 9 (discard) is not listening on the test host
        let err = HttpRcaInvoker::new("http://127.0.0.1:9/rca")
            .run_rca(request())
            .await
            .unwrap_err();
        assert!(matches!(err, RcaError::Unavailable(_)));
    }
}
