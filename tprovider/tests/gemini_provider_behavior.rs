#![cfg(feature = "provider-gemini")]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tprovider::adapters::gemini::{
    GeminiClient, GeminiFinishReason, GeminiOutput, GeminiRequest, GeminiTransport,
};
use tprovider::{
    Credential, FinishReason, Part, ProviderCall, ProviderClient, ProviderError,
    ProviderErrorKind, ProviderFuture, ProviderId, Role, SendConfig, Turn,
};

#[derive(Debug)]
struct FakeTransport {
    captured: Mutex<Vec<GeminiRequest>>,
    outcome: Result<GeminiOutput, ProviderError>,
}

impl FakeTransport {
    fn replying(outcome: Result<GeminiOutput, ProviderError>) -> Arc<Self> {
        Arc::new(Self {
            captured: Mutex::new(Vec::new()),
            outcome,
        })
    }

    fn captured(&self) -> Vec<GeminiRequest> {
        self.captured.lock().expect("captured lock").clone()
    }
}

impl GeminiTransport for FakeTransport {
    fn generate<'a>(
        &'a self,
        request: GeminiRequest,
    ) -> ProviderFuture<'a, Result<GeminiOutput, ProviderError>> {
        Box::pin(async move {
            self.captured.lock().expect("captured lock").push(request);
            self.outcome.clone()
        })
    }
}

fn output(parts: Vec<Part>, finish_reason: GeminiFinishReason) -> GeminiOutput {
    GeminiOutput {
        model: "gemini-2.5-flash".to_string(),
        parts,
        finish_reason,
        block_reason: None,
    }
}

fn call(turn: Turn) -> ProviderCall {
    ProviderCall {
        model: "gemini-2.5-flash".to_string(),
        history: vec![Turn::user("earlier"), Turn::model("reply")],
        turn,
        config: SendConfig::default().with_temperature(0.1),
        timeout: Duration::from_secs(20),
        credential: Credential::new("AIza-live-9876"),
    }
}

#[tokio::test]
async fn send_maps_gemini_output_to_provider_response() {
    let transport = FakeTransport::replying(Ok(output(
        vec![Part::text("hello "), Part::text("world")],
        GeminiFinishReason::Stop,
    )));
    let client = GeminiClient::new(transport.clone());

    let response = client
        .send(call(Turn::user("hi")))
        .await
        .expect("send should succeed");

    assert_eq!(client.id(), ProviderId::Gemini);
    assert_eq!(response.provider, ProviderId::Gemini);
    assert_eq!(response.finish_reason, FinishReason::Stop);
    assert_eq!(response.text(), "hello world");

    let captured = transport.captured();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].api_key.expose(), "AIza-live-9876");
    assert_eq!(captured[0].contents.len(), 3);
    assert_eq!(captured[0].contents[2], Turn::user("hi"));
    assert_eq!(captured[0].temperature, Some(0.1));
    assert_eq!(captured[0].timeout, Duration::from_secs(20));
}

#[tokio::test]
async fn send_reports_function_calls_as_tool_use() {
    let transport = FakeTransport::replying(Ok(output(
        vec![Part::function_call("lookup", json!({"id": 1}))],
        GeminiFinishReason::Stop,
    )));
    let client = GeminiClient::new(transport);

    let response = client
        .send(call(Turn::user("find id 1")))
        .await
        .expect("send should succeed");

    assert_eq!(response.finish_reason, FinishReason::ToolUse);
    assert!(!response.has_content());
}

#[tokio::test]
async fn invalid_calls_never_reach_the_transport() {
    let transport = FakeTransport::replying(Ok(output(Vec::new(), GeminiFinishReason::Stop)));
    let client = GeminiClient::new(transport.clone());

    let error = client
        .send(call(Turn::new(Role::Model, vec![Part::text("wrong role")])))
        .await
        .expect_err("model turn must be rejected");

    assert_eq!(error.kind, ProviderErrorKind::InvalidRequest);
    assert!(transport.captured().is_empty());
}

#[tokio::test]
async fn blocked_output_and_transport_errors_surface_classified() {
    let mut blocked = output(Vec::new(), GeminiFinishReason::Other);
    blocked.block_reason = Some("SAFETY".to_string());
    let client = GeminiClient::new(FakeTransport::replying(Ok(blocked)));
    let error = client
        .send(call(Turn::user("hi")))
        .await
        .expect_err("blocked prompt must fail");
    assert_eq!(error.kind, ProviderErrorKind::ContentBlocked);

    let client = GeminiClient::new(FakeTransport::replying(Err(
        ProviderError::quota_exceeded("429 RESOURCE_EXHAUSTED"),
    )));
    let error = client
        .send(call(Turn::user("hi")))
        .await
        .expect_err("quota error must propagate");
    assert_eq!(error.kind, ProviderErrorKind::QuotaExceeded);
    assert!(error.retryable);
}
