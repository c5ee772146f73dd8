mod common;

use common::{Harness, MockGenerator, MockRecordSource};
use serde_json::json;
use std::num::NonZeroUsize;
use std::sync::Arc;
use toolgate::{AdapterError, Gateway, GatewayError};

fn gateway(harness: &Harness) -> Gateway {
    Gateway::new(
        harness.dispatcher.clone(),
        Arc::new(common::pipeline(&harness.embedder, &harness.index)),
        Arc::new(harness.generator.clone()),
    )
}

fn harness(reply: Result<String, AdapterError>) -> Harness {
    Harness::new(
        MockRecordSource::new(Ok(json!([{"name": "Lincoln Elementary"}]))),
        MockGenerator::new(reply),
    )
}

#[tokio::test]
async fn test_tool_envelope_round_trip() {
    let harness = harness(Ok("unused".to_string()));
    let gateway = gateway(&harness);

    let reply = gateway
        .handle_mcp(json!({
            "tool": "search",
            "arguments": {"area": "downtown", "city": "Springfield"}
        }))
        .await;

    assert_eq!(
        reply,
        json!({"status": "success", "result": [{"name": "Lincoln Elementary"}]})
    );
}

#[tokio::test]
async fn test_tool_failures_are_encoded() {
    let harness = harness(Ok("unused".to_string()));
    let gateway = gateway(&harness);

    let reply = gateway
        .handle_mcp(json!({"tool": "search", "arguments": {"area": "downtown"}}))
        .await;

    assert_eq!(reply["status"], "failure");
    assert_eq!(reply["error"]["kind"], "InvalidArgumentError");
    assert_eq!(reply["error"]["parameter"], "city");
}

#[tokio::test]
async fn test_arguments_are_optional_in_envelope() {
    let harness = harness(Ok("unused".to_string()));
    let gateway = gateway(&harness);

    let reply = gateway.handle_mcp(json!({"tool": "nope"})).await;
    assert_eq!(reply["error"]["kind"], "UnknownToolError");
}

#[tokio::test]
async fn test_undecodable_envelope() {
    let harness = harness(Ok("unused".to_string()));
    let gateway = gateway(&harness);

    let reply = gateway.handle_mcp(json!({"arguments": {}})).await;
    assert!(reply["error"]
        .as_str()
        .unwrap()
        .starts_with("invalid request envelope"));
}

#[tokio::test]
async fn test_chat_passthrough_has_no_system_instruction() {
    let harness = harness(Ok("Hello there".to_string()));
    let gateway = gateway(&harness);

    let reply = gateway.handle_chat(json!({"prompt": "Hi"})).await.unwrap();
    assert_eq!(reply, json!({"response": "Hello there"}));

    let calls = harness.generator.calls.lock().unwrap();
    assert_eq!(*calls, vec![(None, "Hi".to_string())]);
}

#[tokio::test]
async fn test_chat_requires_prompt() {
    let harness = harness(Ok("unused".to_string()));
    let gateway = gateway(&harness);

    let err = gateway.handle_chat(json!({})).await.unwrap_err();
    assert!(matches!(err, GatewayError::MissingPrompt));
    assert_eq!(err.status_code(), 400);

    let err = gateway.handle_chat(json!({"prompt": ""})).await.unwrap_err();
    assert!(matches!(err, GatewayError::MissingPrompt));
    assert_eq!(harness.generator.call_count(), 0);
}

#[tokio::test]
async fn test_whitespace_prompt_is_forwarded() {
    let harness = harness(Ok("Hello".to_string()));
    let gateway = gateway(&harness);

    let reply = gateway.handle_chat(json!({"prompt": "   "})).await.unwrap();
    assert_eq!(reply, json!({"response": "Hello"}));
    assert_eq!(
        *harness.generator.calls.lock().unwrap(),
        vec![(None, "   ".to_string())]
    );
}

#[tokio::test]
async fn test_chat_surfaces_provider_failure() {
    let harness = harness(Err(AdapterError::Timeout));
    let gateway = gateway(&harness);

    let err = gateway.chat("Hi").await.unwrap_err();
    assert_eq!(err.status_code(), 504);
}

#[tokio::test]
async fn test_direct_retrieve() {
    let harness = harness(Ok("unused".to_string()));
    let gateway = gateway(&harness);

    let hits = gateway
        .retrieve("good schools", NonZeroUsize::new(2).unwrap())
        .await
        .unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, "a");
}
