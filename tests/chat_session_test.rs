//! Integration tests for the chat session
//!
//! Covers the single-in-flight gate with a transport that blocks until
//! released, and the full HTTP path against a mocked completion endpoint.

use agent_builder::chat::{
    ChatError, ChatRequest, ChatSession, ChatTransport, HttpChatClient, MessageRole, NoticeKind,
    SendOutcome, SkipReason,
};
use agent_builder::state::{AgentDraft, AgentRecord};
use async_trait::async_trait;
use mockito::{Matcher, Server};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Transport that parks every request until the test releases it
#[derive(Default)]
struct GatedTransport {
    started: Notify,
    release: Notify,
    calls: AtomicUsize,
}

#[async_trait]
impl ChatTransport for GatedTransport {
    async fn complete(&self, request: &ChatRequest) -> Result<String, ChatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        self.release.notified().await;
        let last = request.messages.last().map(|m| m.content.as_str()).unwrap_or("");
        Ok(format!("reply to {}", last))
    }
}

fn helper() -> AgentRecord {
    let mut draft = AgentDraft::new("Helper", "Be concise");
    draft.temperature = Some(0.7);
    draft.top_p = Some(1.0);
    draft.build(None).unwrap()
}

#[tokio::test]
async fn test_concurrent_send_is_dropped() {
    let transport = Arc::new(GatedTransport::default());
    let session = Arc::new(ChatSession::new(transport.clone()));
    let agent = helper();

    let first = {
        let session = session.clone();
        let agent = agent.clone();
        tokio::spawn(async move { session.send(Some(&agent), "first").await })
    };

    transport.started.notified().await;
    assert!(session.is_sending());

    let second = session.send(Some(&agent), "second").await;
    assert_eq!(
        second,
        SendOutcome::Skipped {
            reason: SkipReason::RequestInFlight
        }
    );
    let messages = session.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "first");

    transport.release.notify_one();
    match first.await.unwrap() {
        SendOutcome::Delivered { reply } => assert_eq!(reply.content, "reply to first"),
        other => panic!("Expected Delivered, got: {:?}", other),
    }
    assert!(!session.is_sending());
    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);

    // The gate is open again once the first request completes
    transport.release.notify_one();
    let third = session.send(Some(&agent), "third").await;
    assert!(matches!(third, SendOutcome::Delivered { .. }));
    assert_eq!(session.messages().len(), 4);
    assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_reply_after_clear_is_discarded() {
    let transport = Arc::new(GatedTransport::default());
    let session = Arc::new(ChatSession::new(transport.clone()));
    let agent = helper();

    let pending = {
        let session = session.clone();
        let agent = agent.clone();
        tokio::spawn(async move { session.send(Some(&agent), "Hello").await })
    };

    transport.started.notified().await;
    session.clear();
    transport.release.notify_one();

    assert_eq!(pending.await.unwrap(), SendOutcome::Discarded);
    assert!(session.messages().is_empty());
    assert!(!session.is_sending());
}

#[tokio::test]
async fn test_cancelled_send_releases_gate() {
    let transport = Arc::new(GatedTransport::default());
    let session = Arc::new(ChatSession::new(transport.clone()));
    let agent = helper();

    let pending = {
        let session = session.clone();
        let agent = agent.clone();
        tokio::spawn(async move { session.send(Some(&agent), "Hello").await })
    };

    transport.started.notified().await;
    pending.abort();
    assert!(pending.await.unwrap_err().is_cancelled());

    assert!(!session.is_sending());
    assert_eq!(session.messages().len(), 1);
}

/// Endpoint answers `{error: "rate limited"}`: the user message stays, no
/// assistant message is added, and a failure notice comes back
#[tokio::test]
async fn test_rate_limited_reply_over_http() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/chat")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(json!({
            "messages": [{"role": "user", "content": "Hello"}],
            "agentConfig": {
                "systemInstructions": "Be concise",
                "temperature": 0.7,
                "topP": 1.0
            }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": "rate limited"}"#)
        .create_async()
        .await;

    let client = HttpChatClient::new(reqwest::Client::new(), format!("{}/api/chat", server.url()));
    let session = ChatSession::new(Arc::new(client));

    let outcome = session.send(Some(&helper()), "Hello").await;

    mock.assert_async().await;
    match outcome {
        SendOutcome::Failed { notice } => {
            assert_eq!(notice.kind, NoticeKind::Error);
            assert_eq!(notice.title, "Chat Error");
            assert_eq!(notice.description, "rate limited");
        }
        other => panic!("Expected Failed, got: {:?}", other),
    }

    let messages = session.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, MessageRole::User);
    assert_eq!(messages[0].content, "Hello");
    assert!(!session.is_sending());
}

#[tokio::test]
async fn test_conversation_over_http() {
    let mut server = Server::new_async().await;
    let client = HttpChatClient::new(reqwest::Client::new(), format!("{}/api/chat", server.url()));
    let session = ChatSession::new(Arc::new(client));
    let agent = helper();

    let first = server
        .mock("POST", "/api/chat")
        .match_body(Matcher::PartialJson(json!({
            "messages": [{"role": "user", "content": "Hi"}]
        })))
        .with_status(200)
        .with_body(r#"{"message": "Hello! How can I help?"}"#)
        .create_async()
        .await;

    session.send(Some(&agent), "Hi").await;
    first.assert_async().await;
    first.remove_async().await;

    // The second request carries the whole conversation so far
    let second = server
        .mock("POST", "/api/chat")
        .match_body(Matcher::PartialJson(json!({
            "messages": [
                {"role": "user", "content": "Hi"},
                {"role": "assistant", "content": "Hello! How can I help?"},
                {"role": "user", "content": "Summarise Rust in one word"}
            ]
        })))
        .with_status(200)
        .with_body(r#"{"message": "Ownership."}"#)
        .create_async()
        .await;

    let outcome = session.send(Some(&agent), "Summarise Rust in one word").await;

    second.assert_async().await;
    match outcome {
        SendOutcome::Delivered { reply } => assert_eq!(reply.content, "Ownership."),
        other => panic!("Expected Delivered, got: {:?}", other),
    }
    assert_eq!(session.messages().len(), 4);
}

#[tokio::test]
async fn test_http_error_status_notice() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/chat")
        .with_status(500)
        .create_async()
        .await;

    let client = HttpChatClient::new(reqwest::Client::new(), format!("{}/api/chat", server.url()));
    let session = ChatSession::new(Arc::new(client));

    let outcome = session.send(Some(&helper()), "Hello").await;

    mock.assert_async().await;
    match outcome {
        SendOutcome::Failed { notice } => {
            assert_eq!(notice.description, "HTTP 500: Internal Server Error")
        }
        other => panic!("Expected Failed, got: {:?}", other),
    }
    assert_eq!(session.messages().len(), 1);
}
