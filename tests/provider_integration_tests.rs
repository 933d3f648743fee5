use std::sync::{Arc, Mutex};

use termtalk::core::error::ChatError;
use termtalk::inference::{
    CompletionProvider, CompletionRequest, ContextEntry, DriverEvent, OpenAiProvider,
    ProviderError, StreamChunk, spawn_driver,
};
use tokio::sync::mpsc;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
};

// ============================================================================
// Helper Functions
// ============================================================================

/// Creates a simple test context: system instruction plus one user turn
fn create_test_context() -> Vec<ContextEntry> {
    vec![
        ContextEntry::system("be brief"),
        ContextEntry::user("Hello"),
    ]
}

/// Collects all content deltas from a stream
async fn collect_chunks(mut receiver: mpsc::Receiver<StreamChunk>) -> Vec<String> {
    let mut content_chunks = Vec::new();
    while let Some(StreamChunk::Content(s)) = receiver.recv().await {
        content_chunks.push(s);
    }
    content_chunks
}

fn sse(deltas: &[&str], done: bool) -> String {
    let mut body = String::new();
    for delta in deltas {
        body.push_str(&format!(
            "data: {{\"choices\":[{{\"delta\":{{\"content\":{}}}}}]}}\n\n",
            serde_json::to_string(delta).unwrap()
        ));
    }
    if done {
        body.push_str("data: [DONE]\n\n");
    }
    body
}

async fn mount_sse(server: &MockServer, body: String) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .mount(server)
        .await;
}

async fn stream(
    provider: &OpenAiProvider,
    context: &[ContextEntry],
) -> (Result<(), ProviderError>, Vec<String>) {
    let (tx, rx) = mpsc::channel(100);
    let request = CompletionRequest {
        context,
        model: "test-model",
    };
    let (result, chunks) = tokio::join!(provider.stream_completion(request, tx), collect_chunks(rx));
    (result, chunks)
}

// ============================================================================
// OpenAI Provider Tests
// ============================================================================

#[tokio::test]
async fn test_openai_successful_streaming() {
    let mock_server = MockServer::start().await;
    mount_sse(&mock_server, sse(&["Hello", " world"], true)).await;

    let provider = OpenAiProvider::new(Some("test-key".to_string()), mock_server.uri());
    let (result, chunks) = stream(&provider, &create_test_context()).await;

    assert!(result.is_ok());
    assert_eq!(chunks, vec!["Hello", " world"]);
}

#[tokio::test]
async fn test_openai_sends_bearer_and_context() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({
            "model": "test-model",
            "stream": true,
            "messages": [
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": "Hello"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(sse(&["ok"], true)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(Some("test-key".to_string()), mock_server.uri());
    let (result, chunks) = stream(&provider, &create_test_context()).await;

    assert!(result.is_ok());
    assert_eq!(chunks, vec!["ok"]);
}

#[tokio::test]
async fn test_openai_stream_without_done_is_complete() {
    let mock_server = MockServer::start().await;
    mount_sse(&mock_server, sse(&["partial", " answer"], false)).await;

    let provider = OpenAiProvider::new(None, mock_server.uri());
    let (result, chunks) = stream(&provider, &create_test_context()).await;

    assert!(result.is_ok());
    assert_eq!(chunks.concat(), "partial answer");
}

#[tokio::test]
async fn test_openai_api_error_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(Some("test-key".to_string()), mock_server.uri());
    let (result, chunks) = stream(&provider, &create_test_context()).await;

    assert!(chunks.is_empty());
    match result {
        Err(ProviderError::Api { status, message }) => {
            assert_eq!(status, 500);
            assert!(message.contains("Internal Server Error"));
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_openai_malformed_payload_is_parse_error() {
    let mock_server = MockServer::start().await;
    let body = format!("{}data: {{not json\n\n", sse(&["Hi"], false));
    mount_sse(&mock_server, body).await;

    let provider = OpenAiProvider::new(None, mock_server.uri());
    let (result, chunks) = stream(&provider, &create_test_context()).await;

    assert_eq!(chunks, vec!["Hi"]);
    assert!(matches!(result, Err(ProviderError::Parse(_))));
}

// ============================================================================
// Driver over HTTP
// ============================================================================

async fn drive(provider: OpenAiProvider) -> Vec<DriverEvent> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    spawn_driver(
        Arc::new(provider),
        create_test_context(),
        "test-model".to_string(),
        move |event| {
            sink.lock().unwrap().push(event);
            true
        },
    )
    .await
    .unwrap();
    let collected = events.lock().unwrap().clone();
    collected
}

#[tokio::test]
async fn test_driver_emits_running_totals_then_complete() {
    let mock_server = MockServer::start().await;
    mount_sse(&mock_server, sse(&["Hi", " there", "!"], true)).await;

    let events = drive(OpenAiProvider::new(None, mock_server.uri())).await;

    assert_eq!(
        events,
        vec![
            DriverEvent::Partial("Hi".into()),
            DriverEvent::Partial("Hi there".into()),
            DriverEvent::Partial("Hi there!".into()),
            DriverEvent::Complete("Hi there!".into()),
        ]
    );
}

#[tokio::test]
async fn test_driver_maps_api_error_to_transport_failure() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&mock_server)
        .await;

    let events = drive(OpenAiProvider::new(Some("wrong".into()), mock_server.uri())).await;

    assert_eq!(events.len(), 1);
    match &events[0] {
        DriverEvent::Failed(ChatError::TransportFailure(msg)) => assert!(msg.contains("401")),
        other => panic!("Expected TransportFailure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_driver_maps_malformed_stream_to_corruption() {
    let mock_server = MockServer::start().await;
    let body = format!("{}data: {{not json\n\n", sse(&["Hi"], false));
    mount_sse(&mock_server, body).await;

    let events = drive(OpenAiProvider::new(None, mock_server.uri())).await;

    assert_eq!(events[0], DriverEvent::Partial("Hi".into()));
    assert!(matches!(
        events.last(),
        Some(DriverEvent::Failed(ChatError::StreamCorruption(_)))
    ));
}
