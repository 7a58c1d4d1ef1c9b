use std::time::Duration;

use pretty_assertions::assert_eq;
use scribe_core::ModificationType;
use scribe_engine::{
    AiErrorKind, Endpoint, EndpointSettings, OperationParams, RequestEnvelope, ReqwestEndpoint,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn endpoint(base_url: String) -> ReqwestEndpoint {
    scribe_logging::initialize_for_tests();
    ReqwestEndpoint::new(EndpointSettings {
        base_url,
        connect_timeout: Duration::from_secs(2),
    })
    .expect("endpoint")
}

fn envelope(params: OperationParams) -> RequestEnvelope {
    RequestEnvelope {
        params,
        conversation_id: "conv-1".to_string(),
        document_content: "Once the cat sat down.".to_string(),
        timestamp: "2026-10-18T09:00:00+00:00".to_string(),
    }
}

#[tokio::test]
async fn prompt_posts_camel_case_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/ai/prompt"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({
            "prompt": "write a title",
            "cursorPosition": 5,
            "conversationId": "conv-1",
            "documentContent": "Once the cat sat down.",
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "content": "A Cat"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let content = endpoint(server.uri())
        .send(&envelope(OperationParams::prompt("write a title", 5)))
        .await
        .expect("send ok");
    assert_eq!(content, "A Cat");
}

#[tokio::test]
async fn modify_goes_to_modify_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/ai/modify"))
        .and(body_partial_json(json!({
            "selectedText": "the cat sat",
            "modificationType": "shorten",
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "content": "cat sat"})),
        )
        .mount(&server)
        .await;

    let content = endpoint(server.uri())
        .send(&envelope(OperationParams::modify(
            "the cat sat",
            ModificationType::Shorten,
            None,
        )))
        .await
        .expect("send ok");
    assert_eq!(content, "cat sat");
}

#[tokio::test]
async fn server_errors_are_service_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/ai/continue"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = endpoint(server.uri())
        .send(&envelope(OperationParams::continuation(3, None)))
        .await
        .unwrap_err();
    assert_eq!(err.kind, AiErrorKind::ServiceUnavailable);
    assert_eq!(err.status, Some(503));
    assert_eq!(err.code, "HTTP_503");
    assert!(err.retryable);
}

#[tokio::test]
async fn client_error_message_comes_from_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/ai/prompt"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(json!({"success": false, "error": "prompt too long"})),
        )
        .mount(&server)
        .await;

    let err = endpoint(server.uri())
        .send(&envelope(OperationParams::prompt("x", 0)))
        .await
        .unwrap_err();
    assert_eq!(err.kind, AiErrorKind::Api);
    assert!(!err.retryable);
    assert_eq!(err.message, "prompt too long");
}

#[tokio::test]
async fn unsuccessful_body_is_request_failed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": false, "error": "quota"})),
        )
        .mount(&server)
        .await;

    let err = endpoint(server.uri())
        .send(&envelope(OperationParams::prompt("x", 0)))
        .await
        .unwrap_err();
    assert_eq!(err.code, "REQUEST_FAILED");
    assert_eq!(err.message, "quota");
}

#[tokio::test]
async fn non_json_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = endpoint(server.uri())
        .send(&envelope(OperationParams::prompt("x", 0)))
        .await
        .unwrap_err();
    assert_eq!(err.kind, AiErrorKind::Api);
    assert_eq!(err.code, "INVALID_RESPONSE");
    assert!(err.retryable);
}

#[tokio::test]
async fn refused_connection_is_service_unavailable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let err = endpoint(format!("http://{addr}"))
        .send(&envelope(OperationParams::prompt("x", 0)))
        .await
        .unwrap_err();
    assert_eq!(err.kind, AiErrorKind::ServiceUnavailable);
    assert_eq!(err.code, "UNREACHABLE");
}
