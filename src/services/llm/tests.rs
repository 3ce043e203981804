//! LLM Service Unit Tests
//!
//! Drives the real reqwest transport against a wiremock upstream to check
//! status classification, retry counts and timeouts end to end.

use super::*;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COMPLETIONS_PATH: &str = "/v1/chat/completions";

fn completion_body(text: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": text }, "finish_reason": "stop" }
        ],
        "usage": { "prompt_tokens": 42, "completion_tokens": 7, "total_tokens": 49 }
    })
}

fn test_client(server: &MockServer, attempt_timeout: Duration) -> BatchedCompletionClient {
    let transport = OpenAITransport::new(
        format!("{}/v1", server.uri()),
        Some("sk-test".to_string()),
        Duration::from_secs(5),
    )
    .expect("transport should build");

    let policy = RetryPolicy {
        max_attempts: 5,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(10),
        jitter: false,
    };

    BatchedCompletionClient::new(Arc::new(transport), policy, attempt_timeout)
}

fn sampling() -> SamplingParams {
    SamplingParams { temperature: 0.8, max_tokens: 256 }
}

async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or_default()
}

mod transport_tests {
    use super::*;

    #[tokio::test]
    async fn test_parses_text_and_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(COMPLETIONS_PATH))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("1. Frage")))
            .mount(&server)
            .await;

        let client = test_client(&server, Duration::from_secs(5));
        let completion = client
            .complete("gpt-4o-mini", vec![ChatMessage::user("hi")], &sampling(), &CancellationToken::new())
            .await
            .expect("completion should succeed");

        assert_eq!(completion.text, "1. Frage");
        assert_eq!(completion.usage, TokenUsage { input_tokens: 42, output_tokens: 7 });
    }

    #[tokio::test]
    async fn test_empty_choices_yield_empty_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(COMPLETIONS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })))
            .mount(&server)
            .await;

        let client = test_client(&server, Duration::from_secs(5));
        let completion = client
            .complete("gpt-4o-mini", vec![ChatMessage::user("hi")], &sampling(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(completion.text.is_empty());
        assert_eq!(completion.usage, TokenUsage::default());
    }

    #[tokio::test]
    async fn test_missing_api_key_is_fatal_without_request() {
        let server = MockServer::start().await;
        let transport =
            OpenAITransport::new(format!("{}/v1", server.uri()), None, Duration::from_secs(5)).unwrap();
        let client = BatchedCompletionClient::new(
            Arc::new(transport),
            RetryPolicy { base_delay: Duration::from_millis(1), ..RetryPolicy::default() },
            Duration::from_secs(5),
        );

        let err = client
            .complete("gpt-4o-mini", vec![ChatMessage::user("hi")], &sampling(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, LLMError::NotConfigured));
        assert_eq!(request_count(&server).await, 0);
    }

    #[tokio::test]
    async fn test_invalid_json_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(COMPLETIONS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let client = test_client(&server, Duration::from_secs(5));
        let err = client
            .complete("gpt-4o-mini", vec![ChatMessage::user("hi")], &sampling(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, LLMError::ParseError(_)));
        assert_eq!(request_count(&server).await, 1);
    }
}

mod retry_tests {
    use super::*;

    #[tokio::test]
    async fn test_503_twice_then_success_takes_three_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(COMPLETIONS_PATH))
            .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(COMPLETIONS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok")))
            .mount(&server)
            .await;

        let client = test_client(&server, Duration::from_secs(5));
        let completion = client
            .complete("gpt-4o-mini", vec![ChatMessage::user("hi")], &sampling(), &CancellationToken::new())
            .await
            .expect("third attempt should succeed");

        assert_eq!(completion.text, "ok");
        assert_eq!(request_count(&server).await, 3);
    }

    #[tokio::test]
    async fn test_400_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(COMPLETIONS_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": { "message": "Unsupported model", "type": "invalid_request_error" }
            })))
            .mount(&server)
            .await;

        let client = test_client(&server, Duration::from_secs(5));
        let err = client
            .complete("gpt-4o-mini", vec![ChatMessage::user("hi")], &sampling(), &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            LLMError::Http { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Unsupported model");
            },
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(request_count(&server).await, 1);
    }

    #[tokio::test]
    async fn test_429_exhausts_all_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(COMPLETIONS_PATH))
            .respond_with(ResponseTemplate::new(429).set_body_string("Too Many Requests"))
            .mount(&server)
            .await;

        let client = test_client(&server, Duration::from_secs(5));
        let err = client
            .complete("gpt-4o-mini", vec![ChatMessage::user("hi")], &sampling(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, LLMError::Http { status: 429, .. }));
        assert_eq!(request_count(&server).await, 5);
    }

    #[tokio::test]
    async fn test_hung_attempt_times_out_and_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(COMPLETIONS_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion_body("late"))
                    .set_delay(Duration::from_secs(2)),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(COMPLETIONS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("fast")))
            .mount(&server)
            .await;

        let client = test_client(&server, Duration::from_millis(200));
        let completion = client
            .complete("gpt-4o-mini", vec![ChatMessage::user("hi")], &sampling(), &CancellationToken::new())
            .await
            .expect("second attempt should succeed");

        assert_eq!(completion.text, "fast");
        assert_eq!(request_count(&server).await, 2);
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        // Port 1 is closed on any sane test host
        let transport = OpenAITransport::new(
            "http://127.0.0.1:1/v1",
            Some("sk-test".to_string()),
            Duration::from_secs(2),
        )
        .unwrap();
        let client = BatchedCompletionClient::new(
            Arc::new(transport),
            RetryPolicy {
                max_attempts: 2,
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(1),
                jitter: false,
            },
            Duration::from_secs(2),
        );

        let err = client
            .complete("gpt-4o-mini", vec![ChatMessage::user("hi")], &sampling(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.is_retryable(), "expected transport-class error, got {:?}", err);
    }

    #[tokio::test]
    async fn test_cancellation_aborts_in_flight_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(COMPLETIONS_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion_body("never"))
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(&server)
            .await;

        let client = test_client(&server, Duration::from_secs(30));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let err = client
            .complete("gpt-4o-mini", vec![ChatMessage::user("hi")], &sampling(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, LLMError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
