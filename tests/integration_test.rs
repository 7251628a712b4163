use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zoo_mcp::{
    Error, KclSource, PollConfig, SourcePosition, SourceRange, TextToCad, ZooProvider,
    ERROR_PREFIX,
};

const JOB_ID: &str = "7f3c3b0e-2d4a-4b8e-9a51-1d2c3e4f5a6b";

/// Load test fixture from file
fn load_fixture(filename: &str) -> Value {
    let text = std::fs::read_to_string(format!("tests/fixtures/zoo/{filename}"))
        .unwrap_or_else(|_| panic!("Failed to load test fixture: {filename}"));
    serde_json::from_str(&text).expect("Fixture is not valid JSON")
}

fn poll_config() -> PollConfig {
    PollConfig {
        interval: Duration::from_millis(20),
        deadline: Duration::from_secs(2),
        max_retries: 2,
        retry_backoff: Duration::from_millis(10),
    }
}

fn adapter(mock_server: &MockServer, poll: PollConfig) -> TextToCad {
    let provider =
        ZooProvider::new_with_base_url("test-token".to_string(), mock_server.uri())
            .expect("Failed to create Zoo provider");
    TextToCad::new(Arc::new(provider), poll)
}

fn status_path(id: &str) -> String {
    format!("/user/text-to-cad/{id}")
}

async fn mount_create(mock_server: &MockServer, prompt: &str) {
    Mock::given(method("POST"))
        .and(path("/ai/text-to-cad/step"))
        .and(query_param("kcl", "true"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({ "prompt": prompt })))
        .respond_with(ResponseTemplate::new(201).set_body_json(load_fixture("created.json")))
        .expect(1)
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_generate_returns_code() {
    let mock_server = MockServer::start().await;
    mount_create(&mock_server, "a box").await;

    Mock::given(method("GET"))
        .and(path(status_path(JOB_ID)))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(load_fixture("status_completed.json")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = adapter(&mock_server, poll_config()).generate("a box").await;
    assert_eq!(result.into_text(), "solid box() { ... }");
}

#[tokio::test]
async fn test_generate_waits_through_in_progress() {
    let mock_server = MockServer::start().await;
    mount_create(&mock_server, "a box").await;

    Mock::given(method("GET"))
        .and(path(status_path(JOB_ID)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(load_fixture("status_in_progress.json")),
        )
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(status_path(JOB_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(load_fixture("status_completed.json")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = adapter(&mock_server, poll_config()).generate("a box").await;
    assert_eq!(result.code(), Some("solid box() { ... }"));
}

#[tokio::test]
async fn test_remote_failure_reason_is_preserved() {
    let mock_server = MockServer::start().await;
    mount_create(&mock_server, "a box").await;

    Mock::given(method("GET"))
        .and(path(status_path(JOB_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(load_fixture("status_failed.json")))
        .mount(&mock_server)
        .await;

    let result = adapter(&mock_server, poll_config()).generate("a box").await;
    assert!(matches!(result.error(), Some(Error::RemoteFailure { .. })));

    let text = result.into_text();
    assert!(text.starts_with(ERROR_PREFIX));
    assert!(text.contains("unsupported geometry"));
}

#[tokio::test]
async fn test_deadline_yields_timeout() {
    let mock_server = MockServer::start().await;
    mount_create(&mock_server, "a box").await;

    Mock::given(method("GET"))
        .and(path(status_path(JOB_ID)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(load_fixture("status_in_progress.json")),
        )
        .mount(&mock_server)
        .await;

    let poll = PollConfig {
        deadline: Duration::from_millis(150),
        ..poll_config()
    };
    let started = std::time::Instant::now();
    let result = adapter(&mock_server, poll.clone()).generate("a box").await;
    let elapsed = started.elapsed();

    assert!(matches!(result.error(), Some(Error::Timeout { .. })));
    assert!(elapsed < poll.deadline + poll.interval + Duration::from_secs(1));

    let text = result.into_text();
    assert!(text.contains(JOB_ID));
    assert!(!text.to_lowercase().contains("failed"));
}

#[tokio::test]
async fn test_unauthorized_submission_never_polls() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ai/text-to-cad/step"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(load_fixture("error_unauthorized.json")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(load_fixture("status_completed.json")))
        .expect(0)
        .mount(&mock_server)
        .await;

    let result = adapter(&mock_server, poll_config()).generate("a box").await;
    assert!(matches!(result.error(), Some(Error::Auth(_))));
    assert!(result.into_text().contains("invalid API token"));
}

#[tokio::test]
async fn test_blank_prompt_makes_no_requests() {
    let mock_server = MockServer::start().await;

    let result = adapter(&mock_server, poll_config()).generate("  \n ").await;
    assert!(matches!(result.error(), Some(Error::Validation(_))));

    let requests = mock_server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_rejected_submission_includes_upstream_text() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ai/text-to-cad/step"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "error_code": "bad_request",
            "message": "prompt is too long",
            "request_id": "r-422"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = adapter(&mock_server, poll_config()).generate("a box").await;
    assert!(matches!(result.error(), Some(Error::Submission(_))));
    assert!(result.into_text().contains("prompt is too long"));
}

#[tokio::test]
async fn test_transient_status_errors_are_retried() {
    let mock_server = MockServer::start().await;
    mount_create(&mock_server, "a box").await;

    Mock::given(method("GET"))
        .and(path(status_path(JOB_ID)))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream busy"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(status_path(JOB_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(load_fixture("status_completed.json")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = adapter(&mock_server, poll_config()).generate("a box").await;
    assert_eq!(result.code(), Some("solid box() { ... }"));
}

#[tokio::test]
async fn test_persistent_status_errors_surface_as_polling_error() {
    let mock_server = MockServer::start().await;
    mount_create(&mock_server, "a box").await;

    Mock::given(method("GET"))
        .and(path(status_path(JOB_ID)))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let result = adapter(&mock_server, poll_config()).generate("a box").await;
    assert!(matches!(result.error(), Some(Error::Polling { .. })));
    assert!(result.into_text().contains("bad gateway"));
}

#[tokio::test]
async fn test_iteration_round_trip() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ml/text-to-cad/iteration"))
        .and(body_json(json!({
            "original_source_code": "width = 4",
            "source_ranges": [{
                "prompt": "make it wider",
                "range": {
                    "start": {"line": 1, "column": 1},
                    "end": {"line": 1, "column": 10}
                }
            }]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": JOB_ID,
            "status": "queued"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(status_path(JOB_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "text_to_cad_iteration",
            "id": JOB_ID,
            "status": "completed",
            "code": "width = 8"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let range = SourceRange {
        start: SourcePosition::new(1, 1),
        end: SourcePosition::new(1, 10),
    };
    let result = adapter(&mock_server, poll_config())
        .iterate(KclSource::Code("width = 4".to_string()), "make it wider", range)
        .await;
    assert_eq!(result.into_text(), "width = 8");
}

#[tokio::test]
async fn test_iteration_rejects_wrong_job_type() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ml/text-to-cad/iteration"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": JOB_ID })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(status_path(JOB_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(load_fixture("status_completed.json")))
        .mount(&mock_server)
        .await;

    let result = adapter(&mock_server, poll_config())
        .iterate(
            KclSource::Code("width = 4".to_string()),
            "make it wider",
            SourceRange::default(),
        )
        .await;
    assert!(matches!(result.error(), Some(Error::UnexpectedResponse(_))));
}

#[tokio::test]
async fn test_concurrent_generations_are_independent() {
    let mock_server = MockServer::start().await;

    let jobs = [
        ("a gear", "11111111-1111-4111-8111-111111111111", "gear()"),
        ("a bolt", "22222222-2222-4222-8222-222222222222", "bolt()"),
        ("a hinge", "33333333-3333-4333-8333-333333333333", "hinge()"),
    ];

    for (prompt, id, code) in jobs {
        Mock::given(method("POST"))
            .and(path("/ai/text-to-cad/step"))
            .and(body_json(json!({ "prompt": prompt })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": id,
                "status": "queued"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path(status_path(id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "text_to_cad",
                "id": id,
                "status": "completed",
                "code": code
            })))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let adapter = adapter(&mock_server, poll_config());
    let results =
        futures::future::join_all(jobs.iter().map(|(prompt, _, _)| adapter.generate(prompt)))
            .await;

    for ((_, _, code), result) in jobs.iter().zip(results) {
        assert_eq!(result.into_text(), *code);
    }
}
