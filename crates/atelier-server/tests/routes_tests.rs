//! HTTP route tests over in-memory storage and fake capabilities

use atelier_core::Pipeline;
use atelier_server::routes;
use atelier_test_utils::{
    happy_pipeline, pipeline_with, FakeAngles, FakeEnhancer, FakeVideo, RecordingBackend, Script,
};
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::sync::Arc;
use warp::http::StatusCode;

const BOUNDARY: &str = "atelier-test-boundary";
const ORIGIN: &str = "http://localhost:3000";

struct FilePart<'a> {
    name: &'a str,
    content_type: &'a str,
    data: Vec<u8>,
}

impl<'a> FilePart<'a> {
    fn new(name: &'a str, content_type: &'a str, data: &[u8]) -> Self {
        Self {
            name,
            content_type,
            data: data.to_vec(),
        }
    }
}

fn multipart_body(parts: &[FilePart<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{0}\"; filename=\"{0}.img\"\r\n",
                part.name
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", part.content_type).as_bytes());
        body.extend_from_slice(&part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn post_generate(pipeline: Pipeline, parts: &[FilePart<'_>]) -> warp::http::Response<bytes::Bytes> {
    warp::test::request()
        .method("POST")
        .path("/api/generate")
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(multipart_body(parts))
        .reply(&routes(pipeline, ORIGIN))
        .await
}

/// JSON payloads of every `data:` line in an SSE body
fn sse_events(body: &[u8]) -> Vec<Value> {
    std::str::from_utf8(body)
        .unwrap()
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| serde_json::from_str(data.trim()).unwrap())
        .collect()
}

fn pair() -> Vec<FilePart<'static>> {
    vec![
        FilePart::new("front", "image/jpeg", b"\xFF\xD8\xFFfront"),
        FilePart::new("back", "image/png", b"\x89PNG\r\n\x1a\nback"),
    ]
}

#[tokio::test]
async fn health_reports_ok() {
    let backend = Arc::new(RecordingBackend::new());
    let res = warp::test::request()
        .method("GET")
        .path("/api/health")
        .reply(&routes(happy_pipeline(backend), ORIGIN))
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "atelier");
    assert_eq!(body["version"], atelier_server::VERSION);
    assert!(body["timestamp"].as_str().unwrap().contains('T'));
}

#[tokio::test]
async fn generate_streams_progress_to_completion() {
    let backend = Arc::new(RecordingBackend::new());
    let res = post_generate(happy_pipeline(backend.clone()), &pair()).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));
    assert_eq!(res.headers()["cache-control"], "no-cache");
    assert_eq!(res.headers()["x-accel-buffering"], "no");

    let events = sse_events(res.body());
    let progress: Vec<u64> = events.iter().map(|e| e["progress"].as_u64().unwrap()).collect();
    assert_eq!(progress, vec![10, 25, 50, 80, 100]);

    let last = events.last().unwrap();
    assert_eq!(last["status"], "complete");
    assert_eq!(last["step"], 5);
    assert_eq!(last["result"]["images"].as_array().unwrap().len(), 4);
    assert_eq!(last["result"]["costs"]["total"], 1.47);
    assert!(events[..4].iter().all(|e| e.get("result").is_none()));

    assert_eq!(backend.objects().len(), 7);
}

#[tokio::test]
async fn field_aliases_are_accepted() {
    let backend = Arc::new(RecordingBackend::new());
    let parts = [
        FilePart::new("frontImage", "image/jpeg", b"front"),
        FilePart::new("backImage", "image/jpeg", b"back"),
        FilePart::new("notes", "text/plain", b"ignored"),
    ];

    let res = post_generate(happy_pipeline(backend), &parts).await;

    let events = sse_events(res.body());
    assert_eq!(events.last().unwrap()["status"], "complete");
}

#[tokio::test]
async fn missing_part_becomes_error_event() {
    let backend = Arc::new(RecordingBackend::new());
    let parts = [FilePart::new("front", "image/jpeg", b"front")];

    let res = post_generate(happy_pipeline(backend.clone()), &parts).await;

    assert_eq!(res.status(), StatusCode::OK);
    let events = sse_events(res.body());
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["status"], "error");
    assert_eq!(events[0]["step"], 1);
    assert_eq!(events[0]["progress"], 0);
    assert_eq!(events[0]["message"], "Both front and back images are required");
    assert_eq!(backend.put_count(), 0);
}

#[tokio::test]
async fn synthesis_failure_is_an_error_event_not_a_status() {
    let backend = Arc::new(RecordingBackend::new());
    let pipeline = pipeline_with(
        backend,
        FakeEnhancer::new(Script::Fail),
        FakeAngles::new(Script::Succeed),
        FakeVideo::new(Script::Fail),
    );

    let res = post_generate(pipeline, &pair()).await;

    assert_eq!(res.status(), StatusCode::OK);
    let events = sse_events(res.body());
    let last = events.last().unwrap();
    assert_eq!(last["status"], "error");
    assert_eq!(last["progress"], 80);
    assert!(last["message"].as_str().unwrap().starts_with("Video synthesis failed"));
}

#[tokio::test]
async fn unsupported_type_is_rejected_before_streaming() {
    let backend = Arc::new(RecordingBackend::new());
    let parts = [
        FilePart::new("front", "image/jpeg", b"front"),
        FilePart::new("back", "image/gif", b"GIF89a"),
    ];

    let res = post_generate(happy_pipeline(backend.clone()), &parts).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(
        body["error"],
        "Unsupported image type `image/gif` for back; expected JPEG or PNG"
    );
    assert_eq!(backend.put_count(), 0);
}

#[tokio::test]
async fn oversized_image_is_rejected() {
    let backend = Arc::new(RecordingBackend::new());
    let big = vec![0xAB; atelier_server::form::MAX_IMAGE_BYTES + 1];
    let parts = [FilePart::new("front", "image/jpeg", &big)];

    let res = post_generate(happy_pipeline(backend), &parts).await;

    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = serde_json::from_slice(res.body()).unwrap();
    assert!(body["error"].as_str().unwrap().contains("front"));
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let backend = Arc::new(RecordingBackend::new());
    let res = warp::test::request()
        .method("GET")
        .path("/api/nope")
        .reply(&routes(happy_pipeline(backend), ORIGIN))
        .await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(body["error"], "Not found");
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin() {
    let backend = Arc::new(RecordingBackend::new());
    let res = warp::test::request()
        .method("OPTIONS")
        .path("/api/generate")
        .header("origin", ORIGIN)
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .reply(&routes(happy_pipeline(backend), ORIGIN))
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["access-control-allow-origin"], ORIGIN);
}
