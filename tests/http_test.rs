mod common;

use std::time::Duration;

use poem::{http::StatusCode, test::TestClient};
use serde_json::json;

use common::{Harness, RecordingTransport};
use mailstream::presentation::http::routes;

fn data_lines(body: &str) -> Vec<serde_json::Value> {
    body.split("\n\n")
        .filter_map(|block| block.lines().find_map(|line| line.strip_prefix("data:")))
        .map(|data| serde_json::from_str(data.trim()).unwrap())
        .collect()
}

#[tokio::test]
async fn sendmail_streams_until_completed() {
    let mut harness = Harness::new(RecordingTransport::slow(Duration::from_millis(30)));
    harness.start_workers(1);
    let cli = TestClient::new(routes(harness.state.clone(), "http://localhost:3000"));

    let resp = cli
        .get("/api/sendmail")
        .query("recipient", &"user@example.com")
        .send()
        .await;
    resp.assert_status_is_ok();

    let body = resp.0.into_body().into_string().await.unwrap();
    assert!(body.ends_with("\n\n"));

    let events = data_lines(&body);
    let (last, earlier) = events.split_last().unwrap();
    assert_eq!(last, &json!({"status": "COMPLETED", "message": "sent"}));
    assert!(earlier.iter().all(|e| e["status"] == "PENDING"));
}

#[tokio::test]
async fn sendmail_rejects_empty_recipient() {
    let harness = Harness::new(RecordingTransport::new());
    let cli = TestClient::new(routes(harness.state.clone(), "http://localhost:3000"));

    let resp = cli
        .get("/api/sendmail")
        .query("recipient", &"")
        .send()
        .await;

    resp.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(harness.queue.ready_len(), 0);
}

#[tokio::test]
async fn enqueue_then_poll_status() {
    let harness = Harness::new(RecordingTransport::new());
    let cli = TestClient::new(routes(harness.state.clone(), "http://localhost:3000"));

    let resp = cli
        .post("/api/emails")
        .body_json(&json!({"recipient": "user@example.com"}))
        .send()
        .await;
    resp.assert_status_is_ok();
    let json = resp.json().await;
    let task_id = json.value().object().get("task_id").string().to_string();

    let resp = cli.get(format!("/api/emails/{task_id}")).send().await;
    resp.assert_status_is_ok();
    let json = resp.json().await;
    let status = json.value().object();
    status.get("task_id").assert_string(&task_id);
    status.get("state").assert_string("pending");
}

#[tokio::test]
async fn failed_task_stream_reports_reason() {
    let mut harness = Harness::new(RecordingTransport::failing("auth error"));
    harness.start_workers(1);
    let cli = TestClient::new(routes(harness.state.clone(), "http://localhost:3000"));

    let resp = cli
        .post("/api/emails")
        .body_json(&json!({"recipient": "user@example.com"}))
        .send()
        .await;
    let json = resp.json().await;
    let task_id = json.value().object().get("task_id").string().to_string();

    let resp = cli.get(format!("/api/emails/{task_id}/events")).send().await;
    resp.assert_status_is_ok();
    let body = resp.0.into_body().into_string().await.unwrap();

    let last = data_lines(&body).pop().unwrap();
    assert_eq!(last["status"], "FAILED");
    assert!(last["message"].as_str().unwrap().contains("auth error"));
}

#[tokio::test]
async fn unknown_task_status_is_not_found() {
    let harness = Harness::new(RecordingTransport::new());
    let cli = TestClient::new(routes(harness.state.clone(), "http://localhost:3000"));

    let resp = cli
        .get(format!("/api/emails/{}", uuid::Uuid::new_v4()))
        .send()
        .await;

    resp.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn talktome_echoes_logged_time() {
    let harness = Harness::new(RecordingTransport::new());
    let cli = TestClient::new(routes(harness.state.clone(), "http://localhost:3000"));

    let resp = cli.get("/api/talktome").send().await;
    resp.assert_status_is_ok();
    let body = resp.0.into_body().into_string().await.unwrap();
    assert!(body.starts_with("Logged current time: "));
}

fn serve_forever<E: poem::Endpoint + 'static>(endpoint: E) -> E {
    endpoint
}

#[tokio::test]
async fn routes_outlive_a_runtime_server_url() {
    let harness = Harness::new(RecordingTransport::new());
    let endpoint = {
        let server_url = format!("{}://{}:{}", "http", "localhost", 3000);
        serve_forever(routes(harness.state.clone(), &server_url))
    };
    let cli = TestClient::new(endpoint);

    cli.get("/api/health").send().await.assert_status_is_ok();
}
