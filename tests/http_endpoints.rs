mod common;

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use common::{FakeProducer, Outcome, ranked_document};
use rankboard::ingest::{Pipeline, StorageLayout};
use rankboard::resolve::RoleCandidates;
use rankboard::rules::PresentationRules;
use rankboard::server::{AppState, router};
use serde_json::Value;
use tower::ServiceExt;

const BOUNDARY: &str = "rankboard-test-boundary";

async fn app(dir: &std::path::Path, producer: Arc<FakeProducer>, max_upload: usize) -> Router {
    let pipeline = Pipeline::open(StorageLayout::new(dir.join("storage")), producer)
        .await
        .unwrap()
        .with_max_upload_bytes(max_upload);
    let state = AppState::new(Arc::new(pipeline), RoleCandidates::default(), PresentationRules::default());
    router(state, None)
}

fn multipart(field: &str, file_name: &str, contents: &[u8]) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
         Content-Type: application/vnd.openxmlformats-officedocument.spreadsheetml.sheet\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    Request::post("/api/upload")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
}

#[tokio::test]
async fn health_is_always_ok() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), FakeProducer::new(Outcome::Fails("unused".into())), 1024).await;
    let (status, body) = send(&app, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn data_before_and_after_upload() {
    let dir = tempfile::tempdir().unwrap();
    let producer = FakeProducer::new(Outcome::Writes(ranked_document("2024-05-01 08:00")));
    let app = app(dir.path(), producer, 1024).await;

    for uri in ["/api/data", "/api/meta", "/api/leaderboard"] {
        let (status, body) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["error"], "No data yet. Upload an .xlsx first.");
    }

    let (status, uploaded) = send(&app, multipart("file", "report.xlsx", b"PK workbook")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(uploaded["ok"], true);
    assert_eq!(uploaded["meta"]["Exported"], "2024-05-01 08:00");

    let (status, data) = send(&app, get("/api/data")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["meta"], uploaded["meta"]);
    assert_eq!(data["dataset"]["columns"][0], "Rank");
    assert_eq!(data["dataset"]["rows"].as_array().unwrap().len(), 3);
    assert_eq!(data["fieldTypes"]["Escorted To Vehicle"], "percent");

    let (status, meta) = send(&app, get("/api/meta")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(meta, uploaded["meta"]);
}

#[tokio::test]
async fn leaderboard_ranks_and_classifies() {
    let dir = tempfile::tempdir().unwrap();
    let producer = FakeProducer::new(Outcome::Writes(ranked_document("2024-05-01")));
    let app = app(dir.path(), producer, 1024).await;
    let (status, _) = send(&app, multipart("file", "report.xlsx", b"PK workbook")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, board) = send(&app, get("/api/leaderboard")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(board["title"], "Service Employee Rank");
    assert_eq!(board["header"]["dealerNumber"], "426085");
    assert_eq!(board["header"]["dealerName"], "Stevens Creek Volkswagen");
    assert_eq!(board["header"]["area"], "West");
    assert_eq!(board["lastUpdate"], "2024-05-01");
    assert_eq!(board["detailColumns"], serde_json::json!(["Escorted To Vehicle"]));

    let entries = board["entries"].as_array().unwrap();
    let names: Vec<&str> = entries.iter().map(|e| e["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["Al", "Bea", "Cy"]);
    assert_eq!(entries[0]["tier"], "gold");
    assert_eq!(entries[0]["summary"]["score"], "100");
    assert_eq!(entries[1]["summary"]["score"], "96.5");
    assert_eq!(entries[2]["rank"], Value::Null);
    assert_eq!(entries[2]["summary"]["score"], "—");

    let gauge = |entry: &Value| entry["details"][0]["gauge"].clone();
    assert_eq!(gauge(&entries[0])["verdict"], "good");
    assert_eq!(gauge(&entries[1])["verdict"], "bad");
    assert!(entries[2]["details"][0].get("gauge").is_none());
    assert_eq!(entries[1]["details"][0]["display"], "74.9%");
}

#[tokio::test]
async fn upload_without_file_field_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let producer = FakeProducer::new(Outcome::Writes(ranked_document("2024-05-01")));
    let app = app(dir.path(), Arc::clone(&producer), 1024).await;

    let (status, body) = send(&app, multipart("spreadsheet", "report.xlsx", b"PK")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("file"));
    assert_eq!(producer.calls(), 0);
}

#[tokio::test]
async fn upload_with_wrong_extension_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let producer = FakeProducer::new(Outcome::Writes(ranked_document("2024-05-01")));
    let app = app(dir.path(), Arc::clone(&producer), 1024).await;

    let (status, body) = send(&app, multipart("file", "report.csv", b"a,b,c")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert_eq!(producer.calls(), 0);

    let (status, _) = send(&app, get("/api/data")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let producer = FakeProducer::new(Outcome::Writes(ranked_document("2024-05-01")));
    let app = app(dir.path(), Arc::clone(&producer), 16).await;

    let (status, body) = send(&app, multipart("file", "report.xlsx", &[7u8; 17])).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["error"].as_str().unwrap().contains("16"));

    // far beyond the limit the body is cut off while streaming
    let (status, _) = send(&app, multipart("file", "report.xlsx", &vec![7u8; 200 * 1024])).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(producer.calls(), 0);
}

#[tokio::test]
async fn parser_failure_is_a_server_error() {
    let dir = tempfile::tempdir().unwrap();
    let producer = FakeProducer::new(Outcome::Writes(ranked_document("2024-05-01")));
    let app = app(dir.path(), Arc::clone(&producer), 1024).await;
    send(&app, multipart("file", "good.xlsx", b"PK good")).await;

    producer.set(Outcome::Fails("KeyError: 'Data'".into()));
    let (status, body) = send(&app, multipart("file", "bad.xlsx", b"PK bad")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("KeyError"));

    let (status, data) = send(&app, get("/api/data")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["meta"]["Exported"], "2024-05-01");
}
