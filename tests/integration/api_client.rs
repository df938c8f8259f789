//! HTTP client against a local mock server

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use reqwest::Client;
use wiremock::matchers::{body_json, body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{fixtures, logging};
use std::time::{Duration, Instant};

use fracture_tui::api::{check_health, ApiError, FractureApiClient, FractureBackend};
use fracture_tui::models::{
    Landmark, LandmarkLabel, ModelVariant, ProcessLandmarksRequest, SessionId, UploadFile,
};

fn client(server: &MockServer) -> FractureApiClient {
    FractureApiClient::with_client(Client::new(), &server.uri()).unwrap()
}

fn png_upload() -> UploadFile {
    UploadFile {
        file_name: "wrist.png".to_string(),
        mime: "image/png",
        bytes: fixtures::png_bytes(4, 4),
    }
}

#[tokio::test]
async fn test_health_reads_service_banner() {
    logging::init_test_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": "Fracture API running",
            "version": "1.0.0"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let info = client(&server).health().await.unwrap();
    assert_eq!(info.message.as_deref(), Some("Fracture API running"));
    assert_eq!(info.version.as_deref(), Some("1.0.0"));
}

#[tokio::test]
async fn test_health_check_gives_up_on_slow_backend() {
    logging::init_test_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "message": "late" }))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let started = Instant::now();
    let info = check_health(&client(&server), Duration::from_millis(200)).await;
    assert!(info.is_none());
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_health_check_returns_banner_in_time() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": "Fracture API running"
        })))
        .mount(&server)
        .await;

    let info = check_health(&client(&server), Duration::from_secs(5)).await;
    assert_eq!(info.and_then(|i| i.message).as_deref(), Some("Fracture API running"));
}

#[tokio::test]
async fn test_xray_upload_posts_multipart_file_field() {
    logging::init_test_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload/xray"))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("filename=\"wrist.png\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "session_id": "session_1",
            "image_base64": fixtures::png_data_url(4, 4),
            "width": 4,
            "height": 4
        })))
        .expect(1)
        .mount(&server)
        .await;

    let uploaded = client(&server).upload_xray(png_upload()).await.unwrap();
    assert_eq!(uploaded.session_id, SessionId::new("session_1"));
    assert_eq!(uploaded.width, Some(4));
}

#[tokio::test]
async fn test_xray_upload_tolerates_missing_dimensions() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload/xray"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "session_id": "session_2",
            "image_base64": fixtures::png_data_url(4, 4)
        })))
        .mount(&server)
        .await;

    let uploaded = client(&server).upload_xray(png_upload()).await.unwrap();
    assert_eq!(uploaded.width, None);
    assert_eq!(uploaded.height, None);
}

#[tokio::test]
async fn test_model_upload_passes_session_as_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload/model"))
        .and(query_param("session_id", "session_1"))
        .and(body_string_contains("name=\"file\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let file = UploadFile {
        file_name: "arm.glb".to_string(),
        mime: "model/gltf-binary",
        bytes: vec![0u8; 16],
    };
    client(&server)
        .upload_model(&SessionId::new("session_1"), file)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_landmarks_are_posted_as_json() {
    logging::init_test_logging();
    let server = MockServer::start().await;
    let request = ProcessLandmarksRequest {
        session_id: SessionId::new("session_1"),
        landmarks: LandmarkLabel::ALL
            .iter()
            .enumerate()
            .map(|(i, label)| Landmark {
                x: 100.0 + i as f64,
                y: 200.5,
                label: *label,
            })
            .collect(),
    };

    Mock::given(method("POST"))
        .and(path("/process/landmarks"))
        .and(body_json(serde_json::json!({
            "session_id": "session_1",
            "landmarks": [
                { "x": 100.0, "y": 200.5, "label": "Ulna Head" },
                { "x": 101.0, "y": 200.5, "label": "Ulna Tail" },
                { "x": 102.0, "y": 200.5, "label": "Radius Head" },
                { "x": 103.0, "y": 200.5, "label": "Radius Tail" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::report_json()))
        .expect(1)
        .mount(&server)
        .await;

    let report = client(&server).process_landmarks(&request).await.unwrap();
    logging::log_test_data("Report", &report);
    assert_eq!(report, fixtures::report());
}

#[tokio::test]
async fn test_model_fetch_is_cache_busted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/model/session_1/fractured"))
        .and(query_param("t", "1700000000123"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
        .expect(1)
        .mount(&server)
        .await;

    let bytes = client(&server)
        .fetch_model(&SessionId::new("session_1"), ModelVariant::Fractured, 1700000000123)
        .await
        .unwrap();
    assert_eq!(bytes, vec![1u8, 2, 3]);
}

#[tokio::test]
async fn test_server_error_becomes_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/process/landmarks"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let request = ProcessLandmarksRequest {
        session_id: SessionId::new("session_1"),
        landmarks: Vec::new(),
    };
    let err = client(&server).process_landmarks(&request).await.unwrap_err();
    assert_matches!(err, ApiError::Status { status: 500, ref body } if body == "boom");
}

#[tokio::test]
async fn test_malformed_report_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/process/landmarks"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"confidence\": \"high\"}"))
        .mount(&server)
        .await;

    let request = ProcessLandmarksRequest {
        session_id: SessionId::new("session_1"),
        landmarks: Vec::new(),
    };
    let err = client(&server).process_landmarks(&request).await.unwrap_err();
    assert_matches!(err, ApiError::Decode(_));
}
