//! Workflow behavior against a mocked backend

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

use crate::common::{drive, fixtures, logging, MockBackend};
use fracture_tui::api::ApiError;
use fracture_tui::flow::{self, AlertKind, Applied, Page, SessionFlow};
use fracture_tui::models::ModelVariant;

fn server_error() -> ApiError {
    ApiError::Status {
        status: 500,
        body: "internal error".to_string(),
    }
}

#[tokio::test]
async fn test_happy_path_reaches_report() {
    logging::init_test_logging();
    logging::log_test_step("Upload, capture, report");
    let dir = tempfile::tempdir().unwrap();
    let backend = drive::happy_backend("session_1");
    let mut flow = SessionFlow::new();

    drive::to_report(&mut flow, &backend, &dir).await;

    let report = flow.report().expect("report stored");
    assert_eq!(report, &fixtures::report());
    assert_eq!(flow.session_id().map(|s| s.as_str()), Some("session_1"));
    assert!(!flow.is_busy());
}

#[tokio::test]
async fn test_successful_upload_notifies_and_enables_continue() {
    let dir = tempfile::tempdir().unwrap();
    let backend = drive::happy_backend("session_1");
    let mut flow = SessionFlow::new();

    let path = fixtures::temp_file(&dir, "wrist.jpg", &fixtures::png_bytes(40, 80));
    assert!(flow.upload_xray(path));
    let applied = flow::drain(&mut flow, &backend).await;

    assert_matches!(applied.as_slice(), [Applied::XrayReady { file_name }] if file_name == "wrist.jpg");
    let alert = flow.current_alert().expect("success notice");
    assert_eq!(alert.kind, AlertKind::Info);
    assert_eq!(alert.message, "X-ray uploaded successfully");
    assert!(flow.can_continue());
    assert_eq!(flow.xray().map(|x| (x.width(), x.height())), Some((40, 80)));
}

#[tokio::test]
async fn test_failed_upload_shows_one_error_and_stays_put() {
    logging::init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let mut backend = MockBackend::new();
    backend
        .expect_upload_xray()
        .times(1)
        .returning(|_| Err(server_error()));
    let mut flow = SessionFlow::new();

    let path = fixtures::temp_file(&dir, "wrist.png", &fixtures::png_bytes(10, 10));
    flow.upload_xray(path);
    flow::drain(&mut flow, &backend).await;

    let alerts: Vec<_> = flow.pending_alerts().cloned().collect();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::Error);
    assert_eq!(alerts[0].message, "Failed to upload X-ray");
    assert_eq!(flow.page(), Page::Upload);
    assert!(flow.session_id().is_none());
    assert!(!flow.can_continue());
}

#[tokio::test]
async fn test_unreadable_file_is_reported_as_upload_failure() {
    let backend = MockBackend::new();
    let mut flow = SessionFlow::new();

    flow.upload_xray("/definitely/not/here.png".into());
    flow::drain(&mut flow, &backend).await;

    assert_eq!(
        flow.current_alert().map(|a| a.message.as_str()),
        Some("Failed to upload X-ray")
    );
}

#[test]
fn test_wrong_extension_is_rejected_before_upload() {
    let mut flow = SessionFlow::new();
    assert!(!flow.upload_xray("scan.bmp".into()));
    assert!(flow.take_dispatches().is_empty());
    assert_eq!(flow.current_alert().map(|a| a.kind), Some(AlertKind::Error));
}

#[tokio::test]
async fn test_failed_processing_alerts_and_stays_on_landmarks() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = MockBackend::new();
    backend
        .expect_upload_xray()
        .returning(|_| Ok(fixtures::uploaded_xray("session_9", 40, 80)));
    backend
        .expect_process_landmarks()
        .times(1)
        .returning(|_| Err(server_error()));
    let mut flow = SessionFlow::new();

    drive::to_landmarks(&mut flow, &backend, &dir).await;
    let surface = drive::four_clicks(&flow);
    let request = surface.submission(flow.session_id().unwrap()).unwrap();
    flow.submit_landmarks(request);
    flow::drain(&mut flow, &backend).await;

    assert_eq!(flow.page(), Page::Landmarks);
    assert!(flow.report().is_none());
    assert_eq!(
        flow.current_alert().map(|a| a.message.as_str()),
        Some("Failed to process landmarks")
    );
    assert!(!flow.is_busy());
}

#[tokio::test]
async fn test_model_upload_requires_session_and_reports_success() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = drive::happy_backend("session_4");
    backend.expect_upload_model().times(1).returning(|session, file| {
        assert_eq!(session.as_str(), "session_4");
        assert_eq!(file.mime, "model/gltf-binary");
        Ok(())
    });
    let mut flow = SessionFlow::new();

    let model = fixtures::temp_file(&dir, "arm.glb", &[0u8; 12]);
    assert!(!flow.upload_model(model.clone()));

    let xray = fixtures::temp_file(&dir, "wrist.png", &fixtures::png_bytes(40, 80));
    flow.upload_xray(xray);
    flow::drain(&mut flow, &backend).await;
    while flow.dismiss_alert().is_some() {}

    assert!(flow.upload_model(model));
    let applied = flow::drain(&mut flow, &backend).await;
    assert_matches!(applied.as_slice(), [Applied::ModelUploaded { .. }]);
    assert_eq!(
        flow.current_alert().map(|a| a.message.as_str()),
        Some("3D model uploaded successfully")
    );
}

#[tokio::test]
async fn test_missing_model_is_quietly_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = drive::happy_backend("session_5");
    backend
        .expect_fetch_model()
        .returning(|_, _, _| Err(ApiError::Status { status: 404, body: "not found".into() }));
    let mut flow = SessionFlow::new();

    drive::to_report(&mut flow, &backend, &dir).await;
    assert!(flow.open_viewer());
    assert!(flow.load_model(ModelVariant::Original));
    let applied = flow::drain(&mut flow, &backend).await;

    assert_matches!(
        applied.as_slice(),
        [Applied::ModelUnavailable { variant: ModelVariant::Original }]
    );
    assert!(flow.current_alert().is_none());
}

#[tokio::test]
async fn test_outcome_after_navigation_is_discarded() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = drive::happy_backend("session_6");
    backend
        .expect_fetch_model()
        .returning(|_, _, _| Ok(Vec::new()));
    let mut flow = SessionFlow::new();

    drive::to_report(&mut flow, &backend, &dir).await;
    flow.open_viewer();
    flow.load_model(ModelVariant::Original);
    let stale = flow.take_dispatches();
    flow.back_to_report();

    let outcome = flow::run_command(&backend, stale[0].command.clone()).await;
    assert!(flow.apply(stale[0].epoch, outcome).is_none());
    assert_eq!(flow.page(), Page::Report);
}

#[tokio::test]
async fn test_reset_discards_session() {
    let dir = tempfile::tempdir().unwrap();
    let backend = drive::happy_backend("session_8");
    let mut flow = SessionFlow::new();

    drive::to_report(&mut flow, &backend, &dir).await;
    flow.reset();

    assert_eq!(flow.page(), Page::Upload);
    assert!(flow.session_id().is_none());
    assert!(flow.xray().is_none());
    assert!(flow.report().is_none());
}
