//! Common test utilities and helpers

use std::path::PathBuf;

use async_trait::async_trait;
use mockall::mock;

use fracture_tui::api::{ApiResult, FractureBackend};
use fracture_tui::models::{
    FractureReport, ModelVariant, ProcessLandmarksRequest, ServiceInfo, SessionId, UploadFile,
    UploadedXray,
};

mock! {
    pub Backend {}

    #[async_trait]
    impl FractureBackend for Backend {
        async fn health(&self) -> ApiResult<ServiceInfo>;
        async fn upload_xray(&self, file: UploadFile) -> ApiResult<UploadedXray>;
        async fn upload_model(&self, session_id: &SessionId, file: UploadFile) -> ApiResult<()>;
        async fn process_landmarks(&self, request: &ProcessLandmarksRequest) -> ApiResult<FractureReport>;
        async fn fetch_model(
            &self,
            session_id: &SessionId,
            variant: ModelVariant,
            timestamp: i64,
        ) -> ApiResult<Vec<u8>>;
    }
}

/// Test data utilities
pub mod fixtures {
    use super::*;
    use base64::{engine::general_purpose, Engine as _};
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    /// A small gray PNG
    pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([90, 90, 90]));
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .expect("encode png");
        buf.into_inner()
    }

    pub fn png_data_url(width: u32, height: u32) -> String {
        format!(
            "data:image/png;base64,{}",
            general_purpose::STANDARD.encode(png_bytes(width, height))
        )
    }

    pub fn uploaded_xray(session: &str, width: u32, height: u32) -> UploadedXray {
        UploadedXray {
            session_id: SessionId::new(session),
            image_base64: png_data_url(width, height),
            width: Some(width),
            height: Some(height),
        }
    }

    /// Report body as the backend sends it
    pub fn report_json() -> serde_json::Value {
        serde_json::json!({
            "confidence": 0.87,
            "detected_bones": ["ulna", "radius"],
            "fractures": [
                {
                    "bone": "radius",
                    "severity": "moderate",
                    "damage": "transverse",
                    "location": 0.42,
                    "top_angle": 12.34,
                    "bottom_angle": -3.5
                }
            ]
        })
    }

    pub fn report() -> FractureReport {
        serde_json::from_value(report_json()).expect("fixture report")
    }

    /// Write a file into a temp dir and return its path
    pub fn temp_file(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).expect("write fixture");
        path
    }
}

/// Logging utilities for tests
pub mod logging {
    use std::sync::Once;
    use tracing::{debug, info};

    static INIT: Once = Once::new();

    /// Initialize test logging
    pub fn init_test_logging() {
        INIT.call_once(|| {
            // Another test harness may already own the global subscriber
            let _ = tracing::subscriber::set_global_default(
                tracing_subscriber::fmt()
                    .with_env_filter("fracture_tui=debug,main=debug")
                    .with_test_writer()
                    .finish(),
            );
        });
    }

    pub fn log_test_step(step: &str) {
        info!("Test step: {}", step);
    }

    pub fn log_test_data<T: std::fmt::Debug>(label: &str, data: &T) {
        debug!("{}: {:?}", label, data);
    }
}

/// Drive a `SessionFlow` through the workflow with a mock backend
pub mod drive {
    use super::*;
    use fracture_tui::capture::CaptureSurface;
    use fracture_tui::flow::{self, Page, SessionFlow};

    /// Backend that accepts the X-ray and answers with the fixture report
    pub fn happy_backend(session: &'static str) -> MockBackend {
        let mut backend = MockBackend::new();
        backend
            .expect_upload_xray()
            .returning(move |_| Ok(fixtures::uploaded_xray(session, 40, 80)));
        backend
            .expect_process_landmarks()
            .returning(|_| Ok(fixtures::report()));
        backend
    }

    /// Upload a PNG from `dir` and land on the landmark page
    pub async fn to_landmarks(flow: &mut SessionFlow, backend: &MockBackend, dir: &tempfile::TempDir) {
        let path = fixtures::temp_file(dir, "wrist.png", &fixtures::png_bytes(40, 80));
        assert!(flow.upload_xray(path));
        flow::drain(flow, backend).await;
        while flow.dismiss_alert().is_some() {}
        assert!(flow.continue_to_landmarks());
        assert_eq!(flow.page(), Page::Landmarks);
    }

    /// Four clicks spread over the image
    pub fn four_clicks(flow: &SessionFlow) -> CaptureSurface {
        let image = flow.xray().expect("x-ray decoded");
        let mut surface = CaptureSurface::new(image.width(), image.height(), 420.0);
        for (x, y) in [(5.0, 5.0), (10.0, 20.0), (20.0, 40.0), (30.0, 70.0)] {
            surface.click(x, y);
        }
        surface
    }

    /// Run the whole workflow up to the report page
    pub async fn to_report(flow: &mut SessionFlow, backend: &MockBackend, dir: &tempfile::TempDir) {
        to_landmarks(flow, backend, dir).await;
        let surface = four_clicks(flow);
        let session = flow.session_id().expect("session").clone();
        let request = surface.submission(&session).expect("four landmarks");
        assert!(flow.submit_landmarks(request));
        flow::drain(flow, backend).await;
        assert_eq!(flow.page(), Page::Report);
    }
}
