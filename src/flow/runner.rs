use tracing::debug;

use super::{read_upload, Command, TaskError, TaskOutcome};
use crate::api::FractureBackend;
use crate::model3d::BoneMesh;
use crate::models::UploadKind;
use crate::xray::XrayImage;

/// Execute one command against the backend. Never panics and never retries;
/// every failure comes back inside the outcome.
pub async fn run_command(backend: &dyn FractureBackend, command: Command) -> TaskOutcome {
    debug!("Running {:?}", command);
    match command {
        Command::UploadXray { path } => {
            let file_name = display_name(&path);
            let result = async {
                let file = read_upload(&path, UploadKind::Xray).await?;
                let uploaded = backend.upload_xray(file).await?;
                let image = XrayImage::from_base64(&uploaded.image_base64)?;
                Ok::<_, TaskError>((uploaded, image))
            }
            .await;
            TaskOutcome::XrayUploaded { file_name, result }
        }
        Command::UploadModel { path, session_id } => {
            let file_name = display_name(&path);
            let result = async {
                let file = read_upload(&path, UploadKind::Model).await?;
                backend.upload_model(&session_id, file).await?;
                Ok::<_, TaskError>(())
            }
            .await;
            TaskOutcome::ModelUploaded { file_name, result }
        }
        Command::ProcessLandmarks(request) => {
            let result = backend.process_landmarks(&request).await.map_err(TaskError::from);
            TaskOutcome::LandmarksProcessed(result)
        }
        Command::LoadModel { session_id, variant } => {
            let timestamp = chrono::Utc::now().timestamp_millis();
            let result = async {
                let bytes = backend.fetch_model(&session_id, variant, timestamp).await?;
                let mesh = tokio::task::spawn_blocking(move || BoneMesh::from_gltf_bytes(&bytes))
                    .await
                    .map_err(|e| TaskError::Rejected(format!("mesh parsing panicked: {}", e)))??;
                Ok::<_, TaskError>(mesh)
            }
            .await;
            TaskOutcome::ModelLoaded { variant, result }
        }
    }
}

fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
