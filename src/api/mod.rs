use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{
    FractureReport, ModelVariant, ProcessLandmarksRequest, ServiceInfo, SessionId, UploadFile,
    UploadedXray,
};

pub mod client;
pub use client::FractureApiClient;

/// Failure of a single backend request
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode backend response: {0}")]
    Decode(String),
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Operations the fracture analysis service exposes.
///
/// Each call is an independent one-shot request; nothing is retried.
#[async_trait]
pub trait FractureBackend: Send + Sync {
    /// `GET /` for the service banner
    async fn health(&self) -> ApiResult<ServiceInfo>;

    /// `POST /upload/xray`, opens a new session
    async fn upload_xray(&self, file: UploadFile) -> ApiResult<UploadedXray>;

    /// `POST /upload/model?session_id=...`
    async fn upload_model(&self, session_id: &SessionId, file: UploadFile) -> ApiResult<()>;

    /// `POST /process/landmarks`
    async fn process_landmarks(&self, request: &ProcessLandmarksRequest) -> ApiResult<FractureReport>;

    /// `GET /model/{session_id}/{variant}?t=<timestamp>`
    async fn fetch_model(
        &self,
        session_id: &SessionId,
        variant: ModelVariant,
        timestamp: i64,
    ) -> ApiResult<Vec<u8>>;
}

/// Log whether the backend answers within `limit`. Never fails: the TUI
/// starts either way.
pub async fn check_health(backend: &dyn FractureBackend, limit: Duration) -> Option<ServiceInfo> {
    match tokio::time::timeout(limit, backend.health()).await {
        Ok(Ok(service)) => {
            info!(
                "Backend reachable: {} ({})",
                service.message.as_deref().unwrap_or("no banner"),
                service.version.as_deref().unwrap_or("unknown version")
            );
            Some(service)
        }
        Ok(Err(e)) => {
            warn!("Backend health check failed, continuing anyway: {}", e);
            None
        }
        Err(_) => {
            warn!("Backend health check gave no answer within {:?}, continuing anyway", limit);
            None
        }
    }
}
