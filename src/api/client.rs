use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use super::{ApiError, ApiResult, FractureBackend};
use crate::models::{
    Config, FractureReport, ModelVariant, ProcessLandmarksRequest, ServiceInfo, SessionId,
    UploadFile, UploadedXray,
};

/// HTTP client for the fracture analysis service
#[derive(Clone)]
pub struct FractureApiClient {
    client: Client,
    base: Url,
}

impl FractureApiClient {
    /// Create a new client from the application configuration
    pub fn new(config: &Config) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .user_agent("fracture-tui/0.1")
            .build()?;

        Self::with_client(client, &config.api_base)
    }

    pub fn with_client(client: Client, api_base: &str) -> ApiResult<Self> {
        let base = Url::parse(api_base).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", api_base, e)))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(api_base.to_string()));
        }
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Append path segments to the base address, percent-encoding each one
    pub fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Cache-busted address of a session's 3D asset
    pub fn model_url(&self, session_id: &SessionId, variant: ModelVariant, timestamp: i64) -> ApiResult<Url> {
        let mut url = self.endpoint(&["model", session_id.as_str(), variant.path_segment()])?;
        url.query_pairs_mut().append_pair("t", &timestamp.to_string());
        Ok(url)
    }

    fn file_form(file: UploadFile) -> ApiResult<multipart::Form> {
        let part = multipart::Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(file.mime)?;
        Ok(multipart::Form::new().part("file", part))
    }

    /// Turn non-2xx responses into `ApiError::Status`, keeping the body for logs
    async fn check(response: Response) -> ApiResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        warn!("Backend responded {} for {}", status, body);
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl FractureBackend for FractureApiClient {
    async fn health(&self) -> ApiResult<ServiceInfo> {
        let url = self.endpoint(&[])?;
        let response = Self::check(self.client.get(url).send().await?).await?;
        Self::decode(response).await
    }

    async fn upload_xray(&self, file: UploadFile) -> ApiResult<UploadedXray> {
        let url = self.endpoint(&["upload", "xray"])?;
        info!("Uploading X-ray {} ({} bytes)", file.file_name, file.bytes.len());

        let form = Self::file_form(file)?;
        let response = Self::check(self.client.post(url).multipart(form).send().await?).await?;
        let uploaded: UploadedXray = Self::decode(response).await?;

        debug!(
            "X-ray accepted: session={} reported size={:?}x{:?}",
            uploaded.session_id, uploaded.width, uploaded.height
        );
        Ok(uploaded)
    }

    async fn upload_model(&self, session_id: &SessionId, file: UploadFile) -> ApiResult<()> {
        let mut url = self.endpoint(&["upload", "model"])?;
        url.query_pairs_mut().append_pair("session_id", session_id.as_str());
        info!("Uploading model {} for session {}", file.file_name, session_id);

        let form = Self::file_form(file)?;
        Self::check(self.client.post(url).multipart(form).send().await?).await?;
        Ok(())
    }

    async fn process_landmarks(&self, request: &ProcessLandmarksRequest) -> ApiResult<FractureReport> {
        let url = self.endpoint(&["process", "landmarks"])?;
        info!(
            "Submitting {} landmarks for session {}",
            request.landmarks.len(),
            request.session_id
        );

        let response = Self::check(self.client.post(url).json(request).send().await?).await?;
        let report: FractureReport = Self::decode(response).await?;

        info!(
            "Report received: confidence={:.3}, {} fracture(s)",
            report.confidence,
            report.fractures.len()
        );
        Ok(report)
    }

    async fn fetch_model(
        &self,
        session_id: &SessionId,
        variant: ModelVariant,
        timestamp: i64,
    ) -> ApiResult<Vec<u8>> {
        let url = self.model_url(session_id, variant, timestamp)?;
        debug!("Fetching model asset {}", url);

        let response = Self::check(self.client.get(url).send().await?).await?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}
