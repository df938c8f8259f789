//! Session flow controller.
//!
//! Owns the current page and the data threaded between pages. Views ask it for
//! work (`request`) and navigation; the runtime executes queued commands and
//! feeds their outcomes back through `apply`. Every navigation starts a new
//! epoch, and outcomes from an older epoch are dropped, the same way a
//! response to an unmounted view would be ignored.

use std::collections::VecDeque;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::api::{ApiError, FractureBackend};
use crate::model3d::{BoneMesh, MeshError};
use crate::models::{
    FractureReport, ModelVariant, ProcessLandmarksRequest, SessionId, UploadFile, UploadKind,
    UploadedXray,
};
use crate::xray::{ImageError, XrayImage};

pub mod runner;
pub use runner::run_command;

/// Pages of the linear workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Upload,
    Landmarks,
    Report,
    Visualize,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Upload, Page::Landmarks, Page::Report, Page::Visualize];

    pub fn title(&self) -> &'static str {
        match self {
            Page::Upload => "Upload",
            Page::Landmarks => "Landmarks",
            Page::Report => "Report",
            Page::Visualize => "3D Model",
        }
    }
}

/// Work the runtime performs on behalf of a view
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    UploadXray { path: PathBuf },
    UploadModel { path: PathBuf, session_id: SessionId },
    ProcessLandmarks(ProcessLandmarksRequest),
    LoadModel { session_id: SessionId, variant: ModelVariant },
}

/// A command tagged with the epoch it was issued under
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub epoch: u64,
    pub command: Command,
}

#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error("{0}")]
    Rejected(String),
}

/// Result of an executed command
#[derive(Debug)]
pub enum TaskOutcome {
    XrayUploaded {
        file_name: String,
        result: Result<(UploadedXray, XrayImage), TaskError>,
    },
    ModelUploaded {
        file_name: String,
        result: Result<(), TaskError>,
    },
    LandmarksProcessed(Result<FractureReport, TaskError>),
    ModelLoaded {
        variant: ModelVariant,
        result: Result<BoneMesh, TaskError>,
    },
}

/// What an accepted outcome means for the active view
#[derive(Debug)]
pub enum Applied {
    XrayReady { file_name: String },
    ModelUploaded { file_name: String },
    ReportReady,
    ModelReady { variant: ModelVariant, mesh: BoneMesh },
    ModelUnavailable { variant: ModelVariant },
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Info,
    Error,
}

/// Blocking notification shown over the active page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
}

/// Cross-page workflow state
pub struct SessionFlow {
    page: Page,
    epoch: u64,
    session_id: Option<SessionId>,
    xray: Option<XrayImage>,
    report: Option<FractureReport>,
    in_flight: bool,
    outbox: Vec<Dispatch>,
    alerts: VecDeque<Alert>,
}

impl Default for SessionFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionFlow {
    pub fn new() -> Self {
        Self {
            page: Page::Upload,
            epoch: 0,
            session_id: None,
            xray: None,
            report: None,
            in_flight: false,
            outbox: Vec::new(),
            alerts: VecDeque::new(),
        }
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn xray(&self) -> Option<&XrayImage> {
        self.xray.as_ref()
    }

    pub fn report(&self) -> Option<&FractureReport> {
        self.report.as_ref()
    }

    /// A request issued from the current page has not completed yet
    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    pub fn can_continue(&self) -> bool {
        self.page == Page::Upload && self.session_id.is_some() && self.xray.is_some() && !self.in_flight
    }

    // ---------------------------------------------------------------------
    // Alerts
    // ---------------------------------------------------------------------

    pub fn current_alert(&self) -> Option<&Alert> {
        self.alerts.front()
    }

    pub fn pending_alerts(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter()
    }

    pub fn dismiss_alert(&mut self) -> Option<Alert> {
        self.alerts.pop_front()
    }

    pub fn notify(&mut self, message: impl Into<String>) {
        self.alerts.push_back(Alert {
            kind: AlertKind::Info,
            message: message.into(),
        });
    }

    pub fn alert_error(&mut self, message: impl Into<String>) {
        self.alerts.push_back(Alert {
            kind: AlertKind::Error,
            message: message.into(),
        });
    }

    // ---------------------------------------------------------------------
    // Requests
    // ---------------------------------------------------------------------

    /// Queue a command for the runtime. Refused while another request from
    /// this page is still running.
    pub fn request(&mut self, command: Command) -> bool {
        if self.in_flight {
            warn!("Ignoring {:?} while a request is in flight", command);
            return false;
        }
        self.in_flight = true;
        self.outbox.push(Dispatch {
            epoch: self.epoch,
            command,
        });
        true
    }

    /// Start an X-ray upload from a user-entered path
    pub fn upload_xray(&mut self, path: PathBuf) -> bool {
        if self.page != Page::Upload {
            return false;
        }
        if !UploadKind::Xray.accepts(&path) {
            self.alert_error("Unsupported X-ray format, choose a JPG or PNG file");
            return false;
        }
        self.request(Command::UploadXray { path })
    }

    /// Start a model upload; needs an existing session
    pub fn upload_model(&mut self, path: PathBuf) -> bool {
        if self.page != Page::Upload {
            return false;
        }
        let Some(session_id) = self.session_id.clone() else {
            return false;
        };
        if !UploadKind::Model.accepts(&path) {
            self.alert_error("Unsupported model format, choose a GLB or GLTF file");
            return false;
        }
        self.request(Command::UploadModel { path, session_id })
    }

    pub fn submit_landmarks(&mut self, request: ProcessLandmarksRequest) -> bool {
        if self.page != Page::Landmarks {
            return false;
        }
        self.request(Command::ProcessLandmarks(request))
    }

    pub fn load_model(&mut self, variant: ModelVariant) -> bool {
        if self.page != Page::Visualize {
            return false;
        }
        let Some(session_id) = self.session_id.clone() else {
            return false;
        };
        self.request(Command::LoadModel { session_id, variant })
    }

    /// Commands queued since the last call
    pub fn take_dispatches(&mut self) -> Vec<Dispatch> {
        std::mem::take(&mut self.outbox)
    }

    // ---------------------------------------------------------------------
    // Navigation
    // ---------------------------------------------------------------------

    fn navigate(&mut self, page: Page) {
        info!("Page {:?} -> {:?}", self.page, page);
        self.page = page;
        self.epoch += 1;
        self.in_flight = false;
        self.outbox.clear();
    }

    pub fn continue_to_landmarks(&mut self) -> bool {
        if !self.can_continue() {
            return false;
        }
        self.navigate(Page::Landmarks);
        true
    }

    pub fn open_viewer(&mut self) -> bool {
        if self.page != Page::Report || self.session_id.is_none() {
            return false;
        }
        self.navigate(Page::Visualize);
        true
    }

    pub fn back_to_report(&mut self) -> bool {
        if self.page != Page::Visualize {
            return false;
        }
        self.navigate(Page::Report);
        true
    }

    /// Discard the session and start over
    pub fn reset(&mut self) {
        self.session_id = None;
        self.xray = None;
        self.report = None;
        self.navigate(Page::Upload);
    }

    // ---------------------------------------------------------------------
    // Outcomes
    // ---------------------------------------------------------------------

    /// Fold a finished command back into the workflow. Returns `None` when the
    /// outcome belongs to a page that is no longer shown.
    pub fn apply(&mut self, epoch: u64, outcome: TaskOutcome) -> Option<Applied> {
        if epoch != self.epoch {
            info!("Discarding outcome from epoch {} (now {})", epoch, self.epoch);
            return None;
        }
        self.in_flight = false;

        let applied = match outcome {
            TaskOutcome::XrayUploaded { file_name, result } => match result {
                Ok((uploaded, image)) => {
                    info!(
                        "Session {} opened with a {}x{} image",
                        uploaded.session_id,
                        image.width(),
                        image.height()
                    );
                    self.session_id = Some(uploaded.session_id);
                    self.xray = Some(image);
                    self.notify("X-ray uploaded successfully");
                    Applied::XrayReady { file_name }
                }
                Err(e) => {
                    error!("X-ray upload failed: {}", e);
                    self.alert_error("Failed to upload X-ray");
                    Applied::Failed
                }
            },
            TaskOutcome::ModelUploaded { file_name, result } => match result {
                Ok(()) => {
                    self.notify("3D model uploaded successfully");
                    Applied::ModelUploaded { file_name }
                }
                Err(e) => {
                    error!("Model upload failed: {}", e);
                    self.alert_error("Failed to upload 3D model");
                    Applied::Failed
                }
            },
            TaskOutcome::LandmarksProcessed(result) => match result {
                Ok(report) => {
                    self.report = Some(report);
                    self.navigate(Page::Report);
                    Applied::ReportReady
                }
                Err(e) => {
                    error!("Landmark processing failed: {}", e);
                    self.alert_error("Failed to process landmarks");
                    Applied::Failed
                }
            },
            TaskOutcome::ModelLoaded { variant, result } => match result {
                Ok(mesh) => Applied::ModelReady { variant, mesh },
                Err(e) => {
                    error!("Loading {:?} model failed: {}", variant, e);
                    Applied::ModelUnavailable { variant }
                }
            },
        };
        Some(applied)
    }

    /// Short description for the status bar
    pub fn status_text(&self) -> String {
        let session = self
            .session_id
            .as_ref()
            .map(|s| format!("session {}", s))
            .unwrap_or_else(|| "no session".to_string());
        if self.in_flight {
            format!("{} • working...", session)
        } else {
            session
        }
    }
}

/// Read a file for upload, tagging it with the MIME type of its kind
pub async fn read_upload(path: &std::path::Path, kind: UploadKind) -> Result<UploadFile, TaskError> {
    let mime = kind
        .mime_for(path)
        .ok_or_else(|| TaskError::Rejected(format!("unsupported file type: {}", path.display())))?;
    let bytes = tokio::fs::read(path).await.map_err(|source| ApiError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(UploadFile {
        file_name,
        mime,
        bytes,
    })
}

/// Convenience for tests and tools: run every queued dispatch to completion
/// and apply the outcomes in order.
pub async fn drain(flow: &mut SessionFlow, backend: &dyn FractureBackend) -> Vec<Applied> {
    let mut applied = Vec::new();
    loop {
        let dispatches = flow.take_dispatches();
        if dispatches.is_empty() {
            break;
        }
        for dispatch in dispatches {
            let outcome = run_command(backend, dispatch.command).await;
            if let Some(result) = flow.apply(dispatch.epoch, outcome) {
                applied.push(result);
            }
        }
    }
    applied
}
