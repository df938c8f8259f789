use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Opaque session token issued by the backend at X-ray upload time
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Anatomical landmark labels, in the order they must be captured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LandmarkLabel {
    #[serde(rename = "Ulna Head")]
    UlnaHead,
    #[serde(rename = "Ulna Tail")]
    UlnaTail,
    #[serde(rename = "Radius Head")]
    RadiusHead,
    #[serde(rename = "Radius Tail")]
    RadiusTail,
}

impl LandmarkLabel {
    pub const ALL: [LandmarkLabel; 4] = [
        LandmarkLabel::UlnaHead,
        LandmarkLabel::UlnaTail,
        LandmarkLabel::RadiusHead,
        LandmarkLabel::RadiusTail,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LandmarkLabel::UlnaHead => "Ulna Head",
            LandmarkLabel::UlnaTail => "Ulna Tail",
            LandmarkLabel::RadiusHead => "Radius Head",
            LandmarkLabel::RadiusTail => "Radius Tail",
        }
    }

    /// Position of this label in the capture sequence (0-based)
    pub fn index(&self) -> usize {
        match self {
            LandmarkLabel::UlnaHead => 0,
            LandmarkLabel::UlnaTail => 1,
            LandmarkLabel::RadiusHead => 2,
            LandmarkLabel::RadiusTail => 3,
        }
    }
}

impl fmt::Display for LandmarkLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A labeled point in original image pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub label: LandmarkLabel,
}

/// Body of `POST /process/landmarks`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessLandmarksRequest {
    pub session_id: SessionId,
    pub landmarks: Vec<Landmark>,
}

/// Response of `POST /upload/xray`
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedXray {
    pub session_id: SessionId,
    /// Either a `data:` URL or bare base64
    pub image_base64: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Response of `GET /`
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceInfo {
    pub message: Option<String>,
    pub version: Option<String>,
}

/// Backend-assigned severity tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
    #[serde(other)]
    Unknown,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
            Severity::Unknown => "unknown",
        }
    }
}

/// One detected fracture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fracture {
    pub bone: String,
    pub severity: Severity,
    pub damage: String,
    /// Normalized position along the bone, 0.0..=1.0
    pub location: f64,
    pub top_angle: f64,
    pub bottom_angle: f64,
}

/// Response of `POST /process/landmarks`, never mutated client-side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FractureReport {
    pub confidence: f64,
    pub detected_bones: Vec<String>,
    pub fractures: Vec<Fracture>,
}

/// Which model asset the viewer asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelVariant {
    Original,
    Fractured,
}

impl ModelVariant {
    pub fn path_segment(&self) -> &'static str {
        match self {
            ModelVariant::Original => "original",
            ModelVariant::Fractured => "fractured",
        }
    }
}

/// File accepted by one of the upload inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Xray,
    Model,
}

impl UploadKind {
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            UploadKind::Xray => &["jpg", "jpeg", "png"],
            UploadKind::Model => &["glb", "gltf"],
        }
    }

    pub fn accepts(&self, path: &Path) -> bool {
        self.mime_for(path).is_some()
    }

    /// MIME type sent with the multipart part, `None` for unsupported files
    pub fn mime_for(&self, path: &Path) -> Option<&'static str> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if !self.extensions().contains(&ext.as_str()) {
            return None;
        }
        Some(match ext.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "glb" => "model/gltf-binary",
            _ => "model/gltf+json",
        })
    }
}

/// A file read from disk, ready for a multipart upload
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    pub viewport_height: u32,
    pub request_timeout_secs: u64,
    pub log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8000".to_string(),
            viewport_height: 420,
            request_timeout_secs: 30,
            log_file: "fracture-tui.log".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let defaults = Config::default();
        let viewport_height = match std::env::var("FRACTURE_VIEWPORT_HEIGHT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| anyhow::anyhow!("FRACTURE_VIEWPORT_HEIGHT must be a positive integer, got '{}'", raw))?,
            Err(_) => defaults.viewport_height,
        };
        if viewport_height == 0 {
            anyhow::bail!("FRACTURE_VIEWPORT_HEIGHT must be greater than zero");
        }

        Ok(Config {
            api_base: std::env::var("FRACTURE_API_BASE").unwrap_or(defaults.api_base),
            viewport_height,
            request_timeout_secs: std::env::var("FRACTURE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
            log_file: std::env::var("FRACTURE_LOG_FILE").unwrap_or(defaults.log_file),
        })
    }
}
