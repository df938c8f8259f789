//! Landmark capture geometry.
//!
//! The X-ray is shown scaled down to fit a fixed viewport height. Clicks land
//! in viewport coordinates and are stored in original image pixel space so the
//! backend never sees on-screen sizes.

use crate::models::{Landmark, LandmarkLabel, ProcessLandmarksRequest, SessionId};

/// Ratio between rendered canvas pixels and original image pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayScale {
    factor: f64,
}

impl DisplayScale {
    /// Scale that fits `image_height` into `viewport_height`, never enlarging
    pub fn fit(image_height: u32, viewport_height: f64) -> Self {
        if image_height == 0 {
            return Self { factor: 1.0 };
        }
        let factor = (viewport_height / image_height as f64).min(1.0).max(0.0);
        Self { factor }
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Rendered canvas size for an image of `width` x `height`
    pub fn canvas_size(&self, width: u32, height: u32) -> (f64, f64) {
        (width as f64 * self.factor, height as f64 * self.factor)
    }

    /// Canvas position back to image pixels
    pub fn to_image(&self, x: f64, y: f64) -> (f64, f64) {
        (x / self.factor, y / self.factor)
    }

    /// Image pixels to canvas position
    pub fn to_canvas(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.factor, y * self.factor)
    }
}

/// Result of a click on the capture surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickOutcome {
    Placed(Landmark),
    /// All four landmarks are already placed
    Ignored,
    /// The click missed the rendered image
    OutOfBounds,
}

/// Records up to four labeled landmarks on one image
#[derive(Debug, Clone)]
pub struct CaptureSurface {
    image_width: u32,
    image_height: u32,
    scale: DisplayScale,
    left: f64,
    top: f64,
    points: Vec<Landmark>,
}

impl CaptureSurface {
    pub fn new(image_width: u32, image_height: u32, viewport_height: f64) -> Self {
        Self {
            image_width,
            image_height,
            scale: DisplayScale::fit(image_height, viewport_height),
            left: 0.0,
            top: 0.0,
            points: Vec::with_capacity(LandmarkLabel::ALL.len()),
        }
    }

    /// Recompute the scale for a new viewport height; stored points stay put
    pub fn refit(&mut self, viewport_height: f64) {
        self.scale = DisplayScale::fit(self.image_height, viewport_height);
    }

    /// Canvas top-left corner in viewport coordinates
    pub fn set_origin(&mut self, left: f64, top: f64) {
        self.left = left;
        self.top = top;
    }

    pub fn origin(&self) -> (f64, f64) {
        (self.left, self.top)
    }

    pub fn scale(&self) -> DisplayScale {
        self.scale
    }

    pub fn image_size(&self) -> (u32, u32) {
        (self.image_width, self.image_height)
    }

    pub fn canvas_size(&self) -> (f64, f64) {
        self.scale.canvas_size(self.image_width, self.image_height)
    }

    /// Handle a click at viewport position (`cx`, `cy`)
    pub fn click(&mut self, cx: f64, cy: f64) -> ClickOutcome {
        let Some(label) = self.next_label() else {
            return ClickOutcome::Ignored;
        };

        let (canvas_w, canvas_h) = self.canvas_size();
        let (dx, dy) = (cx - self.left, cy - self.top);
        if !(dx >= 0.0 && dy >= 0.0 && dx < canvas_w && dy < canvas_h) {
            return ClickOutcome::OutOfBounds;
        }

        let (x, y) = self.scale.to_image(dx, dy);
        let landmark = Landmark { x, y, label };
        self.points.push(landmark);
        ClickOutcome::Placed(landmark)
    }

    /// Label the next click will receive, `None` once complete
    pub fn next_label(&self) -> Option<LandmarkLabel> {
        LandmarkLabel::ALL.get(self.points.len()).copied()
    }

    pub fn is_complete(&self) -> bool {
        self.points.len() == LandmarkLabel::ALL.len()
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.points
    }

    /// Viewport position where a stored landmark is drawn
    pub fn to_viewport(&self, landmark: &Landmark) -> (f64, f64) {
        let (x, y) = self.scale.to_canvas(landmark.x, landmark.y);
        (x + self.left, y + self.top)
    }

    /// Request body for the backend, available only with all four points
    pub fn submission(&self, session_id: &SessionId) -> Option<ProcessLandmarksRequest> {
        if !self.is_complete() {
            return None;
        }
        Some(ProcessLandmarksRequest {
            session_id: session_id.clone(),
            landmarks: self.points.clone(),
        })
    }

    /// One-line prompt for the capture status bar
    pub fn prompt(&self) -> String {
        match self.next_label() {
            Some(label) => format!(
                "Landmark {} of {}: {}",
                self.points.len() + 1,
                LandmarkLabel::ALL.len(),
                label
            ),
            None => "All landmarks selected".to_string(),
        }
    }
}
