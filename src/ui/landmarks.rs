use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use image::RgbImage;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tracing::debug;

use crate::capture::{CaptureSurface, ClickOutcome};
use crate::flow::{Page, SessionFlow};
use crate::ui::View;
use crate::xray::{HalfBlockImage, XrayImage};

/// Landmark capture page.
///
/// Viewport coordinates are half-block pixels: one terminal column is one
/// pixel wide and one row is two pixels tall.
pub struct LandmarkView {
    image: Option<XrayImage>,
    surface: Option<CaptureSurface>,
    max_viewport_height: u32,
    raster: Option<RgbImage>,
    viewport: Option<Rect>,
    cursor: (u16, u16),
}

impl LandmarkView {
    pub fn new(image: Option<XrayImage>, max_viewport_height: u32) -> Self {
        let surface = image
            .as_ref()
            .map(|img| CaptureSurface::new(img.width(), img.height(), max_viewport_height as f64));
        Self {
            image,
            surface,
            max_viewport_height,
            raster: None,
            viewport: None,
            cursor: (0, 0),
        }
    }

    pub fn surface(&self) -> Option<&CaptureSurface> {
        self.surface.as_ref()
    }

    /// Viewport height in pixels for a viewport area
    fn viewport_height(&self, area: Rect) -> f64 {
        (area.height as u32 * 2).min(self.max_viewport_height) as f64
    }

    /// Fit the surface to `area` and cache the resampled raster
    pub fn layout_canvas(&mut self, area: Rect) {
        let viewport_height = self.viewport_height(area);
        let (Some(surface), Some(image)) = (self.surface.as_mut(), self.image.as_ref()) else {
            return;
        };
        surface.refit(viewport_height);
        let (w, h) = surface.canvas_size();
        let (w, h) = (w.floor() as u32, h.floor() as u32);
        let left = (area.width as u32).saturating_sub(w) / 2;
        surface.set_origin(left as f64, 0.0);

        let stale = self
            .raster
            .as_ref()
            .map_or(true, |r| r.width() != w || r.height() != h);
        if stale {
            debug!("Resampling X-ray to {}x{} canvas pixels", w, h);
            self.raster = Some(image.raster(w, h));
        }
        self.viewport = Some(area);
    }

    /// Click on terminal cell (`column`, `row`), aimed at the cell center
    pub fn click_cell(&mut self, column: u16, row: u16) -> Option<ClickOutcome> {
        let viewport = self.viewport?;
        if column < viewport.x || row < viewport.y {
            return None;
        }
        let cx = (column - viewport.x) as f64 + 0.5;
        let cy = (row - viewport.y) as f64 * 2.0 + 1.0;
        self.cursor = (column - viewport.x, (row - viewport.y) * 2);
        self.click_viewport(cx, cy)
    }

    fn click_viewport(&mut self, cx: f64, cy: f64) -> Option<ClickOutcome> {
        let surface = self.surface.as_mut()?;
        let outcome = surface.click(cx, cy);
        if let ClickOutcome::Placed(landmark) = outcome {
            debug!(
                "Placed {} at image ({:.1}, {:.1})",
                landmark.label, landmark.x, landmark.y
            );
        }
        Some(outcome)
    }

    fn move_cursor(&mut self, dx: i32, dy: i32) {
        let Some(viewport) = self.viewport else {
            return;
        };
        let max_x = viewport.width.saturating_sub(1) as i32;
        let max_y = (viewport.height * 2).saturating_sub(1) as i32;
        self.cursor.0 = (self.cursor.0 as i32 + dx).clamp(0, max_x) as u16;
        self.cursor.1 = (self.cursor.1 as i32 + dy).clamp(0, max_y) as u16;
    }

    fn submit(&self, flow: &mut SessionFlow) -> bool {
        let (Some(surface), Some(session_id)) = (self.surface.as_ref(), flow.session_id()) else {
            return false;
        };
        match surface.submission(session_id) {
            Some(request) => flow.submit_landmarks(request),
            None => false,
        }
    }

    fn draw_markers(&self, f: &mut Frame, viewport: Rect) {
        let Some(surface) = self.surface.as_ref() else {
            return;
        };
        let buf = f.buffer_mut();
        for landmark in surface.landmarks() {
            let (vx, vy) = surface.to_viewport(landmark);
            let col = vx.floor() as u16;
            let row = (vy / 2.0).floor() as u16;
            if col >= viewport.width || row >= viewport.height {
                continue;
            }
            let (x, y) = (viewport.x + col, viewport.y + row);
            buf.set_string(
                x,
                y,
                (landmark.label.index() + 1).to_string(),
                Style::default().fg(Color::White).bg(Color::Red).add_modifier(Modifier::BOLD),
            );
            let label_x = x + 2;
            if label_x < viewport.right() {
                let room = (viewport.right() - label_x) as usize;
                let text: String = landmark.label.as_str().chars().take(room).collect();
                buf.set_string(label_x, y, text, Style::default().fg(Color::Black).bg(Color::Gray));
            }
        }

        if !surface.is_complete() {
            let (cx, cy) = (self.cursor.0, self.cursor.1 / 2);
            if cx < viewport.width && cy < viewport.height {
                buf.set_string(
                    viewport.x + cx,
                    viewport.y + cy,
                    "+",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                );
            }
        }
    }
}

impl View for LandmarkView {
    fn page(&self) -> Page {
        Page::Landmarks
    }

    fn render(&mut self, f: &mut Frame, area: Rect, flow: &SessionFlow) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Prompt
                Constraint::Min(4),    // Canvas
                Constraint::Length(3), // Submit
            ])
            .split(area);

        let prompt = self
            .surface
            .as_ref()
            .map(|s| s.prompt())
            .unwrap_or_else(|| "No X-ray loaded".to_string());
        f.render_widget(
            Paragraph::new(prompt)
                .alignment(Alignment::Center)
                .style(Style::default().add_modifier(Modifier::BOLD)),
            chunks[0],
        );

        let block = Block::default().borders(Borders::ALL).title(" Mark Landmarks ");
        let viewport = block.inner(chunks[1]);
        f.render_widget(block, chunks[1]);

        self.layout_canvas(viewport);
        if let (Some(surface), Some(raster)) = (self.surface.as_ref(), self.raster.as_ref()) {
            let (left, _) = surface.origin();
            let image_area = Rect::new(
                viewport.x + left as u16,
                viewport.y,
                (raster.width() as u16).min(viewport.width),
                (raster.height().div_ceil(2) as u16).min(viewport.height),
            );
            f.render_widget(HalfBlockImage::new(raster), image_area);
        }
        self.draw_markers(f, viewport);

        let complete = self.surface.as_ref().is_some_and(|s| s.is_complete());
        if complete {
            let (label, style) = if flow.is_busy() {
                ("Processing...", Style::default().fg(Color::DarkGray))
            } else {
                (
                    "Detect Fracture",
                    Style::default().fg(Color::Black).bg(Color::Green).add_modifier(Modifier::BOLD),
                )
            };
            f.render_widget(
                Paragraph::new(label)
                    .alignment(Alignment::Center)
                    .style(style)
                    .block(Block::default().borders(Borders::ALL)),
                chunks[2],
            );
        } else {
            f.render_widget(
                Paragraph::new("Click accurately on anatomical landmarks")
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(Color::DarkGray)),
                chunks[2],
            );
        }
    }

    fn key_hints(&self, _flow: &SessionFlow) -> Vec<(&'static str, &'static str)> {
        if self.surface.as_ref().is_some_and(|s| s.is_complete()) {
            vec![("Enter", "detect fracture")]
        } else {
            vec![("Click", "place landmark"), ("Arrows", "move cursor"), ("Space", "place at cursor")]
        }
    }

    fn handle_key(&mut self, key: KeyEvent, flow: &mut SessionFlow) -> bool {
        let step = if key.modifiers.contains(KeyModifiers::SHIFT) { 5 } else { 1 };
        match key.code {
            KeyCode::Left => self.move_cursor(-step, 0),
            KeyCode::Right => self.move_cursor(step, 0),
            KeyCode::Up => self.move_cursor(0, -step),
            KeyCode::Down => self.move_cursor(0, step),
            KeyCode::Char(' ') => {
                let (x, y) = (self.cursor.0 as f64 + 0.5, self.cursor.1 as f64 + 0.5);
                self.click_viewport(x, y);
            }
            KeyCode::Enter => {
                if self.surface.as_ref().is_some_and(|s| s.is_complete()) {
                    self.submit(flow);
                } else {
                    let (x, y) = (self.cursor.0 as f64 + 0.5, self.cursor.1 as f64 + 0.5);
                    self.click_viewport(x, y);
                }
            }
            _ => return false,
        }
        true
    }

    fn handle_mouse(&mut self, mouse: MouseEvent, _flow: &mut SessionFlow) -> bool {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.click_cell(mouse.column, mouse.row);
                true
            }
            _ => false,
        }
    }
}
