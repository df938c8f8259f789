use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Line as CanvasLine},
        Block, Borders, Paragraph,
    },
    Frame,
};
use tracing::{debug, info};

use crate::flow::{Applied, Page, SessionFlow};
use crate::model3d::{BoneMesh, OrbitCamera};
use crate::models::ModelVariant;
use crate::ui::View;

const ORBIT_STEP: f64 = 0.1;
const AUTO_ROTATE_STEP: f64 = 0.02;
const ZOOM_IN: f64 = 0.9;
const ZOOM_OUT: f64 = 1.1;
/// Upper bound on edges drawn per frame; dense meshes are sampled by stride
const MAX_DRAWN_EDGES: usize = 8000;

#[derive(Debug)]
pub enum LoadState {
    Loading,
    Ready(BoneMesh),
    Unavailable,
}

/// Interactive wireframe viewer for the session's bone model
pub struct ModelViewerView {
    variant: ModelVariant,
    state: LoadState,
    camera: OrbitCamera,
    auto_rotate: bool,
}

impl Default for ModelViewerView {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelViewerView {
    pub fn new() -> Self {
        Self {
            variant: ModelVariant::Original,
            state: LoadState::Loading,
            camera: OrbitCamera::default(),
            auto_rotate: true,
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn variant(&self) -> ModelVariant {
        self.variant
    }

    fn request(&mut self, variant: ModelVariant, flow: &mut SessionFlow) {
        if flow.load_model(variant) {
            self.variant = variant;
            self.state = LoadState::Loading;
        }
    }

    fn reset_camera(&mut self) {
        self.camera = match &self.state {
            LoadState::Ready(mesh) => OrbitCamera::framing(mesh),
            _ => OrbitCamera::default(),
        };
    }

    /// Project the mesh edges into canvas coordinates
    fn segments(&self, mesh: &BoneMesh) -> Vec<(f64, f64, f64, f64)> {
        let stride = mesh.edges.len().div_ceil(MAX_DRAWN_EDGES).max(1);
        let point = |i: u32| {
            let v = mesh.vertices.get(i as usize)?;
            Some([v[0] as f64, v[1] as f64, v[2] as f64])
        };
        mesh.edges
            .iter()
            .step_by(stride)
            .filter_map(|[a, b]| {
                let (x1, y1) = self.camera.project(point(*a)?)?;
                let (x2, y2) = self.camera.project(point(*b)?)?;
                Some((x1, y1, x2, y2))
            })
            .collect()
    }

    fn render_mesh(&self, f: &mut Frame, area: Rect, mesh: &BoneMesh) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} model ", self.variant_title()));
        let inner = block.inner(area);
        if inner.height == 0 {
            f.render_widget(block, area);
            return;
        }
        // Terminal cells are roughly twice as tall as wide
        let aspect = (inner.width as f64 * 0.5) / inner.height as f64;
        let segments = self.segments(mesh);

        let canvas = Canvas::default()
            .block(block)
            .marker(Marker::Braille)
            .x_bounds([-aspect, aspect])
            .y_bounds([-1.0, 1.0])
            .paint(|ctx| {
                for &(x1, y1, x2, y2) in &segments {
                    ctx.draw(&CanvasLine::new(x1, y1, x2, y2, Color::Gray));
                }
            });
        f.render_widget(canvas, area);
    }

    fn render_message(f: &mut Frame, area: Rect, message: &str, color: Color) {
        let block = Block::default().borders(Borders::ALL);
        let inner = block.inner(area);
        f.render_widget(block, area);
        let y = inner.y + inner.height / 2;
        let line_area = Rect::new(inner.x, y, inner.width, 1.min(inner.height));
        f.render_widget(
            Paragraph::new(message)
                .alignment(Alignment::Center)
                .style(Style::default().fg(color)),
            line_area,
        );
    }

    fn variant_title(&self) -> &'static str {
        match self.variant {
            ModelVariant::Original => "Original",
            ModelVariant::Fractured => "Fractured",
        }
    }
}

impl View for ModelViewerView {
    fn page(&self) -> Page {
        Page::Visualize
    }

    fn on_enter(&mut self, flow: &mut SessionFlow) {
        self.request(self.variant, flow);
    }

    fn render(&mut self, f: &mut Frame, area: Rect, _flow: &SessionFlow) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(3)])
            .split(area);

        let mut header = vec![Span::styled(
            "3D Bone Model",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )];
        if let LoadState::Ready(mesh) = &self.state {
            header.push(Span::styled(
                format!("  {} vertices, {} triangles", mesh.vertices.len(), mesh.triangle_count),
                Style::default().fg(Color::DarkGray),
            ));
        }
        if self.auto_rotate {
            header.push(Span::styled("  auto-rotate", Style::default().fg(Color::Green)));
        }
        f.render_widget(Paragraph::new(Line::from(header)), chunks[0]);

        match &self.state {
            LoadState::Loading => Self::render_message(f, chunks[1], "Loading model...", Color::Yellow),
            LoadState::Unavailable => Self::render_message(f, chunks[1], "Model unavailable", Color::Red),
            LoadState::Ready(mesh) => self.render_mesh(f, chunks[1], mesh),
        }
    }

    fn key_hints(&self, _flow: &SessionFlow) -> Vec<(&'static str, &'static str)> {
        vec![
            ("←→↑↓", "orbit"),
            ("+/-", "zoom"),
            ("r", "reset"),
            ("a", "auto-rotate"),
            ("f/o", "fractured/original"),
            ("b", "back"),
        ]
    }

    fn handle_key(&mut self, key: KeyEvent, flow: &mut SessionFlow) -> bool {
        match key.code {
            KeyCode::Left => self.camera.orbit(-ORBIT_STEP, 0.0),
            KeyCode::Right => self.camera.orbit(ORBIT_STEP, 0.0),
            KeyCode::Up => self.camera.orbit(0.0, ORBIT_STEP),
            KeyCode::Down => self.camera.orbit(0.0, -ORBIT_STEP),
            KeyCode::Char('+') | KeyCode::Char('=') => self.camera.zoom(ZOOM_IN),
            KeyCode::Char('-') => self.camera.zoom(ZOOM_OUT),
            KeyCode::Char('r') => self.reset_camera(),
            KeyCode::Char('a') => self.auto_rotate = !self.auto_rotate,
            KeyCode::Char('f') => self.request(ModelVariant::Fractured, flow),
            KeyCode::Char('o') => self.request(ModelVariant::Original, flow),
            KeyCode::Char('b') | KeyCode::Esc => {
                flow.back_to_report();
            }
            _ => return false,
        }
        true
    }

    fn handle_applied(&mut self, applied: Applied) {
        match applied {
            Applied::ModelReady { variant, mesh } if variant == self.variant => {
                info!(
                    "Showing {:?} model: {} vertices, {} edges",
                    variant,
                    mesh.vertices.len(),
                    mesh.edges.len()
                );
                self.camera = OrbitCamera::framing(&mesh);
                self.state = LoadState::Ready(mesh);
            }
            Applied::ModelUnavailable { variant } if variant == self.variant => {
                self.state = LoadState::Unavailable;
            }
            other => debug!("Viewer ignoring {:?}", other),
        }
    }

    fn tick(&mut self) {
        if self.auto_rotate && matches!(self.state, LoadState::Ready(_)) {
            self.camera.orbit(AUTO_ROTATE_STEP, 0.0);
        }
    }
}
