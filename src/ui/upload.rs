use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tracing::debug;

use crate::flow::{Applied, Page, SessionFlow};
use crate::ui::components::{input_line, render_loading_indicator};
use crate::ui::View;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadField {
    Xray,
    Model,
    Continue,
}

/// Upload page: X-ray path (required) and 3D model path (optional)
pub struct UploadView {
    pub xray_input: String,
    pub model_input: String,
    pub focus: UploadField,
    pub xray_name: Option<String>,
    pub model_name: Option<String>,
}

impl UploadView {
    pub fn new(initial_xray: Option<PathBuf>) -> Self {
        Self {
            xray_input: initial_xray
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            model_input: String::new(),
            focus: UploadField::Xray,
            xray_name: None,
            model_name: None,
        }
    }

    /// Fields that can take focus right now, in tab order
    fn available_fields(flow: &SessionFlow) -> Vec<UploadField> {
        let mut fields = vec![UploadField::Xray];
        if flow.session_id().is_some() {
            fields.push(UploadField::Model);
        }
        if flow.can_continue() {
            fields.push(UploadField::Continue);
        }
        fields
    }

    fn cycle_focus(&mut self, flow: &SessionFlow, forward: bool) {
        let fields = Self::available_fields(flow);
        let current = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        let next = if forward {
            (current + 1) % fields.len()
        } else {
            (current + fields.len() - 1) % fields.len()
        };
        self.focus = fields[next];
    }

    fn focused_input(&mut self) -> Option<&mut String> {
        match self.focus {
            UploadField::Xray => Some(&mut self.xray_input),
            UploadField::Model => Some(&mut self.model_input),
            UploadField::Continue => None,
        }
    }

    fn submit(&mut self, flow: &mut SessionFlow) {
        match self.focus {
            UploadField::Xray => {
                let path = self.xray_input.trim();
                if path.is_empty() {
                    return;
                }
                debug!("X-ray path submitted: {}", path);
                flow.upload_xray(PathBuf::from(path));
            }
            UploadField::Model => {
                let path = self.model_input.trim();
                if path.is_empty() {
                    return;
                }
                debug!("Model path submitted: {}", path);
                flow.upload_model(PathBuf::from(path));
            }
            UploadField::Continue => {
                flow.continue_to_landmarks();
            }
        }
    }

    fn field_block(&self, field: UploadField, title: &str, hint: &str) -> Block<'static> {
        let border = if self.focus == field {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(Line::from(vec![
                Span::styled(format!(" {} ", title), Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(format!("{} ", hint), Style::default().fg(Color::Gray)),
            ]))
    }

    fn uploaded_line(name: &Option<String>) -> Line<'static> {
        match name {
            Some(name) => Line::from(Span::styled(format!("✓ {}", name), Style::default().fg(Color::Green))),
            None => Line::from(""),
        }
    }
}

impl View for UploadView {
    fn page(&self) -> Page {
        Page::Upload
    }

    fn render(&mut self, f: &mut Frame, area: Rect, flow: &SessionFlow) {
        // Focus may point at a field that disappeared after a reset
        if !Self::available_fields(flow).contains(&self.focus) {
            self.focus = UploadField::Xray;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(2), // Title
                Constraint::Length(3), // X-ray input
                Constraint::Length(1), // X-ray uploaded
                Constraint::Length(3), // Model input
                Constraint::Length(1), // Model uploaded
                Constraint::Length(3), // Continue
                Constraint::Min(0),
            ])
            .split(area);

        let title = Paragraph::new("Upload Medical Data")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
        f.render_widget(title, chunks[0]);

        let xray = Paragraph::new(input_line(&self.xray_input, self.focus == UploadField::Xray))
            .block(self.field_block(UploadField::Xray, "Upload X-ray", "JPG / PNG"));
        f.render_widget(xray, chunks[1]);
        f.render_widget(Paragraph::new(Self::uploaded_line(&self.xray_name)), chunks[2]);

        if flow.session_id().is_some() {
            let model = Paragraph::new(input_line(&self.model_input, self.focus == UploadField::Model))
                .block(self.field_block(UploadField::Model, "Upload 3D Model (Optional)", "GLB / GLTF"));
            f.render_widget(model, chunks[3]);
            f.render_widget(Paragraph::new(Self::uploaded_line(&self.model_name)), chunks[4]);
        }

        if flow.is_busy() {
            render_loading_indicator(f, chunks[5], "Uploading...");
        } else if flow.can_continue() {
            let style = if self.focus == UploadField::Continue {
                Style::default().fg(Color::Black).bg(Color::Blue).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Blue)
            };
            let button = Paragraph::new("Continue to Mark Landmarks")
                .alignment(Alignment::Center)
                .style(style)
                .block(Block::default().borders(Borders::ALL));
            f.render_widget(button, chunks[5]);
        }
    }

    fn key_hints(&self, flow: &SessionFlow) -> Vec<(&'static str, &'static str)> {
        let mut hints = vec![("Enter", "upload / select")];
        if Self::available_fields(flow).len() > 1 {
            hints.push(("Tab", "next field"));
        }
        hints
    }

    fn handle_key(&mut self, key: KeyEvent, flow: &mut SessionFlow) -> bool {
        match key.code {
            KeyCode::Tab | KeyCode::Down => self.cycle_focus(flow, true),
            KeyCode::BackTab | KeyCode::Up => self.cycle_focus(flow, false),
            KeyCode::Enter => self.submit(flow),
            KeyCode::Backspace => {
                if let Some(input) = self.focused_input() {
                    input.pop();
                }
            }
            KeyCode::Char(c) => match self.focused_input() {
                Some(input) => input.push(c),
                None => return false,
            },
            _ => return false,
        }
        true
    }

    fn handle_applied(&mut self, applied: Applied) {
        match applied {
            Applied::XrayReady { file_name } => {
                self.xray_name = Some(file_name);
                self.model_name = None;
            }
            Applied::ModelUploaded { file_name } => self.model_name = Some(file_name),
            _ => {}
        }
    }
}
