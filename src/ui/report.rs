use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::flow::{Page, SessionFlow};
use crate::models::{Fracture, FractureReport};
use crate::ui::components::{capitalize, format_angle, format_percent, progress_bar, severity_style};
use crate::ui::View;

const FRACTURES_PER_ROW: usize = 2;
const FRACTURE_PANEL_HEIGHT: u16 = 7;

/// Read-only rendering of the fracture report
#[derive(Default)]
pub struct ReportView {
    scroll: u16,
}

impl ReportView {
    pub fn new() -> Self {
        Self::default()
    }

    fn render_confidence(f: &mut Frame, area: Rect, report: &FractureReport) {
        let block = Block::default().borders(Borders::ALL).title(" Detection Confidence ");
        let inner = block.inner(area);
        f.render_widget(block, area);

        let value = format_percent(report.confidence, 1);
        let bar_width = inner.width.saturating_sub(value.chars().count() as u16 + 1);
        let mut line = progress_bar(report.confidence, bar_width, Color::Green);
        line.spans.push(Span::raw(" "));
        line.spans.push(Span::styled(value, Style::default().add_modifier(Modifier::BOLD)));
        f.render_widget(Paragraph::new(line), inner);
    }

    fn render_bones(f: &mut Frame, area: Rect, report: &FractureReport) {
        let mut spans = Vec::with_capacity(report.detected_bones.len() * 2);
        for bone in &report.detected_bones {
            spans.push(Span::styled(
                format!(" {} ", capitalize(bone)),
                Style::default().fg(Color::Black).bg(Color::Cyan),
            ));
            spans.push(Span::raw(" "));
        }
        if spans.is_empty() {
            spans.push(Span::styled("None", Style::default().fg(Color::DarkGray)));
        }
        let paragraph = Paragraph::new(Line::from(spans))
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(" Detected Bones "));
        f.render_widget(paragraph, area);
    }

    fn render_fracture(f: &mut Frame, area: Rect, fracture: &Fracture) {
        let title = Line::from(vec![
            Span::styled(
                format!(" {} Fracture ", capitalize(&fracture.bone)),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" {} ", fracture.severity.as_str().to_uppercase()),
                severity_style(fracture.severity),
            ),
            Span::raw(" "),
        ]);

        let label = Style::default().fg(Color::Gray);
        let rows = vec![
            Line::from(vec![Span::styled("Damage Type: ", label), Span::raw(fracture.damage.clone())]),
            Line::from(vec![
                Span::styled("Location:    ", label),
                Span::raw(format_percent(fracture.location, 0)),
            ]),
            Line::from(vec![
                Span::styled("Top Angle:   ", label),
                Span::raw(format_angle(fracture.top_angle)),
            ]),
            Line::from(vec![
                Span::styled("Bottom Angle:", label),
                Span::raw(format!(" {}", format_angle(fracture.bottom_angle))),
            ]),
        ];

        let panel = Paragraph::new(rows).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(severity_style(fracture.severity).bg.unwrap_or(Color::Gray)))
                .title(title),
        );
        f.render_widget(panel, area);
    }

    fn render_fractures(&self, f: &mut Frame, area: Rect, report: &FractureReport) {
        if report.fractures.is_empty() {
            let none = Paragraph::new("No fractures detected")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Green));
            f.render_widget(none, area);
            return;
        }

        let rows: Vec<&[Fracture]> = report.fractures.chunks(FRACTURES_PER_ROW).collect();
        let visible = (area.height / FRACTURE_PANEL_HEIGHT).max(1) as usize;
        let skip = (self.scroll as usize).min(rows.len().saturating_sub(1));

        for (i, row) in rows.iter().skip(skip).take(visible).enumerate() {
            let y = area.y + i as u16 * FRACTURE_PANEL_HEIGHT;
            let height = FRACTURE_PANEL_HEIGHT.min(area.bottom().saturating_sub(y));
            if height == 0 {
                break;
            }
            let row_area = Rect::new(area.x, y, area.width, height);
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)])
                .split(row_area);
            for (fracture, column) in row.iter().zip(columns.iter()) {
                Self::render_fracture(f, *column, fracture);
            }
        }
    }

    fn max_scroll(flow: &SessionFlow) -> u16 {
        flow.report()
            .map(|r| r.fractures.len().div_ceil(FRACTURES_PER_ROW).saturating_sub(1) as u16)
            .unwrap_or(0)
    }
}

impl View for ReportView {
    fn page(&self) -> Page {
        Page::Report
    }

    fn render(&mut self, f: &mut Frame, area: Rect, flow: &SessionFlow) {
        let Some(report) = flow.report() else {
            let empty = Paragraph::new("No report available")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL));
            f.render_widget(empty, area);
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // Header
                Constraint::Length(3), // Confidence
                Constraint::Length(3), // Bones
                Constraint::Min(FRACTURE_PANEL_HEIGHT),
                Constraint::Length(1), // Disclaimer
            ])
            .split(area);

        let header = Paragraph::new(vec![
            Line::from(Span::styled(
                "Fracture Report",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "AI-assisted fracture analysis summary",
                Style::default().fg(Color::Gray),
            )),
        ])
        .alignment(Alignment::Center);
        f.render_widget(header, chunks[0]);

        Self::render_confidence(f, chunks[1], report);
        Self::render_bones(f, chunks[2], report);
        self.render_fractures(f, chunks[3], report);

        let disclaimer = Paragraph::new("This report is generated for academic & research purposes")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC));
        f.render_widget(disclaimer, chunks[4]);
    }

    fn key_hints(&self, flow: &SessionFlow) -> Vec<(&'static str, &'static str)> {
        let mut hints = vec![("v", "view 3D model"), ("n", "new analysis")];
        if Self::max_scroll(flow) > 0 {
            hints.push(("↑↓", "scroll"));
        }
        hints
    }

    fn handle_key(&mut self, key: KeyEvent, flow: &mut SessionFlow) -> bool {
        match key.code {
            KeyCode::Char('v') => {
                flow.open_viewer();
            }
            KeyCode::Char('n') => flow.reset(),
            KeyCode::Down => self.scroll = (self.scroll + 1).min(Self::max_scroll(flow)),
            KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
            _ => return false,
        }
        true
    }
}
