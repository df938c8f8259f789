use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use crate::flow::Page;

/// Centralized layout management so every page shares the same chrome
pub struct TuiLayout {
    pub tab_bar: Rect,
    pub content: Rect,
    pub status_bar: Rect,
}

impl TuiLayout {
    /// Create a new layout from the given area
    pub fn new(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Tab bar
                Constraint::Min(0),    // Content
                Constraint::Length(4), // Status bar
            ])
            .split(area);

        Self {
            tab_bar: chunks[0],
            content: chunks[1],
            status_bar: chunks[2],
        }
    }

    /// Render the workflow steps, highlighting the current page
    pub fn render_tab_bar(&self, f: &mut Frame, current: Page) {
        let titles: Vec<String> = Page::ALL
            .iter()
            .enumerate()
            .map(|(i, page)| format!("{}. {}", i + 1, page.title()))
            .collect();
        let selected = Page::ALL.iter().position(|p| *p == current).unwrap_or(0);

        let tabs = Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL).title("Fracture Analysis"))
            .style(Style::default().fg(Color::DarkGray))
            .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            .select(selected);

        f.render_widget(tabs, self.tab_bar);
    }

    /// Render key hints and the session status line
    pub fn render_status_bar(&self, f: &mut Frame, hints: &[(&str, &str)], status_text: &str) {
        let mut hint_spans = Vec::with_capacity(hints.len() * 2 + 2);
        for (key, action) in hints {
            hint_spans.push(Span::styled(
                key.to_string(),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ));
            hint_spans.push(Span::styled(format!(" {}  ", action), Style::default().fg(Color::Gray)));
        }
        hint_spans.push(Span::styled("Ctrl+C", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)));
        hint_spans.push(Span::styled(" quit", Style::default().fg(Color::Gray)));

        let status_content = vec![
            Line::from(hint_spans),
            Line::from(Span::styled(status_text.to_string(), Style::default().fg(Color::Cyan))),
        ];

        let paragraph = Paragraph::new(status_content)
            .block(Block::default().borders(Borders::ALL))
            .style(Style::default().fg(Color::White));

        f.render_widget(paragraph, self.status_bar);
    }
}

/// Rectangle of `width` x `height` centered in `area`, clipped to fit
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
