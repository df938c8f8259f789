/// Shared widgets and formatting helpers for the workflow pages
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::flow::{Alert, AlertKind};
use crate::models::Severity;
use crate::ui::layout::centered_rect;

/// Render a loading indicator
pub fn render_loading_indicator(f: &mut Frame, area: Rect, message: &str) {
    let loading = Paragraph::new(message)
        .block(Block::default().borders(Borders::ALL).title("Loading"))
        .style(Style::default().fg(Color::Yellow));

    f.render_widget(loading, area);
}

/// Number of filled cells for a bar of `width` cells at `ratio`
pub fn filled_cells(ratio: f64, width: u16) -> u16 {
    let ratio = if ratio.is_finite() { ratio.clamp(0.0, 1.0) } else { 0.0 };
    (ratio * width as f64).round() as u16
}

/// A text progress bar, filled proportionally to `ratio`
pub fn progress_bar(ratio: f64, width: u16, color: Color) -> Line<'static> {
    let filled = filled_cells(ratio, width);
    Line::from(vec![
        Span::styled("█".repeat(filled as usize), Style::default().fg(color)),
        Span::styled(
            "░".repeat(width.saturating_sub(filled) as usize),
            Style::default().fg(Color::DarkGray),
        ),
    ])
}

/// Percentage of a 0..1 ratio with a fixed number of decimals
pub fn format_percent(ratio: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, ratio * 100.0)
}

pub fn format_angle(degrees: f64) -> String {
    format!("{:.1}°", degrees)
}

/// Uppercase the first character
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Badge style for each severity tier
pub fn severity_style(severity: Severity) -> Style {
    let (fg, bg) = match severity {
        Severity::Mild => (Color::Black, Color::Green),
        Severity::Moderate => (Color::Black, Color::Yellow),
        Severity::Severe => (Color::White, Color::Red),
        Severity::Unknown => (Color::White, Color::DarkGray),
    };
    Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD)
}

/// Render a blocking alert popup over `area`
pub fn render_alert(f: &mut Frame, area: Rect, alert: &Alert) {
    let (title, color) = match alert.kind {
        AlertKind::Info => ("Notice", Color::Cyan),
        AlertKind::Error => ("Error", Color::Red),
    };
    let width = (alert.message.chars().count() as u16 + 6).clamp(30, 70);
    let popup = centered_rect(width, 6, area);

    let body = vec![
        Line::from(alert.message.clone()),
        Line::from(""),
        Line::from(Span::styled("Press any key to continue", Style::default().fg(Color::DarkGray))),
    ];
    let paragraph = Paragraph::new(body)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(color)),
        );

    f.render_widget(Clear, popup);
    f.render_widget(paragraph, popup);
}

/// Render a text input with a trailing cursor when focused
pub fn input_line(value: &str, focused: bool) -> Line<'static> {
    let mut spans = vec![Span::raw(value.to_string())];
    if focused {
        spans.push(Span::styled("▏", Style::default().fg(Color::Yellow)));
    }
    Line::from(spans)
}
