//! Report page rendering against an in-memory terminal

use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};

use crate::common::{drive, logging};
use fracture_tui::flow::SessionFlow;
use fracture_tui::ui::{report::ReportView, View};

const WIDTH: u16 = 100;
const HEIGHT: u16 = 40;

fn row_text(buf: &Buffer, y: u16) -> String {
    (0..buf.area.width)
        .filter_map(|x| buf.cell((x, y)).map(|c| c.symbol().to_string()))
        .collect()
}

fn screen(buf: &Buffer) -> Vec<String> {
    (0..buf.area.height).map(|y| row_text(buf, y)).collect()
}

async fn rendered_report() -> Vec<String> {
    logging::init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let backend = drive::happy_backend("session_7");
    let mut flow = SessionFlow::new();
    drive::to_report(&mut flow, &backend, &dir).await;

    let mut view = ReportView::new();
    let mut terminal = Terminal::new(TestBackend::new(WIDTH, HEIGHT)).unwrap();
    terminal
        .draw(|f| {
            let area = f.area();
            view.render(f, area, &flow);
        })
        .unwrap();
    screen(terminal.backend().buffer())
}

#[tokio::test]
async fn test_confidence_is_shown_with_one_decimal() {
    let lines = rendered_report().await;
    let confidence = lines
        .iter()
        .find(|l| l.contains('█'))
        .expect("confidence bar row");
    assert!(confidence.contains("87.0%"), "row was {:?}", confidence);
}

#[tokio::test]
async fn test_confidence_bar_is_proportional() {
    let lines = rendered_report().await;
    let confidence = lines.iter().find(|l| l.contains('█')).unwrap();
    let filled = confidence.chars().filter(|c| *c == '█').count();
    let empty = confidence.chars().filter(|c| *c == '░').count();
    let ratio = filled as f64 / (filled + empty) as f64;
    assert!((ratio - 0.87).abs() < 0.02, "filled {} of {}", filled, filled + empty);
}

#[tokio::test]
async fn test_fracture_details_are_formatted() {
    let text = rendered_report().await.join("\n");
    assert!(text.contains("Fracture Report"));
    assert!(text.contains("Ulna"));
    assert!(text.contains("Radius Fracture"));
    assert!(text.contains("MODERATE"));
    assert!(text.contains("transverse"));
    assert!(text.contains("42%"));
    assert!(text.contains("12.3°"));
    assert!(text.contains("-3.5°"));
    assert!(text.contains("academic & research purposes"));
}
