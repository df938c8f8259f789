//! Landmark capture geometry

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use test_log::test;

use fracture_tui::capture::{CaptureSurface, ClickOutcome, DisplayScale};
use fracture_tui::models::{LandmarkLabel, SessionId};

const VIEWPORT: f64 = 420.0;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_tall_images_shrink_to_viewport() {
    let scale = DisplayScale::fit(2000, VIEWPORT);
    assert!(approx(scale.factor(), 0.21));
    let (w, h) = scale.canvas_size(1000, 2000);
    assert!(approx(w, 210.0) && approx(h, 420.0));
}

#[test]
fn test_small_images_are_never_enlarged() {
    assert!(approx(DisplayScale::fit(300, VIEWPORT).factor(), 1.0));
    assert!(approx(DisplayScale::fit(420, VIEWPORT).factor(), 1.0));
}

#[test]
fn test_click_maps_back_to_original_pixels() {
    let mut surface = CaptureSurface::new(1000, 2000, VIEWPORT);
    let outcome = surface.click(105.0, 210.0);
    let landmark = assert_matches!(outcome, ClickOutcome::Placed(l) => l);
    assert!(approx(landmark.x, 500.0));
    assert!(approx(landmark.y, 1000.0));
    assert_eq!(landmark.label, LandmarkLabel::UlnaHead);
}

#[test]
fn test_offset_origin_is_subtracted() {
    let mut surface = CaptureSurface::new(1000, 2000, VIEWPORT);
    surface.set_origin(30.0, 0.0);
    let landmark = assert_matches!(surface.click(135.0, 21.0), ClickOutcome::Placed(l) => l);
    assert!(approx(landmark.x, 500.0));
    assert!(approx(landmark.y, 100.0));
}

#[test]
fn test_labels_follow_click_order() {
    let mut surface = CaptureSurface::new(400, 400, VIEWPORT);
    for i in 0..4 {
        surface.click(10.0 * (i + 1) as f64, 10.0);
    }
    let labels: Vec<_> = surface.landmarks().iter().map(|l| l.label).collect();
    assert_eq!(labels, LandmarkLabel::ALL.to_vec());
    assert!(surface.is_complete());
}

#[test]
fn test_fifth_click_is_ignored() {
    let mut surface = CaptureSurface::new(400, 400, VIEWPORT);
    for _ in 0..4 {
        surface.click(50.0, 50.0);
    }
    assert_eq!(surface.click(60.0, 60.0), ClickOutcome::Ignored);
    assert_eq!(surface.landmarks().len(), 4);
}

#[test]
fn test_clicks_outside_image_are_not_recorded() {
    let mut surface = CaptureSurface::new(400, 400, VIEWPORT);
    assert_eq!(surface.click(-1.0, 10.0), ClickOutcome::OutOfBounds);
    assert_eq!(surface.click(10.0, 400.0), ClickOutcome::OutOfBounds);
    assert!(surface.landmarks().is_empty());
    assert_eq!(surface.next_label(), Some(LandmarkLabel::UlnaHead));
}

#[test]
fn test_submission_requires_all_four_points() {
    let session = SessionId::new("session_3");
    let mut surface = CaptureSurface::new(400, 400, VIEWPORT);
    for _ in 0..3 {
        surface.click(20.0, 20.0);
    }
    assert!(surface.submission(&session).is_none());

    surface.click(20.0, 20.0);
    let request = surface.submission(&session).expect("complete submission");
    assert_eq!(request.session_id, session);
    assert_eq!(request.landmarks.len(), 4);
}

#[test]
fn test_prompt_tracks_progress() {
    let mut surface = CaptureSurface::new(400, 400, VIEWPORT);
    assert_eq!(surface.prompt(), "Landmark 1 of 4: Ulna Head");
    for _ in 0..4 {
        surface.click(20.0, 20.0);
    }
    assert_eq!(surface.prompt(), "All landmarks selected");
}
