use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::{prelude::Rect, Frame};

use crate::flow::{Applied, Page, SessionFlow};

/// View contract for the workflow pages.
///
/// A view owns only page-local input state; anything that has to survive a
/// page change goes through the `SessionFlow`. A fresh view is built each
/// time its page is entered.
pub trait View {
    /// The page this view renders
    fn page(&self) -> Page;

    /// Called once after the view is mounted
    fn on_enter(&mut self, _flow: &mut SessionFlow) {}

    /// Render the view
    fn render(&mut self, f: &mut Frame, area: Rect, flow: &SessionFlow);

    /// Key hints for the status bar as (key, action) pairs
    fn key_hints(&self, flow: &SessionFlow) -> Vec<(&'static str, &'static str)>;

    /// Handle a key press, returns true if the key was consumed
    fn handle_key(&mut self, key: KeyEvent, flow: &mut SessionFlow) -> bool;

    /// Handle a mouse event, returns true if it was consumed
    fn handle_mouse(&mut self, _mouse: MouseEvent, _flow: &mut SessionFlow) -> bool {
        false
    }

    /// Receive the effect of a finished request issued from this page
    fn handle_applied(&mut self, _applied: Applied) {}

    /// Periodic update
    fn tick(&mut self) {}
}
