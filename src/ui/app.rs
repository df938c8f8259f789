use std::path::PathBuf;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::api::FractureBackend;
use crate::flow::{run_command, Page, SessionFlow};
use crate::models::Config;
use crate::ui::{
    components::render_alert,
    events::TuiEvent,
    landmarks::LandmarkView,
    layout::TuiLayout,
    report::ReportView,
    upload::UploadView,
    viewer::ModelViewerView,
    View,
};

/// Main TUI application: one active view per workflow page
pub struct FractureTuiApp {
    pub should_quit: bool,
    pub flow: SessionFlow,
    config: Config,
    backend: Arc<dyn FractureBackend>,
    view: Box<dyn View>,
    view_epoch: u64,
    events: mpsc::Sender<TuiEvent>,
}

impl FractureTuiApp {
    pub fn new(
        config: Config,
        backend: Arc<dyn FractureBackend>,
        events: mpsc::Sender<TuiEvent>,
        initial_xray: Option<PathBuf>,
    ) -> Self {
        let flow = SessionFlow::new();
        let view_epoch = flow.epoch();
        Self {
            should_quit: false,
            flow,
            config,
            backend,
            view: Box::new(UploadView::new(initial_xray)),
            view_epoch,
            events,
        }
    }

    pub fn current_page(&self) -> Page {
        self.view.page()
    }

    fn build_view(&self, page: Page) -> Box<dyn View> {
        match page {
            Page::Upload => Box::new(UploadView::new(None)),
            Page::Landmarks => Box::new(LandmarkView::new(
                self.flow.xray().cloned(),
                self.config.viewport_height,
            )),
            Page::Report => Box::new(ReportView::new()),
            Page::Visualize => Box::new(ModelViewerView::new()),
        }
    }

    /// Swap in a fresh view whenever the flow has navigated
    fn sync_view(&mut self) {
        if self.flow.epoch() == self.view_epoch {
            return;
        }
        self.view_epoch = self.flow.epoch();
        let page = self.flow.page();
        info!("Mounting {:?} view", page);
        self.view = self.build_view(page);
        self.view.on_enter(&mut self.flow);
    }

    pub fn handle_event(&mut self, event: TuiEvent) {
        match event {
            TuiEvent::Key(key) => self.handle_key(key),
            TuiEvent::Mouse(mouse) => {
                if self.flow.current_alert().is_none() {
                    self.view.handle_mouse(mouse, &mut self.flow);
                }
            }
            TuiEvent::Resize(w, h) => debug!("Terminal resized to {}x{}", w, h),
            TuiEvent::Tick => self.view.tick(),
            TuiEvent::Outcome { epoch, outcome } => {
                if let Some(applied) = self.flow.apply(epoch, outcome) {
                    self.view.handle_applied(applied);
                }
            }
        }
        self.sync_view();
        self.dispatch_pending();
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            info!("Quit requested");
            self.should_quit = true;
            return;
        }

        // Alerts are modal: the next key only acknowledges
        if self.flow.dismiss_alert().is_some() {
            return;
        }

        let handled = self.view.handle_key(key, &mut self.flow);
        if !handled && key.code == KeyCode::Char('q') {
            info!("Quit requested");
            self.should_quit = true;
        }
    }

    /// Spawn a task per queued command; outcomes return through the event channel
    fn dispatch_pending(&mut self) {
        for dispatch in self.flow.take_dispatches() {
            let backend = Arc::clone(&self.backend);
            let sender = self.events.clone();
            tokio::spawn(async move {
                let outcome = run_command(backend.as_ref(), dispatch.command).await;
                let event = TuiEvent::Outcome {
                    epoch: dispatch.epoch,
                    outcome,
                };
                if sender.send(event).await.is_err() {
                    warn!("Event loop closed before outcome was delivered");
                }
            });
        }
    }

    pub fn draw(&mut self, f: &mut Frame) {
        let layout = TuiLayout::new(f.area());
        layout.render_tab_bar(f, self.view.page());
        self.view.render(f, layout.content, &self.flow);

        let hints = self.view.key_hints(&self.flow);
        layout.render_status_bar(f, &hints, &self.flow.status_text());

        let area = f.area();
        if let Some(alert) = self.flow.current_alert() {
            render_alert(f, area, alert);
        }
    }
}
