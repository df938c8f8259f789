use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info};

use crate::api::FractureBackend;
use crate::models::Config;

pub mod app;
pub mod components;
pub mod events;
pub mod landmarks;
pub mod layout;
pub mod report;
pub mod upload;
pub mod view;
pub mod viewer;

pub use view::View;

use app::FractureTuiApp;
use events::EventManager;

const TICK_RATE: Duration = Duration::from_millis(100);

/// Run the workflow TUI until the user quits
pub async fn run_app(
    config: Config,
    backend: Arc<dyn FractureBackend>,
    initial_xray: Option<PathBuf>,
) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let mut events = EventManager::new();
    let mut app = FractureTuiApp::new(config, backend, events.sender(), initial_xray);
    let reader = events.spawn_terminal_reader(TICK_RATE);
    info!("TUI started");

    let result = loop {
        if let Err(e) = terminal.draw(|f| app.draw(f)) {
            break Err(e.into());
        }

        let Some(event) = events.receive().await else {
            break Ok(());
        };
        app.handle_event(event);
        // Apply whatever else is already queued before redrawing
        while let Some(event) = events.try_receive() {
            app.handle_event(event);
            if app.should_quit {
                break;
            }
        }

        if app.should_quit {
            break Ok(());
        }
    };

    // Cleanup terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    // Dropping the receiver stops the reader at its next poll
    drop(events);
    if let Err(e) = reader.await {
        error!("Terminal reader task failed: {}", e);
    }
    info!("TUI stopped");
    result
}
