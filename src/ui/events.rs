use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind, MouseEvent};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::flow::TaskOutcome;

/// Unified TUI events
#[derive(Debug)]
pub enum TuiEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    Tick,
    /// A spawned request finished
    Outcome { epoch: u64, outcome: TaskOutcome },
}

/// Event manager: one channel fed by the terminal reader and by request tasks
pub struct EventManager {
    event_sender: mpsc::Sender<TuiEvent>,
    event_receiver: mpsc::Receiver<TuiEvent>,
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new()
    }
}

impl EventManager {
    /// Create a new event manager
    pub fn new() -> Self {
        let (event_sender, event_receiver) = mpsc::channel::<TuiEvent>(100);
        Self {
            event_sender,
            event_receiver,
        }
    }

    /// Get a clone of the event sender for use in async tasks
    pub fn sender(&self) -> mpsc::Sender<TuiEvent> {
        self.event_sender.clone()
    }

    /// Receive the next event
    pub async fn receive(&mut self) -> Option<TuiEvent> {
        self.event_receiver.recv().await
    }

    /// Try to receive an event (non-blocking)
    pub fn try_receive(&mut self) -> Option<TuiEvent> {
        self.event_receiver.try_recv().ok()
    }

    /// Poll the terminal on a blocking thread, emitting a tick whenever
    /// `tick_rate` passes without input. Stops once the receiver is gone.
    pub fn spawn_terminal_reader(&self, tick_rate: Duration) -> JoinHandle<()> {
        let sender = self.event_sender.clone();
        tokio::task::spawn_blocking(move || loop {
            let event = match event::poll(tick_rate) {
                Ok(true) => match event::read() {
                    Ok(raw) => match convert(raw) {
                        Some(event) => event,
                        None => continue,
                    },
                    Err(e) => {
                        error!("Failed to read terminal event: {}", e);
                        break;
                    }
                },
                Ok(false) => TuiEvent::Tick,
                Err(e) => {
                    error!("Failed to poll terminal: {}", e);
                    break;
                }
            };
            if sender.blocking_send(event).is_err() {
                debug!("Event receiver closed, terminal reader exiting");
                break;
            }
        })
    }
}

fn convert(raw: Event) -> Option<TuiEvent> {
    match raw {
        Event::Key(key) if key.kind == KeyEventKind::Press => Some(TuiEvent::Key(key)),
        Event::Mouse(mouse) => Some(TuiEvent::Mouse(mouse)),
        Event::Resize(w, h) => Some(TuiEvent::Resize(w, h)),
        _ => None,
    }
}
