//! Terminal input for the TUI
//!
//! crossterm reads block, so a dedicated thread polls the terminal and
//! forwards events over a channel. The thread exits when the receiver is
//! dropped or the terminal stops answering.

use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use tokio::sync::mpsc;
use tracing::{debug, error};

/// Application events
#[derive(Debug, PartialEq, Eq)]
pub enum Event {
    Key(KeyEvent),
    Resize(u16, u16),
}

/// Keys and resizes only; key releases are dropped so every press counts once.
fn translate(event: CrosstermEvent) -> Option<Event> {
    match event {
        CrosstermEvent::Key(key) if key.kind != KeyEventKind::Release => Some(Event::Key(key)),
        CrosstermEvent::Resize(w, h) => Some(Event::Resize(w, h)),
        _ => None,
    }
}

pub struct EventHandler {
    events: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    /// Start the input thread. `poll_interval` bounds how long it takes to
    /// notice the handler was dropped.
    pub fn new(poll_interval: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        thread::spawn(move || read_loop(tx, poll_interval));
        Self { events: rx }
    }

    /// Next input event; `None` once the input thread has stopped.
    pub async fn next(&mut self) -> Option<Event> {
        self.events.recv().await
    }
}

fn read_loop(tx: mpsc::UnboundedSender<Event>, poll_interval: Duration) {
    while !tx.is_closed() {
        match event::poll(poll_interval) {
            Ok(false) => continue,
            Ok(true) => {}
            Err(err) => {
                error!(%err, "failed to poll terminal input");
                return;
            }
        }
        match event::read() {
            Ok(raw) => {
                if let Some(event) = translate(raw) {
                    if tx.send(event).is_err() {
                        break;
                    }
                }
            }
            Err(err) => {
                error!(%err, "failed to read terminal input");
                return;
            }
        }
    }
    debug!("input thread stopped");
}
