//! The single timer owned by a poll scheduler.

use std::future;
use std::pin::Pin;
use std::time::Duration;
use tokio::time::{sleep, Sleep};

/// What an armed timer is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Quiet period after a poll request.
    Debounce,
    /// Pause between a completed response and the next poll.
    Cadence,
}

/// Holds at most one pending deadline. Arming replaces whatever was pending;
/// dropping the slot cancels it.
#[derive(Debug, Default)]
pub struct TimerSlot {
    armed: Option<(TimerKind, Pin<Box<Sleep>>)>,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Must be called from within a Tokio runtime.
    pub fn arm(&mut self, kind: TimerKind, after: Duration) {
        self.armed = Some((kind, Box::pin(sleep(after))));
    }

    /// Cancel the pending deadline. Returns whether one was pending.
    pub fn clear(&mut self) -> bool {
        self.armed.take().is_some()
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn kind(&self) -> Option<TimerKind> {
        self.armed.as_ref().map(|(kind, _)| *kind)
    }

    /// Resolves when the armed deadline passes and disarms the slot. Never
    /// resolves while unarmed. Cancel safe: dropping the future keeps the
    /// deadline in place.
    pub async fn fired(&mut self) -> TimerKind {
        let Some((kind, sleep)) = self.armed.as_mut() else {
            return future::pending().await;
        };
        sleep.as_mut().await;
        let kind = *kind;
        self.armed = None;
        kind
    }
}
