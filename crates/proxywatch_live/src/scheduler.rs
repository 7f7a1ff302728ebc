//! Poll Scheduler: decides when the next collection request goes out.
//!
//! The scheduler is a plain state machine. It owns the view's only timer and
//! the tag of the request currently in flight, but it never performs I/O;
//! the live view driver asks it what to do at each event and reports back.
//!
//! ```text
//! Idle --request_poll--> Scheduled --timer--> InFlight --ok--> Scheduled (cadence)
//!                            ^                    |
//!                            |                    +--err--> Failed (halted)
//!                            +----request_poll/resume-------------+
//! ```

use std::time::Duration;

use proxywatch_protocol::defaults::DEFAULT_DEBOUNCE_MS;
use tracing::debug;

use crate::timer::{TimerKind, TimerSlot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Quiet period before an externally requested poll is sent.
    pub debounce: Duration,
    /// Delay from a successful response to the next automatic poll.
    pub cadence: Duration,
}

impl ScheduleConfig {
    pub fn with_cadence(cadence: Duration) -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            cadence,
        }
    }
}

/// Externally visible state of one view's polling loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Scheduled,
    InFlight,
    Paused,
    /// Automatic polling halted; carries the failure message.
    Failed(String),
}

impl PollState {
    pub fn label(&self) -> &'static str {
        match self {
            PollState::Idle => "idle",
            PollState::Scheduled => "scheduled",
            PollState::InFlight => "loading",
            PollState::Paused => "paused",
            PollState::Failed(_) => "failed",
        }
    }
}

/// Identifies an outgoing request: a sequence number plus the filter
/// expression that was active when it was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTag {
    pub seq: u64,
    pub filter: String,
}

/// What to do with a response that just arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Hand the result to the sink.
    Apply,
    /// Surface the failure; polling has halted.
    Fail,
    /// The filter changed while the request was out.
    DiscardStale,
    /// The view was paused while the request was out.
    DiscardPaused,
    /// The view is being torn down.
    DiscardTornDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseStep {
    pub disposition: Disposition,
    /// Send the next request right away (a poll was queued behind this one).
    pub fetch_now: bool,
}

#[derive(Debug)]
pub struct PollScheduler {
    config: ScheduleConfig,
    state: PollState,
    timer: TimerSlot,
    in_flight: Option<RequestTag>,
    /// A poll came due while a request was still out.
    queued: bool,
    paused: bool,
    torn_down: bool,
    next_seq: u64,
}

impl PollScheduler {
    pub fn new(config: ScheduleConfig) -> Self {
        Self {
            config,
            state: PollState::Idle,
            timer: TimerSlot::new(),
            in_flight: None,
            queued: false,
            paused: false,
            torn_down: false,
            next_seq: 0,
        }
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    pub fn in_flight(&self) -> Option<&RequestTag> {
        self.in_flight.as_ref()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn timer(&self) -> &TimerSlot {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut TimerSlot {
        &mut self.timer
    }

    /// A poll was requested from outside (mount, filter edit). Arms or resets
    /// the debounce timer and clears a previous failure. Ignored while
    /// paused; the edit is picked up on resume.
    pub fn request_poll(&mut self) -> bool {
        if self.torn_down || self.paused {
            return false;
        }
        self.timer.arm(TimerKind::Debounce, self.config.debounce);
        if self.in_flight.is_none() {
            self.state = PollState::Scheduled;
        }
        true
    }

    /// The timer fired. Returns whether a request should be sent now; if one
    /// is already in flight the poll is queued behind it instead.
    pub fn on_timer_fired(&mut self, kind: TimerKind) -> bool {
        if self.torn_down || self.paused {
            return false;
        }
        if self.in_flight.is_some() {
            debug!(?kind, "poll due while a request is in flight; queued");
            self.queued = true;
            return false;
        }
        true
    }

    /// Record that a request for `filter` is being sent.
    pub fn begin_fetch(&mut self, filter: &str) -> RequestTag {
        self.timer.clear();
        self.queued = false;
        self.next_seq += 1;
        let tag = RequestTag {
            seq: self.next_seq,
            filter: filter.to_string(),
        };
        self.in_flight = Some(tag.clone());
        if !self.paused {
            self.state = PollState::InFlight;
        }
        tag
    }

    /// A response for `tag` arrived. `current_filter` is the filter active
    /// now; `outcome` carries the failure message, if any.
    pub fn on_response(
        &mut self,
        tag: &RequestTag,
        current_filter: &str,
        outcome: Result<(), &str>,
    ) -> ResponseStep {
        if self.in_flight.as_ref() != Some(tag) {
            return ResponseStep {
                disposition: Disposition::DiscardStale,
                fetch_now: false,
            };
        }
        self.in_flight = None;

        if self.torn_down {
            return ResponseStep {
                disposition: Disposition::DiscardTornDown,
                fetch_now: false,
            };
        }
        if self.paused {
            return ResponseStep {
                disposition: Disposition::DiscardPaused,
                fetch_now: false,
            };
        }

        let queued = std::mem::take(&mut self.queued);

        if tag.filter != current_filter {
            // Every filter edit arms the timer or queues a poll, so one of
            // the two is normally pending; fall back to fetching right away.
            let fetch_now = queued || !self.timer.is_armed();
            self.state = PollState::Scheduled;
            return ResponseStep {
                disposition: Disposition::DiscardStale,
                fetch_now,
            };
        }

        match outcome {
            Ok(()) => {
                if !self.timer.is_armed() {
                    self.timer.arm(TimerKind::Cadence, self.config.cadence);
                }
                self.state = PollState::Scheduled;
                ResponseStep {
                    disposition: Disposition::Apply,
                    fetch_now: queued,
                }
            }
            Err(message) => {
                // A poll requested while this one was out still goes ahead.
                let requested = self.timer.kind() == Some(TimerKind::Debounce);
                if queued || requested {
                    debug!(queued, "failure with a poll pending; not halting");
                    self.state = PollState::Scheduled;
                } else {
                    self.timer.clear();
                    self.state = PollState::Failed(message.to_string());
                }
                ResponseStep {
                    disposition: Disposition::Fail,
                    fetch_now: queued,
                }
            }
        }
    }

    /// Whether a poll is due or waiting behind the request in flight.
    pub fn has_pending_poll(&self) -> bool {
        self.queued || self.timer.is_armed()
    }

    /// Stop the loop. A response already in flight is discarded on arrival.
    pub fn pause(&mut self) {
        if self.torn_down {
            return;
        }
        self.paused = true;
        self.queued = false;
        self.timer.clear();
        self.state = PollState::Paused;
    }

    /// Restart the loop. Returns whether a request should be sent right now;
    /// if one from before the pause is still out, the poll is queued behind
    /// it.
    pub fn resume(&mut self) -> bool {
        if self.torn_down || !self.paused {
            return false;
        }
        self.paused = false;
        if self.in_flight.is_some() {
            self.queued = true;
            self.state = PollState::InFlight;
            false
        } else {
            self.state = PollState::Scheduled;
            true
        }
    }

    /// Tear down: clear the timer and refuse every further transition.
    pub fn shutdown(&mut self) {
        self.torn_down = true;
        self.queued = false;
        self.timer.clear();
        self.state = PollState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> PollScheduler {
        PollScheduler::new(ScheduleConfig {
            debounce: Duration::from_millis(500),
            cadence: Duration::from_secs(2),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_poll_arms_debounce() {
        let mut s = scheduler();
        assert_eq!(s.state(), &PollState::Idle);

        assert!(s.request_poll());
        assert_eq!(s.state(), &PollState::Scheduled);
        assert_eq!(s.timer().kind(), Some(TimerKind::Debounce));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_arms_cadence() {
        let mut s = scheduler();
        s.request_poll();
        let kind = s.timer_mut().fired().await;
        assert!(s.on_timer_fired(kind));

        let tag = s.begin_fetch("");
        assert_eq!(s.state(), &PollState::InFlight);
        assert!(!s.timer().is_armed());

        let step = s.on_response(&tag, "", Ok(()));
        assert_eq!(step.disposition, Disposition::Apply);
        assert!(!step.fetch_now);
        assert_eq!(s.state(), &PollState::Scheduled);
        assert_eq!(s.timer().kind(), Some(TimerKind::Cadence));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_halts_until_next_request() {
        let mut s = scheduler();
        let tag = s.begin_fetch("x");
        let step = s.on_response(&tag, "x", Err("no ID found"));

        assert_eq!(step.disposition, Disposition::Fail);
        assert_eq!(s.state(), &PollState::Failed("no ID found".to_string()));
        assert!(!s.timer().is_armed());

        assert!(s.request_poll());
        assert_eq!(s.state(), &PollState::Scheduled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_during_flight_is_queued() {
        let mut s = scheduler();
        let tag = s.begin_fetch("a");

        s.request_poll();
        let kind = s.timer_mut().fired().await;
        assert!(!s.on_timer_fired(kind));

        let step = s.on_response(&tag, "a", Ok(()));
        assert_eq!(step.disposition, Disposition::Apply);
        assert!(step.fetch_now);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_is_discarded() {
        let mut s = scheduler();
        let tag = s.begin_fetch("a");
        s.request_poll();

        let step = s.on_response(&tag, "b", Ok(()));
        assert_eq!(step.disposition, Disposition::DiscardStale);
        assert!(!step.fetch_now, "debounce timer is still pending");
        assert_eq!(s.timer().kind(), Some(TimerKind::Debounce));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_failure_does_not_halt() {
        let mut s = scheduler();
        let tag = s.begin_fetch("a");
        s.request_poll();

        let step = s.on_response(&tag, "b", Err("parse error"));
        assert_eq!(step.disposition, Disposition::DiscardStale);
        assert_eq!(s.state(), &PollState::Scheduled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_discards_in_flight_result() {
        let mut s = scheduler();
        let tag = s.begin_fetch("");
        s.pause();
        assert_eq!(s.state(), &PollState::Paused);

        let step = s.on_response(&tag, "", Ok(()));
        assert_eq!(step.disposition, Disposition::DiscardPaused);
        assert!(!s.timer().is_armed());
        assert_eq!(s.state(), &PollState::Paused);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_poll_ignored_while_paused() {
        let mut s = scheduler();
        s.pause();
        assert!(!s.request_poll());
        assert!(!s.timer().is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_fetches_immediately() {
        let mut s = scheduler();
        s.pause();
        assert!(s.resume());
        assert_eq!(s.state(), &PollState::Scheduled);
        assert!(!s.resume(), "second resume is a no-op");
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_with_request_out_queues() {
        let mut s = scheduler();
        let tag = s.begin_fetch("");
        s.pause();
        assert!(!s.resume());

        let step = s.on_response(&tag, "", Ok(()));
        assert_eq!(step.disposition, Disposition::Apply);
        assert!(step.fetch_now);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_poll_queued_by_resume() {
        let mut s = scheduler();
        let tag = s.begin_fetch("");
        s.pause();
        assert!(!s.resume());

        let step = s.on_response(&tag, "", Err("connection reset"));
        assert_eq!(step.disposition, Disposition::Fail);
        assert!(step.fetch_now);
        assert_eq!(s.state(), &PollState::Scheduled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_debounced_request() {
        let mut s = scheduler();
        let tag = s.begin_fetch("");
        assert!(s.request_poll());

        let step = s.on_response(&tag, "", Err("connection reset"));
        assert_eq!(step.disposition, Disposition::Fail);
        assert!(!step.fetch_now);
        assert!(s.has_pending_poll());
        assert_eq!(s.timer().kind(), Some(TimerKind::Debounce));
        assert_eq!(s.state(), &PollState::Scheduled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_clears_timer() {
        let mut s = scheduler();
        s.request_poll();
        s.shutdown();
        assert!(!s.timer().is_armed());
        assert!(!s.request_poll());
        assert!(!s.on_timer_fired(TimerKind::Debounce));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequence_numbers_increase() {
        let mut s = scheduler();
        let first = s.begin_fetch("a");
        s.on_response(&first, "a", Ok(()));
        let second = s.begin_fetch("a");
        assert!(second.seq > first.seq);
    }
}
