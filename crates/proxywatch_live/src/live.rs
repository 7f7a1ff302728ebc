//! The live view: one driver task per mounted page.
//!
//! [`LiveFilter`] is a cheap handle. All state lives in a driver task that
//! handles one event at a time, selecting over presentation commands, the
//! scheduler's timer and the single in-flight request. Each handled event
//! publishes a fresh [`LiveSnapshot`] on a watch channel.

use std::future::{self, Future};
use std::pin::Pin;
use std::sync::Arc;

use proxywatch_protocol::QueryResult;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{ErrorChannel, LiveError};
use crate::facets::{render_facets, DrillDown, FacetView};
use crate::fetcher::{FetchRequest, Fetcher};
use crate::location::Location;
use crate::scheduler::{Disposition, PollScheduler, PollState, RequestTag, ScheduleConfig};
use crate::sink::ResultSink;
use crate::store::QueryStateStore;

/// Everything needed to mount a view.
#[derive(Debug, Clone)]
pub struct LiveOptions {
    /// Collection endpoint, e.g. `/history`.
    pub endpoint: String,
    /// Initial page location; its `filter` parameter seeds the store.
    pub location: Location,
    pub schedule: ScheduleConfig,
}

impl LiveOptions {
    pub fn new(endpoint: impl Into<String>, location: Location, schedule: ScheduleConfig) -> Self {
        Self {
            endpoint: endpoint.into(),
            location,
            schedule,
        }
    }
}

/// Point-in-time view state for rendering.
#[derive(Debug, Clone)]
pub struct LiveSnapshot<T> {
    /// Canonical page location, e.g. `/history?filter=StatusCode%3A404`.
    pub location: String,
    pub filter: String,
    pub state: PollState,
    pub paused: bool,
    pub failure: Option<String>,
    pub sink: ResultSink<T>,
    pub facets: Vec<FacetView>,
}

#[derive(Debug)]
enum Command {
    SetFilter(String),
    Refresh,
    Pause,
    Resume,
    TogglePause,
    Shutdown,
}

/// Handle to a mounted live view. Dropping it tears the view down.
pub struct LiveFilter<T> {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<LiveSnapshot<T>>,
    task: Option<JoinHandle<()>>,
}

impl<T> LiveFilter<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Mount a view and request its first poll. Must be called from within
    /// a Tokio runtime.
    pub fn mount<F>(fetcher: Arc<F>, options: LiveOptions) -> Self
    where
        F: Fetcher<T>,
    {
        let store = QueryStateStore::new(options.location);
        let scheduler = PollScheduler::new(options.schedule);
        let sink = ResultSink::new();
        let errors = ErrorChannel::default();

        let initial = snapshot_of(&store, &scheduler, &sink, &errors);
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        info!(endpoint = %options.endpoint, location = %store.location(), "mounting live view");
        let driver = Driver {
            fetcher,
            endpoint: options.endpoint,
            store,
            scheduler,
            sink,
            errors,
            snapshots: snapshot_tx,
        };
        let task = tokio::spawn(driver.run(command_rx));

        Self {
            commands: command_tx,
            snapshots: snapshot_rx,
            task: Some(task),
        }
    }

    /// Replace the filter expression. Rapid calls collapse into one request.
    pub fn set_filter(&self, value: impl Into<String>) {
        self.send(Command::SetFilter(value.into()));
    }

    /// Follow a facet link.
    pub fn activate(&self, link: &DrillDown) {
        self.send(Command::SetFilter(link.filter.clone()));
    }

    /// Request a poll with the current filter, e.g. after a failure.
    pub fn refresh(&self) {
        self.send(Command::Refresh);
    }

    pub fn pause(&self) {
        self.send(Command::Pause);
    }

    pub fn resume(&self) {
        self.send(Command::Resume);
    }

    pub fn toggle_pause(&self) {
        self.send(Command::TogglePause);
    }

    pub fn snapshot(&self) -> LiveSnapshot<T> {
        self.snapshots.borrow().clone()
    }

    /// Wait until a snapshot newer than the last one seen here is published.
    /// Returns `false` once the driver has stopped.
    pub async fn changed(&mut self) -> bool {
        self.snapshots.changed().await.is_ok()
    }

    /// Tear the view down and wait for the driver to stop. No request is
    /// sent and no state is applied afterwards.
    pub async fn unmount(mut self) {
        if let Some(task) = self.task.take() {
            let _ = self.commands.send(Command::Shutdown);
            if let Err(err) = task.await {
                if err.is_panic() {
                    warn!("live view driver panicked during unmount");
                }
            }
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("live view driver already stopped");
        }
    }
}

impl<T> Drop for LiveFilter<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

type Response<T> = (RequestTag, Result<QueryResult<T>, LiveError>);
type InFlight<T> = Pin<Box<dyn Future<Output = Response<T>> + Send>>;

struct Driver<T, F> {
    fetcher: Arc<F>,
    endpoint: String,
    store: QueryStateStore,
    scheduler: PollScheduler,
    sink: ResultSink<T>,
    errors: ErrorChannel,
    snapshots: watch::Sender<LiveSnapshot<T>>,
}

impl<T, F> Driver<T, F>
where
    T: Clone + Send + Sync + 'static,
    F: Fetcher<T>,
{
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let mut in_flight: Option<InFlight<T>> = None;
        self.scheduler.request_poll();
        self.publish();

        loop {
            tokio::select! {
                biased;

                command = commands.recv() => {
                    let command = match command {
                        Some(Command::Shutdown) | None => break,
                        Some(command) => command,
                    };
                    if self.handle_command(command) {
                        in_flight = Some(self.start_fetch());
                    }
                }

                kind = self.scheduler.timer_mut().fired() => {
                    if self.scheduler.on_timer_fired(kind) {
                        in_flight = Some(self.start_fetch());
                    }
                }

                (tag, outcome) = next_response(&mut in_flight) => {
                    in_flight = None;
                    if self.handle_response(tag, outcome) {
                        in_flight = Some(self.start_fetch());
                    }
                }
            }
            self.publish();
        }

        self.scheduler.shutdown();
        drop(in_flight);
        self.publish();
        info!(endpoint = %self.endpoint, "live view unmounted");
    }

    /// Returns whether a request should be sent right away.
    fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::SetFilter(value) => {
                if self.store.set_filter(&value) {
                    debug!(filter = %value, "filter changed");
                    self.trigger_poll();
                }
                false
            }
            Command::Refresh => {
                self.trigger_poll();
                false
            }
            Command::Pause => {
                self.pause();
                false
            }
            Command::Resume => self.resume(),
            Command::TogglePause => {
                if self.scheduler.is_paused() {
                    self.resume()
                } else {
                    self.pause();
                    false
                }
            }
            Command::Shutdown => false,
        }
    }

    fn trigger_poll(&mut self) {
        if self.scheduler.request_poll() {
            self.errors.clear();
        }
    }

    fn pause(&mut self) {
        debug!(endpoint = %self.endpoint, "paused");
        self.scheduler.pause();
    }

    fn resume(&mut self) -> bool {
        if !self.scheduler.is_paused() {
            return false;
        }
        debug!(endpoint = %self.endpoint, "resumed");
        self.errors.clear();
        self.scheduler.resume()
    }

    fn start_fetch(&mut self) -> InFlight<T> {
        let tag = self.scheduler.begin_fetch(self.store.filter());
        let request = FetchRequest {
            endpoint: self.endpoint.clone(),
            params: self.store.query_pairs(),
            tag,
        };
        let fetcher = Arc::clone(&self.fetcher);
        Box::pin(async move {
            let outcome = fetcher.fetch(&request).await;
            (request.tag, outcome)
        })
    }

    /// Returns whether a request should be sent right away.
    fn handle_response(&mut self, tag: RequestTag, outcome: Result<QueryResult<T>, LiveError>) -> bool {
        let step = {
            let current = self.store.filter();
            let verdict = outcome.as_ref().map(|_| ()).map_err(LiveError::message);
            self.scheduler.on_response(&tag, current, verdict)
        };

        match (step.disposition, outcome) {
            (Disposition::Apply, Ok(result)) => {
                debug!(seq = tag.seq, total = result.total, "result applied");
                self.errors.clear();
                self.sink.on_result(result);
            }
            (Disposition::Fail, Err(err)) => {
                let halted = !self.scheduler.has_pending_poll() && !step.fetch_now;
                warn!(endpoint = %self.endpoint, filter = %tag.filter, error = %err, halted, "fetch failed");
                self.errors.raise(err);
            }
            (disposition, _) => {
                debug!(seq = tag.seq, filter = %tag.filter, ?disposition, "response discarded");
            }
        }
        step.fetch_now
    }

    fn publish(&self) {
        let snapshot = snapshot_of(&self.store, &self.scheduler, &self.sink, &self.errors);
        self.snapshots.send_replace(snapshot);
    }
}

fn snapshot_of<T: Clone>(
    store: &QueryStateStore,
    scheduler: &PollScheduler,
    sink: &ResultSink<T>,
    errors: &ErrorChannel,
) -> LiveSnapshot<T> {
    LiveSnapshot {
        location: store.location().to_string(),
        filter: store.filter().to_string(),
        state: scheduler.state().clone(),
        paused: scheduler.is_paused(),
        failure: errors.message().map(str::to_string),
        sink: sink.clone(),
        facets: render_facets(sink.facets()),
    }
}

async fn next_response<T>(in_flight: &mut Option<InFlight<T>>) -> Response<T> {
    match in_flight {
        Some(request) => request.await,
        None => future::pending().await,
    }
}
