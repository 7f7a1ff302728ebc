//! Live view behaviour under a paused clock.

mod support;

use std::sync::Arc;
use std::time::Duration;

use proxywatch_live::{LiveError, LiveFilter, LiveOptions, Location, PollState, ScheduleConfig};
use proxywatch_protocol::QueryResult;
use support::{facet, ScriptedFetcher};
use tokio::time::{sleep, Instant};

const DEBOUNCE: Duration = Duration::from_millis(500);
const CADENCE: Duration = Duration::from_secs(2);

fn options(location: &str) -> LiveOptions {
    LiveOptions::new(
        "/history",
        Location::parse(location).unwrap(),
        ScheduleConfig {
            debounce: DEBOUNCE,
            cadence: CADENCE,
        },
    )
}

fn mount(fetcher: &ScriptedFetcher, location: &str) -> LiveFilter<String> {
    LiveFilter::mount(Arc::new(fetcher.clone()), options(location))
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_edits_yields_one_fetch() {
    let fetcher = ScriptedFetcher::new().with_latency(Duration::from_millis(10));
    let view = mount(&fetcher, "/history");

    for value in ["S", "St", "Sta", "Stat"] {
        view.set_filter(value);
        sleep(Duration::from_millis(100)).await;
    }
    sleep(Duration::from_millis(700)).await;

    assert_eq!(fetcher.filters(), ["Stat"]);
    let calls = fetcher.calls();
    assert_eq!(
        calls[0].params,
        vec![("filter".to_string(), "Stat".to_string())]
    );

    let snapshot = view.snapshot();
    assert_eq!(snapshot.sink.records(), ["Stat".to_string()]);
    assert_eq!(snapshot.location, "/history?filter=Stat");
}

#[tokio::test(start_paused = true)]
async fn test_mount_polls_once_then_follows_cadence() {
    let fetcher = ScriptedFetcher::new().with_latency(Duration::from_millis(10));
    let start = Instant::now();
    let view = mount(&fetcher, "/history?filter=Method%3AGET");

    sleep(Duration::from_millis(5000)).await;

    let calls = fetcher.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().all(|c| c.filter == "Method:GET"));
    assert!(calls[0].at - start >= DEBOUNCE);
    assert!(calls[1].at - calls[0].at >= CADENCE);
    assert!(calls[2].at - calls[1].at >= CADENCE);
    assert_eq!(view.snapshot().sink.applied(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_facets_with_one_entry_are_not_rendered() {
    let fetcher = ScriptedFetcher::new().with_facets(vec![
        facet("Country", &[("DE", "12", "Country:DE")]),
        facet(
            "Status",
            &[("404", "17", "StatusCode:404"), ("200", "9", "StatusCode:200")],
        ),
        facet("Empty", &[]),
    ]);
    let view = mount(&fetcher, "/history");

    sleep(Duration::from_millis(600)).await;

    let snapshot = view.snapshot();
    assert_eq!(snapshot.sink.facets().len(), 3);
    let names: Vec<_> = snapshot.facets.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["Status"]);
}

#[tokio::test(start_paused = true)]
async fn test_pause_then_resume_polls_once_immediately() {
    let fetcher = ScriptedFetcher::new().with_latency(Duration::from_millis(10));
    let view = mount(&fetcher, "/history");

    sleep(Duration::from_millis(1000)).await;
    assert_eq!(fetcher.calls().len(), 1);

    view.pause();
    sleep(Duration::from_secs(10)).await;
    assert_eq!(fetcher.calls().len(), 1, "no polls while paused");
    assert_eq!(view.snapshot().state, PollState::Paused);

    let resumed_at = Instant::now();
    view.resume();
    sleep(Duration::from_millis(100)).await;
    let calls = fetcher.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[1].at - resumed_at < DEBOUNCE, "resume skips the debounce");

    sleep(Duration::from_millis(2500)).await;
    let calls = fetcher.calls();
    assert_eq!(calls.len(), 3, "cadence resumes after the immediate poll");
    assert!(calls[2].at - calls[1].at >= CADENCE);
}

#[tokio::test(start_paused = true)]
async fn test_result_arriving_while_paused_is_discarded() {
    let fetcher = ScriptedFetcher::new().with_latency(Duration::from_secs(1));
    let view = mount(&fetcher, "/history");

    sleep(Duration::from_millis(700)).await;
    assert_eq!(fetcher.calls().len(), 1);
    view.pause();

    sleep(Duration::from_secs(5)).await;
    let snapshot = view.snapshot();
    assert_eq!(snapshot.sink.applied(), 0);
    assert!(!snapshot.sink.has_result());
    assert_eq!(snapshot.state, PollState::Paused);
}

#[tokio::test(start_paused = true)]
async fn test_superseded_response_is_never_applied() {
    let fetcher = ScriptedFetcher::new().with_latency(Duration::from_secs(1));
    let view = mount(&fetcher, "/history?filter=a");

    // "a" goes out at 500ms and answers at 1500ms.
    sleep(Duration::from_millis(700)).await;
    view.set_filter("b");

    sleep(Duration::from_millis(1000)).await;
    let snapshot = view.snapshot();
    assert_eq!(snapshot.sink.applied(), 0, "response for \"a\" dropped");

    sleep(Duration::from_millis(1000)).await;
    let snapshot = view.snapshot();
    assert_eq!(fetcher.filters(), ["a", "b"]);
    assert_eq!(snapshot.sink.applied(), 1);
    assert_eq!(snapshot.sink.records(), ["b".to_string()]);

    let calls = fetcher.calls();
    assert!(
        calls[1].at - calls[0].at <= Duration::from_millis(1001),
        "queued poll goes out as soon as the stale response is handled"
    );
}

#[tokio::test(start_paused = true)]
async fn test_never_more_than_one_request_in_flight() {
    let fetcher = ScriptedFetcher::new().with_latency(Duration::from_secs(2));
    let view = mount(&fetcher, "/history");

    for value in ["a", "b", "c", "d"] {
        sleep(Duration::from_millis(600)).await;
        view.set_filter(value);
    }
    sleep(Duration::from_secs(6)).await;

    assert_eq!(fetcher.max_in_flight(), 1);
    let snapshot = view.snapshot();
    assert_eq!(snapshot.sink.records(), ["d".to_string()]);
    assert_eq!(fetcher.filters().last().map(String::as_str), Some("d"));
}

#[tokio::test(start_paused = true)]
async fn test_unmount_cancels_pending_timer() {
    let fetcher = ScriptedFetcher::new();
    let view = mount(&fetcher, "/history");

    sleep(Duration::from_millis(100)).await;
    view.unmount().await;

    sleep(Duration::from_secs(30)).await;
    assert!(fetcher.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_dropping_the_handle_cancels_polling() {
    let fetcher = ScriptedFetcher::new().with_latency(Duration::from_millis(10));
    let view = mount(&fetcher, "/history");

    sleep(Duration::from_millis(1000)).await;
    assert_eq!(fetcher.calls().len(), 1);
    drop(view);

    sleep(Duration::from_secs(30)).await;
    assert_eq!(fetcher.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_total_without_records() {
    let fetcher = ScriptedFetcher::new().respond_with(QueryResult::new(42, Vec::new()));
    let view = mount(&fetcher, "/history");

    assert_eq!(view.snapshot().sink.total_label(), None);
    sleep(Duration::from_millis(600)).await;

    let snapshot = view.snapshot();
    assert_eq!(snapshot.sink.total_label().as_deref(), Some("42 total"));
    assert!(snapshot.sink.records().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_drill_down_replaces_filter() {
    let fetcher = ScriptedFetcher::new().with_facets(vec![facet(
        "Status",
        &[("404", "17", "StatusCode:404"), ("200", "9", "StatusCode:200")],
    )]);
    let view = mount(&fetcher, "/history?filter=Method%3AGET");

    sleep(Duration::from_millis(600)).await;
    let snapshot = view.snapshot();
    let link = snapshot.facets[0].entries[0]
        .link
        .clone()
        .expect("404 entry is a link");

    view.activate(&link);
    sleep(Duration::from_millis(10)).await;

    let snapshot = view.snapshot();
    assert_eq!(snapshot.filter, "StatusCode:404");
    assert_eq!(snapshot.location, "/history?filter=StatusCode%3A404");

    sleep(Duration::from_millis(600)).await;
    assert_eq!(fetcher.filters(), ["Method:GET", "StatusCode:404"]);
}

#[tokio::test(start_paused = true)]
async fn test_failure_halts_polling_until_next_edit() {
    let fetcher = ScriptedFetcher::new().with_latency(Duration::from_millis(10));
    fetcher.fail_next(LiveError::application(400, "unexpected token ':' at 7"));
    let view = mount(&fetcher, "/history?filter=Status%3A%3A");

    sleep(Duration::from_millis(1000)).await;
    let snapshot = view.snapshot();
    assert_eq!(snapshot.failure.as_deref(), Some("unexpected token ':' at 7"));
    assert_eq!(
        snapshot.state,
        PollState::Failed("unexpected token ':' at 7".to_string())
    );

    sleep(Duration::from_secs(20)).await;
    assert_eq!(fetcher.calls().len(), 1, "no automatic retry");

    view.set_filter("StatusCode:200");
    sleep(Duration::from_millis(1)).await;
    let snapshot = view.snapshot();
    assert_eq!(snapshot.failure, None, "cleared as soon as a poll is requested");
    assert_eq!(snapshot.state, PollState::Scheduled);

    sleep(Duration::from_millis(600)).await;
    let snapshot = view.snapshot();
    assert_eq!(fetcher.calls().len(), 2);
    assert_eq!(snapshot.sink.applied(), 1);
    assert_eq!(snapshot.failure, None);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_recovers_after_transport_failure() {
    let fetcher = ScriptedFetcher::new().with_latency(Duration::from_millis(10));
    fetcher.fail_next(LiveError::transport("connection refused"));
    let view = mount(&fetcher, "/history");

    sleep(Duration::from_millis(1000)).await;
    assert_eq!(view.snapshot().failure.as_deref(), Some("connection refused"));

    view.refresh();
    sleep(Duration::from_millis(600)).await;
    let snapshot = view.snapshot();
    assert_eq!(snapshot.failure, None);
    assert_eq!(snapshot.sink.applied(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_resume_poll_survives_failing_request() {
    let fetcher = ScriptedFetcher::new().with_latency(Duration::from_secs(1));
    fetcher.fail_next(LiveError::transport("connection reset"));
    let view = mount(&fetcher, "/history");

    // Out at 500ms, answers with a failure at 1500ms.
    sleep(Duration::from_millis(700)).await;
    view.pause();
    sleep(Duration::from_millis(100)).await;
    view.resume();

    sleep(Duration::from_millis(800)).await;
    let calls = fetcher.calls();
    assert_eq!(calls.len(), 2, "resume polls once the failed request is handled");
    let snapshot = view.snapshot();
    assert_eq!(snapshot.failure.as_deref(), Some("connection reset"));
    assert_eq!(snapshot.state, PollState::InFlight);

    sleep(Duration::from_millis(1100)).await;
    let snapshot = view.snapshot();
    assert_eq!(snapshot.sink.applied(), 1);
    assert_eq!(snapshot.failure, None);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_during_failing_request_still_polls() {
    let fetcher = ScriptedFetcher::new().with_latency(Duration::from_secs(1));
    fetcher.fail_next(LiveError::transport("connection reset"));
    let view = mount(&fetcher, "/history");

    // Refresh at 1300ms debounces to 1800ms, after the failure at 1500ms.
    sleep(Duration::from_millis(1300)).await;
    view.refresh();

    sleep(Duration::from_millis(300)).await;
    let snapshot = view.snapshot();
    assert_eq!(snapshot.failure.as_deref(), Some("connection reset"));
    assert_eq!(snapshot.state, PollState::Scheduled);

    sleep(Duration::from_millis(1500)).await;
    let calls = fetcher.calls();
    assert_eq!(calls.len(), 2, "refresh is not cancelled by the failure");
    assert_eq!(view.snapshot().sink.applied(), 1);
    assert_eq!(view.snapshot().failure, None);
}

#[tokio::test(start_paused = true)]
async fn test_changed_wakes_on_applied_result() {
    let fetcher = ScriptedFetcher::new().with_latency(Duration::from_millis(10));
    let mut view = mount(&fetcher, "/history");

    let start = Instant::now();
    while view.snapshot().sink.applied() == 0 {
        assert!(view.changed().await, "driver is running");
    }
    assert!(Instant::now() - start >= DEBOUNCE);
    assert_eq!(view.snapshot().sink.records(), ["".to_string()]);
}
