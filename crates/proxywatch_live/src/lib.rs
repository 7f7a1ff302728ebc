//! Live filtered queries against the dashboard's collection endpoints.
//!
//! A [`LiveFilter`] is mounted per page. It owns:
//! - a [`QueryStateStore`] holding the filter expression inside the page
//!   location (`/history?filter=...`),
//! - a [`PollScheduler`] deciding when the next request goes out,
//! - a [`ResultSink`] with the last applied result,
//! - an [`ErrorChannel`] with the last failure,
//!
//! and drives them from a single task so that at most one request per page
//! is ever in flight. Responses are tagged with the filter they were sent
//! for and dropped on arrival if the filter has changed since.

pub mod error;
pub mod facets;
pub mod fetcher;
pub mod live;
pub mod location;
pub mod scheduler;
pub mod sink;
pub mod store;
pub mod timer;

pub use error::{ErrorChannel, LiveError};
pub use facets::{render_facets, DrillDown, EntryView, FacetView};
pub use fetcher::{FetchRequest, Fetcher, HttpFetcher};
pub use live::{LiveFilter, LiveOptions, LiveSnapshot};
pub use location::{Location, LocationError};
pub use scheduler::{Disposition, PollScheduler, PollState, RequestTag, ResponseStep, ScheduleConfig};
pub use sink::ResultSink;
pub use store::QueryStateStore;
pub use timer::{TimerKind, TimerSlot};
