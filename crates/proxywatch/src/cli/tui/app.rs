//! Application state for the TUI

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use proxywatch_live::{DrillDown, HttpFetcher, LiveFilter, LiveOptions, Location, ScheduleConfig};
use proxywatch_protocol::defaults::FILTER_KEY;
use proxywatch_protocol::{BlacklistRecord, HistoryRecord, Page, PoolRecord, ProxywatchConfig, ReverifyRecord};
use tracing::debug;

/// The mounted live view of the current page, one variant per record type.
pub enum PageView {
    History(LiveFilter<HistoryRecord>),
    Pool(LiveFilter<PoolRecord>),
    Blacklist(LiveFilter<BlacklistRecord>),
    Reverify(LiveFilter<ReverifyRecord>),
}

macro_rules! with_live {
    ($view:expr, $live:ident => $body:expr) => {
        match $view {
            PageView::History($live) => $body,
            PageView::Pool($live) => $body,
            PageView::Blacklist($live) => $body,
            PageView::Reverify($live) => $body,
        }
    };
}

impl PageView {
    fn mount(page: Page, location: Location, fetcher: &Arc<HttpFetcher>, config: &ProxywatchConfig) -> Self {
        let schedule = ScheduleConfig {
            debounce: config.debounce(),
            cadence: config.cadence_for(page),
        };
        let options = LiveOptions::new(page.endpoint(), location, schedule);
        let fetcher = Arc::clone(fetcher);
        match page {
            Page::History => PageView::History(LiveFilter::mount(fetcher, options)),
            Page::Pool => PageView::Pool(LiveFilter::mount(fetcher, options)),
            Page::Blacklist => PageView::Blacklist(LiveFilter::mount(fetcher, options)),
            Page::Reverify => PageView::Reverify(LiveFilter::mount(fetcher, options)),
        }
    }

    pub fn set_filter(&self, value: &str) {
        with_live!(self, live => live.set_filter(value))
    }

    pub fn activate(&self, link: &DrillDown) {
        with_live!(self, live => live.activate(link))
    }

    pub fn toggle_pause(&self) {
        with_live!(self, live => live.toggle_pause())
    }

    pub fn refresh(&self) {
        with_live!(self, live => live.refresh())
    }

    /// Drill-down links of the current result, in display order.
    pub fn links(&self) -> Vec<DrillDown> {
        with_live!(self, live => {
            live.snapshot()
                .facets
                .iter()
                .flat_map(|facet| facet.links().cloned())
                .collect()
        })
    }

    /// Resolves when the view publishes a new snapshot; pends forever once
    /// the view has stopped.
    pub async fn changed(&mut self) {
        let live = with_live!(self, live => live.changed().await);
        if !live {
            std::future::pending::<()>().await;
        }
    }

    pub fn location(&self) -> String {
        with_live!(self, live => live.snapshot().location)
    }
}

/// Main application state
pub struct App {
    /// Whether the app should keep running
    pub running: bool,
    pub page: Page,
    /// Filter text as typed; every edit is forwarded to the view.
    pub input: String,
    pub view: PageView,
    config: ProxywatchConfig,
    fetcher: Arc<HttpFetcher>,
}

impl App {
    /// Mount the first page. Must be called from within a Tokio runtime.
    pub fn new(config: ProxywatchConfig, fetcher: Arc<HttpFetcher>, page: Page, location: Location) -> Self {
        let input = location.get(FILTER_KEY).unwrap_or_default().to_string();
        let view = PageView::mount(page, location, &fetcher, &config);
        Self {
            running: true,
            page,
            input,
            view,
            config,
            fetcher,
        }
    }

    /// Unmount the current view and mount `page` with an empty filter.
    pub fn switch_page(&mut self, page: Page) {
        debug!(from = %self.page, to = %page, "switching page");
        self.page = page;
        self.input.clear();
        self.view = PageView::mount(page, Location::new(page.as_str()), &self.fetcher, &self.config);
    }

    /// Follow the `index`-th drill-down link (zero based).
    pub fn activate_link(&mut self, index: usize) -> bool {
        match self.view.links().into_iter().nth(index) {
            Some(link) => {
                self.input = link.filter.clone();
                self.view.activate(&link);
                true
            }
            None => false,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        match key.code {
            KeyCode::Esc => self.running = false,
            KeyCode::Char('c') if ctrl => self.running = false,
            KeyCode::Char('p') if ctrl => self.view.toggle_pause(),
            KeyCode::Char('r') if ctrl => self.view.refresh(),
            KeyCode::Char('u') if ctrl => {
                self.input.clear();
                self.view.set_filter("");
            }
            KeyCode::Tab => self.switch_page(self.page.next()),
            KeyCode::BackTab => self.switch_page(self.page.prev()),
            KeyCode::F(n @ 1..=9) => {
                self.activate_link(usize::from(n) - 1);
            }
            KeyCode::Char(c @ '1'..='9') if alt => {
                let index = c as usize - '1' as usize;
                self.activate_link(index);
            }
            KeyCode::Backspace => {
                if self.input.pop().is_some() {
                    self.view.set_filter(&self.input);
                }
            }
            KeyCode::Char(c) if !ctrl && !alt => {
                self.input.push(c);
                self.view.set_filter(&self.input);
            }
            _ => {}
        }
    }
}
