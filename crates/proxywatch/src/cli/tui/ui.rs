//! UI rendering for the TUI

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use chrono::Utc;
use proxywatch_live::{LiveSnapshot, PollState};
use proxywatch_protocol::Page;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs, Wrap},
};
use tracing::error;

use super::app::{App, PageView};
use crate::cli::records::RecordTable;

const MAX_FACET_ROWS: u16 = 8;
const NUMBERED_LINKS: usize = 9;
const MAX_COLUMN_WIDTH: usize = 48;

/// Draw the entire UI
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();
    match &app.view {
        PageView::History(live) => draw_live(frame, area, app.page, &app.input, &live.snapshot()),
        PageView::Pool(live) => draw_live(frame, area, app.page, &app.input, &live.snapshot()),
        PageView::Blacklist(live) => draw_live(frame, area, app.page, &app.input, &live.snapshot()),
        PageView::Reverify(live) => draw_live(frame, area, app.page, &app.input, &live.snapshot()),
    }
}

/// Draw one page from a snapshot of its live view.
pub fn draw_live<T: RecordTable>(
    frame: &mut Frame,
    area: Rect,
    page: Page,
    input: &str,
    snapshot: &LiveSnapshot<T>,
) {
    let facet_rows = if snapshot.facets.is_empty() {
        0
    } else {
        (snapshot.facets.len() as u16).min(MAX_FACET_ROWS) + 2
    };
    let failure_rows = if snapshot.failure.is_some() { 3 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),            // Page tabs + status
            Constraint::Length(3),            // Filter input
            Constraint::Length(failure_rows), // Failure banner
            Constraint::Length(facet_rows),   // Facets
            Constraint::Min(0),               // Records
            Constraint::Length(1),            // Footer
        ])
        .split(area);

    guarded(frame, chunks[0], "header", |f| draw_header(f, chunks[0], page, snapshot));
    guarded(frame, chunks[1], "filter", |f| draw_filter(f, chunks[1], input, &snapshot.location));
    if let Some(message) = &snapshot.failure {
        guarded(frame, chunks[2], "failure", |f| draw_failure(f, chunks[2], message));
    }
    if facet_rows > 0 {
        guarded(frame, chunks[3], "facets", |f| draw_facets(f, chunks[3], snapshot));
    }
    guarded(frame, chunks[4], "records", |f| draw_records(f, chunks[4], snapshot));

    let footer = Paragraph::new(
        " [Tab] Page  [type] Filter  [F1-F9] Drill down  [Ctrl+P] Pause  [Ctrl+R] Retry  [Ctrl+U] Clear  [Esc] Quit ",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[5]);
}

/// Render a panel, replacing it with a "Failed" block if rendering panics.
/// The rest of the screen is unaffected.
pub fn guarded(frame: &mut Frame, area: Rect, panel: &str, render: impl FnOnce(&mut Frame)) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| render(frame)));
    if let Err(payload) = outcome {
        let reason = panic_message(payload.as_ref());
        error!(panel, %reason, "panel rendering failed");

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(" Failed ");
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(reason)
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: true })
                .block(block),
            area,
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panel could not be rendered".to_string()
    }
}

fn draw_header<T: RecordTable>(frame: &mut Frame, area: Rect, page: Page, snapshot: &LiveSnapshot<T>) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(56)])
        .split(area);

    let selected = Page::ALL.iter().position(|p| *p == page).unwrap_or(0);
    let tabs = Tabs::new(Page::ALL.iter().map(|p| p.title()))
        .select(selected)
        .highlight_style(Style::default().fg(Color::Cyan).bold())
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(tabs, chunks[0]);

    let status = Paragraph::new(status_line(snapshot))
        .alignment(Alignment::Right)
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(status, chunks[1]);
}

fn status_line<T: RecordTable>(snapshot: &LiveSnapshot<T>) -> Line<'static> {
    let state_style = match &snapshot.state {
        PollState::Failed(_) => Style::default().fg(Color::Red),
        PollState::Paused => Style::default().fg(Color::Yellow),
        PollState::InFlight => Style::default().fg(Color::Cyan),
        PollState::Idle | PollState::Scheduled => Style::default().fg(Color::DarkGray),
    };
    let mut spans = Vec::new();
    if let Some(total) = snapshot.sink.total_label() {
        spans.push(Span::styled(total, Style::default().bold()));
        if let Some(summary) = T::summary(snapshot.sink.records()) {
            spans.push(Span::raw(format!(" · {}", summary)));
        }
        spans.push(Span::raw("  "));
    }
    spans.push(Span::styled(snapshot.state.label(), state_style));
    Line::from(spans)
}

fn draw_filter(frame: &mut Frame, area: Rect, input: &str, location: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Filter ")
        .title(Line::from(format!(" {} ", location)).right_aligned());
    let text = if input.is_empty() {
        Line::from(Span::styled("type to filter", Style::default().fg(Color::DarkGray)))
    } else {
        Line::from(input.to_string())
    };
    frame.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_failure(frame: &mut Frame, area: Rect, message: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Failed ");
    let text = Line::from(vec![
        Span::styled(message.to_string(), Style::default().fg(Color::Red)),
        Span::styled("  (edit the filter or Ctrl+R to retry)", Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_facets<T>(frame: &mut Frame, area: Rect, snapshot: &LiveSnapshot<T>) {
    let mut link_number = 0;
    let lines: Vec<Line> = snapshot
        .facets
        .iter()
        .map(|facet| {
            let mut spans = vec![Span::styled(format!("{}: ", facet.name), Style::default().bold())];
            for entry in &facet.entries {
                let text = format!("{} ({})", entry.label, entry.value);
                if entry.link.is_some() {
                    link_number += 1;
                    if link_number <= NUMBERED_LINKS {
                        spans.push(Span::styled(
                            format!("F{} ", link_number),
                            Style::default().fg(Color::DarkGray),
                        ));
                    }
                    spans.push(Span::styled(text, Style::default().fg(Color::Cyan).underlined()));
                } else {
                    spans.push(Span::raw(text));
                }
                spans.push(Span::raw("  "));
            }
            Line::from(spans)
        })
        .collect();

    let block = Block::default().borders(Borders::ALL).title(" Facets ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_records<T: RecordTable>(frame: &mut Frame, area: Rect, snapshot: &LiveSnapshot<T>) {
    let block = Block::default().borders(Borders::ALL);
    let records = snapshot.sink.records();

    if records.is_empty() {
        let text = if snapshot.sink.has_result() {
            "no matching records"
        } else {
            "loading..."
        };
        frame.render_widget(
            Paragraph::new(text)
                .style(Style::default().fg(Color::DarkGray))
                .block(block),
            area,
        );
        return;
    }

    let now = Utc::now();
    let cells: Vec<Vec<String>> = records.iter().map(|record| record.cells(now)).collect();
    let widths = column_widths(T::HEADERS, &cells);
    let header = Row::new(T::HEADERS.iter().map(|h| Cell::from(*h)))
        .style(Style::default().fg(Color::Cyan).bold());
    let rows = cells
        .into_iter()
        .map(|row| Row::new(row.into_iter().map(Cell::from)));

    frame.render_widget(Table::new(rows, widths).header(header).block(block), area);
}

/// Each column as wide as its widest cell, capped.
fn column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<Constraint> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            let widest = rows
                .iter()
                .filter_map(|row| row.get(idx))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0);
            Constraint::Length(widest.min(MAX_COLUMN_WIDTH) as u16)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proxywatch_live::{render_facets, ResultSink};
    use proxywatch_protocol::{Facet, FacetEntry, HistoryRecord, PoolRecord, QueryResult};
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Buffer;

    fn buffer_text(buffer: &Buffer) -> String {
        let width = buffer.area.width as usize;
        buffer
            .content
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn snapshot<T: Clone>(result: Option<QueryResult<T>>) -> LiveSnapshot<T> {
        let mut sink = ResultSink::new();
        if let Some(result) = result {
            sink.on_result(result);
        }
        LiveSnapshot {
            location: "/history".to_string(),
            filter: String::new(),
            state: PollState::Scheduled,
            paused: false,
            failure: None,
            facets: render_facets(sink.facets()),
            sink,
        }
    }

    fn render<T: RecordTable>(page: Page, input: &str, snapshot: &LiveSnapshot<T>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 30)).unwrap();
        terminal
            .draw(|frame| draw_live(frame, frame.area(), page, input, snapshot))
            .unwrap();
        buffer_text(terminal.backend().buffer())
    }

    #[test]
    fn test_total_shown_with_empty_body() {
        let snap = snapshot::<HistoryRecord>(Some(QueryResult::new(42, Vec::new())));
        let text = render(Page::History, "", &snap);
        assert!(text.contains("42 total"));
        assert!(text.contains("no matching records"));
    }

    #[test]
    fn test_loading_before_first_result() {
        let snap = snapshot::<HistoryRecord>(None);
        let text = render(Page::History, "", &snap);
        assert!(!text.contains("total"));
        assert!(text.contains("loading..."));
    }

    #[test]
    fn test_records_and_aggregate() {
        let records = vec![
            PoolRecord {
                proxy: "http://1.2.3.4:8080".to_string(),
                offered: 10,
                succeed: 4,
                ..Default::default()
            },
            PoolRecord {
                proxy: "socks5://5.6.7.8:1080".to_string(),
                offered: 2,
                succeed: 1,
                ..Default::default()
            },
        ];
        let snap = snapshot(Some(QueryResult::new(2, records)));
        let text = render(Page::Pool, "Offered > 1", &snap);
        assert!(text.contains("http://1.2.3.4:8080"));
        assert!(text.contains("12 offered, 5 succeeded"));
        assert!(text.contains("Offered > 1"));
        assert!(text.contains("Proxies"));
    }

    #[test]
    fn test_facets_are_numbered_links() {
        let facets = vec![
            Facet {
                name: "Status".to_string(),
                top: vec![
                    FacetEntry::new("404", "17", "StatusCode:404"),
                    FacetEntry::new("200", "9", "StatusCode:200"),
                ],
            },
            Facet {
                name: "Country".to_string(),
                top: vec![FacetEntry::new("DE", "3", "Country:DE")],
            },
        ];
        let snap = snapshot::<HistoryRecord>(Some(QueryResult::new(26, Vec::new()).with_facets(facets)));
        let text = render(Page::History, "", &snap);
        assert!(text.contains("Status:"));
        assert!(text.contains("F1 404 (17)"));
        assert!(text.contains("F2 200 (9)"));
        assert!(!text.contains("Country:"));
    }

    #[test]
    fn test_failure_banner() {
        let mut snap = snapshot::<HistoryRecord>(None);
        snap.failure = Some("unexpected token ':' at 7".to_string());
        snap.state = PollState::Failed("unexpected token ':' at 7".to_string());
        let text = render(Page::History, "Status::", &snap);
        assert!(text.contains("Failed"));
        assert!(text.contains("unexpected token ':' at 7"));
        assert!(text.contains("failed"));
    }

    #[test]
    fn test_column_widths_fit_content() {
        let rows = vec![vec!["http://1.2.3.4:8080".to_string(), "DE".to_string()]];
        assert_eq!(
            column_widths(&["Proxy", "Country"], &rows),
            vec![Constraint::Length(19), Constraint::Length(7)]
        );
    }

    #[test]
    fn test_panicking_panel_is_contained() {
        let mut terminal = Terminal::new(TestBackend::new(60, 10)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.area();
                let halves = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Length(5), Constraint::Length(5)])
                    .split(area);
                guarded(frame, halves[0], "broken", |_| panic!("column overflow"));
                guarded(frame, halves[1], "fine", |f| {
                    f.render_widget(Paragraph::new("still here"), halves[1])
                });
            })
            .unwrap();
        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("Failed"));
        assert!(text.contains("column overflow"));
        assert!(text.contains("still here"));
    }
}
