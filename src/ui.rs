//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).
//!
//! ## For contributors
//!
//! * The layout is a two-row split: the article list (or a notice when there
//!   is nothing to list) on top and a one-line status bar at the bottom.
//! * While the search prompt is open the status bar becomes the prompt.
//! * Dates arrive from the API as raw ISO-8601 strings; [`format_date`] is
//!   the only place they are turned into something readable.

use chrono::NaiveDateTime;
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Mode};

/// Input pattern of the API's `webPublicationDate`.
const API_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
/// Output pattern, e.g. `Mar 3, 2021`.
const DISPLAY_DATE_FORMAT: &str = "%b %-d, %Y";

/// Turn `2021-03-03T10:00:00Z` into `Mar 3, 2021`.
///
/// Anything that does not match the API's pattern yields an empty string.
pub fn format_date(raw: &str) -> String {
    NaiveDateTime::parse_from_str(raw, API_DATE_FORMAT)
        .map(|dt| dt.format(DISPLAY_DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// Draw the complete UI for one frame.
pub fn draw(app: &mut App, frame: &mut Frame) {
    let [main_area, status_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    if app.items.is_empty() {
        draw_notice(app, frame, main_area);
    } else {
        draw_news_list(app, frame, main_area);
    }

    match app.mode {
        Mode::Browse => draw_status_bar(app, frame, status_area),
        Mode::Search => draw_search_prompt(app, frame, status_area),
    }
}

fn title(app: &App) -> String {
    let term = match app.session().term() {
        "" => "latest",
        term => term,
    };
    match app.session().section() {
        "" => format!(" News: {term} "),
        section => format!(" News: {term} in {section} "),
    }
}

/// Render the article list.
fn draw_news_list(app: &mut App, frame: &mut Frame, area: Rect) {
    let list_items: Vec<ListItem> = app
        .items
        .iter()
        .map(|item| {
            let headline = Line::from(Span::styled(
                item.title(),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ));

            let mut details = vec![Span::styled(
                format!("{:<13}", format_date(item.published_at())),
                Style::default().fg(Color::DarkGray),
            )];
            if !item.author().is_empty() {
                details.push(Span::styled(
                    item.author(),
                    Style::default().fg(Color::Yellow),
                ));
                details.push(Span::raw("  "));
            }
            if !item.section().is_empty() {
                details.push(Span::styled(
                    format!("[{}]", item.section()),
                    Style::default().fg(Color::Cyan),
                ));
            }

            ListItem::new(vec![headline, Line::from(details)])
        })
        .collect();

    let list = List::new(list_items)
        .block(Block::default().title(title(app)).borders(Borders::ALL))
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("▸ ");

    frame.render_stateful_widget(list, area, &mut app.list_state);
}

/// Render the message that stands in for an empty list.
fn draw_notice(app: &App, frame: &mut Frame, area: Rect) {
    let text = if app.loading {
        "Loading…"
    } else {
        app.notice.as_deref().unwrap_or("")
    };

    let notice = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().title(title(app)).borders(Borders::ALL));
    frame.render_widget(notice, area);
}

/// Render the bottom status bar.
fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let state = if app.loading {
        Span::styled("Loading…", Style::default().fg(Color::Yellow))
    } else {
        Span::styled(
            format!("{} items", app.items.len()),
            Style::default().fg(Color::Green),
        )
    };

    let status = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        state,
        Span::raw("  q: quit  ↑/↓: scroll  Enter: open  /: search  Tab: section  r: reload"),
    ]));
    frame.render_widget(status, area);
}

/// Render the search prompt in place of the status bar.
fn draw_search_prompt(app: &App, frame: &mut Frame, area: Rect) {
    let prompt = Paragraph::new(Line::from(vec![
        Span::styled(" Search: ", Style::default().fg(Color::Cyan)),
        Span::raw(app.prompt.as_str()),
        Span::styled("█", Style::default().fg(Color::Gray)),
        Span::styled(
            "  Enter: apply  Esc: cancel",
            Style::default().fg(Color::DarkGray),
        ),
    ]));
    frame.render_widget(prompt, area);
}
