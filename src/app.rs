use ratatui::widgets::ListState;

use crate::config::{ConfigProvider, SearchConfig, SessionConfig};
use crate::loader::ResultSink;
use crate::source::{LoadOutcome, NewsItem};

/// Shown in place of the list when a load succeeds with no usable items.
pub const NO_NEWS: &str = "No news found.";

/// Whether keystrokes drive the list or edit the search prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browse,
    Search,
}

/// Presentation state: what the UI draws and what keys act on.
pub struct App {
    /// Items from the last successful load, in API order.
    pub items: Vec<NewsItem>,
    /// List selection state for scrolling.
    pub list_state: ListState,
    /// Message shown instead of the list (empty result, errors).
    pub notice: Option<String>,
    /// Whether a load is in flight.
    pub loading: bool,
    /// Whether the user has requested to quit.
    pub quit: bool,
    pub mode: Mode,
    /// Text being typed at the search prompt.
    pub prompt: String,
    session: SessionConfig,
}

impl App {
    pub fn new(session: SessionConfig) -> Self {
        Self {
            items: Vec::new(),
            list_state: ListState::default(),
            notice: None,
            loading: false,
            quit: false,
            mode: Mode::Browse,
            prompt: String::new(),
            session,
        }
    }

    pub fn session(&self) -> &SessionConfig {
        &self.session
    }

    /// Called right before the loader is started.
    pub fn begin_loading(&mut self) {
        self.loading = true;
    }

    /// URL of the highlighted item, if any.
    pub fn selected_url(&self) -> Option<&str> {
        self.list_state
            .selected()
            .and_then(|i| self.items.get(i))
            .map(NewsItem::url)
    }

    /// Step the section filter; the caller starts a new load.
    pub fn cycle_section(&mut self) {
        self.session.cycle_section();
    }

    // -- search prompt -------------------------------------------------------

    pub fn open_search(&mut self) {
        self.prompt = self.session.term().to_string();
        self.mode = Mode::Search;
    }

    pub fn push_search_char(&mut self, c: char) {
        self.prompt.push(c);
    }

    pub fn pop_search_char(&mut self) {
        self.prompt.pop();
    }

    pub fn cancel_search(&mut self) {
        self.prompt.clear();
        self.mode = Mode::Browse;
    }

    /// Make the typed text the current term; the caller starts a new load.
    pub fn commit_search(&mut self) {
        let term = std::mem::take(&mut self.prompt);
        self.session.set_term(term.trim());
        self.mode = Mode::Browse;
    }

    // -- navigation ----------------------------------------------------------

    pub fn select_next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1).min(self.items.len() - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_first(&mut self) {
        if !self.items.is_empty() {
            self.list_state.select(Some(0));
        }
    }

    pub fn select_last(&mut self) {
        if !self.items.is_empty() {
            self.list_state.select(Some(self.items.len() - 1));
        }
    }
}

impl ConfigProvider for App {
    fn search_config(&self) -> SearchConfig {
        self.session.search_config()
    }
}

impl ResultSink for App {
    /// Every outcome replaces what was on screen.
    fn deliver(&mut self, outcome: LoadOutcome) {
        self.loading = false;
        self.items.clear();
        self.list_state.select(None);

        match outcome {
            LoadOutcome::Success(items) => {
                self.items = items;
                self.notice = None;
                self.select_first();
            }
            LoadOutcome::Empty => self.notice = Some(NO_NEWS.to_string()),
            LoadOutcome::Failure(kind) => self.notice = Some(kind.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ErrorKind;

    fn make_item(title: &str) -> NewsItem {
        NewsItem::new(
            title,
            "Jane Doe",
            "2021-03-03T10:00:00Z",
            "World news",
            format!("https://example.com/{title}"),
        )
        .unwrap()
    }

    fn sample_items() -> Vec<NewsItem> {
        vec![make_item("new"), make_item("mid"), make_item("old")]
    }

    fn loaded_app() -> App {
        let mut app = App::new(SessionConfig::default());
        app.deliver(LoadOutcome::Success(sample_items()));
        app
    }

    // -- construction --------------------------------------------------------

    #[test]
    fn new_app_starts_empty() {
        let app = App::new(SessionConfig::default());
        assert!(app.items.is_empty());
        assert!(!app.quit);
        assert!(!app.loading);
        assert!(app.notice.is_none());
        assert!(app.list_state.selected().is_none());
    }

    // -- deliver -------------------------------------------------------------

    #[test]
    fn success_replaces_items_and_selects_first() {
        let mut app = App::new(SessionConfig::default());
        app.begin_loading();
        app.deliver(LoadOutcome::Success(sample_items()));

        assert!(!app.loading);
        assert_eq!(app.items.len(), 3);
        assert_eq!(app.items[0].title(), "new", "API order is kept");
        assert_eq!(app.list_state.selected(), Some(0));
        assert_eq!(app.selected_url(), Some("https://example.com/new"));
    }

    #[test]
    fn empty_clears_list_and_shows_notice() {
        let mut app = loaded_app();
        app.deliver(LoadOutcome::Empty);

        assert!(app.items.is_empty());
        assert_eq!(app.notice.as_deref(), Some(NO_NEWS));
        assert!(app.selected_url().is_none());
    }

    #[test]
    fn failure_shows_error_message() {
        let mut app = loaded_app();
        app.deliver(LoadOutcome::Failure(ErrorKind::NoConnection));

        assert!(app.items.is_empty());
        assert_eq!(app.notice.as_deref(), Some("No internet connection."));
    }

    #[test]
    fn success_after_failure_clears_notice() {
        let mut app = App::new(SessionConfig::default());
        app.deliver(LoadOutcome::Failure(ErrorKind::NetworkFailure));
        app.deliver(LoadOutcome::Success(sample_items()));
        assert!(app.notice.is_none());
    }

    // -- search prompt -------------------------------------------------------

    #[test]
    fn search_prompt_starts_from_current_term() {
        let mut app = App::new(SessionConfig::new(SearchConfig {
            term: "rust".into(),
            section: String::new(),
        }));
        app.open_search();
        assert_eq!(app.mode, Mode::Search);
        assert_eq!(app.prompt, "rust");
    }

    #[test]
    fn commit_search_updates_term() {
        let mut app = App::new(SessionConfig::default());
        app.open_search();
        for c in " climate ".chars() {
            app.push_search_char(c);
        }
        app.commit_search();

        assert_eq!(app.mode, Mode::Browse);
        assert_eq!(app.search_config().term, "climate");
        assert!(app.prompt.is_empty());
    }

    #[test]
    fn cancel_search_keeps_term() {
        let mut app = App::new(SessionConfig::default());
        app.open_search();
        app.push_search_char('x');
        app.pop_search_char();
        app.push_search_char('y');
        app.cancel_search();

        assert_eq!(app.mode, Mode::Browse);
        assert_eq!(app.search_config().term, "");
    }

    #[test]
    fn cycle_section_changes_search_config() {
        let mut app = App::new(SessionConfig::default());
        app.cycle_section();
        assert_eq!(app.search_config().section, "world");
    }

    // -- navigation ----------------------------------------------------------

    #[test]
    fn navigation_on_empty_is_noop() {
        let mut app = App::new(SessionConfig::default());
        app.select_next();
        app.select_previous();
        app.select_first();
        app.select_last();
        assert!(app.list_state.selected().is_none());
    }

    #[test]
    fn select_next_advances_and_clamps() {
        let mut app = loaded_app();

        app.select_next();
        assert_eq!(app.list_state.selected(), Some(1));
        app.select_next();
        app.select_next();
        assert_eq!(app.list_state.selected(), Some(2));
    }

    #[test]
    fn select_previous_moves_up_and_clamps() {
        let mut app = loaded_app();

        app.select_last();
        app.select_previous();
        assert_eq!(app.list_state.selected(), Some(1));
        app.select_previous();
        app.select_previous();
        assert_eq!(app.list_state.selected(), Some(0));
    }

    #[test]
    fn select_first_and_last_jump() {
        let mut app = loaded_app();

        app.select_last();
        assert_eq!(app.list_state.selected(), Some(2));
        assert_eq!(app.selected_url(), Some("https://example.com/old"));
        app.select_first();
        assert_eq!(app.list_state.selected(), Some(0));
    }
}
