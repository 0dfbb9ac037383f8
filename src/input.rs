//! Keyboard input handling.
//!
//! Maps terminal key events to [`App`] mutations.  Actions that need the
//! loader or the operating system are returned as a [`Command`] for the main
//! loop to carry out, which keeps this module free of side effects.
//!
//! ## For contributors
//!
//! To add a new keybinding:
//!
//! 1. Add a method on [`App`] for the action (if one doesn't exist).
//! 2. Add a `KeyCode` match arm in [`handle_key_event`] that calls it.
//! 3. Update the help text in `ui::draw_status_bar`.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::app::{App, Mode};

/// Work the main loop must do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start a new load with the current search config.
    Reload,
    /// Open this URL in the system browser.
    Open(String),
}

/// Process a single key event, updating app state accordingly.
///
/// Only reacts to key-press events (ignoring release / repeat) so that each
/// physical keypress triggers exactly one action.
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match app.mode {
        Mode::Browse => handle_browse_key(app, key.code),
        Mode::Search => handle_search_key(app, key.code),
    }
}

fn handle_browse_key(app: &mut App, code: KeyCode) -> Option<Command> {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
        KeyCode::Home | KeyCode::Char('g') => app.select_first(),
        KeyCode::End | KeyCode::Char('G') => app.select_last(),
        KeyCode::Enter => return app.selected_url().map(|url| Command::Open(url.to_string())),
        KeyCode::Char('r') => return Some(Command::Reload),
        KeyCode::Char('/') => app.open_search(),
        KeyCode::Tab => {
            app.cycle_section();
            return Some(Command::Reload);
        }
        _ => {}
    }
    None
}

fn handle_search_key(app: &mut App, code: KeyCode) -> Option<Command> {
    match code {
        KeyCode::Enter => {
            app.commit_search();
            return Some(Command::Reload);
        }
        KeyCode::Esc => app.cancel_search(),
        KeyCode::Backspace => app.pop_search_char(),
        KeyCode::Char(c) => app.push_search_char(c),
        _ => {}
    }
    None
}
