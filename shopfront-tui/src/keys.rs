//! Keybinding definitions for the TUI.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    NextView,
    PrevView,
    SwitchView(usize),
    MoveUp,
    MoveDown,
    Confirm,
    Cancel,
    Refresh,
    NextPage,
    PrevPage,
    /// Add the selection to the cart.
    AddItem,
    /// Edit the current entity (profile).
    EditItem,
    /// Remove the selection (cart line).
    DeleteItem,
    /// Bump quantity up.
    Increase,
    /// Bump quantity down.
    Decrease,
    /// Mark the selected notification as read.
    MarkRead,
    /// Start a new review.
    NewItem,
    Logout,
    OpenHelp,
}

pub fn map_key(event: KeyEvent) -> Option<Action> {
    let KeyEvent {
        code, modifiers, ..
    } = event;

    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') => Some(Action::Quit),
            KeyCode::Char('r') => Some(Action::Refresh),
            KeyCode::Char('l') => Some(Action::Logout),
            _ => None,
        };
    }

    match code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('?') => Some(Action::OpenHelp),
        KeyCode::Char('r') => Some(Action::Refresh),
        KeyCode::Char('a') => Some(Action::AddItem),
        KeyCode::Char('e') => Some(Action::EditItem),
        KeyCode::Char('d') => Some(Action::DeleteItem),
        KeyCode::Char('m') => Some(Action::MarkRead),
        KeyCode::Char('n') => Some(Action::NewItem),
        KeyCode::Char(']') => Some(Action::NextPage),
        KeyCode::Char('[') => Some(Action::PrevPage),
        KeyCode::Enter => Some(Action::Confirm),
        KeyCode::Esc => Some(Action::Cancel),
        KeyCode::Tab => Some(Action::NextView),
        KeyCode::BackTab => Some(Action::PrevView),
        KeyCode::Up | KeyCode::Char('k') => Some(Action::MoveUp),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::MoveDown),
        KeyCode::Left | KeyCode::Char('h') => Some(Action::Decrease),
        KeyCode::Right | KeyCode::Char('l') => Some(Action::Increase),
        KeyCode::Char('+') => Some(Action::Increase),
        KeyCode::Char('-') => Some(Action::Decrease),
        KeyCode::Char(c) if c.is_ascii_digit() => {
            let idx = match c {
                '1' => 0,
                '2' => 1,
                '3' => 2,
                '4' => 3,
                '5' => 4,
                '6' => 5,
                '7' => 6,
                '8' => 7,
                _ => return None,
            };
            Some(Action::SwitchView(idx))
        }
        _ => None,
    }
}
